//! Subtitle download and format normalization
//!
//! URL and path candidates are fetched in one step. OpenSubtitles candidates
//! carry a file id that is first resolved to a link, then fetched the same way.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::api::OpenSubtitlesClient;
use crate::error::{FeedError, FeedResult};
use crate::models::{DownloadRef, ProviderKind, SubFormat, SubtitleCandidate, SubtitleProvider};

/// First line of every WebVTT document we produce
pub const WEBVTT_HEADER: &str = "WEBVTT\n\n";

static SRT_TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{2}:\d{2}:\d{2}),(\d{3})").expect("timestamp pattern is valid")
});

/// Convert SRT content to WebVTT
///
/// Prefixes the `WEBVTT` header and rewrites `HH:MM:SS,mmm` timestamps to
/// `HH:MM:SS.mmm`. Everything else, dialogue commas included, passes through.
pub fn srt_to_vtt(srt: &str) -> String {
    let srt = srt.trim_start_matches('\u{feff}');
    let body = SRT_TIMESTAMP_RE.replace_all(srt, "$1.$2");

    if has_vtt_signature(&body) {
        return body.into_owned();
    }

    let mut vtt = String::with_capacity(WEBVTT_HEADER.len() + body.len());
    vtt.push_str(WEBVTT_HEADER);
    vtt.push_str(&body);
    vtt
}

/// First line is exactly `WEBVTT`, optionally followed by a space or tab
fn has_vtt_signature(content: &str) -> bool {
    let first = content.lines().next().unwrap_or_default();
    match first.strip_prefix("WEBVTT") {
        Some(rest) => rest.is_empty() || rest.starts_with([' ', '\t']),
        None => false,
    }
}

/// Normalize downloaded content for storage
///
/// SRT becomes WebVTT; other formats are kept as downloaded.
pub fn normalize(content: &str, format: SubFormat) -> String {
    match format {
        SubFormat::Srt => srt_to_vtt(content),
        _ => content.to_string(),
    }
}

/// Fetches subtitle content for candidates
pub struct SubtitleDownloader {
    client: reqwest::Client,
}

impl SubtitleDownloader {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Download a candidate's raw content
    ///
    /// `provider` is the provider that produced the candidate; it is required
    /// for file-id candidates, which need its endpoint and key to resolve.
    pub async fn download(
        &self,
        provider: Option<&SubtitleProvider>,
        candidate: &SubtitleCandidate,
    ) -> FeedResult<String> {
        match &candidate.download {
            DownloadRef::Url(url) => self.fetch_text(url).await,
            DownloadRef::Path(path) => Ok(tokio::fs::read_to_string(path).await?),
            DownloadRef::FileId(file_id) => {
                let link = self.resolve(provider, candidate, *file_id).await?;
                self.fetch_text(&link).await
            }
        }
    }

    async fn resolve(
        &self,
        provider: Option<&SubtitleProvider>,
        candidate: &SubtitleCandidate,
        file_id: u64,
    ) -> FeedResult<String> {
        let credentials = match provider.map(|p| &p.kind) {
            Some(ProviderKind::OpenSubtitles { api_url, api_key }) => api_key
                .as_deref()
                .filter(|k| !k.trim().is_empty())
                .map(|key| (api_url, key)),
            _ => None,
        };
        let (api_url, api_key) = match credentials {
            Some(found) => found,
            None => {
                return Err(FeedError::configuration(format!(
                    "no OpenSubtitles credentials for provider '{}'",
                    candidate.provider_id
                )))
            }
        };

        debug!("Resolving OpenSubtitles file {}", file_id);
        OpenSubtitlesClient::with_client(self.client.clone(), api_url.as_str(), api_key)
            .resolve_link(file_id)
            .await
    }

    /// Fetch a URL as text; any non-2xx status is a failure
    pub async fn fetch_text(&self, url: &str) -> FeedResult<String> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

impl Default for SubtitleDownloader {
    fn default() -> Self {
        Self::new()
    }
}
