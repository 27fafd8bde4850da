//! OpenSubtitles REST API client
//!
//! Search is a GET authenticated with an `Api-Key` header. Downloads take two
//! steps: POST the file id to `/download`, then fetch the returned link.
//! API docs: https://opensubtitles.stoplight.io/docs/opensubtitles-api

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FeedError, FeedResult};
use crate::models::{DownloadRef, SubFormat, SubtitleCandidate};

const USER_AGENT: &str = concat!("tvfeed v", env!("CARGO_PKG_VERSION"));

/// OpenSubtitles API client
pub struct OpenSubtitlesClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenSubtitlesClient {
    /// Create a client for the given endpoint and key
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, api_key)
    }

    /// Create with a preconfigured HTTP client
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Search subtitles by free-text query and language
    ///
    /// Result order is the API's own ranking.
    pub async fn search(
        &self,
        provider_id: &str,
        query: &str,
        language: &str,
    ) -> FeedResult<Vec<SubtitleCandidate>> {
        let url = format!("{}/subtitles", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("query", query), ("languages", language)])
            .header("Api-Key", &self.api_key)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let parsed: SearchResponse = serde_json::from_str(&body)?;

        let candidates: Vec<SubtitleCandidate> = parsed
            .data
            .into_iter()
            .filter_map(|item| item.into_candidate(provider_id, query, language))
            .collect();

        debug!(
            "OpenSubtitles returned {} candidates for '{}' [{}]",
            candidates.len(),
            query,
            language
        );
        Ok(candidates)
    }

    /// Exchange a file id for a temporary download link
    pub async fn resolve_link(&self, file_id: u64) -> FeedResult<String> {
        let url = format!("{}/download", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .json(&DownloadRequest { file_id })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let parsed: DownloadResponse = serde_json::from_str(&body)?;

        parsed
            .link
            .filter(|link| !link.trim().is_empty())
            .ok_or(FeedError::NoLink)
    }
}

// =============================================================================
// Response Structures (internal deserialization)
// =============================================================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: Option<String>,
    attributes: Attributes,
}

#[derive(Debug, Deserialize)]
struct Attributes {
    #[serde(default)]
    files: Vec<FileRaw>,
    release: Option<String>,
    feature_details: Option<FeatureDetails>,
    language: Option<String>,
    download_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct FileRaw {
    file_id: u64,
    file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FeatureDetails {
    title: Option<String>,
    movie_name: Option<String>,
}

impl SearchItem {
    /// Items without files cannot be downloaded and are dropped
    fn into_candidate(
        self,
        provider_id: &str,
        query: &str,
        language: &str,
    ) -> Option<SubtitleCandidate> {
        let attrs = self.attributes;
        let file = attrs.files.into_iter().next()?;

        let file_name = file.file_name.unwrap_or_default();
        let feature_title = attrs
            .feature_details
            .and_then(|f| f.movie_name.or(f.title));
        let title = [attrs.release, feature_title, Some(file_name.clone())]
            .into_iter()
            .flatten()
            .find(|t| !t.trim().is_empty())
            .unwrap_or_else(|| query.to_string());

        Some(SubtitleCandidate {
            id: self.id.unwrap_or_else(|| file.file_id.to_string()),
            title,
            language: attrs.language.unwrap_or_else(|| language.to_string()),
            download: DownloadRef::FileId(file.file_id),
            format: SubFormat::from_file_name(&file_name),
            popularity: attrs.download_count,
            provider_id: provider_id.to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
struct DownloadRequest {
    file_id: u64,
}

#[derive(Debug, Deserialize)]
struct DownloadResponse {
    link: Option<String>,
}
