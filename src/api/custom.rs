//! Generic subtitle API client
//!
//! Talks to any endpoint answering `GET <api_url>?query=..&language=..` with a
//! JSON array of `{id?, name, url, language?, format?}`. Entries carry direct
//! URLs, so downloads are a single fetch.

use serde::Deserialize;
use tracing::debug;

use crate::error::{FeedError, FeedResult};
use crate::models::{DownloadRef, SubFormat, SubtitleCandidate};

/// Custom subtitle API client
pub struct CustomSubtitleClient {
    api_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct CustomSubtitle {
    #[serde(default)]
    id: Option<serde_json::Value>,
    name: String,
    url: String,
    language: Option<String>,
    format: Option<String>,
}

impl CustomSubtitleClient {
    pub fn new(api_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url, api_key)
    }

    pub fn with_client(
        client: reqwest::Client,
        api_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            api_key,
            client,
        }
    }

    /// Search the endpoint; entries keep the order the server returned
    pub async fn search(
        &self,
        provider_id: &str,
        query: &str,
        language: &str,
    ) -> FeedResult<Vec<SubtitleCandidate>> {
        let mut request = self
            .client
            .get(&self.api_url)
            .query(&[("query", query), ("language", language)])
            .header("Accept", "application/json");

        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let entries: Vec<CustomSubtitle> = serde_json::from_str(&body)?;

        let candidates: Vec<SubtitleCandidate> = entries
            .into_iter()
            .enumerate()
            .map(|(idx, entry)| entry.into_candidate(provider_id, idx, language))
            .collect();

        debug!(
            "Custom provider {} returned {} candidates",
            provider_id,
            candidates.len()
        );
        Ok(candidates)
    }
}

impl CustomSubtitle {
    fn into_candidate(self, provider_id: &str, idx: usize, language: &str) -> SubtitleCandidate {
        let id = match self.id {
            Some(serde_json::Value::String(s)) if !s.is_empty() => s,
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => format!("{}-{}", provider_id, idx),
        };

        SubtitleCandidate {
            id,
            title: self.name,
            language: self
                .language
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| language.to_string()),
            download: DownloadRef::Url(self.url),
            format: self
                .format
                .as_deref()
                .map(SubFormat::from_extension)
                .unwrap_or(SubFormat::Srt),
            popularity: None,
            provider_id: provider_id.to_string(),
        }
    }
}
