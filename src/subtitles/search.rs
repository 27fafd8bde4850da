//! Subtitle search across configured providers
//!
//! Each provider is queried on its own and its result recorded as a
//! [`ProviderOutcome`]. A failing provider contributes no candidates; it never
//! stops the others from being queried or returned.

use tracing::{debug, warn};

use crate::api::{CustomSubtitleClient, OpenSubtitlesClient};
use crate::error::{FeedError, FeedResult};
use crate::models::{ProviderKind, SubtitleCandidate, SubtitleProvider};
use crate::storage::Storage;

/// Result of querying a single provider
#[derive(Debug)]
pub struct ProviderOutcome {
    pub provider_id: String,
    pub provider_name: String,
    pub result: FeedResult<Vec<SubtitleCandidate>>,
}

/// Aggregated outcome of a search, in configured provider order
#[derive(Debug, Default)]
pub struct SearchReport {
    pub outcomes: Vec<ProviderOutcome>,
}

impl SearchReport {
    /// All candidates from healthy providers, provider order preserved
    pub fn candidates(&self) -> Vec<&SubtitleCandidate> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .flatten()
            .collect()
    }

    /// Consume the report, keeping only candidates
    pub fn into_candidates(self) -> Vec<SubtitleCandidate> {
        self.outcomes
            .into_iter()
            .filter_map(|o| o.result.ok())
            .flatten()
            .collect()
    }

    /// Providers that failed, with their errors
    pub fn failures(&self) -> Vec<(&str, &FeedError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.provider_id.as_str(), e)))
            .collect()
    }

    /// Ids of providers that were queried
    pub fn queried(&self) -> Vec<&str> {
        self.outcomes.iter().map(|o| o.provider_id.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| o.result.as_ref().map(|c| c.is_empty()).unwrap_or(true))
    }
}

/// Fans a search out over subtitle providers
pub struct SubtitleSearch {
    client: reqwest::Client,
}

impl SubtitleSearch {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Search every configured provider that lists `language`
    ///
    /// Fails only when no providers are configured at all. Having providers
    /// but none for this language yields an empty report.
    pub async fn search(
        &self,
        storage: &dyn Storage,
        query: &str,
        language: &str,
    ) -> FeedResult<SearchReport> {
        let providers = storage.subtitle_providers()?;
        if providers.is_empty() {
            return Err(FeedError::configuration("no subtitle providers configured"));
        }

        Ok(self
            .search_providers(storage, &providers, query, language)
            .await)
    }

    /// Search the given providers sequentially, skipping those without `language`
    pub async fn search_providers(
        &self,
        storage: &dyn Storage,
        providers: &[SubtitleProvider],
        query: &str,
        language: &str,
    ) -> SearchReport {
        let mut report = SearchReport::default();

        for provider in providers.iter().filter(|p| p.supports(language)) {
            let result = self.search_provider(storage, provider, query, language).await;

            match &result {
                Ok(found) => debug!(
                    "Provider {} returned {} subtitles for '{}' [{}]",
                    provider.name,
                    found.len(),
                    query,
                    language
                ),
                Err(e) => warn!("Subtitle provider {} failed: {}", provider.name, e),
            }

            report.outcomes.push(ProviderOutcome {
                provider_id: provider.id.clone(),
                provider_name: provider.name.clone(),
                result,
            });
        }

        report
    }

    /// Query one provider
    pub async fn search_provider(
        &self,
        storage: &dyn Storage,
        provider: &SubtitleProvider,
        query: &str,
        language: &str,
    ) -> FeedResult<Vec<SubtitleCandidate>> {
        match &provider.kind {
            ProviderKind::OpenSubtitles { api_url, api_key } => {
                let api_key = api_key
                    .as_deref()
                    .filter(|k| !k.trim().is_empty())
                    .ok_or_else(|| {
                        FeedError::configuration(format!(
                            "OpenSubtitles provider '{}' has no API key",
                            provider.name
                        ))
                    })?;

                OpenSubtitlesClient::with_client(self.client.clone(), api_url.as_str(), api_key)
                    .search(&provider.id, query, language)
                    .await
            }
            ProviderKind::Custom { api_url, api_key } => {
                CustomSubtitleClient::with_client(
                    self.client.clone(),
                    api_url.as_str(),
                    api_key.clone(),
                )
                .search(&provider.id, query, language)
                .await
            }
            ProviderKind::Local => Ok(storage
                .local_subtitles()?
                .into_iter()
                .filter(|c| c.language == language)
                .map(|c| SubtitleCandidate {
                    provider_id: provider.id.clone(),
                    ..c
                })
                .collect()),
        }
    }
}

impl Default for SubtitleSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DownloadRef, SubFormat};
    use crate::storage::MemoryStorage;

    fn local_candidate(lang: &str, title: &str) -> SubtitleCandidate {
        SubtitleCandidate {
            id: title.to_string(),
            title: title.to_string(),
            language: lang.to_string(),
            download: DownloadRef::Url(format!("http://local/{}", title)),
            format: SubFormat::Srt,
            popularity: None,
            provider_id: "local".to_string(),
        }
    }

    #[tokio::test]
    async fn test_no_providers_is_configuration_error() {
        let storage = MemoryStorage::new();
        let err = SubtitleSearch::new()
            .search(&storage, "news", "en")
            .await
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn test_no_matching_language_is_empty() {
        let storage = MemoryStorage::with_providers(vec![SubtitleProvider::new(
            "l",
            "Local",
            ProviderKind::Local,
            &["en"],
        )]);
        let report = SubtitleSearch::new()
            .search(&storage, "news", "ar")
            .await
            .unwrap();
        assert!(report.outcomes.is_empty());
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn test_local_filters_exact_language_and_retags() {
        let storage = MemoryStorage::with_providers(vec![SubtitleProvider::new(
            "cache",
            "Cache",
            ProviderKind::Local,
            &["en"],
        )]);
        storage.add_local_subtitle(local_candidate("en", "a")).unwrap();
        storage.add_local_subtitle(local_candidate("eng", "b")).unwrap();
        storage.add_local_subtitle(local_candidate("en", "c")).unwrap();

        let report = SubtitleSearch::new()
            .search(&storage, "anything", "en")
            .await
            .unwrap();
        let titles: Vec<_> = report.candidates().iter().map(|c| c.title.clone()).collect();

        assert_eq!(titles, vec!["a", "c"]);
        assert!(report.candidates().iter().all(|c| c.provider_id == "cache"));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_isolated() {
        let storage = MemoryStorage::with_providers(vec![
            SubtitleProvider::new(
                "os",
                "OpenSubtitles",
                ProviderKind::OpenSubtitles {
                    api_url: "http://127.0.0.1:9".to_string(),
                    api_key: None,
                },
                &["en"],
            ),
            SubtitleProvider::new("cache", "Cache", ProviderKind::Local, &["en"]),
        ]);
        storage.add_local_subtitle(local_candidate("en", "kept")).unwrap();

        let report = SubtitleSearch::new()
            .search(&storage, "q", "en")
            .await
            .unwrap();

        assert_eq!(report.queried(), vec!["os", "cache"]);
        assert_eq!(report.failures().len(), 1);
        assert!(report.failures()[0].1.is_configuration());
        assert_eq!(report.into_candidates().len(), 1);
    }
}
