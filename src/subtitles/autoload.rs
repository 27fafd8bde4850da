//! Automatic subtitle selection for a channel
//!
//! Walks auto-load providers in configured order and their languages in
//! listed order. The first `(provider, language)` pair that yields a subtitle
//! wins, either from storage or from a fresh search and download.

use tracing::{debug, info, warn};

use crate::error::FeedResult;
use crate::models::{SavedSubtitle, SubFormat, SubtitleProvider};
use crate::storage::Storage;
use crate::subtitles::download::{normalize, SubtitleDownloader};
use crate::subtitles::search::SubtitleSearch;

/// Which providers a pair's search consults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    /// Every configured provider listing the language
    #[default]
    AllProviders,
    /// Only the provider of the current pair
    CurrentProvider,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AutoLoadOptions {
    pub scope: SearchScope,
}

/// Picks, downloads and saves at most one subtitle per request
pub struct AutoLoader {
    search: SubtitleSearch,
    downloader: SubtitleDownloader,
    options: AutoLoadOptions,
}

impl AutoLoader {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            search: SubtitleSearch::with_client(client.clone()),
            downloader: SubtitleDownloader::with_client(client),
            options: AutoLoadOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AutoLoadOptions) -> Self {
        self.options = options;
        self
    }

    /// Find a subtitle for `content_name` on `channel_id`
    ///
    /// Returns `Ok(None)` when nothing was found. Failures of individual
    /// pairs are logged and skipped; only failing to read the provider list
    /// is an error.
    pub async fn auto_load(
        &self,
        storage: &dyn Storage,
        content_name: &str,
        channel_id: u64,
    ) -> FeedResult<Option<SavedSubtitle>> {
        let providers = storage.subtitle_providers()?;
        let auto: Vec<&SubtitleProvider> = providers.iter().filter(|p| p.auto_load).collect();

        if auto.is_empty() {
            debug!("No auto-load subtitle providers configured");
            return Ok(None);
        }

        for provider in auto {
            for language in &provider.languages {
                match self
                    .try_pair(storage, &providers, provider, content_name, channel_id, language)
                    .await
                {
                    Ok(Some(saved)) => return Ok(Some(saved)),
                    Ok(None) => {}
                    Err(e) => warn!(
                        "Auto-load via {} [{}] failed for channel {}: {}",
                        provider.name, language, channel_id, e
                    ),
                }
            }
        }

        info!("No subtitle found for '{}' on channel {}", content_name, channel_id);
        Ok(None)
    }

    async fn try_pair(
        &self,
        storage: &dyn Storage,
        providers: &[SubtitleProvider],
        provider: &SubtitleProvider,
        content_name: &str,
        channel_id: u64,
        language: &str,
    ) -> FeedResult<Option<SavedSubtitle>> {
        if let Some(saved) = storage.channel_subtitle(channel_id, language)? {
            debug!("Using saved {} subtitle for channel {}", language, channel_id);
            return Ok(Some(saved));
        }

        let report = match self.options.scope {
            SearchScope::AllProviders => {
                self.search
                    .search_providers(storage, providers, content_name, language)
                    .await
            }
            SearchScope::CurrentProvider => {
                self.search
                    .search_providers(storage, std::slice::from_ref(provider), content_name, language)
                    .await
            }
        };

        let Some(candidate) = report.into_candidates().into_iter().next() else {
            return Ok(None);
        };

        let source = providers.iter().find(|p| p.id == candidate.provider_id);
        let raw = self.downloader.download(source, &candidate).await?;
        let content = normalize(&raw, candidate.format);

        let saved = SavedSubtitle::new(channel_id, language, content, SubFormat::Vtt);
        storage.save_channel_subtitle(&saved)?;

        info!(
            "Saved {} subtitle '{}' for channel {}",
            language, candidate.title, channel_id
        );
        Ok(Some(saved))
    }
}

impl Default for AutoLoader {
    fn default() -> Self {
        Self::new()
    }
}
