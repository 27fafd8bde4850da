//! Error taxonomy shared by the channel loader and the subtitle pipeline

use thiserror::Error;

/// Errors raised by source loading and subtitle operations
#[derive(Error, Debug)]
pub enum FeedError {
    /// Nothing configured, or a provider is missing a required setting
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Server returned HTTP {0}")]
    Status(u16),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Response parsed but has the wrong shape for the protocol
    #[error("Protocol mismatch: {0}")]
    ProtocolMismatch(String),

    #[error("Invalid response: {0}")]
    Decoding(String),

    /// Resolve step answered without a download link
    #[error("No download link provided")]
    NoLink,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Both strategies of an unhinted load failed
    #[error("Xtream probe failed ({xtream}); M3U fallback failed ({m3u})")]
    FallbackExhausted {
        xtream: Box<FeedError>,
        m3u: Box<FeedError>,
    },
}

impl FeedError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        FeedError::Configuration(msg.into())
    }

    pub fn decoding(msg: impl std::fmt::Display) -> Self {
        FeedError::Decoding(msg.to_string())
    }

    /// Network, status and body-decoding failures
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FeedError::Status(_) | FeedError::Request(_) | FeedError::Decoding(_) | FeedError::Io(_)
        )
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, FeedError::Configuration(_))
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::Decoding(format!("JSON parse error: {}", err))
    }
}

pub type FeedResult<T> = std::result::Result<T, FeedError>;
