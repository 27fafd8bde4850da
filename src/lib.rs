//! tvfeed - live-TV channel and subtitle aggregation
//!
//! Normalizes channel lists from Xtream Codes servers and M3U endpoints, and
//! subtitles from OpenSubtitles, custom JSON APIs and local caches, into one
//! model. Unreliable sources are expected: loading falls back between
//! protocols, and subtitle providers fail independently of each other.
//!
//! # Modules
//!
//! - `models` - Servers, channels, subtitle providers and candidates
//! - `playlist` - M3U/EXTINF tokenizer
//! - `api` - HTTP clients (Xtream, M3U, OpenSubtitles, custom)
//! - `loader` - Protocol selection and fallback for channel sources
//! - `subtitles` - Search, download and auto-load pipeline
//! - `storage` - Storage interface and implementations
//! - `config` - TOML configuration

pub mod api;
pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod playlist;
pub mod storage;
pub mod subtitles;

// Re-export commonly used types
pub use models::{
    Channel, ChannelDraft, DownloadRef, ProviderKind, SavedSubtitle, ServerDescriptor,
    SubFormat, SubtitleCandidate, SubtitleProvider,
};

pub use config::Config;
pub use error::{FeedError, FeedResult};
pub use loader::{ChannelLoader, Strategy};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use subtitles::{AutoLoader, SubtitleDownloader, SubtitleSearch};
