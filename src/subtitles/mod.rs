//! Subtitle pipeline
//!
//! - Search: fan-out over configured providers with per-provider outcomes
//! - Download: one-step and two-step fetch, SRT to WebVTT conversion
//! - Auto-load: pick and persist one subtitle per channel

pub mod autoload;
pub mod download;
pub mod search;

pub use autoload::{AutoLoadOptions, AutoLoader, SearchScope};
pub use download::{srt_to_vtt, SubtitleDownloader};
pub use search::{ProviderOutcome, SearchReport, SubtitleSearch};
