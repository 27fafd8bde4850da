//! API clients for external services
//!
//! - Xtream: live stream listing via `player_api.php`
//! - M3U: playlist exports and raw playlist URLs
//! - OpenSubtitles: subtitle search and two-step download
//! - Custom: generic JSON subtitle endpoints

pub mod custom;
pub mod m3u;
pub mod opensubtitles;
pub mod xtream;

pub use custom::CustomSubtitleClient;
pub use m3u::PlaylistClient;
pub use opensubtitles::OpenSubtitlesClient;
pub use xtream::XtreamClient;
