//! Channel source loader
//!
//! Picks a protocol for a server without trusting the caller to know which one
//! it speaks. The descriptor's `api_path` is read as a hint:
//!
//! | Hint | Strategy | On failure |
//! |---|---|---|
//! | contains `player_api` | Xtream only | error returned as-is |
//! | contains `get.php` or ends in `.m3u`/`.m3u8` | M3U only | error returned as-is |
//! | anything else | Xtream, then M3U | both errors reported |

use std::path::Path;
use tracing::{info, warn};

use crate::api::m3u::{self, DEFAULT_PLAYLIST_PATH};
use crate::api::xtream::DEFAULT_API_PATH;
use crate::api::{PlaylistClient, XtreamClient};
use crate::error::{FeedError, FeedResult};
use crate::models::{ChannelDraft, ServerDescriptor};

/// Transport strategy chosen for a load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Explicit Xtream hint; no fallback
    XtreamProbe,
    /// Explicit M3U hint; no fallback
    M3uProbe,
    /// No usable hint: Xtream first, M3U on any failure
    Fallback,
}

impl Strategy {
    /// Choose a strategy from the descriptor's path hint
    pub fn for_server(server: &ServerDescriptor) -> Self {
        let Some(path) = server.api_path.as_deref() else {
            return Strategy::Fallback;
        };
        let path = path.to_lowercase();
        let path_only = path.split('?').next().unwrap_or_default();

        if path.contains("player_api") {
            Strategy::XtreamProbe
        } else if path.contains("get.php")
            || path_only.ends_with(".m3u")
            || path_only.ends_with(".m3u8")
        {
            Strategy::M3uProbe
        } else {
            Strategy::Fallback
        }
    }
}

/// Loads channel lists from Xtream servers and M3U endpoints
pub struct ChannelLoader {
    xtream: XtreamClient,
    playlists: PlaylistClient,
}

impl ChannelLoader {
    /// Create a loader with default HTTP clients
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    /// Create a loader sharing one configured HTTP client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            xtream: XtreamClient::with_client(client.clone()),
            playlists: PlaylistClient::with_client(client),
        }
    }

    /// Load the channel list for a server
    pub async fn load(&self, server: &ServerDescriptor) -> FeedResult<Vec<ChannelDraft>> {
        let strategy = Strategy::for_server(server);
        info!("Loading channels from {} using {:?}", server, strategy);

        let hinted = server.api_path.as_deref();

        match strategy {
            Strategy::XtreamProbe => {
                self.xtream
                    .live_streams(server, hinted.unwrap_or(DEFAULT_API_PATH))
                    .await
            }
            Strategy::M3uProbe => {
                self.playlists
                    .server_playlist(server, hinted.unwrap_or(DEFAULT_PLAYLIST_PATH))
                    .await
            }
            Strategy::Fallback => {
                let xtream_err = match self
                    .xtream
                    .live_streams(server, hinted.unwrap_or(DEFAULT_API_PATH))
                    .await
                {
                    Ok(channels) => return Ok(channels),
                    Err(e) => e,
                };

                if xtream_err.is_transport() {
                    warn!(
                        "Xtream probe of {} failed ({}), falling back to M3U",
                        server, xtream_err
                    );
                } else {
                    info!(
                        "{} does not look like an Xtream panel ({}), trying M3U",
                        server, xtream_err
                    );
                }

                self.playlists
                    .server_playlist(server, hinted.unwrap_or(DEFAULT_PLAYLIST_PATH))
                    .await
                    .map_err(|m3u_err| FeedError::FallbackExhausted {
                        xtream: Box::new(xtream_err),
                        m3u: Box::new(m3u_err),
                    })
            }
        }
    }

    /// Load a raw playlist URL
    pub async fn load_playlist_url(&self, url: &str) -> FeedResult<Vec<ChannelDraft>> {
        self.playlists.playlist_url(url).await
    }

    /// Load a playlist cached on disk
    pub async fn load_playlist_file(&self, path: &Path) -> FeedResult<Vec<ChannelDraft>> {
        let content = tokio::fs::read_to_string(path).await?;
        m3u::parse_checked(&content)
    }

    /// Reachability probe for UI feedback; never errors
    pub async fn test_connection(&self, server: &ServerDescriptor) -> bool {
        self.xtream.test_connection(server).await
    }
}

impl Default for ChannelLoader {
    fn default() -> Self {
        Self::new()
    }
}
