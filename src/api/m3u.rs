//! M3U playlist fetching
//!
//! Downloads playlist text, either from an Xtream panel's `get.php` export or
//! from a raw playlist URL, and hands it to the tokenizer.

use tracing::{debug, info};

use crate::error::{FeedError, FeedResult};
use crate::models::{ChannelDraft, ServerDescriptor};
use crate::playlist;

/// Path used when the descriptor gives no playlist path
pub const DEFAULT_PLAYLIST_PATH: &str = "get.php";

/// Playlist client
pub struct PlaylistClient {
    client: reqwest::Client,
}

impl PlaylistClient {
    /// Create a new playlist client
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create with a preconfigured HTTP client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Request the server's `type=m3u_plus` export and parse it
    pub async fn server_playlist(
        &self,
        server: &ServerDescriptor,
        api_path: &str,
    ) -> FeedResult<Vec<ChannelDraft>> {
        let url = server.endpoint(api_path);
        debug!("Requesting M3U export from {}", server);

        let request = self.client.get(&url).query(&[
            ("username", server.username.as_str()),
            ("password", server.password.as_str()),
            ("type", "m3u_plus"),
            ("output", "ts"),
        ]);

        let body = self.fetch_text(request).await?;
        parse_checked(&body)
    }

    /// Fetch a raw playlist URL and parse it
    pub async fn playlist_url(&self, url: &str) -> FeedResult<Vec<ChannelDraft>> {
        debug!("Fetching playlist {}", url);
        let body = self.fetch_text(self.client.get(url)).await?;
        parse_checked(&body)
    }

    async fn fetch_text(&self, request: reqwest::RequestBuilder) -> FeedResult<String> {
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

impl Default for PlaylistClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject non-playlist bodies, then tokenize
pub fn parse_checked(content: &str) -> FeedResult<Vec<ChannelDraft>> {
    if !playlist::validate(content) {
        return Err(FeedError::ProtocolMismatch(
            "response is not an M3U playlist".to_string(),
        ));
    }

    let channels = playlist::parse(content);
    info!("Parsed {} channels from M3U playlist", channels.len());
    Ok(channels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_checked_rejects_html() {
        let err = parse_checked("<html>login</html>").unwrap_err();
        assert!(matches!(err, FeedError::ProtocolMismatch(_)));
    }

    #[test]
    fn test_parse_checked_header_only_is_empty_ok() {
        assert!(parse_checked("#EXTM3U\n").unwrap().is_empty());
    }
}
