//! Xtream Codes player API client
//!
//! Lists live streams through `player_api.php` and synthesizes direct stream
//! URLs of the form `<base>/live/<user>/<pass>/<stream_id>.ts`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::error::{FeedError, FeedResult};
use crate::models::{ChannelDraft, ServerDescriptor, UNCATEGORIZED};

/// Path used when the descriptor gives no Xtream path
pub const DEFAULT_API_PATH: &str = "player_api.php";

/// Accept ids sent either as JSON numbers or strings
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(D::Error::custom("expected stream id as string or number")),
    }
}

/// Single entry of `action=get_live_streams`
#[derive(Debug, Deserialize)]
struct XtreamStream {
    #[serde(deserialize_with = "deserialize_id")]
    stream_id: String,
    name: Option<String>,
    stream_icon: Option<String>,
    category_name: Option<String>,
    epg_channel_id: Option<String>,
}

impl XtreamStream {
    fn into_draft(self, server: &ServerDescriptor) -> ChannelDraft {
        let non_empty = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        ChannelDraft {
            stream_url: server.live_stream_url(&self.stream_id),
            name: non_empty(self.name).unwrap_or_else(|| format!("Stream {}", self.stream_id)),
            logo_url: non_empty(self.stream_icon),
            category: non_empty(self.category_name).unwrap_or_else(|| UNCATEGORIZED.to_string()),
            epg_id: non_empty(self.epg_channel_id),
        }
    }
}

/// Xtream Codes API client
pub struct XtreamClient {
    client: reqwest::Client,
}

impl XtreamClient {
    /// Create a new client with default transport settings
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create with a preconfigured HTTP client (timeouts live there)
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// List live streams as channel drafts
    ///
    /// A body that parses but is not a JSON array is reported as
    /// [`FeedError::ProtocolMismatch`] so callers can try another protocol.
    pub async fn live_streams(
        &self,
        server: &ServerDescriptor,
        api_path: &str,
    ) -> FeedResult<Vec<ChannelDraft>> {
        let url = server.endpoint(api_path);
        debug!("Listing Xtream live streams from {}", server);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("username", server.username.as_str()),
                ("password", server.password.as_str()),
                ("action", "get_live_streams"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let value: Value = serde_json::from_str(&body)?;

        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(FeedError::ProtocolMismatch(format!(
                    "expected JSON array of live streams, got {}",
                    json_kind(&other)
                )));
            }
        };

        let total = items.len();
        let channels: Vec<ChannelDraft> = items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<XtreamStream>(item) {
                Ok(stream) => Some(stream.into_draft(server)),
                Err(e) => {
                    debug!("Skipping Xtream entry without usable stream_id: {}", e);
                    None
                }
            })
            .collect();

        debug!("Xtream returned {} of {} usable streams", channels.len(), total);
        Ok(channels)
    }

    /// Lightweight reachability probe
    ///
    /// Returns false on any transport failure instead of erroring.
    pub async fn test_connection(&self, server: &ServerDescriptor) -> bool {
        let path = server.api_path.as_deref().unwrap_or(DEFAULT_API_PATH);
        let url = server.endpoint(path);

        match self
            .client
            .get(&url)
            .query(&[
                ("username", server.username.as_str()),
                ("password", server.password.as_str()),
            ])
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Connection test to {} failed: {}", server, e);
                false
            }
        }
    }
}

impl Default for XtreamClient {
    fn default() -> Self {
        Self::new()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> ServerDescriptor {
        ServerDescriptor {
            protocol: "http".to_string(),
            host: "tv.local".to_string(),
            port: None,
            api_path: None,
            username: "u".to_string(),
            password: "p".to_string(),
        }
    }

    #[test]
    fn test_stream_id_number_or_string() {
        let a: XtreamStream = serde_json::from_str(r#"{"stream_id": 12}"#).unwrap();
        let b: XtreamStream = serde_json::from_str(r#"{"stream_id": "34"}"#).unwrap();
        assert_eq!(a.stream_id, "12");
        assert_eq!(b.stream_id, "34");
    }

    #[test]
    fn test_stream_id_required() {
        assert!(serde_json::from_str::<XtreamStream>(r#"{"name": "x"}"#).is_err());
        assert!(serde_json::from_str::<XtreamStream>(r#"{"stream_id": ""}"#).is_err());
    }

    #[test]
    fn test_into_draft_defaults() {
        let stream: XtreamStream =
            serde_json::from_str(r#"{"stream_id": 5, "category_name": "", "stream_icon": ""}"#)
                .unwrap();
        let draft = stream.into_draft(&server());
        assert_eq!(draft.name, "Stream 5");
        assert_eq!(draft.category, UNCATEGORIZED);
        assert!(draft.logo_url.is_none());
        assert_eq!(draft.stream_url, "http://tv.local/live/u/p/5.ts");
    }

    #[test]
    fn test_json_kind() {
        assert_eq!(json_kind(&serde_json::json!({})), "object");
        assert_eq!(json_kind(&serde_json::json!([])), "array");
    }
}
