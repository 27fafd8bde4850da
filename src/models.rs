//! Data structures and types for tvfeed
//!
//! Contains all shared models used across the crate organized by domain:
//! - **Sources**: server descriptors and normalized channels
//! - **Subtitles**: provider configuration, search candidates, saved subtitles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Category assigned to channels that do not carry one
pub const UNCATEGORIZED: &str = "Uncategorized";

// =============================================================================
// Source Models (Xtream / M3U)
// =============================================================================

/// Remote IPTV endpoint description
///
/// `api_path` is only a hint: the loader inspects it to decide which protocol
/// to speak, and probes when it says nothing useful.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerDescriptor {
    /// URL scheme, "http" or "https"
    pub protocol: String,
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_path: Option<String>,
    pub username: String,
    pub password: String,
}

impl ServerDescriptor {
    /// Split a full server URL into a descriptor
    ///
    /// Accepts `host`, `host:port`, `http://host:port/path` forms; the scheme
    /// defaults to http when missing. Credentials pasted into the query
    /// (`get.php?username=..&password=..`) are moved out of `api_path`; they
    /// fill in arguments left empty, and non-empty arguments win.
    pub fn parse(
        url: &str,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Option<Self> {
        let url = url.trim();
        let (protocol, rest) = match url.split_once("://") {
            Some((scheme, rest)) => (scheme.to_lowercase(), rest),
            None => ("http".to_string(), url),
        };

        let (authority, path) = match rest.split_once('/') {
            Some((authority, path)) => (authority, Some(path)),
            None => (rest, None),
        };

        if authority.is_empty() {
            return None;
        }

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => (host, Some(port.parse::<u16>().ok()?)),
            None => (authority, None),
        };

        let (path, query) = match path {
            Some(p) => match p.split_once('?') {
                Some((p, q)) => (p, q),
                None => (p, ""),
            },
            None => ("", ""),
        };

        let mut username: String = username.into();
        let mut password: String = password.into();
        let mut kept = Vec::new();

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let slot = match key {
                "username" => &mut username,
                "password" => &mut password,
                _ => {
                    kept.push(pair);
                    continue;
                }
            };
            if slot.is_empty() {
                *slot = urlencoding::decode(value)
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| value.to_string());
            }
        }

        let path = path.trim_matches('/');
        let api_path = match (path.is_empty(), kept.is_empty()) {
            (true, true) => None,
            (_, true) => Some(path.to_string()),
            (_, false) => Some(format!("{}?{}", path, kept.join("&"))),
        };

        Some(Self {
            protocol,
            host: host.to_string(),
            port,
            api_path,
            username,
            password,
        })
    }

    /// Scheme, host and optional port, without a trailing slash
    pub fn base_url(&self) -> String {
        let protocol = if self.protocol.is_empty() {
            "http"
        } else {
            self.protocol.as_str()
        };
        let host = self.host.trim_end_matches('/');
        match self.port {
            Some(port) => format!("{}://{}:{}", protocol, host, port),
            None => format!("{}://{}", protocol, host),
        }
    }

    /// Join a path onto the base URL
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url(), path.trim_start_matches('/'))
    }

    /// Direct stream URL for an Xtream live stream id
    pub fn live_stream_url(&self, stream_id: &str) -> String {
        format!(
            "{}/live/{}/{}/{}.ts",
            self.base_url(),
            self.username,
            self.password,
            stream_id
        )
    }
}

impl fmt::Display for ServerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Credentials stay out of logs
        match &self.api_path {
            Some(path) => write!(f, "{}/{}", self.base_url(), path),
            None => write!(f, "{}", self.base_url()),
        }
    }
}

/// Channel record produced by the tokenizer or the Xtream listing
///
/// Carries no identity yet; ids and the owning source are assigned when the
/// drafts are persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDraft {
    pub name: String,
    pub stream_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epg_id: Option<String>,
}

impl ChannelDraft {
    pub fn new(name: impl Into<String>, stream_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stream_url: stream_url.into(),
            logo_url: None,
            category: UNCATEGORIZED.to_string(),
            epg_id: None,
        }
    }
}

/// Persisted channel belonging to exactly one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: u64,
    pub source_id: String,
    pub name: String,
    pub stream_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epg_id: Option<String>,
}

impl Channel {
    /// Attach identity to a draft
    pub fn from_draft(id: u64, source_id: impl Into<String>, draft: ChannelDraft) -> Self {
        Self {
            id,
            source_id: source_id.into(),
            name: draft.name,
            stream_url: draft.stream_url,
            logo_url: draft.logo_url,
            category: draft.category,
            epg_id: draft.epg_id,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} [{}]", self.id, self.name, self.category)
    }
}

// =============================================================================
// Subtitle Models
// =============================================================================

/// Subtitle file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubFormat {
    Srt,
    #[serde(alias = "webvtt")]
    Vtt,
    Sub,
    Ass,
}

impl SubFormat {
    /// Parse format from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "srt" => SubFormat::Srt,
            "vtt" | "webvtt" => SubFormat::Vtt,
            "sub" => SubFormat::Sub,
            "ass" | "ssa" => SubFormat::Ass,
            _ => SubFormat::Srt,
        }
    }

    /// Derive format from a file name such as `Movie.2022.en.srt`
    pub fn from_file_name(name: &str) -> Self {
        name.rsplit_once('.')
            .map(|(_, ext)| Self::from_extension(ext))
            .unwrap_or(SubFormat::Srt)
    }

    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            SubFormat::Srt => "srt",
            SubFormat::Vtt => "vtt",
            SubFormat::Sub => "sub",
            SubFormat::Ass => "ass",
        }
    }
}

impl fmt::Display for SubFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubFormat::Srt => write!(f, "SRT"),
            SubFormat::Vtt => write!(f, "WebVTT"),
            SubFormat::Sub => write!(f, "SUB"),
            SubFormat::Ass => write!(f, "ASS"),
        }
    }
}

/// Default OpenSubtitles REST endpoint
pub const OPENSUBTITLES_API_URL: &str = "https://api.opensubtitles.com/api/v1";

fn default_opensubtitles_url() -> String {
    OPENSUBTITLES_API_URL.to_string()
}

/// Protocol-specific part of a subtitle provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenSubtitles REST API; searching without a key is a configuration error
    OpenSubtitles {
        #[serde(default = "default_opensubtitles_url")]
        api_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
    },
    /// Generic JSON API returning `[{id?, name, url, language?, format?}]`
    Custom {
        api_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
    },
    /// Subtitles already cached on this machine
    Local,
}

impl ProviderKind {
    pub fn label(&self) -> &'static str {
        match self {
            ProviderKind::OpenSubtitles { .. } => "opensubtitles",
            ProviderKind::Custom { .. } => "custom",
            ProviderKind::Local => "local",
        }
    }
}

/// Configured subtitle provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleProvider {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: ProviderKind,
    /// Languages in preference order; the provider is skipped for any other
    pub languages: Vec<String>,
    #[serde(default)]
    pub auto_load: bool,
}

impl SubtitleProvider {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: ProviderKind,
        languages: &[&str],
    ) -> Self {
        let mut langs: Vec<String> = Vec::with_capacity(languages.len());
        for lang in languages {
            let lang = lang.trim().to_string();
            if !lang.is_empty() && !langs.contains(&lang) {
                langs.push(lang);
            }
        }

        Self {
            id: id.into(),
            name: name.into(),
            kind,
            languages: langs,
            auto_load: false,
        }
    }

    /// Builder-style toggle for auto-loading
    pub fn with_auto_load(mut self, auto_load: bool) -> Self {
        self.auto_load = auto_load;
        self
    }

    /// Whether this provider participates in searches for `language`
    pub fn supports(&self, language: &str) -> bool {
        self.languages.iter().any(|l| l == language)
    }
}

impl fmt::Display for SubtitleProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let auto = if self.auto_load { " auto" } else { "" };
        write!(
            f,
            "{} ({}) [{}]{}",
            self.name,
            self.kind.label(),
            self.languages.join(","),
            auto
        )
    }
}

/// How a candidate's content is obtained
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum DownloadRef {
    /// OpenSubtitles file id, resolved to a link before fetching
    FileId(u64),
    /// Directly fetchable URL
    Url(String),
    /// File on the local filesystem
    Path(PathBuf),
}

impl fmt::Display for DownloadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadRef::FileId(id) => write!(f, "file:{}", id),
            DownloadRef::Url(url) => write!(f, "{}", url),
            DownloadRef::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Unsaved search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleCandidate {
    pub id: String,
    pub title: String,
    pub language: String,
    pub download: DownloadRef,
    pub format: SubFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<u64>,
    /// Id of the provider that produced this candidate
    pub provider_id: String,
}

impl fmt::Display for SubtitleCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let downloads = self
            .popularity
            .map(|d| format!(" - {}⬇", d))
            .unwrap_or_default();
        write!(
            f,
            "[{}] {} ({}){}",
            self.language, self.title, self.format, downloads
        )
    }
}

/// Downloaded and normalized subtitle, one per (channel, language)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSubtitle {
    pub channel_id: u64,
    pub language: String,
    pub content: String,
    pub format: SubFormat,
    pub saved_at: DateTime<Utc>,
}

impl SavedSubtitle {
    pub fn new(
        channel_id: u64,
        language: impl Into<String>,
        content: impl Into<String>,
        format: SubFormat,
    ) -> Self {
        Self {
            channel_id,
            language: language.into(),
            content: content.into(),
            format,
            saved_at: Utc::now(),
        }
    }
}

impl fmt::Display for SavedSubtitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "channel {} [{}] {} ({} bytes)",
            self.channel_id,
            self.language,
            self.format,
            self.content.len()
        )
    }
}

// =============================================================================
// Tests
// =============================================================================
