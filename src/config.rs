//! Configuration management for tvfeed
//!
//! Holds the server list, subtitle providers and transport settings.
//! Config is stored at ~/.config/tvfeed/config.toml

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::{ServerDescriptor, SubtitleProvider};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Named channel source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedServer {
    pub name: String,
    #[serde(flatten)]
    pub server: ServerDescriptor,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Per-request timeout applied by the HTTP client
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// Log filter used when TVFEED_LOG / RUST_LOG are unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    /// Override for the data directory (channels, saved subtitles)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub servers: Vec<NamedServer>,
    #[serde(default)]
    pub providers: Vec<SubtitleProvider>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_level: None,
            data_dir: None,
            servers: Vec::new(),
            providers: Vec::new(),
        }
    }
}

impl Config {
    /// Get config file path (~/.config/tvfeed/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tvfeed").join("config.toml"))
    }

    /// Load config from the default path, or return default if not found
    pub fn load() -> Self {
        Self::path()
            .and_then(|p| Self::load_from(&p).ok())
            .unwrap_or_default()
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        let path = Self::path().ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;
        self.save_to(&path)
    }

    /// Save config to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Look up a server by name (case-insensitive)
    pub fn server(&self, name: &str) -> Option<&NamedServer> {
        self.servers
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Build the shared HTTP client with the configured timeout
    pub fn http_client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.request_timeout_secs))
            .build()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProviderKind;

    const SAMPLE: &str = r#"
request_timeout_secs = 10

[[servers]]
name = "Home"
protocol = "http"
host = "tv.example.com"
port = 8080
username = "alice"
password = "secret"

[[providers]]
id = "os"
name = "OpenSubtitles"
kind = "opensubtitles"
api_key = "abc"
languages = ["en", "ar"]
auto_load = true

[[providers]]
id = "cache"
name = "Cache"
kind = "local"
languages = ["en"]
"#;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.servers.is_empty());
        assert!(config.providers.is_empty());
    }

    #[test]
    fn test_parse_sample() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.request_timeout_secs, 10);

        let home = config.server("home").unwrap();
        assert_eq!(home.server.base_url(), "http://tv.example.com:8080");

        assert_eq!(config.providers.len(), 2);
        assert!(config.providers[0].auto_load);
        assert_eq!(config.providers[1].kind, ProviderKind::Local);
    }

    #[test]
    fn test_save_and_reload() {
        let path = std::env::temp_dir()
            .join(format!("tvfeed-config-{}", std::process::id()))
            .join("config.toml");
        let config: Config = toml::from_str(SAMPLE).unwrap();

        config.save_to(&path).unwrap();
        let reloaded = Config::load_from(&path).unwrap();

        assert_eq!(reloaded.servers, config.servers);
        assert_eq!(reloaded.providers, config.providers);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
