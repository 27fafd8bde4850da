//! CLI - Command Line Interface for tvfeed
//!
//! Every operation is scriptable. All output is JSON-parseable.
//!
//! # Examples
//!
//! ```bash
//! # Load channels from a configured server
//! tvfeed channels home --save
//!
//! # Parse a raw playlist
//! tvfeed playlist http://example.com/list.m3u
//!
//! # Subtitles
//! tvfeed subtitles "evening news" -l en
//! tvfeed autoload "evening news" --channel 5
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

use tvfeed::subtitles::SearchScope;

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Network error
    NetworkError = 3,
    /// Nothing found
    NoResults = 4,
    /// Missing or invalid configuration
    ConfigError = 5,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// tvfeed - live-TV channel and subtitle aggregation
#[derive(Parser, Debug)]
#[command(
    name = "tvfeed",
    version,
    about = "Live-TV channel and subtitle aggregation",
    long_about = "Loads channel lists from Xtream Codes servers and M3U endpoints, \
                  and searches, downloads and saves subtitles from configured providers.",
    after_help = "EXAMPLES:\n\
                  tvfeed channels home --save           Load a configured server\n\
                  tvfeed playlist ./list.m3u            Parse a playlist file\n\
                  tvfeed subtitles \"news\" -l en         Search subtitles\n\
                  tvfeed autoload \"news\" --channel 5    Pick and save a subtitle"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load the channel list of a server
    #[command(visible_alias = "ch")]
    Channels(ChannelsCmd),

    /// Parse a playlist URL or file
    #[command(visible_alias = "pl")]
    Playlist(PlaylistCmd),

    /// Check whether a server answers
    Test(TestCmd),

    /// Search subtitles across providers
    #[command(visible_alias = "sub")]
    Subtitles(SubtitlesCmd),

    /// Pick, download and save a subtitle for a channel
    #[command(visible_alias = "auto")]
    Autoload(AutoloadCmd),

    /// List configured subtitle providers
    Providers,
}

/// Server selection shared by `channels` and `test`
#[derive(Args, Debug)]
pub struct ServerArgs {
    /// Configured server name, or a server URL
    #[arg(required = true)]
    pub server: String,

    /// Username (when SERVER is a URL)
    #[arg(long, short = 'u', default_value = "")]
    pub username: String,

    /// Password (when SERVER is a URL)
    #[arg(long, short = 'p', default_value = "")]
    pub password: String,
}

impl ServerArgs {
    /// Whether the argument is a URL rather than a configured name
    pub fn is_url(&self) -> bool {
        self.server.contains("://")
    }
}

/// Load channels from a server
#[derive(Args, Debug)]
pub struct ChannelsCmd {
    #[command(flatten)]
    pub target: ServerArgs,

    /// Persist the channels, replacing the server's previous list
    #[arg(long)]
    pub save: bool,

    /// Only show channels in this category
    #[arg(long, short = 'g')]
    pub category: Option<String>,

    /// Maximum number of channels to print
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,
}

/// Parse a playlist
#[derive(Args, Debug)]
pub struct PlaylistCmd {
    /// Playlist URL or local file path
    #[arg(required = true)]
    pub source: String,

    /// Persist under this source id
    #[arg(long)]
    pub save_as: Option<String>,
}

impl PlaylistCmd {
    pub fn is_url(&self) -> bool {
        self.source.starts_with("http://") || self.source.starts_with("https://")
    }
}

/// Test a server connection
#[derive(Args, Debug)]
pub struct TestCmd {
    #[command(flatten)]
    pub target: ServerArgs,
}

/// Search subtitles
#[derive(Args, Debug)]
pub struct SubtitlesCmd {
    /// Content name to search for
    #[arg(required = true)]
    pub query: String,

    /// Language code
    #[arg(long, short = 'l', default_value = "en")]
    pub lang: String,

    /// Maximum number of results
    #[arg(long, default_value = "20")]
    pub limit: usize,
}

/// Search scope for auto-loading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ScopeChoice {
    /// Every provider listing the language
    #[default]
    All,
    /// Only the provider being tried
    Current,
}

impl From<ScopeChoice> for SearchScope {
    fn from(choice: ScopeChoice) -> Self {
        match choice {
            ScopeChoice::All => SearchScope::AllProviders,
            ScopeChoice::Current => SearchScope::CurrentProvider,
        }
    }
}

/// Auto-load a subtitle
#[derive(Args, Debug)]
pub struct AutoloadCmd {
    /// Content name to search for
    #[arg(required = true)]
    pub query: String,

    /// Channel id to attach the subtitle to
    #[arg(long, short = 'C')]
    pub channel: u64,

    /// Which providers each attempt searches
    #[arg(long, value_enum, default_value = "all")]
    pub scope: ScopeChoice,
}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

/// Connection test response
#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub server: String,
    pub reachable: bool,
}

/// Provider failure entry in a search response
#[derive(Debug, Serialize, Deserialize)]
pub struct ProviderFailure {
    pub provider: String,
    pub error: String,
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data
    pub fn print<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
