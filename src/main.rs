//! tvfeed - live-TV channel and subtitle aggregation
//!
//! # Usage
//!
//! ```bash
//! tvfeed channels home --save
//! tvfeed test http://tv.example.com:8080 -u alice -p secret
//! tvfeed subtitles "evening news" -l en --json
//! tvfeed autoload "evening news" --channel 5
//! ```

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Cli, Command, ExitCode, Output};
use crate::commands::Context;
use tvfeed::Config;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let output = Output::new(&cli);

    let config = match &cli.config {
        Some(path) => match Config::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                return output
                    .error(
                        format!("Failed to read config {}: {}", path.display(), e),
                        ExitCode::ConfigError,
                    )
                    .into();
            }
        },
        None => Config::load(),
    };

    init_logging(&config, cli.quiet);

    run_cli(cli, config, &output).await.into()
}

/// Install the tracing subscriber
///
/// TVFEED_LOG wins over RUST_LOG, which wins over the config file's level.
/// Logs go to stderr so stdout stays parseable.
fn init_logging(config: &Config, quiet: bool) {
    let fallback = config
        .log_level
        .clone()
        .unwrap_or_else(|| if quiet { "error" } else { "warn" }.to_string());

    let filter = EnvFilter::try_from_env("TVFEED_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(format!("tvfeed={}", fallback)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli, config: Config, output: &Output) -> ExitCode {
    let ctx = Context::new(config);

    match cli.command {
        Command::Channels(cmd) => commands::channels_cmd(cmd, &ctx, output).await,

        Command::Playlist(cmd) => commands::playlist_cmd(cmd, &ctx, output).await,

        Command::Test(cmd) => commands::test_cmd(cmd, &ctx, output).await,

        Command::Subtitles(cmd) => commands::subtitles_cmd(cmd, &ctx, output).await,

        Command::Autoload(cmd) => commands::autoload_cmd(cmd, &ctx, output).await,

        Command::Providers => commands::providers_cmd(&ctx, output),
    }
}
