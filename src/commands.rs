//! CLI command implementations
//!
//! Each command runs one library operation and maps its outcome to output and
//! an exit code.

use tvfeed::error::FeedError;
use tvfeed::storage::{FileStorage, Storage};
use tvfeed::subtitles::{AutoLoadOptions, AutoLoader, SubtitleSearch};
use tvfeed::{ChannelDraft, ChannelLoader, Config, ServerDescriptor};

use crate::cli::{
    AutoloadCmd, ChannelsCmd, ConnectionStatus, ExitCode, Output, PlaylistCmd, ProviderFailure,
    ServerArgs, SubtitlesCmd, TestCmd,
};

/// Everything a command needs from the environment
pub struct Context {
    pub config: Config,
    pub storage: FileStorage,
}

impl Context {
    pub fn new(config: Config) -> Self {
        let root = config
            .data_dir
            .clone()
            .unwrap_or_else(FileStorage::default_root);
        let storage = FileStorage::new(root, config.providers.clone());
        Self { config, storage }
    }

    fn loader(&self) -> ChannelLoader {
        ChannelLoader::with_client(self.config.http_client())
    }
}

fn exit_code_for(err: &FeedError) -> ExitCode {
    match err {
        FeedError::Configuration(_) => ExitCode::ConfigError,
        FeedError::Storage(_) | FeedError::Io(_) => ExitCode::Error,
        e if e.is_transport() => ExitCode::NetworkError,
        FeedError::FallbackExhausted { .. } => ExitCode::NetworkError,
        // The server answered, just not with anything usable
        _ => ExitCode::NoResults,
    }
}

/// Resolve a server argument into (source id, descriptor)
fn resolve_server(
    target: &ServerArgs,
    config: &Config,
) -> Result<(String, ServerDescriptor), (String, ExitCode)> {
    if target.is_url() {
        let server = ServerDescriptor::parse(&target.server, &target.username, &target.password)
            .ok_or_else(|| {
                (
                    format!("Invalid server URL: {}", target.server),
                    ExitCode::InvalidArgs,
                )
            })?;
        return Ok((server.base_url(), server));
    }

    config
        .server(&target.server)
        .map(|named| (named.name.clone(), named.server.clone()))
        .ok_or_else(|| {
            (
                format!("No server named '{}' in config", target.server),
                ExitCode::ConfigError,
            )
        })
}

fn print_channels(
    drafts: Vec<ChannelDraft>,
    save_as: Option<&str>,
    category: Option<&str>,
    limit: Option<usize>,
    ctx: &Context,
    output: &Output,
) -> ExitCode {
    // A reload replaces the source even when it came back empty
    if let Some(source_id) = save_as {
        return match ctx.storage.replace_channels(source_id, drafts) {
            Ok(saved) if saved.is_empty() => {
                output.info(format!("Cleared channels for {}", source_id));
                output.error("No channels found", ExitCode::NoResults)
            }
            Ok(saved) => {
                output.info(format!("Saved {} channels for {}", saved.len(), source_id));
                let shown: Vec<_> = saved
                    .into_iter()
                    .filter(|c| category.map_or(true, |g| c.category.eq_ignore_ascii_case(g)))
                    .take(limit.unwrap_or(usize::MAX))
                    .collect();
                match output.print(&shown) {
                    Ok(()) => ExitCode::Success,
                    Err(e) => output.error(format!("Failed to serialize: {}", e), ExitCode::Error),
                }
            }
            Err(e) => output.error(format!("Failed to save channels: {}", e), exit_code_for(&e)),
        };
    }

    if drafts.is_empty() {
        return output.error("No channels found", ExitCode::NoResults);
    }

    let shown: Vec<_> = drafts
        .into_iter()
        .filter(|c| category.map_or(true, |g| c.category.eq_ignore_ascii_case(g)))
        .take(limit.unwrap_or(usize::MAX))
        .collect();

    match output.print(&shown) {
        Ok(()) => ExitCode::Success,
        Err(e) => output.error(format!("Failed to serialize: {}", e), ExitCode::Error),
    }
}

// =============================================================================
// Channels Command
// =============================================================================

pub async fn channels_cmd(cmd: ChannelsCmd, ctx: &Context, output: &Output) -> ExitCode {
    let (source_id, server) = match resolve_server(&cmd.target, &ctx.config) {
        Ok(resolved) => resolved,
        Err((msg, code)) => return output.error(msg, code),
    };

    output.info(format!("Loading channels from {}", server));

    match ctx.loader().load(&server).await {
        Ok(drafts) => print_channels(
            drafts,
            cmd.save.then_some(source_id.as_str()),
            cmd.category.as_deref(),
            cmd.limit,
            ctx,
            output,
        ),
        Err(e) => output.error(format!("Channel loading failed: {}", e), exit_code_for(&e)),
    }
}

// =============================================================================
// Playlist Command
// =============================================================================

pub async fn playlist_cmd(cmd: PlaylistCmd, ctx: &Context, output: &Output) -> ExitCode {
    let loader = ctx.loader();

    let result = if cmd.is_url() {
        loader.load_playlist_url(&cmd.source).await
    } else {
        loader.load_playlist_file(std::path::Path::new(&cmd.source)).await
    };

    match result {
        Ok(drafts) => print_channels(drafts, cmd.save_as.as_deref(), None, None, ctx, output),
        Err(e) => output.error(format!("Playlist loading failed: {}", e), exit_code_for(&e)),
    }
}

// =============================================================================
// Test Command
// =============================================================================

pub async fn test_cmd(cmd: TestCmd, ctx: &Context, output: &Output) -> ExitCode {
    let (_, server) = match resolve_server(&cmd.target, &ctx.config) {
        Ok(resolved) => resolved,
        Err((msg, code)) => return output.error(msg, code),
    };

    let reachable = ctx.loader().test_connection(&server).await;
    let status = ConnectionStatus {
        server: server.to_string(),
        reachable,
    };

    if let Err(e) = output.print(&status) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }

    if reachable {
        ExitCode::Success
    } else {
        ExitCode::NetworkError
    }
}

// =============================================================================
// Subtitles Command
// =============================================================================

pub async fn subtitles_cmd(cmd: SubtitlesCmd, ctx: &Context, output: &Output) -> ExitCode {
    output.info(format!("Searching subtitles for: {} ({})", cmd.query, cmd.lang));

    let search = SubtitleSearch::with_client(ctx.config.http_client());
    let report = match search.search(&ctx.storage, &cmd.query, &cmd.lang).await {
        Ok(report) => report,
        Err(e) => {
            return output.error(format!("Subtitle search failed: {}", e), exit_code_for(&e))
        }
    };

    let failures: Vec<ProviderFailure> = report
        .failures()
        .into_iter()
        .map(|(provider, err)| ProviderFailure {
            provider: provider.to_string(),
            error: err.to_string(),
        })
        .collect();
    for failure in &failures {
        output.info(format!("Provider {} failed: {}", failure.provider, failure.error));
    }

    let mut candidates = report.into_candidates();
    if candidates.is_empty() {
        return output.error("No subtitles found", ExitCode::NoResults);
    }
    candidates.truncate(cmd.limit);

    if let Err(e) = output.print(&candidates) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

// =============================================================================
// Autoload Command
// =============================================================================

pub async fn autoload_cmd(cmd: AutoloadCmd, ctx: &Context, output: &Output) -> ExitCode {
    let loader = AutoLoader::with_client(ctx.config.http_client()).with_options(AutoLoadOptions {
        scope: cmd.scope.into(),
    });

    match loader.auto_load(&ctx.storage, &cmd.query, cmd.channel).await {
        Ok(Some(saved)) => {
            output.info(format!("Loaded {}", saved));
            match output.print(&saved) {
                Ok(()) => ExitCode::Success,
                Err(e) => output.error(format!("Failed to serialize: {}", e), ExitCode::Error),
            }
        }
        Ok(None) => output.error("No subtitle found", ExitCode::NoResults),
        Err(e) => output.error(format!("Auto-load failed: {}", e), exit_code_for(&e)),
    }
}

// =============================================================================
// Providers Command
// =============================================================================

pub fn providers_cmd(ctx: &Context, output: &Output) -> ExitCode {
    let providers = match ctx.storage.subtitle_providers() {
        Ok(providers) => providers,
        Err(e) => return output.error(e.to_string(), exit_code_for(&e)),
    };

    if providers.is_empty() {
        return output.error("No subtitle providers configured", ExitCode::ConfigError);
    }

    for provider in &providers {
        output.info(provider);
    }

    match output.print(&providers) {
        Ok(()) => ExitCode::Success,
        Err(e) => output.error(format!("Failed to serialize: {}", e), ExitCode::Error),
    }
}
