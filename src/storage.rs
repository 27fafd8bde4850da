//! Storage interface consumed by the loader's callers and the subtitle pipeline
//!
//! Components receive a `&dyn Storage` explicitly; nothing reaches for global
//! state. Two implementations ship with the crate:
//! - [`MemoryStorage`]: in-process maps, used by tests and one-shot commands
//! - [`FileStorage`]: JSON files under a data directory, used by the CLI

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

use crate::error::{FeedError, FeedResult};
use crate::models::{
    Channel, ChannelDraft, DownloadRef, SavedSubtitle, SubFormat, SubtitleCandidate,
    SubtitleProvider,
};

/// Provider id attached to candidates discovered on disk
pub const LOCAL_PROVIDER_ID: &str = "local";

/// Key-value store used by the core
pub trait Storage: Send + Sync {
    /// Configured subtitle providers, in configured order
    fn subtitle_providers(&self) -> FeedResult<Vec<SubtitleProvider>>;

    /// Saved subtitle for a channel and language, if any
    fn channel_subtitle(&self, channel_id: u64, language: &str)
        -> FeedResult<Option<SavedSubtitle>>;

    /// Save a subtitle, replacing any entry for the same channel and language
    fn save_channel_subtitle(&self, subtitle: &SavedSubtitle) -> FeedResult<()>;

    /// Subtitles cached on this machine
    fn local_subtitles(&self) -> FeedResult<Vec<SubtitleCandidate>>;

    /// Replace every channel of `source_id` with `drafts`, assigning fresh ids
    fn replace_channels(&self, source_id: &str, drafts: Vec<ChannelDraft>)
        -> FeedResult<Vec<Channel>>;

    /// Channels belonging to a source
    fn channels(&self, source_id: &str) -> FeedResult<Vec<Channel>>;

    /// Delete a source's channels, returning how many were removed
    fn delete_source(&self, source_id: &str) -> FeedResult<usize>;
}

fn poisoned<T>(_: T) -> FeedError {
    FeedError::Storage("storage lock poisoned".to_string())
}

/// Channel table shared by both implementations
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct ChannelTable {
    next_id: u64,
    channels: Vec<Channel>,
}

impl ChannelTable {
    fn replace(&mut self, source_id: &str, drafts: Vec<ChannelDraft>) -> Vec<Channel> {
        self.channels.retain(|c| c.source_id != source_id);

        let mut inserted = Vec::with_capacity(drafts.len());
        for draft in drafts {
            self.next_id += 1;
            inserted.push(Channel::from_draft(self.next_id, source_id, draft));
        }

        self.channels.extend(inserted.iter().cloned());
        inserted
    }

    fn of_source(&self, source_id: &str) -> Vec<Channel> {
        self.channels
            .iter()
            .filter(|c| c.source_id == source_id)
            .cloned()
            .collect()
    }

    fn delete(&mut self, source_id: &str) -> usize {
        let before = self.channels.len();
        self.channels.retain(|c| c.source_id != source_id);
        before - self.channels.len()
    }
}

// =============================================================================
// In-memory storage
// =============================================================================

#[derive(Debug, Default)]
struct MemoryInner {
    providers: Vec<SubtitleProvider>,
    subtitles: HashMap<(u64, String), SavedSubtitle>,
    local: Vec<SubtitleCandidate>,
    channels: ChannelTable,
}

/// In-memory storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: RwLock<MemoryInner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage seeded with a provider list
    pub fn with_providers(providers: Vec<SubtitleProvider>) -> Self {
        let storage = Self::default();
        if let Ok(mut inner) = storage.inner.write() {
            inner.providers = providers;
        }
        storage
    }

    /// Register locally cached subtitles
    pub fn add_local_subtitle(&self, candidate: SubtitleCandidate) -> FeedResult<()> {
        self.inner.write().map_err(poisoned)?.local.push(candidate);
        Ok(())
    }

    /// Number of saved subtitles
    pub fn saved_count(&self) -> usize {
        self.inner.read().map(|i| i.subtitles.len()).unwrap_or(0)
    }
}

impl Storage for MemoryStorage {
    fn subtitle_providers(&self) -> FeedResult<Vec<SubtitleProvider>> {
        Ok(self.inner.read().map_err(poisoned)?.providers.clone())
    }

    fn channel_subtitle(
        &self,
        channel_id: u64,
        language: &str,
    ) -> FeedResult<Option<SavedSubtitle>> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner
            .subtitles
            .get(&(channel_id, language.to_string()))
            .cloned())
    }

    fn save_channel_subtitle(&self, subtitle: &SavedSubtitle) -> FeedResult<()> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        inner.subtitles.insert(
            (subtitle.channel_id, subtitle.language.clone()),
            subtitle.clone(),
        );
        Ok(())
    }

    fn local_subtitles(&self) -> FeedResult<Vec<SubtitleCandidate>> {
        Ok(self.inner.read().map_err(poisoned)?.local.clone())
    }

    fn replace_channels(
        &self,
        source_id: &str,
        drafts: Vec<ChannelDraft>,
    ) -> FeedResult<Vec<Channel>> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        Ok(inner.channels.replace(source_id, drafts))
    }

    fn channels(&self, source_id: &str) -> FeedResult<Vec<Channel>> {
        Ok(self.inner.read().map_err(poisoned)?.channels.of_source(source_id))
    }

    fn delete_source(&self, source_id: &str) -> FeedResult<usize> {
        Ok(self.inner.write().map_err(poisoned)?.channels.delete(source_id))
    }
}

// =============================================================================
// File-backed storage
// =============================================================================

/// JSON-file storage rooted at a data directory
///
/// ```text
/// <root>/channels.json
/// <root>/subtitles/<channel>_<lang>.json
/// <root>/local/<title>.<lang>.<ext>
/// ```
pub struct FileStorage {
    root: PathBuf,
    providers: Vec<SubtitleProvider>,
    channels: RwLock<()>,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>, providers: Vec<SubtitleProvider>) -> Self {
        Self {
            root: root.into(),
            providers,
            channels: RwLock::new(()),
        }
    }

    /// Default data directory (~/.local/share/tvfeed)
    pub fn default_root() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("tvfeed")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory scanned for cached subtitle files
    pub fn local_dir(&self) -> PathBuf {
        self.root.join("local")
    }

    fn subtitle_path(&self, channel_id: u64, language: &str) -> PathBuf {
        // Percent-encoding keeps separators out of the file name
        self.root.join("subtitles").join(format!(
            "{}_{}.json",
            channel_id,
            urlencoding::encode(language)
        ))
    }

    fn channels_path(&self) -> PathBuf {
        self.root.join("channels.json")
    }

    fn read_table(&self) -> FeedResult<ChannelTable> {
        match fs::read_to_string(self.channels_path()) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ChannelTable::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_table(&self, table: &ChannelTable) -> FeedResult<()> {
        write_json(&self.channels_path(), table)
    }
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> FeedResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| FeedError::Storage(format!("serialize failed: {}", e)))?;
    fs::write(path, json)?;
    Ok(())
}

/// Split `<title>.<lang>.<ext>` into a local candidate
fn local_candidate(path: &Path) -> Option<SubtitleCandidate> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    if !matches!(ext.as_str(), "srt" | "vtt" | "ass" | "ssa" | "sub") {
        return None;
    }

    let stem = path.file_stem()?.to_str()?;
    let (title, language) = stem.rsplit_once('.')?;
    if title.is_empty() || language.is_empty() {
        return None;
    }

    Some(SubtitleCandidate {
        id: path.file_name()?.to_string_lossy().into_owned(),
        title: title.replace('.', " "),
        language: language.to_string(),
        download: DownloadRef::Path(path.to_path_buf()),
        format: SubFormat::from_extension(&ext),
        popularity: None,
        provider_id: LOCAL_PROVIDER_ID.to_string(),
    })
}

impl Storage for FileStorage {
    fn subtitle_providers(&self) -> FeedResult<Vec<SubtitleProvider>> {
        Ok(self.providers.clone())
    }

    fn channel_subtitle(
        &self,
        channel_id: u64,
        language: &str,
    ) -> FeedResult<Option<SavedSubtitle>> {
        match fs::read_to_string(self.subtitle_path(channel_id, language)) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save_channel_subtitle(&self, subtitle: &SavedSubtitle) -> FeedResult<()> {
        let path = self.subtitle_path(subtitle.channel_id, &subtitle.language);
        debug!("Saving subtitle to {}", path.display());
        write_json(&path, subtitle)
    }

    fn local_subtitles(&self) -> FeedResult<Vec<SubtitleCandidate>> {
        let entries = match fs::read_dir(self.local_dir()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect();
        paths.sort();

        Ok(paths.iter().filter_map(|p| local_candidate(p)).collect())
    }

    fn replace_channels(
        &self,
        source_id: &str,
        drafts: Vec<ChannelDraft>,
    ) -> FeedResult<Vec<Channel>> {
        let _guard = self.channels.write().map_err(poisoned)?;
        let mut table = self.read_table()?;
        let inserted = table.replace(source_id, drafts);
        self.write_table(&table)?;
        Ok(inserted)
    }

    fn channels(&self, source_id: &str) -> FeedResult<Vec<Channel>> {
        let _guard = self.channels.read().map_err(poisoned)?;
        Ok(self.read_table()?.of_source(source_id))
    }

    fn delete_source(&self, source_id: &str) -> FeedResult<usize> {
        let _guard = self.channels.write().map_err(poisoned)?;
        let mut table = self.read_table()?;
        let removed = table.delete(source_id);
        self.write_table(&table)?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "tvfeed-storage-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_replace_channels_is_full_replace() {
        let storage = MemoryStorage::new();
        storage
            .replace_channels("a", vec![ChannelDraft::new("1", "http://1"), ChannelDraft::new("2", "http://2")])
            .unwrap();
        storage
            .replace_channels("b", vec![ChannelDraft::new("x", "http://x")])
            .unwrap();

        let reloaded = storage
            .replace_channels("a", vec![ChannelDraft::new("3", "http://3")])
            .unwrap();

        assert_eq!(storage.channels("a").unwrap().len(), 1);
        assert_eq!(storage.channels("b").unwrap().len(), 1);
        // ids stay unique across the whole channel set
        assert_eq!(reloaded[0].id, 4);
    }

    #[test]
    fn test_delete_source() {
        let storage = MemoryStorage::new();
        storage
            .replace_channels("a", vec![ChannelDraft::new("1", "http://1")])
            .unwrap();
        assert_eq!(storage.delete_source("a").unwrap(), 1);
        assert!(storage.channels("a").unwrap().is_empty());
    }

    #[test]
    fn test_save_overwrites_same_key() {
        let storage = MemoryStorage::new();
        storage
            .save_channel_subtitle(&SavedSubtitle::new(5, "en", "old", SubFormat::Vtt))
            .unwrap();
        storage
            .save_channel_subtitle(&SavedSubtitle::new(5, "en", "new", SubFormat::Vtt))
            .unwrap();
        storage
            .save_channel_subtitle(&SavedSubtitle::new(5, "fr", "fr", SubFormat::Vtt))
            .unwrap();

        assert_eq!(storage.saved_count(), 2);
        assert_eq!(storage.channel_subtitle(5, "en").unwrap().unwrap().content, "new");
        assert!(storage.channel_subtitle(6, "en").unwrap().is_none());
    }

    #[test]
    fn test_local_candidate_naming() {
        let candidate = local_candidate(Path::new("/subs/Some.Show.en.srt")).unwrap();
        assert_eq!(candidate.title, "Some Show");
        assert_eq!(candidate.language, "en");
        assert_eq!(candidate.format, SubFormat::Srt);
        assert_eq!(candidate.provider_id, LOCAL_PROVIDER_ID);

        assert!(local_candidate(Path::new("/subs/nolang.srt")).is_none());
        assert!(local_candidate(Path::new("/subs/movie.en.txt")).is_none());
    }

    #[test]
    fn test_file_storage_round_trip() {
        let root = temp_root("roundtrip");
        let storage = FileStorage::new(&root, Vec::new());

        assert!(storage.channel_subtitle(1, "en").unwrap().is_none());
        storage
            .save_channel_subtitle(&SavedSubtitle::new(1, "en", "WEBVTT\n\n", SubFormat::Vtt))
            .unwrap();
        let saved = storage.channel_subtitle(1, "en").unwrap().unwrap();
        assert_eq!(saved.content, "WEBVTT\n\n");

        let inserted = storage
            .replace_channels("srv", vec![ChannelDraft::new("BBC", "http://bbc")])
            .unwrap();
        assert_eq!(inserted[0].id, 1);
        assert_eq!(storage.channels("srv").unwrap(), inserted);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_subtitle_path_keeps_languages_apart() {
        let storage = FileStorage::new("/data", Vec::new());
        let plain = storage.subtitle_path(3, "pt-BR");
        let odd = storage.subtitle_path(3, "../pt");

        assert!(plain.ends_with("subtitles/3_pt-BR.json"));
        assert_eq!(odd.parent(), plain.parent());
        assert_ne!(odd, plain);
    }

    #[test]
    fn test_file_storage_local_scan() {
        let root = temp_root("local");
        let storage = FileStorage::new(&root, Vec::new());
        assert!(storage.local_subtitles().unwrap().is_empty());

        fs::create_dir_all(storage.local_dir()).unwrap();
        fs::write(storage.local_dir().join("News.ar.srt"), "1\n").unwrap();
        fs::write(storage.local_dir().join("readme.txt"), "x").unwrap();

        let local = storage.local_subtitles().unwrap();
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].language, "ar");

        let _ = fs::remove_dir_all(&root);
    }
}
