//! The cache-backed storage service.
//!
//! `CachedStorageService` answers directory, search and random-selection
//! requests from the cache and only reaches the device on a miss or for
//! explicit mutations. The cache lives behind one `RwLock`; every mutation is
//! a single write-locked critical section, and no guard is held across an
//! `.await`.

use super::cache::{CacheSnapshot, StorageCache};
use super::device::StorageDevice;
use super::error::{CoreError, Result};
use super::path::{DirectoryPath, FilePath};
use super::search::{SearchEngine, SearchQuery};
use super::selection::{pick_random, CandidateFilter, StorageScope};
use super::{CacheEntry, FileRecord};
use crate::config::StorageSettings;
use crate::utils::file_detection::{detect_file_type, FileType};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct IndexProgress {
    pub directories_indexed: usize,
    pub files_indexed: usize,
    pub current_path: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct IndexSummary {
    pub directories: usize,
    pub files: usize,
    pub skipped_directories: usize,
    pub favorites_linked: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct CopySummary {
    pub copied: Vec<FilePath>,
    pub failed: Vec<FilePath>,
}

pub struct CachedStorageService<D: StorageDevice> {
    device: Arc<D>,
    cache: Arc<RwLock<StorageCache>>,
    settings: Arc<RwLock<StorageSettings>>,
}

impl<D: StorageDevice> Clone for CachedStorageService<D> {
    fn clone(&self) -> Self {
        Self {
            device: Arc::clone(&self.device),
            cache: Arc::clone(&self.cache),
            settings: Arc::clone(&self.settings),
        }
    }
}

impl<D: StorageDevice> CachedStorageService<D> {
    pub fn new(device: D, settings: StorageSettings) -> Self {
        let mut cache = StorageCache::new(settings.ban_list(), settings.favorite_roots());
        cache.set_playlist_roots(vec![settings.playlist_path.clone()]);
        Self {
            device: Arc::new(device),
            cache: Arc::new(RwLock::new(cache)),
            settings: Arc::new(RwLock::new(settings)),
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn settings(&self) -> StorageSettings {
        self.settings.read().clone()
    }

    /// Returns the listing of `path`, fetching it from the device on a miss.
    ///
    /// Banned and nonexistent directories yield `None`.
    pub async fn get_directory(&self, path: &DirectoryPath) -> Result<Option<CacheEntry>> {
        let bans = {
            let cache = self.cache.read();
            if cache.ban_list().is_banned_directory(path) {
                tracing::debug!("Refusing banned directory {}", path);
                return Ok(None);
            }
            if let Some(entry) = cache.get_by_path(path) {
                return Ok(Some(entry.clone()));
            }
            cache.ban_list().clone()
        };

        tracing::debug!("Cache miss for {}, fetching from device", path);
        let Some(content) = self.device.fetch_directory(path).await? else {
            return Ok(None);
        };
        let Some(content) = content.without_banned(&bans) else {
            return Ok(None);
        };

        let mut cache = self.cache.write();
        cache.upsert_directory(path, content.into_entry());
        Ok(cache.get_by_path(path).cloned())
    }

    pub fn get_file(&self, path: &FilePath) -> Option<FileRecord> {
        self.cache.read().get_file_by_path(path).cloned()
    }

    /// Runs a ranked search over everything currently cached.
    pub fn search(&self, text: &str, file_types: &[FileType]) -> Vec<FileRecord> {
        let (query, weights, excluded) = {
            let settings = self.settings.read();
            (
                SearchQuery::parse(text, &settings.search_stop_words),
                settings.search_weights,
                settings.discovery_exclusions(),
            )
        };
        if query.is_empty() {
            tracing::debug!("Query {:?} has no searchable terms", text);
            return Vec::new();
        }

        let cache = self.cache.read();
        let filter = CandidateFilter::new(file_types, &excluded, cache.ban_list());
        SearchEngine::search(cache.files(), &query, &weights, &filter)
    }

    /// Picks a random cached file in scope. Never touches the device.
    pub fn get_random_file(
        &self,
        scope: StorageScope,
        scope_path: &DirectoryPath,
        file_types: &[FileType],
    ) -> Option<FileRecord> {
        let excluded = self.settings.read().discovery_exclusions();
        let cache = self.cache.read();
        let filter = CandidateFilter::new(file_types, &excluded, cache.ban_list());
        let pick = pick_random(
            cache.files(),
            scope,
            scope_path,
            &filter,
            &mut rand::thread_rng(),
        );
        if pick.is_none() {
            tracing::debug!("No cached candidates for {:?} in {}", scope, scope_path);
        }
        pick
    }

    /// Copies `file` into the favorites folder for its type and links the
    /// mirror with its source. Returns the mirror record.
    ///
    /// A mirror of another file with the same name is never overwritten; the
    /// new mirror gets the next free name instead.
    pub async fn save_favorite(&self, file: &FileRecord) -> Result<FileRecord> {
        if self.cache.read().is_favorite_path(&file.path) {
            return Ok(file.clone());
        }
        if let Some(mirror) = self.cached_mirror(&file.path) {
            return Ok(mirror);
        }

        let target_dir = self.settings.read().favorite_path(file.file_type)?;
        self.get_directory(&target_dir).await?;
        if let Some(mirror) = self.cached_mirror(&file.path) {
            return Ok(mirror);
        }
        let target = available_name(&self.cache.read(), &target_dir, &file.name)?;

        tracing::info!("Saving favorite {} to {}", file.path, target);
        self.device.copy_file(&file.path, &target).await?;

        let mut mirror = file.relocated(target.clone());
        mirror.favorite_parent_path = Some(file.path.clone());

        let mut cache = self.cache.write();
        if cache.get_file_by_path(&file.path).is_none() {
            cache.upsert_file(file.clone());
        }
        cache.upsert_file(mirror.clone());
        Ok(cache.get_file_by_path(&target).cloned().unwrap_or(mirror))
    }

    fn cached_mirror(&self, source: &FilePath) -> Option<FileRecord> {
        let cache = self.cache.read();
        let mirror = cache.get_file_by_path(source)?.favorite_child_path.as_ref()?;
        cache.get_file_by_path(mirror).cloned()
    }

    /// Deletes the favorite mirror of `path` (which may name either the mirror
    /// or its source) and clears the favorite flag on the source.
    pub async fn remove_favorite(&self, path: &FilePath) -> Result<()> {
        let (mirror, source) = {
            let cache = self.cache.read();
            let record = cache.get_file_by_path(path).cloned();
            if cache.is_favorite_path(path) {
                let source = record.and_then(|r| r.favorite_parent_path);
                (path.clone(), source)
            } else {
                let mirror = match record.as_ref().and_then(|r| r.favorite_child_path.clone()) {
                    Some(mirror) => mirror,
                    None => {
                        let file_type = record
                            .as_ref()
                            .map(|r| r.file_type)
                            .unwrap_or_else(|| detect_file_type(path.as_str()));
                        self.settings
                            .read()
                            .favorite_path(file_type)?
                            .join_file(path.name())?
                    }
                };
                (mirror, Some(path.clone()))
            }
        };

        tracing::info!("Removing favorite {}", mirror);
        self.device.delete_file(&mirror).await?;

        let mut cache = self.cache.write();
        cache.delete_file(&mirror);
        if let Some(source) = source {
            cache.clear_favorite(&source);
        }
        Ok(())
    }

    /// Flags a file as unable to run on the device. Returns the updated record.
    pub fn mark_incompatible(&self, path: &FilePath) -> Option<FileRecord> {
        let updated = self
            .cache
            .write()
            .update_file(path, |record| record.is_compatible = false);
        if updated.is_some() {
            tracing::info!("Marked {} as incompatible", path);
        }
        updated
    }

    /// Deletes a file on the device and drops it from the cache, unlinking its
    /// favorite counterpart.
    pub async fn delete_file(&self, path: &FilePath) -> Result<()> {
        self.device.delete_file(path).await?;

        let mut cache = self.cache.write();
        let Some(removed) = cache.delete_file(path) else {
            return Ok(());
        };
        if let Some(source) = &removed.favorite_parent_path {
            cache.clear_favorite(source);
        }
        if let Some(mirror) = &removed.favorite_child_path {
            cache.update_file(mirror, |record| record.favorite_parent_path = None);
        }
        tracing::info!("Deleted {}", path);
        Ok(())
    }

    /// Copies files into `target`, renaming on collision with a cached file.
    ///
    /// A failed copy is recorded and the rest continue. Copies into a favorites
    /// folder are linked to their sources.
    pub async fn copy_files(
        &self,
        files: &[FileRecord],
        target: &DirectoryPath,
    ) -> Result<CopySummary> {
        let mut summary = CopySummary::default();

        for file in files {
            let destination = available_name(&self.cache.read(), target, &file.name)?;

            if let Err(err) = self.device.copy_file(&file.path, &destination).await {
                tracing::warn!("Failed to copy {} to {}: {}", file.path, destination, err);
                summary.failed.push(file.path.clone());
                continue;
            }

            let mut copy = file.relocated(destination.clone());
            if self.cache.read().is_favorite_path(&destination) {
                copy.favorite_parent_path = Some(file.path.clone());
            }
            self.cache.write().upsert_file(copy);
            summary.copied.push(destination);
        }

        tracing::info!(
            "Copied {} files to {} ({} failed)",
            summary.copied.len(),
            target,
            summary.failed.len()
        );
        Ok(summary)
    }

    /// Stores records produced elsewhere, e.g. by metadata enrichment. Returns
    /// how many were accepted.
    pub fn upsert_files(&self, files: Vec<FileRecord>) -> usize {
        let mut cache = self.cache.write();
        files
            .into_iter()
            .map(|file| cache.upsert_file(file))
            .filter(|stored| *stored)
            .count()
    }

    /// Drops the whole cache, or only `path` and everything below it.
    /// Returns the number of directory entries removed.
    pub fn clear_cache(&self, path: Option<&DirectoryPath>) -> usize {
        let mut cache = self.cache.write();
        match path {
            Some(path) => cache.delete_directory_with_children(path),
            None => {
                let count = cache.directory_count();
                cache.clear();
                count
            }
        }
    }

    pub fn file_count(&self) -> usize {
        self.cache.read().file_count()
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        self.cache.read().snapshot()
    }

    pub fn restore(&self, snapshot: CacheSnapshot) {
        self.cache.write().restore(snapshot);
    }

    /// Applies new settings. The new ban list takes effect for subsequent
    /// inserts; already cached content stays until re-fetched or cleared.
    pub fn update_settings(&self, settings: StorageSettings) {
        {
            let mut cache = self.cache.write();
            cache.set_ban_list(settings.ban_list());
            cache.set_favorite_roots(settings.favorite_roots());
            cache.set_playlist_roots(vec![settings.playlist_path.clone()]);
            cache.ensure_favorites();
            cache.ensure_playlists();
        }
        *self.settings.write() = settings;
        tracing::info!("Storage settings updated");
    }

    /// Re-indexes `path` (the whole storage when `None`) from the device.
    ///
    /// The scope is cleared first, then listings stream in through a bounded
    /// channel and are stored one directory at a time. Cancellation is checked
    /// between directories; whatever was stored before a cancellation or a
    /// device failure stays cached.
    pub async fn cache_all<F>(
        &self,
        path: Option<&DirectoryPath>,
        cancel: Arc<AtomicBool>,
        progress: F,
    ) -> Result<IndexSummary>
    where
        F: Fn(IndexProgress) + Send + Sync,
    {
        if cancel.load(Ordering::Relaxed) {
            return Err(CoreError::Cancelled);
        }

        let root = path.cloned().unwrap_or_default();
        let capacity = self.settings.read().index_channel_capacity.max(1);
        let bans = {
            let mut cache = self.cache.write();
            if root.is_root() {
                cache.clear();
            } else {
                cache.delete_directory_with_children(&root);
            }
            cache.ban_list().clone()
        };
        tracing::info!("Indexing {} from device", root);

        let (tx, mut rx) = mpsc::channel(capacity);
        let producer = self.device.fetch_directory_recursive(&root, tx);
        let consumer = async move {
            let mut summary = IndexSummary::default();
            while let Some(content) = rx.recv().await {
                if cancel.load(Ordering::Relaxed) {
                    return Err(CoreError::Cancelled);
                }

                let Some(content) = content.without_banned(&bans) else {
                    summary.skipped_directories += 1;
                    continue;
                };
                let dir = content.path.clone();
                let file_count = content.files.len();

                if self.cache.write().upsert_directory(&dir, content.into_entry()) {
                    summary.directories += 1;
                    summary.files += file_count;
                }

                progress(IndexProgress {
                    directories_indexed: summary.directories,
                    files_indexed: summary.files,
                    current_path: dir.to_string(),
                });
                tokio::task::yield_now().await;
            }
            Ok(summary)
        };

        let (fetched, consumed) = tokio::join!(producer, consumer);
        let mut summary = match (fetched, consumed) {
            (_, Err(CoreError::Cancelled)) => {
                tracing::info!("Indexing of {} cancelled", root);
                return Err(CoreError::Cancelled);
            }
            (Err(err), _) => {
                tracing::warn!("Indexing of {} failed: {}", root, err);
                return Err(err);
            }
            (Ok(()), consumed) => consumed?,
        };

        summary.favorites_linked = {
            let mut cache = self.cache.write();
            cache.ensure_playlists();
            cache.ensure_favorites()
        };
        tracing::info!(
            "Indexed {} directories and {} files under {}",
            summary.directories,
            summary.files,
            root
        );
        Ok(summary)
    }
}

/// The first free file name for `name` in `dir`: `name`, then `stem_1.ext`,
/// `stem_2.ext` and so on.
fn available_name(cache: &StorageCache, dir: &DirectoryPath, name: &str) -> Result<FilePath> {
    let candidate = dir.join_file(name)?;
    if cache.get_file_by_path(&candidate).is_none() {
        return Ok(candidate);
    }

    let (stem, ext) = match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    };
    let mut n = 1;
    loop {
        let candidate = dir.join_file(&format!("{stem}_{n}{ext}"))?;
        if cache.get_file_by_path(&candidate).is_none() {
            return Ok(candidate);
        }
        n += 1;
    }
}
