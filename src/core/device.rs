//! The storage device as seen by the cache.

use super::ban_list::BanList;
use super::error::Result;
use super::path::{DirectoryPath, FilePath};
use super::{CacheEntry, FileRecord};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// One directory listing as returned by the device.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryContent {
    pub path: DirectoryPath,
    pub directories: Vec<DirectoryPath>,
    pub files: Vec<FileRecord>,
}

impl DirectoryContent {
    pub fn new(path: DirectoryPath) -> Self {
        Self {
            path,
            directories: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Drops banned children and files. Returns `None` if the listed
    /// directory is itself banned.
    pub fn without_banned(mut self, bans: &BanList) -> Option<Self> {
        if bans.is_banned_directory(&self.path) {
            return None;
        }
        self.directories.retain(|d| !bans.is_banned_directory(d));
        self.files.retain(|f| !bans.is_banned_file_name(&f.name));
        Some(self)
    }

    pub fn into_entry(self) -> CacheEntry {
        CacheEntry::with_contents(self.path, self.directories, self.files)
    }
}

/// Transport-agnostic access to the device's storage.
///
/// Implementations are expected to be slow; the cache exists so that callers
/// hit them as rarely as possible.
#[async_trait]
pub trait StorageDevice: Send + Sync {
    /// Lists one directory. `Ok(None)` means the directory does not exist.
    async fn fetch_directory(&self, path: &DirectoryPath) -> Result<Option<DirectoryContent>>;

    /// Streams `path` and every directory below it into `sink`.
    ///
    /// Implementations stop early once the receiving side is dropped.
    async fn fetch_directory_recursive(
        &self,
        path: &DirectoryPath,
        sink: mpsc::Sender<DirectoryContent>,
    ) -> Result<()>;

    async fn copy_file(&self, source: &FilePath, target: &FilePath) -> Result<()>;

    async fn delete_file(&self, path: &FilePath) -> Result<()>;
}
