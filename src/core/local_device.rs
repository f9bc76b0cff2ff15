//! A `StorageDevice` backed by a local folder.
//!
//! Serves a directory on disk as if it were the device's storage root, for
//! hosts that keep a copy of the card locally and for tests.

use super::device::{DirectoryContent, StorageDevice};
use super::error::{CoreError, Result};
use super::path::{DirectoryPath, FilePath};
use super::FileRecord;
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use ignore::WalkBuilder;
use std::path::Path;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub struct LocalDevice {
    root: Utf8PathBuf,
}

impl LocalDevice {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Builds a device from a std path, rejecting roots that are not UTF-8.
    pub fn from_path(root: &Path) -> Result<Self> {
        let root = Utf8PathBuf::from_path_buf(root.to_path_buf()).map_err(|p| {
            CoreError::Device(format!("storage root is not UTF-8: {}", p.display()))
        })?;
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn local_path(&self, path: &str) -> Utf8PathBuf {
        local_path(&self.root, path)
    }

    fn ensure_root(&self) -> Result<()> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(CoreError::Device(format!(
                "storage root {} is not available",
                self.root
            )))
        }
    }
}

fn local_path(root: &Utf8Path, path: &str) -> Utf8PathBuf {
    root.join(path.trim_start_matches('/'))
}

fn io_error(err: std::io::Error, path: &Utf8Path) -> CoreError {
    CoreError::Io(err, path.as_std_path().to_path_buf())
}

/// Lists one directory on disk. Entries whose names cannot be expressed as
/// storage paths are skipped.
fn list_directory(root: &Utf8Path, dir: &DirectoryPath) -> Option<DirectoryContent> {
    let local = local_path(root, dir.as_str());
    if !local.is_dir() {
        return None;
    }

    let mut content = DirectoryContent::new(dir.clone());
    let walker = WalkBuilder::new(&local)
        .standard_filters(false)
        .max_depth(Some(1))
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!("Failed to read entry in {}: {}", local, err);
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            tracing::warn!("Skipping non UTF-8 entry in {}", local);
            continue;
        };
        let Some(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            match dir.join(name) {
                Ok(child) => content.directories.push(child),
                Err(err) => tracing::warn!("Skipping directory {:?}: {}", name, err),
            }
        } else if file_type.is_file() {
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            match dir.join_file(name) {
                Ok(path) => content.files.push(FileRecord::new(path, size)),
                Err(err) => tracing::warn!("Skipping file {:?}: {}", name, err),
            }
        }
    }

    Some(content)
}

/// Converts a directory found below `root` into its storage path.
fn storage_directory(root: &Utf8Path, local: &Path) -> Option<DirectoryPath> {
    let local = Utf8Path::from_path(local)?;
    let relative = local.strip_prefix(root).ok()?;
    let joined = relative
        .components()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join("/");
    DirectoryPath::new(joined).ok()
}

#[async_trait]
impl StorageDevice for LocalDevice {
    async fn fetch_directory(&self, path: &DirectoryPath) -> Result<Option<DirectoryContent>> {
        self.ensure_root()?;
        let root = self.root.clone();
        let path = path.clone();
        let content = tokio::task::spawn_blocking(move || list_directory(&root, &path)).await?;
        Ok(content)
    }

    async fn fetch_directory_recursive(
        &self,
        path: &DirectoryPath,
        sink: mpsc::Sender<DirectoryContent>,
    ) -> Result<()> {
        self.ensure_root()?;
        let root = self.root.clone();
        let start = self.local_path(path.as_str());

        tokio::task::spawn_blocking(move || {
            if !start.is_dir() {
                return;
            }
            let walker = WalkBuilder::new(&start)
                .standard_filters(false)
                .sort_by_file_name(|a, b| a.cmp(b))
                .build();

            for entry in walker.filter_map(|e| e.ok()) {
                if !entry.file_type().is_some_and(|t| t.is_dir()) {
                    continue;
                }
                let Some(dir) = storage_directory(&root, entry.path()) else {
                    tracing::warn!("Skipping unreadable directory {}", entry.path().display());
                    continue;
                };
                let Some(content) = list_directory(&root, &dir) else {
                    continue;
                };
                if sink.blocking_send(content).is_err() {
                    tracing::debug!("Listing receiver dropped, stopping walk");
                    return;
                }
            }
        })
        .await?;

        Ok(())
    }

    async fn copy_file(&self, source: &FilePath, target: &FilePath) -> Result<()> {
        self.ensure_root()?;
        let from = self.local_path(source.as_str());
        let to = self.local_path(target.as_str());

        if let Some(parent) = to.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(e, parent))?;
        }
        tokio::fs::copy(&from, &to)
            .await
            .map_err(|e| io_error(e, &from))?;
        Ok(())
    }

    /// Deleting a file that is already gone succeeds.
    async fn delete_file(&self, path: &FilePath) -> Result<()> {
        self.ensure_root()?;
        let local = self.local_path(path.as_str());
        match tokio::fs::remove_file(&local).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error(err, &local)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, LocalDevice) {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("games/arcade")).unwrap();
        fs::write(dir.path().join("games/b.crt"), b"bb").unwrap();
        fs::write(dir.path().join("games/a.crt"), b"a").unwrap();
        fs::write(dir.path().join("games/arcade/c.prg"), b"ccc").unwrap();
        let device = LocalDevice::from_path(dir.path()).unwrap();
        (dir, device)
    }

    #[tokio::test]
    async fn test_fetch_directory_lists_children_and_sizes() {
        let (_dir, device) = fixture();
        let content = device
            .fetch_directory(&DirectoryPath::new("/games").unwrap())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(content.directories, vec![DirectoryPath::new("/games/arcade").unwrap()]);
        let files: Vec<_> = content.files.iter().map(|f| (f.name.as_str(), f.size)).collect();
        assert_eq!(files, vec![("a.crt", 1), ("b.crt", 2)]);
    }

    #[tokio::test]
    async fn test_fetch_missing_directory_is_none() {
        let (_dir, device) = fixture();
        let content = device
            .fetch_directory(&DirectoryPath::new("/nope").unwrap())
            .await
            .unwrap();
        assert!(content.is_none());
    }

    #[tokio::test]
    async fn test_recursive_fetch_streams_every_directory() {
        let (_dir, device) = fixture();
        let (tx, mut rx) = mpsc::channel(4);
        device
            .fetch_directory_recursive(&DirectoryPath::root(), tx)
            .await
            .unwrap();

        let mut seen = Vec::new();
        while let Some(content) = rx.recv().await {
            seen.push(content.path.to_string());
        }
        assert_eq!(seen, vec!["/", "/games/", "/games/arcade/"]);
    }

    #[tokio::test]
    async fn test_copy_and_delete() {
        let (dir, device) = fixture();
        let source = FilePath::new("/games/a.crt").unwrap();
        let target = FilePath::new("/favorites/games/a.crt").unwrap();

        device.copy_file(&source, &target).await.unwrap();
        assert!(dir.path().join("favorites/games/a.crt").exists());

        device.delete_file(&target).await.unwrap();
        assert!(!dir.path().join("favorites/games/a.crt").exists());
        device.delete_file(&target).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_root_is_a_device_error() {
        let device = LocalDevice::new("/definitely/not/a/real/root");
        let result = device.fetch_directory(&DirectoryPath::root()).await;
        assert!(matches!(result, Err(CoreError::Device(_))));
    }
}
