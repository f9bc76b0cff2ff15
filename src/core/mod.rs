pub mod ban_list;
pub mod cache;
pub mod device;
pub mod error;
pub mod history;
pub mod local_device;
pub mod path;
pub mod search;
pub mod selection;
pub mod service;

use crate::utils::file_detection::{detect_file_type, FileType};
use path::{compare_names, DirectoryPath, FilePath};
use serde::{Deserialize, Serialize};

/// A file as mirrored from the device, plus the metadata used for search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: FilePath,
    pub name: String,
    pub size: u64,
    pub file_type: FileType,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default = "default_true")]
    pub is_compatible: bool,
    /// On a favorite mirror: the file it was copied from.
    #[serde(default)]
    pub favorite_parent_path: Option<FilePath>,
    /// On a favorited source: the mirror copy under the favorites root.
    #[serde(default)]
    pub favorite_child_path: Option<FilePath>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub release_info: String,
}

fn default_true() -> bool {
    true
}

impl FileRecord {
    /// A bare record as a directory listing reports it; the type is detected
    /// from the extension and all metadata is empty.
    pub fn new(path: FilePath, size: u64) -> Self {
        Self {
            name: path.name().to_string(),
            file_type: detect_file_type(path.as_str()),
            path,
            size,
            is_favorite: false,
            is_compatible: true,
            favorite_parent_path: None,
            favorite_child_path: None,
            title: String::new(),
            creator: String::new(),
            description: String::new(),
            tags: Vec::new(),
            release_info: String::new(),
        }
    }

    /// The other half of a favorite pair, if linked.
    pub fn counterpart(&self) -> Option<&FilePath> {
        self.favorite_parent_path
            .as_ref()
            .or(self.favorite_child_path.as_ref())
    }

    /// A copy of this record at a new location, with favorite state reset.
    pub fn relocated(&self, path: FilePath) -> FileRecord {
        FileRecord {
            name: path.name().to_string(),
            path,
            is_favorite: false,
            favorite_parent_path: None,
            favorite_child_path: None,
            ..self.clone()
        }
    }

    /// Takes over the searchable metadata of `source`. Fields the source
    /// leaves empty keep their current value.
    pub fn inherit_metadata(&mut self, source: &FileRecord) {
        for (field, value) in [
            (&mut self.title, &source.title),
            (&mut self.creator, &source.creator),
            (&mut self.description, &source.description),
            (&mut self.release_info, &source.release_info),
        ] {
            if !value.is_empty() {
                field.clone_from(value);
            }
        }
        if !source.tags.is_empty() {
            self.tags.clone_from(&source.tags);
        }
    }

    /// Two records describe the same content when name and size agree.
    pub fn same_content(&self, other: &FileRecord) -> bool {
        self.size == other.size && self.name.eq_ignore_ascii_case(&other.name)
    }
}

/// A child directory reference. Links are keys, never owned entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRef {
    pub name: String,
    pub path: DirectoryPath,
}

impl From<DirectoryPath> for DirectoryRef {
    fn from(path: DirectoryPath) -> Self {
        Self {
            name: path.name().to_string(),
            path,
        }
    }
}

/// The cached listing of one directory.
///
/// Subdirectories and files are both kept ordered by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub path: DirectoryPath,
    #[serde(default)]
    pub directories: Vec<DirectoryRef>,
    #[serde(default)]
    pub files: Vec<FileRecord>,
}

impl CacheEntry {
    pub fn new(path: DirectoryPath) -> Self {
        Self {
            path,
            directories: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn with_contents<D, F>(path: DirectoryPath, directories: D, files: F) -> Self
    where
        D: IntoIterator<Item = DirectoryPath>,
        F: IntoIterator<Item = FileRecord>,
    {
        let mut entry = Self::new(path);
        for dir in directories {
            entry.insert_subdirectory(DirectoryRef::from(dir));
        }
        for file in files {
            entry.upsert_file(file);
        }
        entry
    }

    pub fn has_subdirectory(&self, path: &DirectoryPath) -> bool {
        self.directories.iter().any(|d| &d.path == path)
    }

    /// Inserts a child reference in name order; duplicates are ignored.
    pub fn insert_subdirectory(&mut self, dir: DirectoryRef) {
        if self.has_subdirectory(&dir.path) {
            return;
        }
        let idx = self
            .directories
            .partition_point(|d| compare_names(&d.name, &dir.name).is_lt());
        self.directories.insert(idx, dir);
    }

    /// Inserts a file in name order, replacing a record with the same path.
    pub fn upsert_file(&mut self, file: FileRecord) {
        self.files.retain(|f| f.path != file.path);
        let idx = self
            .files
            .partition_point(|f| compare_names(&f.name, &file.name).is_lt());
        self.files.insert(idx, file);
    }

    pub fn remove_file(&mut self, path: &FilePath) -> Option<FileRecord> {
        let idx = self.files.iter().position(|f| &f.path == path)?;
        Some(self.files.remove(idx))
    }

    pub fn file(&self, path: &FilePath) -> Option<&FileRecord> {
        self.files.iter().find(|f| &f.path == path)
    }

    pub fn file_mut(&mut self, path: &FilePath) -> Option<&mut FileRecord> {
        self.files.iter_mut().find(|f| &f.path == path)
    }
}

pub use ban_list::BanList;
pub use cache::{CacheSnapshot, StorageCache};
pub use device::{DirectoryContent, StorageDevice};
pub use error::CoreError;
pub use history::{HistoryEntry, LaunchHistory};
pub use local_device::LocalDevice;
pub use search::{QueryClause, SearchEngine, SearchQuery, SearchWeights};
pub use selection::{pick_random, CandidateFilter, StorageScope};
pub use service::{CachedStorageService, CopySummary, IndexProgress, IndexSummary};

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str) -> FileRecord {
        FileRecord::new(FilePath::new(path).unwrap(), 10)
    }

    #[test]
    fn test_entry_keeps_files_ordered_by_name() {
        let mut entry = CacheEntry::new(DirectoryPath::new("/games").unwrap());
        entry.upsert_file(record("/games/b.crt"));
        entry.upsert_file(record("/games/A.crt"));
        entry.upsert_file(record("/games/c.crt"));

        let names: Vec<_> = entry.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["A.crt", "b.crt", "c.crt"]);
    }

    #[test]
    fn test_entry_upsert_replaces_same_path() {
        let mut entry = CacheEntry::new(DirectoryPath::new("/games").unwrap());
        entry.upsert_file(record("/games/a.crt"));
        let mut updated = record("/games/A.CRT");
        updated.title = "Updated".to_string();
        entry.upsert_file(updated);

        assert_eq!(entry.files.len(), 1);
        assert_eq!(entry.files[0].title, "Updated");
    }

    #[test]
    fn test_subdirectories_are_deduplicated_and_ordered() {
        let root = DirectoryPath::root();
        let entry = CacheEntry::with_contents(
            root,
            [
                DirectoryPath::new("/music").unwrap(),
                DirectoryPath::new("/games").unwrap(),
                DirectoryPath::new("/Music").unwrap(),
            ],
            Vec::new(),
        );
        let names: Vec<_> = entry.directories.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["games", "music"]);
    }

    #[test]
    fn test_inherit_metadata_keeps_fields_the_source_lacks() {
        let mut source = record("/games/commando.crt");
        source.title = "Commando".to_string();
        source.creator = "Rob Hubbard".to_string();
        source.tags = vec!["shooter".to_string()];

        let mut mirror = record("/favorites/games/commando.crt");
        mirror.description = "Run and gun".to_string();
        mirror.inherit_metadata(&source);

        assert_eq!(mirror.title, "Commando");
        assert_eq!(mirror.creator, "Rob Hubbard");
        assert_eq!(mirror.description, "Run and gun");
        assert_eq!(mirror.tags, vec!["shooter".to_string()]);
    }

    #[test]
    fn test_relocated_record_resets_favorite_links() {
        let mut source = record("/games/a.crt");
        source.is_favorite = true;
        source.favorite_child_path = Some(FilePath::new("/favorites/games/a.crt").unwrap());
        source.title = "Alpha".to_string();

        let copy = source.relocated(FilePath::new("/backup/a.crt").unwrap());
        assert_eq!(copy.name, "a.crt");
        assert_eq!(copy.title, "Alpha");
        assert!(!copy.is_favorite);
        assert!(copy.counterpart().is_none());
        assert!(copy.same_content(&source));
    }
}
