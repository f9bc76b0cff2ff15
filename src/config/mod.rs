pub mod settings;

use crate::core::error::Result as CoreResult;
use crate::core::path::DirectoryPath;
use crate::core::search::SearchWeights;
use crate::core::{BanList, LaunchHistory};
use crate::utils::file_detection::FileType;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// User-tunable settings that shape what the cache stores and how it searches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageSettings {
    /// Root under which favorite mirrors are kept, one subfolder per kind.
    pub favorites_root: DirectoryPath,
    /// Where favorited firmware (`.hex`) files are mirrored.
    pub firmware_path: DirectoryPath,
    pub playlist_path: DirectoryPath,
    pub banned_directories: Vec<String>,
    pub banned_files: Vec<String>,
    pub search_weights: SearchWeights,
    pub search_stop_words: Vec<String>,
    pub history_capacity: Option<usize>,
    /// Listings buffered between the device walk and the cache during bulk
    /// indexing.
    pub index_channel_capacity: usize,
}

impl StorageSettings {
    pub fn load() -> Result<Self> {
        settings::load_config(None)
    }

    /// The mirror directory a favorite of `file_type` is copied into.
    pub fn favorite_path(&self, file_type: FileType) -> CoreResult<DirectoryPath> {
        let folder = match file_type {
            FileType::Hex => return Ok(self.firmware_path.clone()),
            FileType::Sid => "music",
            FileType::Prg | FileType::P00 | FileType::Crt | FileType::D64 => "games",
            FileType::Kla | FileType::Koa | FileType::Art | FileType::Aas | FileType::Hpi => {
                "images"
            }
            FileType::Seq | FileType::Txt | FileType::Nfo => "text",
            FileType::Unknown => "unknown",
        };
        self.favorites_root.join(folder)
    }

    /// Directories whose files are favorite mirrors.
    pub fn favorite_roots(&self) -> Vec<DirectoryPath> {
        vec![self.favorites_root.clone(), self.firmware_path.clone()]
    }

    /// Directories hidden from search and random selection: the favorite
    /// mirrors and playlists would otherwise show up twice.
    pub fn discovery_exclusions(&self) -> Vec<DirectoryPath> {
        let mut roots = self.favorite_roots();
        roots.push(self.playlist_path.clone());
        roots
    }

    pub fn ban_list(&self) -> BanList {
        BanList::new(&self.banned_directories, &self.banned_files)
    }

    pub fn new_history(&self) -> LaunchHistory {
        match self.history_capacity {
            Some(capacity) => LaunchHistory::with_capacity(capacity),
            None => LaunchHistory::new(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        let banned_directories = [
            "MUSICIANS/S/Szachista",
            "System Volume Information",
            "FOUND.000",
            "integration-test-files",
            "integration-tests",
            "AlternativeFormats",
            "Dumps",
            "Docs",
        ];
        let banned_files = [
            "Revolutionary_Etude_part_1.sid",
            "Revolutionary_Etude_part_2.sid",
            "Super_Trouper.sid",
        ];
        let stop_words = [
            "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "is", "it",
            "no", "not", "of", "on", "or", "that", "the", "to", "was", "with",
        ];

        Self {
            favorites_root: DirectoryPath::new("/favorites/").unwrap_or_default(),
            firmware_path: DirectoryPath::new("/firmware/").unwrap_or_default(),
            playlist_path: DirectoryPath::new("/playlists/").unwrap_or_default(),
            banned_directories: banned_directories.iter().map(|s| s.to_string()).collect(),
            banned_files: banned_files.iter().map(|s| s.to_string()).collect(),
            search_weights: SearchWeights::default(),
            search_stop_words: stop_words.iter().map(|s| s.to_string()).collect(),
            history_capacity: Some(100),
            index_channel_capacity: 32,
        }
    }
}
