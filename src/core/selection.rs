//! Scoped random selection among cached files.

use super::ban_list::BanList;
use super::path::DirectoryPath;
use super::FileRecord;
use crate::utils::file_detection::FileType;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Which part of the cached tree a random pick may come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StorageScope {
    /// Every cached file.
    #[default]
    Storage,
    /// Files directly in the scope directory or in one of its immediate
    /// subdirectories.
    DirShallow,
    /// Files anywhere below the scope directory.
    DirDeep,
}

impl StorageScope {
    pub fn includes(self, scope_path: &DirectoryPath, file: &FileRecord) -> bool {
        match self {
            StorageScope::Storage => true,
            StorageScope::DirDeep => file.path.is_within(scope_path),
            StorageScope::DirShallow => {
                let dir = file.path.directory();
                &dir == scope_path || scope_path.is_parent_of(&dir)
            }
        }
    }
}

/// Shared eligibility rules for search results and random picks.
///
/// An empty type list means every launchable type.
#[derive(Debug, Clone, Copy)]
pub struct CandidateFilter<'a> {
    file_types: &'a [FileType],
    excluded_roots: &'a [DirectoryPath],
    bans: &'a BanList,
}

impl<'a> CandidateFilter<'a> {
    pub fn new(
        file_types: &'a [FileType],
        excluded_roots: &'a [DirectoryPath],
        bans: &'a BanList,
    ) -> Self {
        Self {
            file_types,
            excluded_roots,
            bans,
        }
    }

    pub fn accepts(&self, file: &FileRecord) -> bool {
        let type_ok = if self.file_types.is_empty() {
            file.file_type.is_launchable()
        } else {
            self.file_types.contains(&file.file_type)
        };

        type_ok
            && !self.excluded_roots.iter().any(|root| file.path.is_within(root))
            && !self.bans.is_banned_file(&file.path)
    }
}

/// Picks one file uniformly at random from the eligible files in scope.
///
/// Returns `None` when nothing in the cache qualifies; callers decide whether
/// to index more of the device and retry.
pub fn pick_random<'a, I, R>(
    files: I,
    scope: StorageScope,
    scope_path: &DirectoryPath,
    filter: &CandidateFilter<'_>,
    rng: &mut R,
) -> Option<FileRecord>
where
    I: IntoIterator<Item = &'a FileRecord>,
    R: Rng + ?Sized,
{
    let candidates: Vec<&FileRecord> = files
        .into_iter()
        .filter(|file| scope.includes(scope_path, file) && filter.accepts(file))
        .collect();

    candidates.choose(rng).map(|file| (*file).clone())
}
