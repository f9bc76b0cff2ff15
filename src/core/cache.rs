//! The directory cache tree.
//!
//! `StorageCache` maps normalized directory paths to their cached listings.
//! Child links are stored as path keys and resolved on every lookup, so the
//! tree never holds references between entries. The cache itself is not
//! synchronized; `CachedStorageService` owns it behind a single writer lock.

use super::ban_list::BanList;
use super::path::{DirectoryPath, FilePath};
use super::{CacheEntry, DirectoryRef, FileRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A serializable copy of every cached entry, ordered by path.
///
/// Persisting the snapshot is the host's concern; the cache only produces
/// and consumes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub entries: Vec<CacheEntry>,
}

#[derive(Debug, Default)]
pub struct StorageCache {
    entries: HashMap<DirectoryPath, CacheEntry>,
    bans: BanList,
    favorite_roots: Vec<DirectoryPath>,
    playlist_roots: Vec<DirectoryPath>,
}

impl StorageCache {
    pub fn new(bans: BanList, favorite_roots: Vec<DirectoryPath>) -> Self {
        Self {
            entries: HashMap::new(),
            bans,
            favorite_roots,
            playlist_roots: Vec::new(),
        }
    }

    pub fn ban_list(&self) -> &BanList {
        &self.bans
    }

    /// Swaps the active ban list. Already cached content is untouched until it
    /// is re-inserted or the cache is cleared.
    pub fn set_ban_list(&mut self, bans: BanList) {
        self.bans = bans;
    }

    pub fn favorite_roots(&self) -> &[DirectoryPath] {
        &self.favorite_roots
    }

    pub fn set_favorite_roots(&mut self, roots: Vec<DirectoryPath>) {
        self.favorite_roots = roots;
    }

    /// Playlist folders hold copies of other files. Their files are never
    /// chosen as the source of a favorite mirror.
    pub fn set_playlist_roots(&mut self, roots: Vec<DirectoryPath>) {
        self.playlist_roots = roots;
    }

    pub fn is_favorite_path(&self, path: &FilePath) -> bool {
        self.favorite_roots.iter().any(|root| path.is_within(root))
    }

    pub fn is_playlist_path(&self, path: &FilePath) -> bool {
        self.playlist_roots.iter().any(|root| path.is_within(root))
    }

    fn is_copy_path(&self, path: &FilePath) -> bool {
        self.is_favorite_path(path) || self.is_playlist_path(path)
    }

    fn is_favorite_directory(&self, dir: &DirectoryPath) -> bool {
        self.favorite_roots.iter().any(|root| root.contains(dir))
    }

    /// Replaces the entry stored for `path`.
    ///
    /// Banned directories are ignored. Banned children and files are filtered
    /// out before storing, cached subdirectories that the new listing no
    /// longer contains are dropped with their descendants, and the entry is
    /// linked into its materialized parent chain. Returns whether the entry
    /// was stored.
    pub fn upsert_directory(&mut self, path: &DirectoryPath, mut entry: CacheEntry) -> bool {
        if self.bans.is_banned_directory(path) {
            tracing::debug!("Skipping banned directory {}", path);
            return false;
        }

        entry.path = path.clone();
        self.filter_banned(&mut entry);

        let favorite_dir = self.is_favorite_directory(path);
        if favorite_dir {
            for file in &mut entry.files {
                file.is_favorite = true;
            }
        }
        let mirrors: Vec<FilePath> = if favorite_dir {
            entry.files.iter().map(|f| f.path.clone()).collect()
        } else {
            Vec::new()
        };

        if let Some(previous) = self.entries.remove(path) {
            // A fresh listing knows nothing about favorites or compatibility.
            for old in &previous.files {
                if let Some(new) = entry.file_mut(&old.path) {
                    new.is_compatible &= old.is_compatible;
                    if old.favorite_child_path.is_some() {
                        new.is_favorite = true;
                        new.favorite_child_path = old.favorite_child_path.clone();
                    }
                    if new.favorite_parent_path.is_none() {
                        new.favorite_parent_path = old.favorite_parent_path.clone();
                    }
                }
            }
            for stale in previous
                .directories
                .iter()
                .filter(|d| !entry.has_subdirectory(&d.path))
            {
                self.delete_directory_with_children(&stale.path);
            }
        }

        self.entries.insert(path.clone(), entry);
        self.ensure_parents(path);

        for mirror in &mirrors {
            self.link_favorite(mirror);
        }
        true
    }

    /// Inserts or replaces a single file, materializing its parent chain.
    ///
    /// Files whose name or directory is banned are ignored. Returns whether
    /// the file was stored.
    pub fn upsert_file(&mut self, mut file: FileRecord) -> bool {
        if self.bans.is_banned_file(&file.path) {
            tracing::debug!("Skipping banned file {}", file.path);
            return false;
        }

        let dir = file.path.directory();
        let is_mirror = self.is_favorite_path(&file.path);
        if is_mirror {
            file.is_favorite = true;
        }
        let path = file.path.clone();

        self.ensure_parents(&dir);
        match self.entries.get_mut(&dir) {
            Some(entry) => entry.upsert_file(file),
            None => return false,
        }

        if is_mirror {
            self.link_favorite(&path);
        } else if self.is_playlist_path(&path) {
            self.map_playlist_copy(&path);
        }
        true
    }

    /// Makes sure `path` and every ancestor up to the root has an entry, and
    /// that each parent lists its immediate child.
    pub fn ensure_parents(&mut self, path: &DirectoryPath) {
        if self.bans.is_banned_directory(path) {
            return;
        }

        self.entries
            .entry(path.clone())
            .or_insert_with(|| CacheEntry::new(path.clone()));

        let mut child = path.clone();
        while let Some(parent) = child.parent() {
            self.entries
                .entry(parent.clone())
                .or_insert_with(|| CacheEntry::new(parent.clone()))
                .insert_subdirectory(DirectoryRef::from(child));
            child = parent;
        }
    }

    /// Removes a single entry. The parent keeps its link, so the next lookup
    /// misses and refetches.
    pub fn delete_directory(&mut self, path: &DirectoryPath) -> Option<CacheEntry> {
        self.entries.remove(path)
    }

    /// Removes `path` and every cached entry below it. Returns how many
    /// entries were dropped.
    pub fn delete_directory_with_children(&mut self, path: &DirectoryPath) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !path.contains(key));
        before - self.entries.len()
    }

    pub fn delete_file(&mut self, path: &FilePath) -> Option<FileRecord> {
        self.entries.get_mut(&path.directory())?.remove_file(path)
    }

    pub fn get_by_path(&self, path: &DirectoryPath) -> Option<&CacheEntry> {
        if self.bans.is_banned_directory(path) {
            return None;
        }
        self.entries.get(path)
    }

    pub fn get_file_by_path(&self, path: &FilePath) -> Option<&FileRecord> {
        self.entries.get(&path.directory())?.file(path)
    }

    fn file_mut(&mut self, path: &FilePath) -> Option<&mut FileRecord> {
        self.entries.get_mut(&path.directory())?.file_mut(path)
    }

    /// Applies `update` to a cached record in place and returns the result.
    pub fn update_file<F>(&mut self, path: &FilePath, update: F) -> Option<FileRecord>
    where
        F: FnOnce(&mut FileRecord),
    {
        let record = self.file_mut(path)?;
        update(record);
        Some(record.clone())
    }

    /// Scans every cached file for an exact (case-insensitive) name match.
    pub fn get_files_by_name(&self, name: &str) -> Vec<&FileRecord> {
        self.files()
            .filter(|f| f.name.eq_ignore_ascii_case(name))
            .collect()
    }

    pub fn files(&self) -> impl Iterator<Item = &FileRecord> {
        self.entries.values().flat_map(|entry| entry.files.iter())
    }

    pub fn entries(&self) -> impl Iterator<Item = &CacheEntry> {
        self.entries.values()
    }

    pub fn file_count(&self) -> usize {
        self.entries.values().map(|entry| entry.files.len()).sum()
    }

    pub fn directory_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops everything, including content that was cached before the
    /// current ban list was applied.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Re-links every cached favorite mirror with its source. Returns the
    /// number of mirrors that have a source.
    pub fn ensure_favorites(&mut self) -> usize {
        let mirrors: Vec<FilePath> = self
            .files()
            .filter(|f| self.is_favorite_path(&f.path))
            .map(|f| f.path.clone())
            .collect();

        mirrors
            .iter()
            .filter(|mirror| self.link_favorite(mirror))
            .count()
    }

    /// Copies source metadata onto every cached playlist file whose source
    /// is cached. Returns how many playlist files were mapped.
    pub fn ensure_playlists(&mut self) -> usize {
        let copies: Vec<FilePath> = self
            .files()
            .filter(|f| self.is_playlist_path(&f.path))
            .map(|f| f.path.clone())
            .collect();

        copies
            .iter()
            .filter(|path| self.map_playlist_copy(path))
            .count()
    }

    fn map_playlist_copy(&mut self, path: &FilePath) -> bool {
        let source = self
            .get_file_by_path(path)
            .and_then(|copy| self.find_source(copy))
            .cloned();
        match (source, self.file_mut(path)) {
            (Some(source), Some(copy)) => {
                copy.inherit_metadata(&source);
                true
            }
            _ => false,
        }
    }

    /// Clears the favorite state of a source whose mirror is gone.
    ///
    /// Playlist copies of the same content lose their flag too, unless a
    /// favorite mirror of that content is still cached.
    pub fn clear_favorite(&mut self, source_path: &FilePath) {
        let Some(source) = self.update_file(source_path, |record| {
            record.is_favorite = false;
            record.favorite_child_path = None;
        }) else {
            return;
        };

        let still_mirrored = self.files().any(|f| {
            self.is_favorite_path(&f.path)
                && (f.favorite_parent_path.as_ref() == Some(source_path) || f.same_content(&source))
        });
        if still_mirrored {
            return;
        }

        let copies: Vec<FilePath> = self
            .files()
            .filter(|f| self.is_playlist_path(&f.path) && f.same_content(&source))
            .map(|f| f.path.clone())
            .collect();
        for path in &copies {
            self.update_file(path, |record| record.is_favorite = false);
        }
    }

    /// Flags a mirror as favorite and connects it with its source.
    ///
    /// A mirror without a recorded source is matched by name and size against
    /// cached files outside the favorite and playlist roots. Once linked, the
    /// mirror takes over the source's metadata and every other favorite or
    /// playlist copy of the same content is flagged as well. Returns whether
    /// a source was linked.
    fn link_favorite(&mut self, mirror_path: &FilePath) -> bool {
        let Some(mirror) = self.get_file_by_path(mirror_path).cloned() else {
            return false;
        };

        let source_path = mirror
            .favorite_parent_path
            .clone()
            .or_else(|| self.find_source(&mirror).map(|f| f.path.clone()));
        let source = source_path
            .as_ref()
            .and_then(|path| self.get_file_by_path(path))
            .cloned();

        if let Some(record) = self.file_mut(mirror_path) {
            record.is_favorite = true;
            record.favorite_parent_path = source_path;
            if let Some(source) = &source {
                record.inherit_metadata(source);
            }
        }

        let Some(source) = source else {
            return false;
        };
        if let Some(record) = self.file_mut(&source.path) {
            record.is_favorite = true;
            record.favorite_child_path = Some(mirror_path.clone());
        }

        let siblings: Vec<FilePath> = self
            .files()
            .filter(|f| {
                &f.path != mirror_path && self.is_copy_path(&f.path) && f.same_content(&source)
            })
            .map(|f| f.path.clone())
            .collect();
        for path in &siblings {
            if let Some(sibling) = self.file_mut(path) {
                sibling.is_favorite = true;
                sibling.inherit_metadata(&source);
            }
        }
        true
    }

    fn find_source(&self, copy: &FileRecord) -> Option<&FileRecord> {
        self.files()
            .filter(|f| !self.is_copy_path(&f.path) && f.same_content(copy))
            .min_by(|a, b| a.path.cmp(&b.path))
    }

    fn filter_banned(&self, entry: &mut CacheEntry) {
        entry
            .directories
            .retain(|d| !self.bans.is_banned_directory(&d.path));
        entry
            .files
            .retain(|f| !self.bans.is_banned_file_name(&f.name));
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        let mut entries: Vec<CacheEntry> = self.entries.values().cloned().collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        CacheSnapshot { entries }
    }

    pub fn from_snapshot(
        snapshot: CacheSnapshot,
        bans: BanList,
        favorite_roots: Vec<DirectoryPath>,
    ) -> Self {
        let mut cache = Self::new(bans, favorite_roots);
        cache.restore(snapshot);
        cache
    }

    /// Replaces the cache content with a snapshot, applying the current ban
    /// list and re-materializing parent links.
    pub fn restore(&mut self, snapshot: CacheSnapshot) {
        self.entries.clear();
        for mut entry in snapshot.entries {
            if self.bans.is_banned_directory(&entry.path) {
                continue;
            }
            self.filter_banned(&mut entry);
            self.entries.insert(entry.path.clone(), entry);
        }

        let paths: Vec<DirectoryPath> = self.entries.keys().cloned().collect();
        for path in &paths {
            self.ensure_parents(path);
        }
        self.ensure_favorites();
        self.ensure_playlists();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_helpers::{fixture_record as file, setup_test_logging};

    fn dir(path: &str) -> DirectoryPath {
        DirectoryPath::new(path).unwrap()
    }

    fn cache() -> StorageCache {
        setup_test_logging();
        let mut cache = StorageCache::new(
            BanList::new(["Dumps"], ["Super_Trouper.sid"]),
            vec![dir("/favorites"), dir("/firmware")],
        );
        cache.set_playlist_roots(vec![dir("/playlists")]);
        cache
    }

    fn get<'a>(cache: &'a StorageCache, path: &str) -> &'a FileRecord {
        cache
            .get_file_by_path(&FilePath::new(path).unwrap())
            .unwrap_or_else(|| panic!("{path} is not cached"))
    }

    fn listing(path: &str, dirs: &[&str], files: &[&str]) -> CacheEntry {
        CacheEntry::with_contents(
            dir(path),
            dirs.iter().map(|d| dir(d)),
            files.iter().map(|f| file(f, 100)),
        )
    }

    #[test]
    fn test_upsert_directory_stores_ordered_listing() {
        let mut cache = cache();
        cache.upsert_directory(
            &dir("/games"),
            listing("/games", &[], &["/games/B.crt", "/games/A.crt"]),
        );

        let entry = cache.get_by_path(&dir("/games")).unwrap();
        let names: Vec<_> = entry.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["A.crt", "B.crt"]);

        let root = cache.get_by_path(&DirectoryPath::root()).unwrap();
        assert!(root.has_subdirectory(&dir("/games")));
    }

    #[test]
    fn test_upsert_directory_is_idempotent() {
        let mut once = cache();
        let mut twice = cache();
        let entry = listing("/games/arcade", &["/games/arcade/x"], &["/games/arcade/a.prg"]);

        once.upsert_directory(&dir("/games/arcade"), entry.clone());
        twice.upsert_directory(&dir("/games/arcade"), entry.clone());
        twice.upsert_directory(&dir("/games/arcade"), entry);

        assert_eq!(once.snapshot(), twice.snapshot());
    }

    #[test]
    fn test_banned_directory_upsert_is_noop() {
        let mut cache = cache();
        let stored = cache.upsert_directory(&dir("/Dumps/old"), listing("/Dumps/old", &[], &[]));
        assert!(!stored);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_banned_children_are_filtered_on_insert() {
        let mut cache = cache();
        cache.upsert_directory(
            &dir("/music"),
            listing(
                "/music",
                &["/music/Dumps", "/music/abba"],
                &["/music/super_trouper.sid", "/music/waterloo.sid"],
            ),
        );

        let entry = cache.get_by_path(&dir("/music")).unwrap();
        assert_eq!(entry.directories.len(), 1);
        assert_eq!(entry.directories[0].name, "abba");
        assert_eq!(entry.files.len(), 1);
        assert_eq!(entry.files[0].name, "waterloo.sid");
    }

    #[test]
    fn test_upsert_file_materializes_parents() {
        let mut cache = cache();
        assert!(cache.upsert_file(file("/a/b/c/tune.sid", 1)));

        for path in ["/", "/a/", "/a/b/", "/a/b/c/"] {
            assert!(cache.get_by_path(&dir(path)).is_some(), "missing {path}");
        }
        assert!(cache
            .get_by_path(&dir("/a/b"))
            .unwrap()
            .has_subdirectory(&dir("/a/b/c")));
        assert_eq!(cache.file_count(), 1);
    }

    #[test]
    fn test_upsert_file_ignores_banned_names() {
        let mut cache = cache();
        assert!(!cache.upsert_file(file("/music/Super_Trouper.sid", 1)));
        assert!(!cache.upsert_file(file("/Dumps/x.prg", 1)));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_ban_list_changes_heal_on_reinsert() {
        let mut cache = StorageCache::new(BanList::default(), Vec::new());
        let entry = listing("/music", &[], &["/music/bad.sid", "/music/good.sid"]);
        cache.upsert_directory(&dir("/music"), entry.clone());
        assert_eq!(cache.file_count(), 2);

        cache.set_ban_list(BanList::new(Vec::<String>::new(), ["bad"]));
        assert_eq!(cache.file_count(), 2, "existing content stays until reinsert");

        cache.upsert_directory(&dir("/music"), entry);
        assert_eq!(cache.file_count(), 1);
    }

    #[test]
    fn test_delete_directory_is_not_recursive() {
        let mut cache = cache();
        cache.upsert_file(file("/a/b/x.prg", 1));
        cache.delete_directory(&dir("/a"));

        assert!(cache.get_by_path(&dir("/a")).is_none());
        assert!(cache.get_by_path(&dir("/a/b")).is_some());
        assert!(cache
            .get_by_path(&DirectoryPath::root())
            .unwrap()
            .has_subdirectory(&dir("/a")));
    }

    #[test]
    fn test_delete_directory_with_children_only_touches_subtree() {
        let mut cache = cache();
        cache.upsert_file(file("/a/b/x.prg", 1));
        cache.upsert_file(file("/a/c/y.prg", 1));
        cache.upsert_file(file("/ab/z.prg", 1));

        let removed = cache.delete_directory_with_children(&dir("/a"));
        assert_eq!(removed, 3);
        assert!(cache.get_by_path(&dir("/ab")).is_some());
        assert_eq!(cache.file_count(), 1);
    }

    #[test]
    fn test_relisting_drops_vanished_subdirectories() {
        let mut cache = cache();
        cache.upsert_directory(&dir("/games"), listing("/games", &["/games/old"], &[]));
        cache.upsert_file(file("/games/old/x.prg", 1));

        cache.upsert_directory(&dir("/games"), listing("/games", &["/games/new"], &[]));
        assert!(cache.get_by_path(&dir("/games/old")).is_none());
        assert_eq!(cache.file_count(), 0);
    }

    #[test]
    fn test_lookups_by_file_path_and_name() {
        let mut cache = cache();
        cache.upsert_file(file("/games/a.crt", 1));
        cache.upsert_file(file("/backup/A.CRT", 1));

        let found = cache
            .get_file_by_path(&FilePath::new("/GAMES/a.crt").unwrap())
            .unwrap();
        assert_eq!(found.name, "a.crt");
        assert_eq!(cache.get_files_by_name("a.crt").len(), 2);
        assert!(cache
            .get_file_by_path(&FilePath::new("/games/missing.crt").unwrap())
            .is_none());
    }

    #[test]
    fn test_mirror_links_to_cached_source_on_upsert() {
        let mut cache = cache();
        cache.upsert_file(file("/games/arcade/a.crt", 42));
        cache.upsert_file(file("/favorites/games/a.crt", 42));

        let mirror = cache
            .get_file_by_path(&FilePath::new("/favorites/games/a.crt").unwrap())
            .unwrap();
        assert!(mirror.is_favorite);
        assert_eq!(
            mirror.favorite_parent_path.as_ref().unwrap().as_str(),
            "/games/arcade/a.crt"
        );

        let source = cache
            .get_file_by_path(&FilePath::new("/games/arcade/a.crt").unwrap())
            .unwrap();
        assert!(source.is_favorite);
        assert_eq!(
            source.favorite_child_path.as_ref().unwrap().as_str(),
            "/favorites/games/a.crt"
        );
    }

    #[test]
    fn test_favorite_directory_listing_flags_files() {
        let mut cache = cache();
        cache.upsert_directory(
            &dir("/favorites/music"),
            listing("/favorites/music", &[], &["/favorites/music/tune.sid"]),
        );
        let entry = cache.get_by_path(&dir("/favorites/music")).unwrap();
        assert!(entry.files[0].is_favorite);
        assert!(entry.files[0].favorite_parent_path.is_none());
    }

    #[test]
    fn test_ensure_favorites_links_after_sources_arrive() {
        let mut cache = cache();
        cache.upsert_directory(
            &dir("/favorites/music"),
            listing("/favorites/music", &[], &["/favorites/music/tune.sid"]),
        );
        cache.upsert_directory(&dir("/hvsc"), listing("/hvsc", &[], &["/hvsc/tune.sid"]));

        assert_eq!(cache.ensure_favorites(), 1);
        let source = cache
            .get_file_by_path(&FilePath::new("/hvsc/tune.sid").unwrap())
            .unwrap();
        assert!(source.is_favorite);
    }

    #[test]
    fn test_playlist_copies_are_never_chosen_as_source() {
        let mut cache = cache();
        cache.upsert_file(file("/zzz/tune.sid", 7));
        cache.upsert_file(file("/playlists/tune.sid", 7));
        cache.upsert_file(file("/favorites/music/tune.sid", 7));

        let mirror = get(&cache, "/favorites/music/tune.sid");
        assert_eq!(
            mirror.favorite_parent_path.as_ref().unwrap().as_str(),
            "/zzz/tune.sid"
        );
        assert!(get(&cache, "/zzz/tune.sid").is_favorite);
        assert!(get(&cache, "/playlists/tune.sid").favorite_child_path.is_none());
    }

    #[test]
    fn test_mirror_inherits_source_metadata_and_flags_siblings() {
        let mut cache = cache();
        let mut source = file("/games/commando.crt", 9);
        source.title = "Commando".to_string();
        source.creator = "Rob Hubbard".to_string();
        cache.upsert_file(source);
        cache.upsert_file(file("/playlists/commando.crt", 9));
        cache.upsert_file(file("/favorites/games/commando.crt", 9));

        let mirror = get(&cache, "/favorites/games/commando.crt");
        assert_eq!(mirror.title, "Commando");
        assert_eq!(mirror.creator, "Rob Hubbard");

        let playlist_copy = get(&cache, "/playlists/commando.crt");
        assert!(playlist_copy.is_favorite);
        assert_eq!(playlist_copy.title, "Commando");
    }

    #[test]
    fn test_playlist_copy_takes_source_metadata() {
        let mut cache = cache();
        cache.upsert_file(file("/playlists/tune.sid", 3));
        let mut source = file("/hvsc/tune.sid", 3);
        source.title = "Tune".to_string();
        cache.upsert_file(source);

        assert_eq!(cache.ensure_playlists(), 1);
        assert_eq!(get(&cache, "/playlists/tune.sid").title, "Tune");
        assert!(!get(&cache, "/playlists/tune.sid").is_favorite);
    }

    #[test]
    fn test_relisting_keeps_link_of_renamed_mirror() {
        let mut cache = cache();
        cache.upsert_file(file("/games/commando.crt", 9));
        let mut mirror = file("/favorites/games/commando_1.crt", 9);
        mirror.favorite_parent_path = Some(FilePath::new("/games/commando.crt").unwrap());
        cache.upsert_file(mirror);

        cache.upsert_directory(
            &dir("/favorites/games"),
            CacheEntry::with_contents(
                dir("/favorites/games"),
                Vec::new(),
                [file("/favorites/games/commando_1.crt", 9)],
            ),
        );

        let mirror = get(&cache, "/favorites/games/commando_1.crt");
        assert_eq!(
            mirror.favorite_parent_path.as_ref().unwrap().as_str(),
            "/games/commando.crt"
        );
        assert_eq!(
            get(&cache, "/games/commando.crt")
                .favorite_child_path
                .as_ref()
                .unwrap()
                .as_str(),
            "/favorites/games/commando_1.crt"
        );
    }

    #[test]
    fn test_clear_favorite_unflags_source_and_playlist_copies() {
        let mut cache = cache();
        cache.upsert_file(file("/music/tune.sid", 5));
        cache.upsert_file(file("/playlists/tune.sid", 5));
        cache.upsert_file(file("/favorites/music/tune.sid", 5));
        assert!(get(&cache, "/playlists/tune.sid").is_favorite);

        cache.delete_file(&FilePath::new("/favorites/music/tune.sid").unwrap());
        cache.clear_favorite(&FilePath::new("/music/tune.sid").unwrap());

        let source = get(&cache, "/music/tune.sid");
        assert!(!source.is_favorite);
        assert!(source.favorite_child_path.is_none());
        assert!(!get(&cache, "/playlists/tune.sid").is_favorite);
    }

    #[test]
    fn test_snapshot_restore_round_trip_applies_bans() {
        let mut cache = cache();
        cache.upsert_file(file("/games/a.crt", 1));
        let snapshot = cache.snapshot();

        let mut restored = StorageCache::new(
            BanList::new(["games"], Vec::<String>::new()),
            Vec::new(),
        );
        restored.restore(snapshot.clone());
        assert_eq!(restored.file_count(), 0);
        assert!(restored.get_by_path(&DirectoryPath::root()).is_some());

        let mut plain = StorageCache::default();
        plain.restore(snapshot.clone());
        assert_eq!(plain.snapshot(), snapshot);
    }
}
