//! Back/forward launch history.
//!
//! History is a single sequence with a cursor. Appending after stepping back
//! discards the abandoned forward branch, like a browser.

use super::path::FilePath;
use super::FileRecord;
use crate::utils::file_detection::FileType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub index: usize,
    pub file: FileRecord,
    pub launched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct LaunchHistory {
    entries: Vec<HistoryEntry>,
    cursor: Option<usize>,
    current_is_new: bool,
    capacity: Option<usize>,
}

impl LaunchHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A history that evicts its oldest entry once `capacity` is reached.
    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            ..Self::default()
        }
    }

    /// Records a launch, dropping everything after the cursor first.
    pub fn append(&mut self, file: FileRecord) {
        if let Some(cursor) = self.cursor {
            self.entries.truncate(cursor + 1);
        }

        if let Some(capacity) = self.capacity {
            while self.entries.len() >= capacity {
                self.entries.remove(0);
            }
        }

        self.entries.push(HistoryEntry {
            index: 0,
            file,
            launched_at: Utc::now(),
        });
        self.reindex();
        self.cursor = Some(self.entries.len() - 1);
        self.current_is_new = true;
    }

    /// Steps back to the closest earlier entry whose type is in `types`.
    /// An empty `types` matches everything. The cursor does not move when no
    /// entry qualifies.
    pub fn previous(&mut self, types: &[FileType]) -> Option<&HistoryEntry> {
        let cursor = self.cursor?;
        let found = (0..cursor)
            .rev()
            .find(|&i| matches_types(&self.entries[i], types))?;
        self.move_to(found)
    }

    /// Steps forward to the closest later entry whose type is in `types`.
    pub fn next(&mut self, types: &[FileType]) -> Option<&HistoryEntry> {
        let start = self.cursor.map_or(0, |c| c + 1);
        let found = (start..self.entries.len()).find(|&i| matches_types(&self.entries[i], types))?;
        self.move_to(found)
    }

    fn move_to(&mut self, index: usize) -> Option<&HistoryEntry> {
        self.cursor = Some(index);
        self.current_is_new = false;
        self.entries.get(index)
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.cursor?)
    }

    /// `true` right after an append, until the cursor moves.
    pub fn current_is_new(&self) -> bool {
        self.current_is_new
    }

    /// Drops every entry for `path`, keeping the cursor on the same logical
    /// entry (or the closest earlier one if it was removed).
    pub fn remove(&mut self, path: &FilePath) -> usize {
        let before = self.entries.len();
        let cursor = self.cursor;
        let mut new_cursor = None;
        let mut kept = Vec::with_capacity(before);

        for (i, entry) in self.entries.drain(..).enumerate() {
            if &entry.file.path == path {
                continue;
            }
            if cursor.is_some_and(|c| i <= c) {
                new_cursor = Some(kept.len());
            }
            kept.push(entry);
        }

        self.entries = kept;
        self.cursor = new_cursor;
        self.reindex();
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
        self.current_is_new = false;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    fn reindex(&mut self) {
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.index = i;
        }
    }
}

fn matches_types(entry: &HistoryEntry, types: &[FileType]) -> bool {
    types.is_empty() || types.contains(&entry.file.file_type)
}
