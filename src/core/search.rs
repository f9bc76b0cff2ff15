//! Query parsing and ranked search over cached file records.
//!
//! A query is split on whitespace outside double quotes. A `+` prefix marks a
//! clause as required, a double-quoted run is matched as one phrase, anything
//! else is an optional word. Matching is a case-insensitive substring test
//! against each weighted field of a record.

use super::selection::CandidateFilter;
use super::FileRecord;
use crate::core::path::compare_names;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\+?)"([^"]*)"|(\S+)"#).expect("token pattern is a valid regex")
});

/// One parsed clause. `text` is already lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryClause {
    pub text: String,
    pub is_phrase: bool,
    pub is_required: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub clauses: Vec<QueryClause>,
}

impl SearchQuery {
    /// Parses free text into clauses.
    ///
    /// Word clauses that are stop words are dropped, phrases are kept as
    /// written. An unterminated quote is read as part of a word.
    pub fn parse(input: &str, stop_words: &[String]) -> Self {
        let mut clauses = Vec::new();

        for caps in TOKEN.captures_iter(input) {
            if let Some(phrase) = caps.get(2) {
                let text = phrase.as_str().trim().to_lowercase();
                if text.is_empty() {
                    continue;
                }
                clauses.push(QueryClause {
                    text,
                    is_phrase: true,
                    is_required: caps.get(1).is_some_and(|m| !m.as_str().is_empty()),
                });
            } else if let Some(word) = caps.get(3) {
                let raw = word.as_str();
                let (is_required, rest) = match raw.strip_prefix('+') {
                    Some(rest) => (true, rest),
                    None => (false, raw),
                };
                let text = rest.replace('"', "").to_lowercase();
                if text.is_empty() || stop_words.iter().any(|s| s.eq_ignore_ascii_case(&text)) {
                    continue;
                }
                clauses.push(QueryClause {
                    text,
                    is_phrase: false,
                    is_required,
                });
            }
        }

        Self { clauses }
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn required(&self) -> impl Iterator<Item = &QueryClause> {
        self.clauses.iter().filter(|c| c.is_required)
    }
}

/// Per-field weights used when scoring a match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchWeights {
    pub title: u32,
    pub file_name: u32,
    pub file_path: u32,
    pub creator: u32,
    pub description: u32,
    pub tags: u32,
    pub release_info: u32,
}

impl Default for SearchWeights {
    fn default() -> Self {
        Self {
            title: 10,
            file_name: 8,
            file_path: 1,
            creator: 6,
            description: 2,
            tags: 4,
            release_info: 2,
        }
    }
}

/// Lowercased searchable text of one record, paired with field weights.
struct Fields([(String, u32); 7]);

impl Fields {
    fn of(file: &FileRecord, weights: &SearchWeights) -> Self {
        Self([
            (file.title.to_lowercase(), weights.title),
            (file.name.to_lowercase(), weights.file_name),
            (file.path.as_str().to_lowercase(), weights.file_path),
            (file.creator.to_lowercase(), weights.creator),
            (file.description.to_lowercase(), weights.description),
            (file.tags.join("\n").to_lowercase(), weights.tags),
            (file.release_info.to_lowercase(), weights.release_info),
        ])
    }

    fn matches(&self, clause: &QueryClause) -> bool {
        self.0
            .iter()
            .any(|(text, _)| !text.is_empty() && text.contains(&clause.text))
    }

    fn score(&self, clause: &QueryClause) -> u32 {
        self.0
            .iter()
            .filter(|(text, _)| !text.is_empty() && text.contains(&clause.text))
            .map(|(_, weight)| *weight)
            .sum()
    }
}

/// Stateless ranked search.
pub struct SearchEngine;

impl SearchEngine {
    /// Returns the records matching `query`, best match first.
    ///
    /// Records excluded by `filter` are never scored. A record missing any
    /// required clause is dropped, as is any record whose total score is zero.
    /// Ties are ordered by name and then by path.
    pub fn search<'a, I>(
        files: I,
        query: &SearchQuery,
        weights: &SearchWeights,
        filter: &CandidateFilter<'_>,
    ) -> Vec<FileRecord>
    where
        I: IntoIterator<Item = &'a FileRecord>,
    {
        if query.is_empty() {
            return Vec::new();
        }

        let candidates: Vec<&FileRecord> = files
            .into_iter()
            .filter(|file| filter.accepts(file))
            .collect();

        let mut scored: Vec<(u32, &FileRecord)> = candidates
            .par_iter()
            .filter_map(|file| {
                let score = Self::score(file, query, weights)?;
                (score > 0).then_some((score, *file))
            })
            .collect();

        scored.sort_by(|(sa, a), (sb, b)| {
            sb.cmp(sa)
                .then_with(|| compare_names(&a.name, &b.name))
                .then_with(|| a.path.cmp(&b.path))
        });

        scored.into_iter().map(|(_, file)| file.clone()).collect()
    }

    /// Scores a single record, or `None` when a required clause is missing.
    pub fn score(file: &FileRecord, query: &SearchQuery, weights: &SearchWeights) -> Option<u32> {
        let fields = Fields::of(file, weights);
        if !query.required().all(|clause| fields.matches(clause)) {
            return None;
        }
        Some(query.clauses.iter().map(|clause| fields.score(clause)).sum())
    }
}
