//! Unix-style storage paths as used on the device.
//!
//! The free functions operate on raw strings and are what the value types
//! [`DirectoryPath`] and [`FilePath`] are built from. Directory paths always
//! start and end with `/` (the root is exactly `/`); file paths start with `/`
//! and never end with one. Comparisons ignore ASCII case because the device
//! storage is FAT formatted.

use super::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

pub const ROOT: &str = "/";

/// Splits a raw path into its normalized segments.
///
/// Empty and `.` segments are dropped and `..` pops the previous segment,
/// never climbing above the root.
fn segments(raw: &str) -> Result<Vec<&str>> {
    if raw.contains('\\') {
        return Err(CoreError::InvalidPath(
            raw.to_string(),
            "backslashes are not allowed",
        ));
    }
    if raw.contains('\0') {
        return Err(CoreError::InvalidPath(
            raw.to_string(),
            "NUL bytes are not allowed",
        ));
    }
    if has_drive_prefix(raw) {
        return Err(CoreError::InvalidPath(
            raw.to_string(),
            "drive prefixes are not allowed",
        ));
    }

    let mut out = Vec::new();
    for segment in raw.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

fn has_drive_prefix(raw: &str) -> bool {
    let bytes = raw.trim_start_matches('/').as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Strips whitespace around the path, never from inside a segment.
///
/// Leading whitespace only goes when a slash follows it and trailing
/// whitespace only when a slash precedes it, so `"/x/foo "` keeps its name.
fn trim_outer(raw: &str) -> &str {
    let start = raw.trim_start();
    let raw = if start.starts_with('/') { start } else { raw };
    let end = raw.trim_end();
    if end.ends_with('/') {
        end
    } else {
        raw
    }
}

/// Normalizes a directory path: leading and trailing slash, no duplicates.
pub fn normalize_directory(raw: &str) -> Result<String> {
    let parts = segments(trim_outer(raw))?;
    if parts.is_empty() {
        return Ok(ROOT.to_string());
    }
    Ok(format!("/{}/", parts.join("/")))
}

/// Normalizes a file path: leading slash, no trailing slash.
pub fn normalize_file(raw: &str) -> Result<String> {
    let parts = segments(trim_outer(raw))?;
    if parts.is_empty() {
        return Err(CoreError::InvalidPath(
            raw.to_string(),
            "a file path needs a file name",
        ));
    }
    Ok(format!("/{}", parts.join("/")))
}

/// Returns the directory containing a normalized path, or `None` for the root.
pub fn parent_directory(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.rfind('/') {
        Some(idx) => Some(&path[..=idx]),
        None => Some(ROOT),
    }
}

/// Returns the final segment of a path; empty for the root.
pub fn last_segment(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Returns the extension of the final segment without the dot.
///
/// Dot-files such as `.hidden` have no extension.
pub fn file_extension(path: &str) -> Option<&str> {
    let name = last_segment(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => Some(&name[idx + 1..]),
        _ => None,
    }
}

/// Combines a base path and a relative (or absolute) tail into a directory path.
pub fn combine_directory(base: &str, tail: &str) -> Result<String> {
    normalize_directory(&format!("{base}/{tail}"))
}

/// Combines a directory and a file name (or relative file path) into a file path.
pub fn combine_file(base: &str, tail: &str) -> Result<String> {
    normalize_file(&format!("{base}/{tail}"))
}

/// Returns `true` if `path` equals `ancestor` or lies below it.
///
/// Both arguments must be normalized; `ancestor` is a directory path.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    path.len() >= ancestor.len()
        && path.as_bytes()[..ancestor.len()].eq_ignore_ascii_case(ancestor.as_bytes())
}

/// Case-insensitive substring test of a path fragment against a haystack.
///
/// Surrounding slashes on the fragment are ignored so `"/Docs/"` and `"Docs"`
/// are the same fragment. Empty fragments never match.
pub fn contains_fragment(haystack: &str, fragment: &str) -> bool {
    let fragment = fragment.trim().trim_matches('/');
    if fragment.is_empty() {
        return false;
    }
    haystack
        .to_ascii_lowercase()
        .contains(&fragment.to_ascii_lowercase())
}

fn hash_ignore_case<H: Hasher>(value: &str, state: &mut H) {
    for byte in value.bytes() {
        state.write_u8(byte.to_ascii_lowercase());
    }
    state.write_u8(0xff);
}

fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.bytes()
        .map(|b| b.to_ascii_lowercase())
        .cmp(b.bytes().map(|b| b.to_ascii_lowercase()))
}

/// Orders entry names ignoring ASCII case, falling back to byte order.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    cmp_ignore_case(a, b).then_with(|| a.cmp(b))
}

macro_rules! storage_path_traits {
    ($ty:ident) => {
        impl $ty {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.0.eq_ignore_ascii_case(&other.0)
            }
        }

        impl Eq for $ty {}

        impl Hash for $ty {
            fn hash<H: Hasher>(&self, state: &mut H) {
                hash_ignore_case(&self.0, state);
            }
        }

        impl PartialOrd for $ty {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $ty {
            fn cmp(&self, other: &Self) -> Ordering {
                cmp_ignore_case(&self.0, &other.0)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $ty {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $ty {
            type Error = CoreError;

            fn try_from(value: String) -> Result<Self> {
                Self::new(&value)
            }
        }

        impl TryFrom<&str> for $ty {
            type Error = CoreError;

            fn try_from(value: &str) -> Result<Self> {
                Self::new(value)
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.0
            }
        }
    };
}

/// A normalized directory path on the device.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DirectoryPath(String);

storage_path_traits!(DirectoryPath);

impl DirectoryPath {
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        normalize_directory(raw.as_ref()).map(Self)
    }

    pub fn root() -> Self {
        Self(ROOT.to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT
    }

    /// The last segment of the path, or `/` for the root.
    pub fn name(&self) -> &str {
        if self.is_root() {
            ROOT
        } else {
            last_segment(&self.0)
        }
    }

    pub fn parent(&self) -> Option<DirectoryPath> {
        parent_directory(&self.0).map(|p| Self(p.to_string()))
    }

    /// All ancestors from the immediate parent up to and including the root.
    pub fn ancestors(&self) -> Vec<DirectoryPath> {
        let mut out = Vec::new();
        let mut current = self.parent();
        while let Some(dir) = current {
            current = dir.parent();
            out.push(dir);
        }
        out
    }

    /// Number of segments below the root; the root itself has depth 0.
    pub fn depth(&self) -> usize {
        self.0.split('/').filter(|s| !s.is_empty()).count()
    }

    pub fn join(&self, tail: &str) -> Result<DirectoryPath> {
        combine_directory(&self.0, tail).map(Self)
    }

    pub fn join_file(&self, name: &str) -> Result<FilePath> {
        combine_file(&self.0, name).map(FilePath)
    }

    /// `true` if `other` is this directory or one of its descendants.
    pub fn contains(&self, other: &DirectoryPath) -> bool {
        is_within(&other.0, &self.0)
    }

    /// `true` if `other` is exactly one level below this directory.
    pub fn is_parent_of(&self, other: &DirectoryPath) -> bool {
        other.parent().is_some_and(|p| &p == self)
    }
}

impl Default for DirectoryPath {
    fn default() -> Self {
        Self::root()
    }
}

/// A normalized file path on the device.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FilePath(String);

storage_path_traits!(FilePath);

impl FilePath {
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        normalize_file(raw.as_ref()).map(Self)
    }

    pub fn name(&self) -> &str {
        last_segment(&self.0)
    }

    pub fn extension(&self) -> Option<&str> {
        file_extension(&self.0)
    }

    pub fn directory(&self) -> DirectoryPath {
        DirectoryPath(
            parent_directory(&self.0)
                .unwrap_or(ROOT)
                .to_string(),
        )
    }

    /// `true` if the file lives in `dir` or any of its descendants.
    pub fn is_within(&self, dir: &DirectoryPath) -> bool {
        is_within(&self.0, dir.as_str())
    }

    /// The same file name placed in another directory.
    pub fn with_directory(&self, dir: &DirectoryPath) -> FilePath {
        FilePath(format!("{}{}", dir.as_str(), self.name()))
    }
}
