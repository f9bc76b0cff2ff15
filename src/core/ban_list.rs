use super::path::{contains_fragment, DirectoryPath, FilePath};

/// Compiled ban list for directories and file names.
///
/// Entries are substrings; a directory is banned when its path contains any
/// banned directory fragment, a file when its name contains any banned file
/// fragment. Matching ignores ASCII case. The root directory is never banned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BanList {
    directories: Vec<String>,
    files: Vec<String>,
}

impl BanList {
    /// Builds a ban list from configured patterns.
    ///
    /// Blank lines and lines starting with `#` are skipped, as in ignore files.
    pub fn new<D, F>(directories: D, files: F) -> Self
    where
        D: IntoIterator,
        D::Item: AsRef<str>,
        F: IntoIterator,
        F::Item: AsRef<str>,
    {
        Self {
            directories: compile(directories),
            files: compile(files),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.files.is_empty()
    }

    pub fn is_banned_directory(&self, dir: &DirectoryPath) -> bool {
        if dir.is_root() {
            return false;
        }
        self.directories
            .iter()
            .any(|fragment| contains_fragment(dir.as_str(), fragment))
    }

    pub fn is_banned_file_name(&self, name: &str) -> bool {
        self.files
            .iter()
            .any(|fragment| contains_fragment(name, fragment))
    }

    /// A file is banned by its own name or by any banned directory above it.
    pub fn is_banned_file(&self, path: &FilePath) -> bool {
        self.is_banned_file_name(path.name()) || self.is_banned_directory(&path.directory())
    }
}

fn compile<I>(patterns: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    patterns
        .into_iter()
        .filter_map(|pattern| {
            let trimmed = pattern.as_ref().trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                return None;
            }
            let fragment = trimmed.trim_matches('/');
            (!fragment.is_empty()).then(|| fragment.to_string())
        })
        .collect()
}
