//! File-type detection from storage file names.

use crate::core::error::{CoreError, Result};
use crate::core::path::file_extension;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kinds of files the device knows how to launch or display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FileType {
    Sid,
    Prg,
    P00,
    Crt,
    D64,
    Hex,
    Kla,
    Koa,
    Art,
    Aas,
    Hpi,
    Seq,
    Txt,
    Nfo,
    Unknown,
}

/// Extension table; extensions are compared lowercase and without the dot.
const EXTENSIONS: &[(&str, FileType)] = &[
    ("sid", FileType::Sid),
    ("prg", FileType::Prg),
    ("p00", FileType::P00),
    ("crt", FileType::Crt),
    ("d64", FileType::D64),
    ("hex", FileType::Hex),
    ("kla", FileType::Kla),
    ("koa", FileType::Koa),
    ("art", FileType::Art),
    ("aas", FileType::Aas),
    ("hpi", FileType::Hpi),
    ("seq", FileType::Seq),
    ("txt", FileType::Txt),
    ("nfo", FileType::Nfo),
];

impl FileType {
    /// Every type that can be launched on the device.
    pub const LAUNCHABLE: &'static [FileType] = &[
        FileType::Sid,
        FileType::Prg,
        FileType::P00,
        FileType::Crt,
        FileType::D64,
        FileType::Kla,
        FileType::Koa,
        FileType::Art,
        FileType::Aas,
        FileType::Hpi,
        FileType::Seq,
        FileType::Txt,
        FileType::Nfo,
    ];

    pub fn from_extension(extension: &str) -> FileType {
        let lower = extension.trim_start_matches('.').to_ascii_lowercase();
        EXTENSIONS
            .iter()
            .find(|(ext, _)| *ext == lower)
            .map(|(_, file_type)| *file_type)
            .unwrap_or(FileType::Unknown)
    }

    pub fn extension(self) -> Option<&'static str> {
        EXTENSIONS
            .iter()
            .find(|(_, file_type)| *file_type == self)
            .map(|(ext, _)| *ext)
    }

    pub fn is_launchable(self) -> bool {
        Self::LAUNCHABLE.contains(&self)
    }

    pub fn filter_type(self) -> FilterType {
        match self {
            FileType::Sid => FilterType::Music,
            FileType::Prg | FileType::P00 | FileType::Crt | FileType::D64 => FilterType::Games,
            FileType::Hex => FilterType::Hex,
            FileType::Kla
            | FileType::Koa
            | FileType::Art
            | FileType::Aas
            | FileType::Hpi
            | FileType::Seq
            | FileType::Txt
            | FileType::Nfo => FilterType::Images,
            FileType::Unknown => FilterType::All,
        }
    }
}

impl From<FileType> for FilterType {
    fn from(value: FileType) -> Self {
        value.filter_type()
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.extension() {
            Some(ext) => f.write_str(&ext.to_ascii_uppercase()),
            None => f.write_str("UNKNOWN"),
        }
    }
}

impl FromStr for FileType {
    type Err = CoreError;

    /// Parses a file-type tag such as `"crt"`, `".SID"` or `"Unknown"`.
    fn from_str(s: &str) -> Result<Self> {
        let tag = s.trim();
        if tag.eq_ignore_ascii_case("unknown") {
            return Ok(FileType::Unknown);
        }
        match FileType::from_extension(tag) {
            FileType::Unknown => Err(CoreError::UnknownFileType(tag.to_string())),
            known => Ok(known),
        }
    }
}

/// Detects the file type of a storage path or bare file name.
pub fn detect_file_type(path: &str) -> FileType {
    file_extension(path)
        .map(FileType::from_extension)
        .unwrap_or(FileType::Unknown)
}

/// User-facing groupings of file types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FilterType {
    #[default]
    All,
    Games,
    Music,
    Hex,
    Images,
}

impl FilterType {
    /// The file types that belong to this group.
    pub fn file_types(self) -> Vec<FileType> {
        match self {
            FilterType::All => FileType::LAUNCHABLE.to_vec(),
            group => FileType::LAUNCHABLE
                .iter()
                .chain(std::iter::once(&FileType::Hex))
                .copied()
                .filter(|t| FilterType::from(*t) == group)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_types_case_insensitively() {
        assert_eq!(detect_file_type("/games/A.CRT"), FileType::Crt);
        assert_eq!(detect_file_type("/music/Commando.sid"), FileType::Sid);
        assert_eq!(detect_file_type("/readme"), FileType::Unknown);
        assert_eq!(detect_file_type("/archive.tar.gz"), FileType::Unknown);
    }

    #[test]
    fn test_parse_tag() {
        assert_eq!("prg".parse::<FileType>().unwrap(), FileType::Prg);
        assert_eq!(".SID".parse::<FileType>().unwrap(), FileType::Sid);
        assert_eq!("unknown".parse::<FileType>().unwrap(), FileType::Unknown);
        assert!(matches!(
            "mp3".parse::<FileType>(),
            Err(CoreError::UnknownFileType(tag)) if tag == "mp3"
        ));
    }

    #[test]
    fn test_filter_groups() {
        assert_eq!(FilterType::Music.file_types(), vec![FileType::Sid]);
        assert_eq!(FilterType::Hex.file_types(), vec![FileType::Hex]);
        assert!(FilterType::Games.file_types().contains(&FileType::D64));
        assert!(!FilterType::All.file_types().contains(&FileType::Hex));
        assert!(!FileType::Unknown.is_launchable());
    }
}
