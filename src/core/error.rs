//! Defines the custom error type for the `core` module.

use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for the `core` module.
///
/// Expected absence (a missing directory, a banned path, a query that reduces
/// to nothing, an empty selection scope) is never reported through this type;
/// those cases surface as `None` or empty collections. Variants here describe
/// programmer errors or failures of the storage device collaborator.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A path string could not be normalized into a Unix-style storage path.
    #[error("Invalid storage path '{0}': {1}")]
    InvalidPath(String, &'static str),

    /// A file-type tag that does not name any known file type.
    #[error("Unknown file type tag: {0}")]
    UnknownFileType(String),

    /// Represents an I/O error, typically from a local device mirror.
    #[error("I/O error for path {1}: {0}")]
    Io(#[source] std::io::Error, PathBuf),

    /// Represents an error that occurred when a Tokio task was joined.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// The storage device reported a failure for a request.
    #[error("Storage device error: {0}")]
    Device(String),

    /// Represents a user-initiated cancellation of an operation.
    #[error("Operation was cancelled by the user")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, CoreError>;
