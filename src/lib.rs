// Declare all modules as public so they can be used by hosts and tests.
pub mod config;
pub mod core;
pub mod utils;

pub use crate::config::StorageSettings;
pub use crate::core::error::{CoreError, Result};
pub use crate::core::path::{DirectoryPath, FilePath};
pub use crate::core::{
    CacheEntry, CachedStorageService, FileRecord, LaunchHistory, LocalDevice, StorageCache,
    StorageDevice, StorageScope,
};
pub use crate::utils::file_detection::{FileType, FilterType};
