use crate::core::path::FilePath;
use crate::core::FileRecord;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

static LOGGING_INIT: Once = Once::new();

/// Initializes the tracing subscriber for tests.
///
/// Guarded by a `Once` so parallel tests share one global subscriber. Without
/// `RUST_LOG` only warnings from this crate are shown.
pub fn setup_test_logging() {
    LOGGING_INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("remote_storage_cache=warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// A bare file record for fixtures.
///
/// # Panics
/// If `path` is not a valid storage file path.
pub fn fixture_record(path: &str, size: u64) -> FileRecord {
    let path = FilePath::new(path).unwrap_or_else(|e| panic!("bad fixture path: {e}"));
    FileRecord::new(path, size)
}
