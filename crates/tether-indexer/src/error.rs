//! Indexer error types.

use std::path::PathBuf;
use tether_core::CoreError;
use thiserror::Error;

/// Errors that can occur while building a dependency graph.
#[derive(Debug, Error)]
pub enum IndexError {
    /// I/O error reading a symbol export
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Symbol export is not valid JSON for the expected shape
    #[error("Invalid symbol export {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Precondition violation on a path or root
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Project root missing or not a directory
    #[error("Project root not found: {0}")]
    RootNotFound(PathBuf),

    /// Worker pool could not be created
    #[error("Worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Build aborted through its cancellation flag
    #[error("Dependency graph build cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IndexError::RootNotFound(PathBuf::from("/test/path"));
        assert!(err.to_string().contains("/test/path"));
    }

    #[test]
    fn test_core_error_conversion() {
        let err: IndexError = CoreError::RelativePath(PathBuf::from("x")).into();
        assert!(matches!(err, IndexError::Core(_)));
    }
}
