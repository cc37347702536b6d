//! Error types for the graph model and the graph store

use std::path::PathBuf;
use thiserror::Error;

/// Precondition violations on core values.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A file or root path was not absolute
    #[error("path is not absolute: {0}")]
    RelativePath(PathBuf),
}

/// Errors raised while persisting or reloading a dependency graph.
///
/// Every variant other than `Io` means the artifact is unusable and the graph
/// has to be rebuilt.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unsupported graph format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Referenced file does not exist: {0}")]
    MissingFile(PathBuf),

    #[error("Path escapes the project root: {0}")]
    EscapesRoot(String),

    #[error("File {file} is outside project root {root}")]
    OutsideRoot { file: PathBuf, root: PathBuf },

    #[error("Project root is not a directory: {0}")]
    InvalidRoot(PathBuf),

    #[error("Upstream and downstream maps are not transposes of each other")]
    Inconsistent,
}

impl StoreError {
    /// Whether this error only means "no usable cache" rather than a failed operation.
    pub fn is_stale_cache(&self) -> bool {
        !matches!(self, StoreError::Io(_) | StoreError::InvalidRoot(_))
    }
}
