//! Error types for vrct-fs

use std::path::PathBuf;

/// Result type for vrct-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in vrct-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File lock acquisition failed
    #[error("Failed to acquire lock on {path}")]
    LockFailed { path: PathBuf },
}

impl Error {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
