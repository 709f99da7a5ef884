//! Error types for vrct-core

use std::path::PathBuf;

/// Result type for vrct-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in vrct-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Filesystem layer error
    #[error(transparent)]
    Fs(#[from] vrct_fs::Error),

    /// Content codec or merge error
    #[error(transparent)]
    Content(#[from] vrct_content::Error),

    /// A prototype has no layers and no real file to fall back on
    #[error("No content source for {path}: no layers and no real file")]
    NoSource { path: PathBuf },

    /// Operation is invalid for the path's declared format
    #[error("Unsupported format for {path}: {message}")]
    UnsupportedFormat { path: PathBuf, message: String },

    /// Path does not exist, virtually or on the real filesystem
    #[error("Path not found: {path}")]
    PathNotFound { path: PathBuf },

    /// Unknown transaction id
    #[error("Transaction {id} not found")]
    TransactionNotFound { id: u64 },

    /// A journal backup no longer matches its recorded checksum
    #[error("Backup for {path} failed checksum verification")]
    BackupChecksum { path: PathBuf },

    /// A revert rule callback reported failure
    #[error("Rule callback failed for {rule}: {message}")]
    RuleCallback { rule: String, message: String },

    /// A metadata record or transaction file could not be read or written
    #[error("Invalid metadata record at {path}: {message}")]
    Record { path: PathBuf, message: String },
}

impl Error {
    /// Create an unsupported-format error with path context
    pub fn unsupported_format(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a record error with path context
    pub fn record(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Record {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a rule callback error
    pub fn rule_callback(rule: impl Into<String>, message: impl ToString) -> Self {
        Self::RuleCallback {
            rule: rule.into(),
            message: message.to_string(),
        }
    }
}
