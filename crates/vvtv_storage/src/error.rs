//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Another process holds the log file lock.
    #[error("log file is locked by another process: {}", path.display())]
    Locked {
        /// Path of the locked log file.
        path: PathBuf,
    },

    /// Attempted to truncate beyond the end of the log.
    #[error("cannot truncate to {requested} bytes, log is only {size} bytes")]
    InvalidTruncate {
        /// The requested new size.
        requested: u64,
        /// The current log size.
        size: u64,
    },
}
