//! Error types for the snapshot store.

use crate::kind::SnapshotKind;
use thiserror::Error;

/// Result type for snapshot store operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Errors that can occur in the snapshot store.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The payload is malformed or lacks its key field.
    ///
    /// Raised before any write is attempted.
    #[error("{message}")]
    Validation {
        /// Description of the defect.
        message: String,
    },

    /// No report is stored under the requested key.
    #[error("{kind} report not found: {key}")]
    NotFound {
        /// Kind that was queried.
        kind: SnapshotKind,
        /// Key that was queried.
        key: String,
    },

    /// The backing log failed.
    #[error("storage error: {0}")]
    Storage(#[from] vvtv_storage::StorageError),

    /// A partial append could not be rolled back; writes are refused
    /// until the store is reopened.
    #[error("snapshot log needs recovery: {message}")]
    NeedsRecovery {
        /// The rollback failure.
        message: String,
    },

    /// The log holds a damaged record before its tail.
    #[error("snapshot log corrupted at offset {offset}: {message}")]
    Corrupted {
        /// Byte offset of the damaged record.
        offset: u64,
        /// Description of the damage.
        message: String,
    },
}

impl SnapshotError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a corruption error.
    pub fn corrupted(offset: u64, message: impl Into<String>) -> Self {
        Self::Corrupted {
            offset,
            message: message.into(),
        }
    }

    /// Returns true if the caller sent something wrong.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::NotFound { .. })
    }

    /// Returns true if persistence failed; the caller may retry later.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Storage(_) | Self::NeedsRecovery { .. } | Self::Corrupted { .. }
        )
    }
}
