//! Error types for the map engine.

use thiserror::Error;

/// Result type for engine operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in map operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Store backend error.
    #[error("storage error: {0}")]
    Storage(#[from] arcmap_storage::StorageError),

    /// Wire format error.
    #[error("codec error: {0}")]
    Codec(#[from] arcmap_codec::CodecError),

    /// The requested key is not present in the map.
    ///
    /// Non-fatal; distinct from I/O and decode failures.
    #[error("key not found: {key}")]
    KeyNotFound {
        /// The missing key, rendered for display.
        key: String,
    },

    /// The topology no longer forms a gap-free partition, or the segment
    /// map lacks an entry for an interval.
    #[error("corrupt topology: {message}")]
    CorruptTopology {
        /// Description of the inconsistency.
        message: String,
    },

    /// `sync` was invoked on a map opened without a writer.
    #[error("sync requires a writer")]
    MissingWriter,
}

impl CoreError {
    /// Creates a key-not-found error.
    pub fn key_not_found(key: impl std::fmt::Display) -> Self {
        Self::KeyNotFound {
            key: key.to_string(),
        }
    }

    /// Creates a corrupt-topology error.
    pub fn corrupt_topology(message: impl Into<String>) -> Self {
        Self::CorruptTopology {
            message: message.into(),
        }
    }

    /// Whether this error is the non-fatal missing-key signal.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound { .. })
    }
}
