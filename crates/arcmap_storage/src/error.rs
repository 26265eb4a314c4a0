//! Error types for store operations.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in a store backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The store directory could not be created or opened.
    #[error("store unavailable at {path}: {message}")]
    Unavailable {
        /// Path of the store root.
        path: String,
        /// Description of the failure.
        message: String,
    },
}

impl StorageError {
    /// Creates a store-unavailable error.
    pub fn unavailable(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            path: path.into(),
            message: message.into(),
        }
    }
}
