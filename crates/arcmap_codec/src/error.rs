//! Error types for the codecs.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding wire data.
#[derive(Debug, Error)]
pub enum CodecError {
    /// JSON serialization or parse error.
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// The binary stream ended before a field was complete.
    #[error("unexpected end of input: need {need} bytes, {have} available")]
    UnexpectedEof {
        /// Bytes required by the next field.
        need: usize,
        /// Bytes remaining in the input.
        have: usize,
    },

    /// The binary stream continued past the declared record count.
    #[error("{trailing} trailing bytes after decoded stream")]
    TrailingBytes {
        /// Number of unconsumed bytes.
        trailing: usize,
    },

    /// A string field held invalid UTF-8.
    #[error("invalid UTF-8 in string field: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}
