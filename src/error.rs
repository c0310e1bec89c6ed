// In: src/error.rs

//! This module defines the single, unified error type for the tambak substream engine.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.

use std::fmt;
use thiserror::Error;

/// The direction of a bulk operation, used to word `MultipleStreamsRequired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkDirection {
    Serialize,
    Deserialize,
}

impl fmt::Display for BulkDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BulkDirection::Serialize => write!(f, "serialized"),
            BulkDirection::Deserialize => write!(f, "deserialized"),
        }
    }
}

#[derive(Error, Debug)]
pub enum TambakError {
    // =========================================================================
    // === High-Level, Semantic Errors (Specific to the substream engine)
    // =========================================================================
    /// A composite column was routed to a single-stream bulk routine.
    #[error("Column {column} must be {direction} with multiple streams")]
    MultipleStreamsRequired {
        column: String,
        direction: BulkDirection,
    },

    /// `create_from_path` was called with a prefix that does not index the path.
    #[error("Invalid substream path prefix {prefix_len} for path of length {path_len}")]
    InvalidPathPrefix { prefix_len: usize, path_len: usize },

    #[error("Unsupported data type for this operation: {0}")]
    UnsupportedType(String),

    #[error("Column does not match serialization: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Failed to parse data type '{input}': {reason}")]
    TypeParseError { input: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid substream descriptor: {0}")]
    InvalidSubstream(String),

    #[error("Stream of column {column} ended in the middle of a value")]
    TruncatedStream { column: String },

    #[error("Corrupted stream data: {0}")]
    CorruptedStream(String),

    #[error("Internal logic error (this is a bug): {0}")]
    InternalError(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the Arrow library.
    #[error("Arrow operation failed: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// An error originating from a caller-supplied stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library, typically while loading configuration.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    // =========================================================================
    // === Low-Level Kernel Errors
    // =========================================================================
    #[error("Buffer length mismatch: expected a multiple of {0}, got {1}")]
    BufferMismatch(usize, usize),

    #[error("Zstd operation failed: {0}")]
    ZstdError(String),

    #[error("LEB128 decoding error: {0}")]
    Leb128DecodeError(String),
}

impl TambakError {
    pub(crate) fn multiple_streams_required(column: &str, direction: BulkDirection) -> Self {
        TambakError::MultipleStreamsRequired {
            column: column.to_string(),
            direction,
        }
    }
}

#[cfg(feature = "python")]
impl From<TambakError> for pyo3::PyErr {
    fn from(err: TambakError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
