//! Error types for CBOR encoding

use thiserror::Error;

/// CBOR writer error types
#[derive(Debug, Error)]
pub enum CborError {
    /// Argument rejected before anything was written (negative length, reserved simple value).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Map closed while a key is still waiting for its value.
    #[error("Unbalanced map: key written without a matching value")]
    UnbalancedMap,
    /// Key encoding is byte-for-byte identical to a key already accepted in the same map.
    ///
    /// The duplicate key bytes are left in the buffer.
    #[error("Duplicate map key")]
    DuplicateKey,
    /// Call is not valid in the writer's current nesting state.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    /// A configured limit was exceeded.
    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),
    /// I/O operation failed while flushing encoded data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON parsing or conversion failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Internal invariant was violated.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CborError {
    /// True for errors caused by the caller's call sequence rather than an internal fault.
    pub fn is_usage_error(&self) -> bool {
        !matches!(self, CborError::Internal(_) | CborError::Io(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, CborError>;
