//! Error types for storage operations.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// An argument was rejected before touching the store.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the rejected argument.
        message: String,
    },

    /// The stored value has the wrong type for the requested operation.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// The kind the operation needs.
        expected: String,
        /// The kind that is stored.
        found: String,
    },

    /// A numeric operation does not fit the stored kind.
    #[error("numeric overflow: {kind} value cannot absorb delta {delta}")]
    NumericOverflow {
        /// The stored numeric kind.
        kind: &'static str,
        /// The requested delta.
        delta: i64,
    },
}

impl StorageError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}
