//! Error types for the value crate.

use thiserror::Error;

/// Result type for copy operations.
pub type CopyResult<T> = Result<T, CopyError>;

/// Errors that can occur while producing an independent copy of a value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CopyError {
    /// The value holds a payload with no copy capability.
    #[error("value of type {type_name} cannot be copied")]
    Uncopyable {
        /// Name of the payload type.
        type_name: String,
    },
}

impl CopyError {
    /// Creates an uncopyable value error.
    pub fn uncopyable(type_name: impl Into<String>) -> Self {
        Self::Uncopyable {
            type_name: type_name.into(),
        }
    }
}
