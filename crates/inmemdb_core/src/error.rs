//! Error types for InMemDB core.

use crate::types::{TransactionId, TransactionState};
use inmemdb_storage::StorageError;
use inmemdb_value::CopyError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Boxed error carried as the cause of a failed transaction.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in InMemDB core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Store error (invalid argument, type mismatch, numeric overflow).
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A value placed into a transaction could not be copied.
    #[error("uncopyable value: {0}")]
    Uncopyable(#[from] CopyError),

    /// Operation attempted on a transaction that is no longer active.
    #[error("transaction {id} is not active (state: {state})")]
    NotActive {
        /// The transaction.
        id: TransactionId,
        /// Its current state.
        state: TransactionState,
    },

    /// Operation cannot run inside a transaction.
    #[error("{operation} is not supported within a transaction")]
    Unsupported {
        /// Name of the rejected operation.
        operation: &'static str,
    },

    /// Commit failed, or a managed transaction's operation returned an error.
    #[error("transaction {id} failed: {source}")]
    TransactionFailed {
        /// The transaction.
        id: TransactionId,
        /// The underlying cause.
        #[source]
        source: BoxError,
    },
}

impl CoreError {
    /// Creates a not active error.
    pub fn not_active(id: TransactionId, state: TransactionState) -> Self {
        Self::NotActive { id, state }
    }

    /// Creates an unsupported operation error.
    pub fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }

    /// Creates a transaction failed error.
    pub fn transaction_failed(id: TransactionId, source: impl Into<BoxError>) -> Self {
        Self::TransactionFailed {
            id,
            source: source.into(),
        }
    }

    /// Returns true for [`CoreError::NotActive`].
    #[must_use]
    pub fn is_not_active(&self) -> bool {
        matches!(self, Self::NotActive { .. })
    }
}
