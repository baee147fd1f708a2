//! Store configuration.

use crate::error::{StorageError, StorageResult};

/// Configuration for creating a [`ConcurrentStore`](crate::ConcurrentStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Number of entries to pre-allocate room for.
    pub initial_capacity: usize,

    /// Number of internal shards, or `None` for the default.
    ///
    /// Must be a power of two greater than one.
    pub shard_amount: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            shard_amount: None,
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial capacity.
    #[must_use]
    pub const fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Sets the shard count.
    #[must_use]
    pub const fn shard_amount(mut self, shards: usize) -> Self {
        self.shard_amount = Some(shards);
        self
    }

    /// Checks that the configuration can build a store.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidArgument`] if the shard count is not a
    /// power of two greater than one.
    pub fn validate(&self) -> StorageResult<()> {
        match self.shard_amount {
            Some(shards) if shards <= 1 || !shards.is_power_of_two() => {
                Err(StorageError::invalid_argument(format!(
                    "shard amount must be a power of two greater than 1, got {shards}"
                )))
            }
            _ => Ok(()),
        }
    }
}
