//! Database facade.

use crate::error::{BoxError, CoreResult};
use crate::transaction::{SharedStore, Transaction, TransactionManager};
use inmemdb_storage::{ConcurrentStore, KeyValueStore, StoreConfig};
use inmemdb_value::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// The main database handle.
///
/// `Database` is the primary entry point for interacting with InMemDB.
/// It owns a [`ConcurrentStore`] keyed by strings and a
/// [`TransactionManager`] bound to it, and provides:
/// - Direct reads and writes against the store
/// - Transactions, either driven by hand or managed
///
/// # Example
///
/// ```rust
/// use inmemdb_core::{Database, KeyValueStore, Number, Value};
///
/// let db = Database::new();
/// db.set("a", 1).unwrap();
/// assert_eq!(
///     db.store().increment_and_get("a".to_string(), 5).unwrap(),
///     Number::Int(6)
/// );
///
/// let txn = db.begin_transaction();
/// txn.put("a".to_string(), Value::Int(100)).unwrap();
/// assert_eq!(db.get("a").unwrap(), Some(Value::Int(6)));
/// txn.commit().unwrap();
/// assert_eq!(db.get("a").unwrap(), Some(Value::Int(100)));
/// ```
pub struct Database {
    /// The shared store.
    store: Arc<ConcurrentStore<String, Value>>,
    /// Transaction manager over `store`.
    txn_manager: TransactionManager<String, Value>,
}

impl Database {
    /// Creates an empty database with default store settings.
    #[must_use]
    pub fn new() -> Self {
        Self::from_store(ConcurrentStore::new())
    }

    /// Creates an empty database whose store is built from `config`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the configuration is invalid.
    pub fn with_config(config: &StoreConfig) -> CoreResult<Self> {
        Ok(Self::from_store(ConcurrentStore::with_config(config)?))
    }

    fn from_store(store: ConcurrentStore<String, Value>) -> Self {
        let store = Arc::new(store);
        let shared: SharedStore<String, Value> = store.clone();
        let txn_manager = TransactionManager::new(shared);
        info!("database initialized with store and transaction manager");
        Self { store, txn_manager }
    }

    /// Returns the shared store.
    #[must_use]
    pub fn store(&self) -> &Arc<ConcurrentStore<String, Value>> {
        &self.store
    }

    /// Returns the transaction manager.
    #[must_use]
    pub fn transaction_manager(&self) -> &TransactionManager<String, Value> {
        &self.txn_manager
    }

    /// Begins a new transaction.
    pub fn begin_transaction(&self) -> Arc<Transaction<String, Value>> {
        self.txn_manager.begin_transaction()
    }

    /// Executes a function within a managed transaction.
    ///
    /// See [`TransactionManager::execute_transaction`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::TransactionFailed`] if the function or the
    /// commit fails.
    pub fn execute_transaction<T, E, F>(&self, operation: F) -> CoreResult<T>
    where
        E: Into<BoxError>,
        F: FnOnce(&Transaction<String, Value>) -> Result<T, E>,
    {
        self.txn_manager.execute_transaction(operation)
    }

    /// Executes a function without a result within a managed transaction.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::TransactionFailed`] if the function or the
    /// commit fails.
    pub fn run_transaction<E, F>(&self, operation: F) -> CoreResult<()>
    where
        E: Into<BoxError>,
        F: FnOnce(&Transaction<String, Value>) -> Result<(), E>,
    {
        self.txn_manager.run_transaction(operation)
    }

    /// Stores a value outside any transaction, returning the previous one.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store rejects the write.
    pub fn set(
        &self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> CoreResult<Option<Value>> {
        let key = key.into();
        let value = value.into();
        debug!(key = %key, value_type = value.type_name(), "set");
        Ok(self.store.put(key, value)?)
    }

    /// Reads a value outside any transaction.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store rejects the read.
    pub fn get(&self, key: &str) -> CoreResult<Option<Value>> {
        Ok(self.store.get(&key.to_owned())?)
    }

    /// Deletes a value outside any transaction, returning it.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store rejects the delete.
    pub fn delete(&self, key: &str) -> CoreResult<Option<Value>> {
        let deleted = self.store.delete(&key.to_owned())?;
        debug!(key, found = deleted.is_some(), "delete");
        Ok(deleted)
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("store", &self.store)
            .field("txn_manager", &self.txn_manager)
            .finish()
    }
}
