//! Transaction manager.

use crate::error::{BoxError, CoreError, CoreResult};
use crate::transaction::state::{SharedStore, Transaction};
use crate::types::TransactionId;
use inmemdb_storage::{StoreKey, StoreValue};
use inmemdb_value::{DeepCopy, Value};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Shared side of the coordination lock.
pub type ReadLockGuard<'a> = RwLockReadGuard<'a, ()>;

/// Exclusive side of the coordination lock.
pub type WriteLockGuard<'a> = RwLockWriteGuard<'a, ()>;

/// Creates and tracks transactions over one store.
///
/// The transaction manager provides:
/// - Transaction creation with unique identifiers
/// - A registry of begun transactions
/// - Managed execution that commits on success and rolls back on failure
/// - A coordination lock for callers that need coarse-grained exclusivity
///
/// ## Registry
///
/// Transactions are registered by [`begin_transaction`](Self::begin_transaction).
/// Managed execution deregisters its transaction when it finishes.
/// Transactions driven by hand stay registered until
/// [`remove_transaction`](Self::remove_transaction) is called.
///
/// ## Coordination lock
///
/// The manager never takes the coordination lock itself. Commits of
/// different transactions do not serialize with each other.
pub struct TransactionManager<K = String, V = Value> {
    /// The store transactions read through to and commit into.
    store: SharedStore<K, V>,
    /// Next transaction sequence number.
    next_txid: AtomicU64,
    /// Registered transactions.
    active_txns: RwLock<HashMap<TransactionId, Arc<Transaction<K, V>>>>,
    /// Lock exposed to callers, never acquired internally.
    coordination_lock: RwLock<()>,
}

impl<K: StoreKey, V: StoreValue + DeepCopy> TransactionManager<K, V> {
    /// Creates a new transaction manager over `store`.
    pub fn new(store: SharedStore<K, V>) -> Self {
        Self {
            store,
            next_txid: AtomicU64::new(1),
            active_txns: RwLock::new(HashMap::new()),
            coordination_lock: RwLock::new(()),
        }
    }

    /// Returns the store this manager's transactions commit into.
    #[must_use]
    pub fn store(&self) -> &SharedStore<K, V> {
        &self.store
    }

    /// Begins and registers a new transaction.
    pub fn begin_transaction(&self) -> Arc<Transaction<K, V>> {
        let id = TransactionId::generate(self.next_txid.fetch_add(1, Ordering::SeqCst));
        let txn = Arc::new(Transaction::new(id, Arc::clone(&self.store)));
        self.active_txns.write().insert(id, Arc::clone(&txn));
        debug!(txn = %id, "transaction begun");
        txn
    }

    /// Runs `operation` in a new transaction and commits it.
    ///
    /// If `operation` returns an error, or panics, the transaction is
    /// rolled back. The transaction is deregistered in every case.
    ///
    /// # Example
    ///
    /// ```rust
    /// use inmemdb_core::{CoreError, Database, Value};
    ///
    /// let db = Database::new();
    /// let total = db
    ///     .execute_transaction(|txn| {
    ///         txn.put("a".to_string(), Value::Int(2))?;
    ///         txn.put("b".to_string(), Value::Int(3))?;
    ///         Ok::<_, CoreError>(5)
    ///     })
    ///     .unwrap();
    /// assert_eq!(total, 5);
    /// assert_eq!(db.get("a").unwrap(), Some(Value::Int(2)));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TransactionFailed`] wrapping the error of
    /// `operation` or of the commit.
    pub fn execute_transaction<T, E, F>(&self, operation: F) -> CoreResult<T>
    where
        E: Into<BoxError>,
        F: FnOnce(&Transaction<K, V>) -> Result<T, E>,
    {
        let registration = Registration {
            manager: self,
            txn: self.begin_transaction(),
        };
        let txn: &Transaction<K, V> = &registration.txn;
        let id = txn.id();

        let value = match operation(txn) {
            Ok(value) => value,
            Err(err) => {
                let source = err.into();
                warn!(txn = %id, error = %source, "transaction operation failed, rolling back");
                txn.rollback();
                return Err(CoreError::transaction_failed(id, source));
            }
        };

        match txn.commit() {
            Ok(()) => Ok(value),
            Err(err @ CoreError::TransactionFailed { .. }) => Err(err),
            Err(err) => Err(CoreError::transaction_failed(id, err)),
        }
    }

    /// Runs `operation` in a new transaction and commits it.
    ///
    /// Same as [`execute_transaction`](Self::execute_transaction) for
    /// operations without a result.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TransactionFailed`] wrapping the error of
    /// `operation` or of the commit.
    pub fn run_transaction<E, F>(&self, operation: F) -> CoreResult<()>
    where
        E: Into<BoxError>,
        F: FnOnce(&Transaction<K, V>) -> Result<(), E>,
    {
        self.execute_transaction(operation)
    }

    /// Returns a registered transaction.
    #[must_use]
    pub fn get_transaction(&self, id: TransactionId) -> Option<Arc<Transaction<K, V>>> {
        self.active_txns.read().get(&id).cloned()
    }

    /// Returns the number of registered transactions.
    #[must_use]
    pub fn active_transaction_count(&self) -> usize {
        self.active_txns.read().len()
    }

    /// Deregisters a transaction, returning it if it was registered.
    ///
    /// The transaction itself is left in whatever state it is in.
    pub fn remove_transaction(&self, id: TransactionId) -> Option<Arc<Transaction<K, V>>> {
        let removed = self.active_txns.write().remove(&id);
        if removed.is_some() {
            debug!(txn = %id, "transaction deregistered");
        }
        removed
    }

    /// Acquires the shared side of the coordination lock.
    ///
    /// A thread already holding the shared side may acquire it again even
    /// while a writer is waiting.
    pub fn acquire_read_lock(&self) -> ReadLockGuard<'_> {
        self.coordination_lock.read_recursive()
    }

    /// Releases the shared side of the coordination lock.
    pub fn release_read_lock(&self, guard: ReadLockGuard<'_>) {
        drop(guard);
    }

    /// Acquires the exclusive side of the coordination lock.
    pub fn acquire_write_lock(&self) -> WriteLockGuard<'_> {
        self.coordination_lock.write()
    }

    /// Releases the exclusive side of the coordination lock.
    pub fn release_write_lock(&self, guard: WriteLockGuard<'_>) {
        drop(guard);
    }
}

/// Rolls back and deregisters a managed transaction when dropped.
struct Registration<'a, K: StoreKey, V: StoreValue + DeepCopy> {
    manager: &'a TransactionManager<K, V>,
    txn: Arc<Transaction<K, V>>,
}

impl<K: StoreKey, V: StoreValue + DeepCopy> Drop for Registration<'_, K, V> {
    fn drop(&mut self) {
        if self.txn.is_active() {
            warn!(txn = %self.txn.id(), "managed transaction abandoned, rolling back");
            self.txn.rollback();
        }
        self.manager.remove_transaction(self.txn.id());
    }
}

impl<K, V> std::fmt::Debug for TransactionManager<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionManager")
            .field("next_txid", &self.next_txid.load(Ordering::SeqCst))
            .field("active_count", &self.active_txns.read().len())
            .finish_non_exhaustive()
    }
}
