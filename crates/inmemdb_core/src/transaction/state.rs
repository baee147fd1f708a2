//! Transaction state.

use crate::error::{CoreError, CoreResult};
use crate::transaction::view::TransactionalStore;
use crate::transaction::workspace::Workspace;
use crate::types::{TransactionId, TransactionState};
use inmemdb_storage::{KeyValueStore, StorageError, StoreKey, StoreValue};
use inmemdb_value::{DeepCopy, Value};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info};

/// A store shared between a manager and its transactions.
pub type SharedStore<K, V> = Arc<dyn KeyValueStore<K, V, Error = StorageError>>;

struct TransactionInner<K, V> {
    state: TransactionState,
    workspace: Workspace<K, V>,
}

impl<K, V> TransactionInner<K, V> {
    fn ensure_active(&self, id: TransactionId) -> CoreResult<()> {
        match self.state {
            TransactionState::Active => Ok(()),
            state => Err(CoreError::not_active(id, state)),
        }
    }
}

/// A transaction over a shared store.
///
/// Changes are buffered in a private workspace and are not visible to
/// other readers of the store until commit. Values entering or leaving the
/// workspace are deep copies.
///
/// Two transactions writing the same key are not reconciled: the one that
/// commits last wins.
///
/// All operations, including commit and rollback, run under one
/// per-transaction lock, so concurrent callers cannot interleave a commit
/// with a rollback of the same transaction.
pub struct Transaction<K = String, V = Value> {
    /// Transaction ID.
    id: TransactionId,
    /// The store reads fall through to and commits write into.
    store: SharedStore<K, V>,
    /// State and workspace.
    inner: Mutex<TransactionInner<K, V>>,
}

impl<K: StoreKey, V: StoreValue + DeepCopy> Transaction<K, V> {
    /// Creates a new transaction.
    pub(crate) fn new(id: TransactionId, store: SharedStore<K, V>) -> Self {
        debug!(txn = %id, "transaction created with isolated workspace");
        Self {
            id,
            store,
            inner: Mutex::new(TransactionInner {
                state: TransactionState::Active,
                workspace: Workspace::new(),
            }),
        }
    }

    /// Returns the transaction ID.
    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.inner.lock().state
    }

    /// Checks if the transaction is still active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state() == TransactionState::Active
    }

    /// Returns the number of buffered writes, deletions included.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.inner.lock().workspace.len()
    }

    /// Returns the store view of this transaction.
    #[must_use]
    pub fn store(&self) -> TransactionalStore<'_, K, V> {
        TransactionalStore::new(self)
    }

    /// Buffers a copy of `value` under `key`.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::NotActive`] after commit or rollback, and
    /// with [`CoreError::Uncopyable`] if the value cannot be copied.
    pub fn put(&self, key: K, value: V) -> CoreResult<()> {
        self.with_active(|workspace, _| {
            debug!(txn = %self.id, ?key, "put");
            workspace.stage_put(key, &value).map(|_| ())
        })
    }

    /// Returns a copy of the value visible to this transaction.
    ///
    /// Keys deleted in this transaction read as absent; keys it has not
    /// touched read through to the store.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::NotActive`] after commit or rollback.
    pub fn get(&self, key: &K) -> CoreResult<Option<V>> {
        self.with_active(|workspace, store| workspace.lookup(store, key))
    }

    /// Marks `key` deleted in this transaction.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::NotActive`] after commit or rollback.
    pub fn delete(&self, key: &K) -> CoreResult<()> {
        self.with_active(|workspace, _| {
            debug!(txn = %self.id, ?key, "delete");
            workspace.stage_delete(key.clone());
            Ok(())
        })
    }

    /// Applies the buffered changes to the store.
    ///
    /// Deletions are applied first, then puts. If the store rejects a
    /// change, the transaction moves to [`TransactionState::Failed`] and the
    /// changes applied before the rejection remain in the store.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::NotActive`] if the transaction is not active,
    /// and with [`CoreError::TransactionFailed`] if applying fails.
    pub fn commit(&self) -> CoreResult<()> {
        let mut inner = self.inner.lock();
        inner.ensure_active(self.id)?;

        debug!(
            txn = %self.id,
            writes = inner.workspace.len(),
            deletions = inner.workspace.tombstone_count(),
            "committing"
        );

        match inner.workspace.apply(&*self.store) {
            Ok(()) => {
                inner.workspace.clear();
                inner.state = TransactionState::Committed;
                info!(txn = %self.id, "transaction committed");
                Ok(())
            }
            Err(err) => {
                inner.state = TransactionState::Failed;
                error!(txn = %self.id, error = %err, "transaction commit failed");
                Err(CoreError::transaction_failed(self.id, err))
            }
        }
    }

    /// Discards the buffered changes.
    ///
    /// Does nothing if the transaction is no longer active.
    pub fn rollback(&self) {
        let mut inner = self.inner.lock();
        if inner.state == TransactionState::Active {
            inner.workspace.clear();
            inner.state = TransactionState::RolledBack;
            info!(txn = %self.id, "transaction rolled back");
        }
    }

    /// Runs `op` against the workspace while the transaction lock is held.
    pub(crate) fn with_active<R>(
        &self,
        op: impl FnOnce(
            &mut Workspace<K, V>,
            &dyn KeyValueStore<K, V, Error = StorageError>,
        ) -> CoreResult<R>,
    ) -> CoreResult<R> {
        let mut inner = self.inner.lock();
        inner.ensure_active(self.id)?;
        op(&mut inner.workspace, &*self.store)
    }
}

impl<K, V> std::fmt::Debug for Transaction<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("state", &self.inner.lock().state)
            .finish_non_exhaustive()
    }
}
