//! Store view over a transaction.

use crate::error::{CoreError, CoreResult};
use crate::transaction::state::Transaction;
use inmemdb_storage::{KeyValueStore, StoreKey, StoreValue};
use inmemdb_value::{DeepCopy, Number, Value};
use std::collections::{HashMap, HashSet};

/// The store as seen from inside a transaction.
///
/// Reads overlay the transaction's buffered changes on the shared store.
/// Writes are buffered in the transaction and reach the store on commit.
/// `put` and `delete` return the value this transaction had buffered for
/// the key, never a value read from the store.
///
/// `compare_and_swap` reads and then writes the overlay; it is atomic with
/// respect to other calls on the same transaction but not with respect to
/// the shared store. Numeric increment and decrement are rejected with
/// [`CoreError::Unsupported`].
pub struct TransactionalStore<'a, K = String, V = Value> {
    txn: &'a Transaction<K, V>,
}

impl<'a, K: StoreKey, V: StoreValue + DeepCopy> TransactionalStore<'a, K, V> {
    pub(crate) fn new(txn: &'a Transaction<K, V>) -> Self {
        Self { txn }
    }

    /// Returns the transaction behind this view.
    #[must_use]
    pub fn transaction(&self) -> &'a Transaction<K, V> {
        self.txn
    }
}

impl<K: StoreKey, V: StoreValue + DeepCopy> KeyValueStore<K, V> for TransactionalStore<'_, K, V> {
    type Error = CoreError;

    fn put(&self, key: K, value: V) -> CoreResult<Option<V>> {
        self.txn
            .with_active(|workspace, _| workspace.stage_put(key, &value))
    }

    fn get(&self, key: &K) -> CoreResult<Option<V>> {
        self.txn.get(key)
    }

    fn update(&self, key: K, value: V) -> CoreResult<bool> {
        self.txn.with_active(|workspace, store| {
            if !workspace.contains(store, &key)? {
                return Ok(false);
            }
            workspace.stage_put(key, &value)?;
            Ok(true)
        })
    }

    fn delete(&self, key: &K) -> CoreResult<Option<V>> {
        self.txn
            .with_active(|workspace, _| Ok(workspace.stage_delete(key.clone())))
    }

    fn contains_key(&self, key: &K) -> CoreResult<bool> {
        self.txn
            .with_active(|workspace, store| workspace.contains(store, key))
    }

    fn len(&self) -> CoreResult<usize> {
        self.keys().map(|keys| keys.len())
    }

    fn is_empty(&self) -> CoreResult<bool> {
        self.len().map(|len| len == 0)
    }

    fn clear(&self) -> CoreResult<()> {
        self.txn
            .with_active(|workspace, store| workspace.stage_clear(store))
    }

    fn keys(&self) -> CoreResult<HashSet<K>> {
        self.txn
            .with_active(|workspace, store| workspace.effective_keys(store))
    }

    fn get_all(&self) -> CoreResult<HashMap<K, V>> {
        self.txn
            .with_active(|workspace, store| workspace.effective_entries(store))
    }

    fn compare_and_swap(&self, key: K, expected: &V, new_value: V) -> CoreResult<bool> {
        self.txn.with_active(|workspace, store| {
            if !workspace.visible_equals(store, &key, expected)? {
                return Ok(false);
            }
            workspace.stage_put(key, &new_value)?;
            Ok(true)
        })
    }

    fn increment_and_get(&self, _key: K, _delta: i64) -> CoreResult<Number> {
        self.txn
            .with_active(|_, _| Err(CoreError::unsupported("increment_and_get")))
    }

    fn decrement_and_get(&self, _key: K, _delta: i64) -> CoreResult<Number> {
        self.txn
            .with_active(|_, _| Err(CoreError::unsupported("decrement_and_get")))
    }
}

impl<K, V> std::fmt::Debug for TransactionalStore<'_, K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionalStore")
            .field("txn", self.txn)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::state::SharedStore;
    use crate::types::TransactionId;
    use inmemdb_storage::ConcurrentStore;
    use inmemdb_value::OpaqueValue;
    use std::sync::Arc;

    fn key(k: &str) -> String {
        k.to_string()
    }

    fn setup() -> (Arc<ConcurrentStore>, Transaction) {
        let store = Arc::new(ConcurrentStore::new());
        store.put(key("a"), Value::Int(1)).unwrap();
        store.put(key("b"), Value::from("two")).unwrap();
        let shared: SharedStore<String, Value> = store.clone();
        (store, Transaction::new(TransactionId::new(1, 0), shared))
    }

    #[test]
    fn put_returns_previously_buffered_value() {
        let (store, txn) = setup();
        let view = txn.store();

        assert_eq!(view.put(key("a"), Value::Int(10)).unwrap(), None);
        assert_eq!(view.put(key("a"), Value::Int(20)).unwrap(), Some(Value::Int(10)));
        assert_eq!(view.put(key("new"), Value::Int(0)).unwrap(), None);
        assert_eq!(store.get(&key("a")).unwrap(), Some(Value::Int(1)));
    }

    #[test]
    fn writes_over_uncopyable_store_value() {
        let (store, txn) = setup();
        let handle = Value::Opaque(OpaqueValue::new(1_u8));
        store.put(key("h"), handle.clone()).unwrap();
        store.put(key("g"), handle.clone()).unwrap();
        store.put(key("c"), handle.clone()).unwrap();
        let view = txn.store();

        assert_eq!(view.put(key("h"), Value::Int(1)).unwrap(), None);
        assert_eq!(view.get(&key("h")).unwrap(), Some(Value::Int(1)));

        assert_eq!(view.delete(&key("g")).unwrap(), None);
        assert!(!view.contains_key(&key("g")).unwrap());

        assert!(view.update(key("h"), Value::Int(2)).unwrap());
        assert!(view
            .compare_and_swap(key("c"), &handle, Value::Int(3))
            .unwrap());
        assert_eq!(view.get(&key("c")).unwrap(), Some(Value::Int(3)));

        txn.commit().unwrap();
        assert_eq!(store.get(&key("h")).unwrap(), Some(Value::Int(2)));
        assert_eq!(store.get(&key("g")).unwrap(), None);
        assert_eq!(store.get(&key("c")).unwrap(), Some(Value::Int(3)));
    }

    #[test]
    fn update_requires_visible_key() {
        let (_, txn) = setup();
        let view = txn.store();

        assert!(!view.update(key("missing"), Value::Int(1)).unwrap());
        assert!(view.update(key("a"), Value::Int(2)).unwrap());
        view.delete(&key("a")).unwrap();
        assert!(!view.update(key("a"), Value::Int(3)).unwrap());
        assert_eq!(view.get(&key("a")).unwrap(), None);
    }

    #[test]
    fn delete_returns_previously_buffered_value() {
        let (store, txn) = setup();
        let view = txn.store();

        assert_eq!(view.delete(&key("b")).unwrap(), None);
        view.put(key("b"), Value::from("buffered")).unwrap();
        assert_eq!(view.delete(&key("b")).unwrap(), Some(Value::from("buffered")));
        assert!(!view.contains_key(&key("b")).unwrap());
        assert!(store.contains_key(&key("b")).unwrap());
    }

    #[test]
    fn overlay_size_and_keys() {
        let (_, txn) = setup();
        let view = txn.store();
        view.put(key("c"), Value::Int(3)).unwrap();
        view.delete(&key("a")).unwrap();

        assert_eq!(view.len().unwrap(), 2);
        assert_eq!(view.keys().unwrap(), HashSet::from([key("b"), key("c")]));
        let all = view.get_all().unwrap();
        assert_eq!(all.get("c"), Some(&Value::Int(3)));
        assert!(!all.contains_key("a"));
    }

    #[test]
    fn clear_hides_everything_until_commit() {
        let (store, txn) = setup();
        let view = txn.store();
        view.put(key("c"), Value::Int(3)).unwrap();
        view.clear().unwrap();

        assert!(view.is_empty().unwrap());
        assert_eq!(store.len().unwrap(), 2);

        txn.commit().unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn compare_and_swap_on_overlay() {
        let (store, txn) = setup();
        let view = txn.store();

        assert!(!view
            .compare_and_swap(key("a"), &Value::Int(99), Value::Int(2))
            .unwrap());
        assert!(view
            .compare_and_swap(key("a"), &Value::Int(1), Value::Int(2))
            .unwrap());
        assert!(!view
            .compare_and_swap(key("missing"), &Value::Int(1), Value::Int(2))
            .unwrap());
        assert_eq!(view.get(&key("a")).unwrap(), Some(Value::Int(2)));
        assert_eq!(store.get(&key("a")).unwrap(), Some(Value::Int(1)));
    }

    #[test]
    fn numeric_operations_unsupported() {
        let (store, txn) = setup();
        let view = txn.store();

        assert!(matches!(
            view.increment_and_get(key("a"), 1),
            Err(CoreError::Unsupported { .. })
        ));
        assert!(matches!(
            view.decrement_and_get(key("a"), 1),
            Err(CoreError::Unsupported { .. })
        ));
        assert_eq!(store.get(&key("a")).unwrap(), Some(Value::Int(1)));
    }

    #[test]
    fn view_rejects_after_rollback() {
        let (_, txn) = setup();
        let view = txn.store();
        txn.rollback();

        assert!(view.keys().unwrap_err().is_not_active());
        assert!(view.increment_and_get(key("a"), 1).unwrap_err().is_not_active());
    }
}
