//! Per-transaction workspace.

use crate::error::CoreResult;
use inmemdb_storage::{KeyValueStore, StorageError, StorageResult, StoreKey, StoreValue};
use inmemdb_value::DeepCopy;
use std::collections::{HashMap, HashSet};

/// Represents a pending write in a transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingWrite<V> {
    /// Insert or replace the value (a private copy).
    Put(V),
    /// Delete the key (a tombstone).
    Delete,
}

/// Buffered changes of one transaction.
///
/// Each key maps to exactly one pending write, so a key is never both
/// pending and tombstoned. Every value stored here or handed out from here
/// is a deep copy.
#[derive(Debug)]
pub(crate) struct Workspace<K, V> {
    writes: HashMap<K, PendingWrite<V>>,
}

impl<K: StoreKey, V: StoreValue + DeepCopy> Workspace<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            writes: HashMap::new(),
        }
    }

    /// Number of buffered writes, tombstones included.
    pub(crate) fn len(&self) -> usize {
        self.writes.len()
    }

    pub(crate) fn clear(&mut self) {
        self.writes.clear();
    }

    pub(crate) fn pending_write(&self, key: &K) -> Option<&PendingWrite<V>> {
        self.writes.get(key)
    }

    /// Buffers a copy of `value` under `key`, clearing any tombstone.
    ///
    /// Returns the value previously buffered under `key`.
    pub(crate) fn stage_put(&mut self, key: K, value: &V) -> CoreResult<Option<V>> {
        let copy = value.deep_copy()?;
        Ok(Self::displaced(self.writes.insert(key, PendingWrite::Put(copy))))
    }

    /// Tombstones `key`, returning the value previously buffered under it.
    pub(crate) fn stage_delete(&mut self, key: K) -> Option<V> {
        Self::displaced(self.writes.insert(key, PendingWrite::Delete))
    }

    // The displaced value is the workspace's private copy, so it can be
    // handed out as is.
    fn displaced(previous: Option<PendingWrite<V>>) -> Option<V> {
        match previous {
            Some(PendingWrite::Put(value)) => Some(value),
            Some(PendingWrite::Delete) | None => None,
        }
    }

    /// Tombstones every key currently in `store` and drops all buffered
    /// values.
    pub(crate) fn stage_clear<S>(&mut self, store: &S) -> CoreResult<()>
    where
        S: KeyValueStore<K, V, Error = StorageError> + ?Sized,
    {
        self.writes.clear();
        for key in store.keys()? {
            self.writes.insert(key, PendingWrite::Delete);
        }
        Ok(())
    }

    /// Returns a copy of the value visible for `key` through this workspace.
    pub(crate) fn lookup<S>(&self, store: &S, key: &K) -> CoreResult<Option<V>>
    where
        S: KeyValueStore<K, V, Error = StorageError> + ?Sized,
    {
        match self.writes.get(key) {
            Some(PendingWrite::Delete) => Ok(None),
            Some(PendingWrite::Put(value)) => Ok(Some(value.deep_copy()?)),
            None => match store.get(key)? {
                Some(value) => Ok(Some(value.deep_copy()?)),
                None => Ok(None),
            },
        }
    }

    /// Checks whether the value visible for `key` equals `expected`.
    ///
    /// Compares in place, so an uncopyable store value can still be matched.
    pub(crate) fn visible_equals<S>(&self, store: &S, key: &K, expected: &V) -> CoreResult<bool>
    where
        S: KeyValueStore<K, V, Error = StorageError> + ?Sized,
    {
        match self.writes.get(key) {
            Some(PendingWrite::Delete) => Ok(false),
            Some(PendingWrite::Put(value)) => Ok(value == expected),
            None => Ok(store.get(key)?.as_ref() == Some(expected)),
        }
    }

    pub(crate) fn contains<S>(&self, store: &S, key: &K) -> CoreResult<bool>
    where
        S: KeyValueStore<K, V, Error = StorageError> + ?Sized,
    {
        match self.writes.get(key) {
            Some(PendingWrite::Delete) => Ok(false),
            Some(PendingWrite::Put(_)) => Ok(true),
            None => Ok(store.contains_key(key)?),
        }
    }

    /// (store keys ∪ buffered keys) − tombstoned keys.
    pub(crate) fn effective_keys<S>(&self, store: &S) -> CoreResult<HashSet<K>>
    where
        S: KeyValueStore<K, V, Error = StorageError> + ?Sized,
    {
        let mut keys = store.keys()?;
        for (key, write) in &self.writes {
            match write {
                PendingWrite::Put(_) => {
                    keys.insert(key.clone());
                }
                PendingWrite::Delete => {
                    keys.remove(key);
                }
            }
        }
        Ok(keys)
    }

    /// Copies of every visible entry, buffered values taking precedence.
    pub(crate) fn effective_entries<S>(&self, store: &S) -> CoreResult<HashMap<K, V>>
    where
        S: KeyValueStore<K, V, Error = StorageError> + ?Sized,
    {
        let mut entries = HashMap::new();
        for (key, value) in store.get_all()? {
            if !self.writes.contains_key(&key) {
                let copy = value.deep_copy()?;
                entries.insert(key, copy);
            }
        }
        for (key, write) in &self.writes {
            if let PendingWrite::Put(value) = write {
                entries.insert(key.clone(), value.deep_copy()?);
            }
        }
        Ok(entries)
    }

    /// Writes the buffered changes into `store`: all deletions, then all puts.
    ///
    /// Stops at the first store error. Changes applied before the error stay
    /// applied.
    pub(crate) fn apply<S>(&self, store: &S) -> StorageResult<()>
    where
        S: KeyValueStore<K, V, Error = StorageError> + ?Sized,
    {
        for (key, write) in &self.writes {
            if let PendingWrite::Delete = write {
                store.delete(key)?;
            }
        }
        for (key, write) in &self.writes {
            if let PendingWrite::Put(value) = write {
                store.put(key.clone(), value.clone())?;
            }
        }
        Ok(())
    }

    pub(crate) fn tombstone_count(&self) -> usize {
        self.writes
            .values()
            .filter(|write| matches!(write, PendingWrite::Delete))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inmemdb_storage::ConcurrentStore;
    use inmemdb_value::{OpaqueValue, SharedValue, Value};

    fn key(k: &str) -> String {
        k.to_string()
    }

    fn setup() -> (ConcurrentStore, Workspace<String, Value>) {
        let store = ConcurrentStore::new();
        store.put(key("a"), Value::Int(1)).unwrap();
        store.put(key("b"), Value::Int(2)).unwrap();
        (store, Workspace::new())
    }

    #[test]
    fn put_overwrites_tombstone() {
        let (_, mut ws) = setup();
        ws.stage_delete(key("a"));
        ws.stage_put(key("a"), &Value::Int(9)).unwrap();

        assert_eq!(ws.len(), 1);
        assert_eq!(ws.tombstone_count(), 0);
        assert_eq!(ws.pending_write(&key("a")), Some(&PendingWrite::Put(Value::Int(9))));
    }

    #[test]
    fn staging_returns_displaced_value() {
        let (_, mut ws) = setup();
        assert_eq!(ws.stage_put(key("a"), &Value::Int(9)).unwrap(), None);
        assert_eq!(ws.stage_put(key("a"), &Value::Int(10)).unwrap(), Some(Value::Int(9)));
        assert_eq!(ws.stage_delete(key("a")), Some(Value::Int(10)));
        assert_eq!(ws.stage_delete(key("a")), None);
        assert_eq!(ws.stage_put(key("a"), &Value::Int(11)).unwrap(), None);
    }

    #[test]
    fn visible_equals_skips_copying() {
        let (store, mut ws) = setup();
        let handle = Value::Opaque(OpaqueValue::new(1_u8));
        store.put(key("h"), handle.clone()).unwrap();
        ws.stage_delete(key("b"));

        assert!(ws.visible_equals(&store, &key("h"), &handle).unwrap());
        assert!(ws.visible_equals(&store, &key("a"), &Value::Int(1)).unwrap());
        assert!(!ws.visible_equals(&store, &key("b"), &Value::Int(2)).unwrap());
        assert!(!ws.visible_equals(&store, &key("z"), &Value::Int(0)).unwrap());
    }

    #[test]
    fn delete_overwrites_pending_value() {
        let (_, mut ws) = setup();
        ws.stage_put(key("a"), &Value::Int(9)).unwrap();
        ws.stage_delete(key("a"));

        assert_eq!(ws.len(), 1);
        assert_eq!(ws.pending_write(&key("a")), Some(&PendingWrite::Delete));
    }

    #[test]
    fn lookup_prefers_workspace() {
        let (store, mut ws) = setup();
        ws.stage_put(key("a"), &Value::Int(10)).unwrap();
        ws.stage_delete(key("b"));

        assert_eq!(ws.lookup(&store, &key("a")).unwrap(), Some(Value::Int(10)));
        assert_eq!(ws.lookup(&store, &key("b")).unwrap(), None);
        assert!(!ws.contains(&store, &key("b")).unwrap());
        assert_eq!(ws.lookup(&store, &key("z")).unwrap(), None);
    }

    #[test]
    fn stage_put_copies_shared_cells() {
        let (store, mut ws) = setup();
        let cell = SharedValue::new(Value::from("mine"));
        ws.stage_put(key("c"), &Value::Shared(cell.clone())).unwrap();
        cell.set(Value::from("changed"));

        let seen = ws.lookup(&store, &key("c")).unwrap().unwrap();
        assert_eq!(seen.as_shared().unwrap().get(), Value::from("mine"));
    }

    #[test]
    fn stage_put_rejects_uncopyable() {
        let (_, mut ws) = setup();
        let result = ws.stage_put(key("c"), &Value::Opaque(OpaqueValue::new(1_u8)));
        assert!(result.is_err());
        assert_eq!(ws.len(), 0);
    }

    #[test]
    fn effective_view() {
        let (store, mut ws) = setup();
        ws.stage_put(key("c"), &Value::Int(3)).unwrap();
        ws.stage_put(key("a"), &Value::Int(11)).unwrap();
        ws.stage_delete(key("b"));

        let keys = ws.effective_keys(&store).unwrap();
        assert_eq!(keys, HashSet::from([key("a"), key("c")]));

        let entries = ws.effective_entries(&store).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries.get("a"), Some(&Value::Int(11)));
        assert_eq!(entries.get("c"), Some(&Value::Int(3)));
    }

    #[test]
    fn stage_clear_tombstones_store_keys() {
        let (store, mut ws) = setup();
        ws.stage_put(key("only-here"), &Value::Int(5)).unwrap();
        ws.stage_clear(&store).unwrap();

        assert_eq!(ws.tombstone_count(), 2);
        assert!(ws.effective_keys(&store).unwrap().is_empty());
        assert!(ws.pending_write(&key("only-here")).is_none());
    }

    #[test]
    fn apply_writes_into_store() {
        let (store, mut ws) = setup();
        ws.stage_put(key("c"), &Value::Int(3)).unwrap();
        ws.stage_delete(key("a"));
        ws.apply(&store).unwrap();

        assert_eq!(store.get(&key("a")).unwrap(), None);
        assert_eq!(store.get(&key("b")).unwrap(), Some(Value::Int(2)));
        assert_eq!(store.get(&key("c")).unwrap(), Some(Value::Int(3)));
    }
}
