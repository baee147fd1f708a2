//! Sharded concurrent store.

use crate::config::StoreConfig;
use crate::error::{StorageError, StorageResult};
use crate::store::{KeyValueStore, StoreKey, StoreValue};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use inmemdb_value::{Number, Value};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// A thread-safe in-memory key-value store.
///
/// Entries live in a [`DashMap`], so reads and writes to keys in different
/// shards never contend. Compare-and-swap and increment/decrement hold the
/// shard write lock for their key while they read and write, which makes
/// them atomic per key.
///
/// # Example
///
/// ```rust
/// use inmemdb_storage::{ConcurrentStore, KeyValueStore};
/// use inmemdb_value::{Number, Value};
///
/// let store: ConcurrentStore = ConcurrentStore::new();
/// store.put("a".to_string(), Value::Int(1)).unwrap();
/// let result = store.increment_and_get("a".to_string(), 5).unwrap();
/// assert_eq!(result, Number::Int(6));
/// ```
pub struct ConcurrentStore<K = String, V = Value> {
    map: DashMap<K, V>,
}

impl<K: StoreKey, V: StoreValue> ConcurrentStore<K, V> {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        debug!("concurrent store initialized");
        Self {
            map: DashMap::new(),
        }
    }

    /// Creates a new empty store from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidArgument`] if the configuration is
    /// invalid.
    pub fn with_config(config: &StoreConfig) -> StorageResult<Self> {
        config.validate()?;
        let map = match config.shard_amount {
            Some(shards) => {
                DashMap::with_capacity_and_shard_amount(config.initial_capacity, shards)
            }
            None => DashMap::with_capacity(config.initial_capacity),
        };
        debug!(
            initial_capacity = config.initial_capacity,
            shard_amount = ?config.shard_amount,
            "concurrent store initialized"
        );
        Ok(Self { map })
    }

    /// Returns the value under `key`, or `default` if there is none.
    pub fn get_or_default(&self, key: &K, default: V) -> V {
        self.map
            .get(key)
            .map_or(default, |entry| entry.value().clone())
    }

    /// Stores `value` only if `key` has no value.
    ///
    /// Returns the existing value, which is left in place, or `None` if
    /// `value` was stored.
    pub fn put_if_absent(&self, key: K, value: V) -> Option<V> {
        match self.map.entry(key) {
            Entry::Occupied(entry) => {
                debug!(key = ?entry.key(), "put_if_absent found existing value");
                Some(entry.get().clone())
            }
            Entry::Vacant(entry) => {
                debug!(key = ?entry.key(), "put_if_absent stored value");
                entry.insert(value);
                None
            }
        }
    }
}

impl<K: StoreKey, V: StoreValue> Default for ConcurrentStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: StoreKey, V: StoreValue> KeyValueStore<K, V> for ConcurrentStore<K, V> {
    type Error = StorageError;

    fn put(&self, key: K, value: V) -> StorageResult<Option<V>> {
        debug!(?key, "put");
        Ok(self.map.insert(key, value))
    }

    fn get(&self, key: &K) -> StorageResult<Option<V>> {
        Ok(self.map.get(key).map(|entry| entry.value().clone()))
    }

    fn update(&self, key: K, value: V) -> StorageResult<bool> {
        let updated = match self.map.get_mut(&key) {
            Some(mut entry) => {
                *entry = value;
                true
            }
            None => false,
        };
        debug!(?key, updated, "update");
        Ok(updated)
    }

    fn delete(&self, key: &K) -> StorageResult<Option<V>> {
        let removed = self.map.remove(key).map(|(_, value)| value);
        debug!(?key, removed = removed.is_some(), "delete");
        Ok(removed)
    }

    fn contains_key(&self, key: &K) -> StorageResult<bool> {
        Ok(self.map.contains_key(key))
    }

    fn len(&self) -> StorageResult<usize> {
        Ok(self.map.len())
    }

    fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.map.is_empty())
    }

    fn clear(&self) -> StorageResult<()> {
        let previous = self.map.len();
        self.map.clear();
        debug!(removed = previous, "clear");
        Ok(())
    }

    fn keys(&self) -> StorageResult<HashSet<K>> {
        Ok(self.map.iter().map(|entry| entry.key().clone()).collect())
    }

    fn get_all(&self) -> StorageResult<HashMap<K, V>> {
        Ok(self
            .map
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect())
    }

    fn compare_and_swap(&self, key: K, expected: &V, new_value: V) -> StorageResult<bool> {
        // The shard write lock is held from comparison to replacement
        let swapped = match self.map.get_mut(&key) {
            Some(mut current) if *current == *expected => {
                *current = new_value;
                true
            }
            _ => false,
        };
        debug!(?key, swapped, "compare_and_swap");
        Ok(swapped)
    }

    fn increment_and_get(&self, key: K, delta: i64) -> StorageResult<Number> {
        match self.map.entry(key) {
            Entry::Occupied(mut entry) => {
                let current = entry.get().as_number().ok_or_else(|| {
                    StorageError::type_mismatch("number", entry.get().kind_name())
                })?;
                let next = current
                    .checked_add(delta)
                    .ok_or(StorageError::NumericOverflow {
                        kind: current.kind(),
                        delta,
                    })?;
                let stored = V::from_number(next).ok_or_else(|| {
                    StorageError::type_mismatch(next.kind(), entry.get().kind_name())
                })?;
                entry.insert(stored);
                debug!(key = ?entry.key(), delta, result = %next, "increment_and_get");
                Ok(next)
            }
            Entry::Vacant(entry) => {
                let initial = Number::Long(delta);
                let stored = V::from_number(initial).ok_or_else(|| {
                    StorageError::type_mismatch(initial.kind(), std::any::type_name::<V>())
                })?;
                debug!(key = ?entry.key(), delta, "increment_and_get created counter");
                entry.insert(stored);
                Ok(initial)
            }
        }
    }

    fn decrement_and_get(&self, key: K, delta: i64) -> StorageResult<Number> {
        let negated = delta
            .checked_neg()
            .ok_or(StorageError::NumericOverflow { kind: "long", delta })?;
        self.increment_and_get(key, negated)
    }
}

impl<K, V> std::fmt::Debug for ConcurrentStore<K, V>
where
    K: StoreKey,
    V: StoreValue,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentStore")
            .field("len", &self.map.len())
            .finish_non_exhaustive()
    }
}
