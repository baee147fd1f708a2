//! Key-value store trait definition.

use inmemdb_value::{Number, NumericValue};
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

/// Requirements for a store key.
pub trait StoreKey: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

impl<T> StoreKey for T where T: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

/// Requirements for a stored value.
///
/// Values are compared by value equality for compare-and-swap and must
/// expose a numeric view for increment and decrement.
pub trait StoreValue: Clone + PartialEq + Debug + NumericValue + Send + Sync + 'static {}

impl<T> StoreValue for T where
    T: Clone + PartialEq + Debug + NumericValue + Send + Sync + 'static
{
}

/// A thread-safe mapping from keys to values.
///
/// Single-key operations are linearizable. Collection-wide operations
/// (`len`, `keys`, `get_all`, `clear`) are point-in-time snapshots with no
/// atomicity relative to concurrent single-key writes.
///
/// # Implementors
///
/// - [`crate::ConcurrentStore`] - the shared in-memory store
/// - `TransactionalStore` in `inmemdb_core` - a transaction's overlay view
pub trait KeyValueStore<K, V>: Send + Sync {
    /// Error returned by every operation.
    type Error;

    /// Stores `value` under `key`, returning the previous value.
    fn put(&self, key: K, value: V) -> Result<Option<V>, Self::Error>;

    /// Returns the value stored under `key`.
    fn get(&self, key: &K) -> Result<Option<V>, Self::Error>;

    /// Replaces the value under `key` only if the key exists.
    ///
    /// Returns `false` and leaves the store untouched if it does not.
    fn update(&self, key: K, value: V) -> Result<bool, Self::Error>;

    /// Removes `key`, returning the removed value.
    fn delete(&self, key: &K) -> Result<Option<V>, Self::Error>;

    /// Returns true if `key` has a value.
    fn contains_key(&self, key: &K) -> Result<bool, Self::Error>;

    /// Returns the number of entries.
    fn len(&self) -> Result<usize, Self::Error>;

    /// Returns true if there are no entries.
    fn is_empty(&self) -> Result<bool, Self::Error>;

    /// Removes every entry.
    fn clear(&self) -> Result<(), Self::Error>;

    /// Returns a snapshot of the keys.
    fn keys(&self) -> Result<HashSet<K>, Self::Error>;

    /// Returns a snapshot of all entries.
    fn get_all(&self) -> Result<HashMap<K, V>, Self::Error>;

    /// Replaces the value under `key` with `new_value` if the current value
    /// equals `expected`.
    ///
    /// Returns whether the swap happened. A missing key never matches.
    fn compare_and_swap(&self, key: K, expected: &V, new_value: V) -> Result<bool, Self::Error>;

    /// Adds `delta` to the number under `key` and returns the result.
    ///
    /// A missing key is created holding `delta`. The stored numeric kind is
    /// preserved.
    fn increment_and_get(&self, key: K, delta: i64) -> Result<Number, Self::Error>;

    /// Subtracts `delta` from the number under `key` and returns the result.
    fn decrement_and_get(&self, key: K, delta: i64) -> Result<Number, Self::Error>;
}
