//! # InMemDB Storage
//!
//! Concurrent key-value storage for InMemDB.
//!
//! This crate provides the store every transaction reads through to and
//! commits into. It knows nothing about transactions.
//!
//! ## Design Principles
//!
//! - Single-key operations are linearizable, including compare-and-swap
//!   and numeric increment/decrement
//! - No multi-key atomicity; collection-wide reads are snapshots
//! - Stores must be `Send + Sync` for concurrent access
//!
//! ## Example
//!
//! ```rust
//! use inmemdb_storage::{ConcurrentStore, KeyValueStore};
//! use inmemdb_value::Value;
//!
//! let store: ConcurrentStore = ConcurrentStore::new();
//! store.put("x".to_string(), Value::from("orig")).unwrap();
//! assert!(store
//!     .compare_and_swap("x".to_string(), &Value::from("orig"), Value::from("next"))
//!     .unwrap());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod concurrent;
mod config;
mod error;
mod store;

pub use concurrent::ConcurrentStore;
pub use config::StoreConfig;
pub use error::{StorageError, StorageResult};
pub use store::{KeyValueStore, StoreKey, StoreValue};
