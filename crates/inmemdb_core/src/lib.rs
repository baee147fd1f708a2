//! # InMemDB Core
//!
//! Transactional engine for InMemDB.
//!
//! This crate provides:
//! - Transactions with a private workspace of deep-copied values
//! - A transactional store view with the same surface as the shared store
//! - A transaction manager with managed execution and a coordination lock
//! - The [`Database`] facade tying a store and a manager together
//!
//! Transactions are isolated from the store until commit. Concurrent
//! transactions are not checked for conflicts: the last commit wins.
//!
//! ## Example
//!
//! ```rust
//! use inmemdb_core::{Database, Value};
//!
//! let db = Database::new();
//! db.set("x", "orig").unwrap();
//!
//! let txn = db.begin_transaction();
//! txn.delete(&"x".to_string()).unwrap();
//! assert_eq!(txn.get(&"x".to_string()).unwrap(), None);
//! assert!(db.get("x").unwrap().is_some());
//!
//! txn.rollback();
//! assert_eq!(db.get("x").unwrap(), Some(Value::from("orig")));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod database;
mod error;
mod transaction;
mod types;

pub use database::Database;
pub use error::{BoxError, CoreError, CoreResult};
pub use transaction::{
    PendingWrite, ReadLockGuard, SharedStore, Transaction, TransactionManager,
    TransactionalStore, WriteLockGuard,
};
pub use types::{TransactionId, TransactionState};

pub use inmemdb_storage::{
    ConcurrentStore, KeyValueStore, StorageError, StorageResult, StoreConfig, StoreKey, StoreValue,
};
pub use inmemdb_value::{
    deep_copy, CopyError, CopyResult, DeepCopy, Number, NumericValue, OpaqueValue, SharedValue,
    Value,
};
