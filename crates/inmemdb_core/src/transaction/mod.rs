//! Transactions over a shared store.
//!
//! InMemDB transactions provide:
//! - **Isolation**: changes are buffered in a private workspace of deep
//!   copies and stay invisible to the store until commit
//! - **Weak atomicity**: commit applies deletions then puts; a store error
//!   partway through leaves the earlier changes applied
//! - **Last-writer-wins**: concurrent transactions touching the same key are
//!   not reconciled

mod manager;
mod state;
mod view;
mod workspace;

pub use manager::{ReadLockGuard, TransactionManager, WriteLockGuard};
pub use state::{SharedStore, Transaction};
pub use view::TransactionalStore;
pub use workspace::PendingWrite;
