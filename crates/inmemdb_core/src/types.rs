//! Core type definitions for InMemDB.

use std::fmt;
use uuid::Uuid;

/// Unique identifier for a transaction.
///
/// The sequence part is monotonically increasing within a manager and never
/// reused; the nonce part is random, so identifiers from different managers
/// in the same process do not collide in practice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId {
    sequence: u64,
    nonce: u32,
}

impl TransactionId {
    /// Creates a transaction ID from its parts.
    #[must_use]
    pub const fn new(sequence: u64, nonce: u32) -> Self {
        Self { sequence, nonce }
    }

    /// Creates a transaction ID with a random nonce.
    #[must_use]
    pub fn generate(sequence: u64) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let nonce = (Uuid::new_v4().as_u128() >> 96) as u32;
        Self::new(sequence, nonce)
    }

    /// Returns the sequence part.
    #[must_use]
    pub const fn sequence(self) -> u64 {
        self.sequence
    }

    /// Returns the random part.
    #[must_use]
    pub const fn nonce(self) -> u32 {
        self.nonce
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TX-{}-{:08x}", self.sequence, self.nonce)
    }
}

/// State of a transaction.
///
/// `Active` is the only state that accepts operations. Every other state is
/// terminal and is entered exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionState {
    /// Transaction is active and can perform operations.
    Active,
    /// Transaction has been committed.
    Committed,
    /// Transaction has been rolled back.
    RolledBack,
    /// Commit was attempted and applying the changes failed.
    Failed,
}

impl TransactionState {
    /// Returns true for every state other than `Active`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, TransactionState::Active)
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionState::Active => "active",
            TransactionState::Committed => "committed",
            TransactionState::RolledBack => "rolled back",
            TransactionState::Failed => "failed",
        };
        f.write_str(name)
    }
}
