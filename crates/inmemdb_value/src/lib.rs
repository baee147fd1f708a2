//! # InMemDB Value
//!
//! Value model for InMemDB.
//!
//! This crate provides:
//! - [`Value`], the dynamic type stored by the database
//! - [`Number`], the closed set of numeric kinds used by atomic counters
//! - [`DeepCopy`], the capability that lets a transaction hold values
//!   sharing no mutable state with the caller or the store
//!
//! ## Example
//!
//! ```rust
//! use inmemdb_value::{DeepCopy, SharedValue, Value};
//!
//! let cell = SharedValue::new(Value::from("draft"));
//! let original = Value::Shared(cell.clone());
//! let copy = original.deep_copy().unwrap();
//!
//! cell.set(Value::from("published"));
//! assert_eq!(copy, Value::Shared(SharedValue::new(Value::from("draft"))));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod copy;
mod error;
mod number;
mod value;

pub use copy::{deep_copy, DeepCopy};
pub use error::{CopyError, CopyResult};
pub use number::{Number, NumericValue};
pub use value::{OpaqueValue, SharedValue, Value};
