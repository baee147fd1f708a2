//! Deep copy support.
//!
//! Transactions keep private copies of every value they hold. A copy made
//! through [`DeepCopy`] shares no mutable state with its source, so writes
//! through a [`SharedValue`](crate::SharedValue) handle held by the caller
//! never reach a transaction's workspace and vice versa.

use crate::error::{CopyError, CopyResult};
use crate::number::Number;
use crate::value::{SharedValue, Value};
use std::collections::BTreeMap;

/// Produces an independent copy of a value.
///
/// # Invariants
///
/// - The copy compares equal to the source at the time of copying
/// - Mutating either side afterwards is invisible to the other
/// - Copying is pure and safe to call from any number of threads
pub trait DeepCopy: Sized {
    /// Returns an independent copy of `self`.
    ///
    /// # Errors
    ///
    /// Returns [`CopyError::Uncopyable`] if the value, or anything nested
    /// inside it, has no copy capability.
    fn deep_copy(&self) -> CopyResult<Self>;
}

/// Copies `value` through its [`DeepCopy`] implementation.
///
/// # Errors
///
/// Propagates [`CopyError::Uncopyable`] from the value.
pub fn deep_copy<T: DeepCopy>(value: &T) -> CopyResult<T> {
    value.deep_copy()
}

impl DeepCopy for Value {
    fn deep_copy(&self) -> CopyResult<Self> {
        if self.is_immutable() {
            return Ok(self.clone());
        }

        match self {
            Value::Bytes(bytes) => Ok(Value::Bytes(bytes.clone())),
            Value::List(items) => items.deep_copy().map(Value::List),
            Value::Map(map) => map
                .iter()
                .map(|(k, v)| v.deep_copy().map(|copy| (k.clone(), copy)))
                .collect::<CopyResult<BTreeMap<_, _>>>()
                .map(Value::Map),
            Value::Shared(cell) => {
                let contents = cell.with(|v| v.deep_copy())?;
                Ok(Value::Shared(SharedValue::new(contents)))
            }
            Value::Opaque(opaque) => Err(CopyError::uncopyable(opaque.type_name())),
            // Scalars and text are handled by the fast path above
            other => Ok(other.clone()),
        }
    }
}

impl DeepCopy for Number {
    fn deep_copy(&self) -> CopyResult<Self> {
        Ok(*self)
    }
}

macro_rules! impl_immutable {
    ($($ty:ty),*) => {
        $(
            impl DeepCopy for $ty {
                fn deep_copy(&self) -> CopyResult<Self> {
                    Ok(self.clone())
                }
            }
        )*
    };
}

impl_immutable!(bool, char, i8, i16, i32, i64, i128, u8, u16, u32, u64, u128, f32, f64, String);

impl<T: DeepCopy> DeepCopy for Vec<T> {
    fn deep_copy(&self) -> CopyResult<Self> {
        self.iter().map(T::deep_copy).collect()
    }
}

impl<T: DeepCopy> DeepCopy for Option<T> {
    fn deep_copy(&self) -> CopyResult<Self> {
        self.as_ref().map(T::deep_copy).transpose()
    }
}
