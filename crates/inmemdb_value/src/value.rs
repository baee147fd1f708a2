//! Dynamic value type.

use crate::number::{Number, NumericValue};
use parking_lot::RwLock;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A dynamic value stored in InMemDB.
///
/// There is no null variant: absence is expressed with `Option::None` by
/// every read operation.
#[derive(Debug, Clone)]
pub enum Value {
    /// Boolean value.
    Bool(bool),
    /// 8-bit signed integer.
    Byte(i8),
    /// 16-bit signed integer.
    Short(i16),
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit signed integer.
    Long(i64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
    /// Text string (UTF-8).
    Text(String),
    /// Byte string.
    Bytes(Vec<u8>),
    /// Ordered list of values.
    List(Vec<Value>),
    /// Map from text keys to values.
    Map(BTreeMap<String, Value>),
    /// Handle to a mutable cell. Clones of the handle alias the same cell.
    Shared(SharedValue),
    /// Foreign payload without copy support.
    Opaque(OpaqueValue),
}

impl Value {
    /// Returns the name of this value's kind.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Byte(_) => "byte",
            Value::Short(_) => "short",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Shared(_) => "shared",
            Value::Opaque(_) => "opaque",
        }
    }

    /// Returns true for kinds that cannot be mutated in place.
    #[must_use]
    pub fn is_immutable(&self) -> bool {
        matches!(
            self,
            Value::Bool(_)
                | Value::Byte(_)
                | Value::Short(_)
                | Value::Int(_)
                | Value::Long(_)
                | Value::Float(_)
                | Value::Double(_)
                | Value::Text(_)
        )
    }

    /// Get this value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as an `i64`, if it is an integer of any width.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Byte(n) => Some(i64::from(*n)),
            Value::Short(n) => Some(i64::from(*n)),
            Value::Int(n) => Some(i64::from(*n)),
            Value::Long(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as text, if it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as a list, if it is one.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get this value as a map, if it is one.
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Get the shared cell handle, if this is one.
    pub fn as_shared(&self) -> Option<&SharedValue> {
        match self {
            Value::Shared(cell) => Some(cell),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Short(a), Value::Short(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Shared(a), Value::Shared(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

impl NumericValue for Value {
    fn as_number(&self) -> Option<Number> {
        match self {
            Value::Int(n) => Some(Number::Int(*n)),
            Value::Long(n) => Some(Number::Long(*n)),
            Value::Float(n) => Some(Number::Float(*n)),
            Value::Double(n) => Some(Number::Double(*n)),
            // Narrow integer kinds widen to Long
            Value::Byte(n) => Some(Number::Long(i64::from(*n))),
            Value::Short(n) => Some(Number::Long(i64::from(*n))),
            _ => None,
        }
    }

    fn from_number(number: Number) -> Option<Self> {
        Some(Value::from(number))
    }

    fn kind_name(&self) -> &'static str {
        self.type_name()
    }
}

impl From<Number> for Value {
    fn from(number: Number) -> Self {
        match number {
            Number::Int(n) => Value::Int(n),
            Number::Long(n) => Value::Long(n),
            Number::Float(n) => Value::Float(n),
            Number::Double(n) => Value::Double(n),
        }
    }
}

macro_rules! impl_from {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        }
    };
}

impl_from!(bool, Bool);
impl_from!(i8, Byte);
impl_from!(i16, Short);
impl_from!(i32, Int);
impl_from!(i64, Long);
impl_from!(f32, Float);
impl_from!(f64, Double);
impl_from!(String, Text);
impl_from!(Vec<u8>, Bytes);
impl_from!(Vec<Value>, List);
impl_from!(BTreeMap<String, Value>, Map);
impl_from!(SharedValue, Shared);
impl_from!(OpaqueValue, Opaque);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// A cloneable handle to a mutable value cell.
///
/// Every clone of the handle reads and writes the same cell, so a value
/// containing a `SharedValue` changes whenever any holder writes to it.
#[derive(Clone)]
pub struct SharedValue(Arc<RwLock<Value>>);

impl SharedValue {
    /// Creates a new cell holding `value`.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    /// Returns a clone of the current contents.
    #[must_use]
    pub fn get(&self) -> Value {
        self.0.read().clone()
    }

    /// Replaces the contents, returning the previous value.
    pub fn set(&self, value: Value) -> Value {
        std::mem::replace(&mut *self.0.write(), value)
    }

    /// Mutates the contents in place.
    pub fn update<R>(&self, f: impl FnOnce(&mut Value) -> R) -> R {
        f(&mut self.0.write())
    }

    /// Applies `f` to the current contents under a read lock.
    pub fn with<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        f(&self.0.read())
    }

    /// Returns true if both handles point at the same cell.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for SharedValue {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0.read() == *other.0.read()
    }
}

impl fmt::Debug for SharedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedValue").field(&*self.0.read()).finish()
    }
}

/// A foreign payload stored by reference.
///
/// Opaque payloads compare by identity and cannot be deep-copied, so they
/// can be stored directly but are rejected by transactions.
#[derive(Clone)]
pub struct OpaqueValue {
    payload: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl OpaqueValue {
    /// Wraps `payload`.
    pub fn new<T: Any + Send + Sync>(payload: T) -> Self {
        Self {
            payload: Arc::new(payload),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Returns the Rust type name of the payload.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the payload if it has type `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl PartialEq for OpaqueValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.payload, &other.payload)
    }
}

impl fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpaqueValue")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}
