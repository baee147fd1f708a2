//! Numeric kinds supported by atomic counters.

use std::fmt;

/// A numeric value of one of the kinds the store can increment.
///
/// Arithmetic preserves the kind: an `Int` plus a delta is an `Int`,
/// a `Double` plus a delta is a `Double`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit signed integer.
    Long(i64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
}

impl Number {
    /// Adds `delta` to this number, keeping its kind.
    ///
    /// Returns `None` if the result does not fit the kind. For `Int` this
    /// includes a delta outside the `i32` range.
    #[must_use]
    pub fn checked_add(self, delta: i64) -> Option<Self> {
        match self {
            Number::Int(n) => i32::try_from(delta)
                .ok()
                .and_then(|d| n.checked_add(d))
                .map(Number::Int),
            Number::Long(n) => n.checked_add(delta).map(Number::Long),
            #[allow(clippy::cast_precision_loss)]
            Number::Float(n) => Some(Number::Float(n + delta as f32)),
            #[allow(clippy::cast_precision_loss)]
            Number::Double(n) => Some(Number::Double(n + delta as f64)),
        }
    }

    /// Returns the name of this numeric kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Number::Int(_) => "int",
            Number::Long(_) => "long",
            Number::Float(_) => "float",
            Number::Double(_) => "double",
        }
    }

    /// Returns the value as an `i64`, if it is an integer kind.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Int(n) => Some(i64::from(*n)),
            Number::Long(n) => Some(*n),
            Number::Float(_) | Number::Double(_) => None,
        }
    }

    /// Returns the value as an `f64`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(n) => f64::from(*n),
            Number::Long(n) => *n as f64,
            Number::Float(n) => f64::from(*n),
            Number::Double(n) => *n,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{n}"),
            Number::Long(n) => write!(f, "{n}"),
            Number::Float(n) => write!(f, "{n}"),
            Number::Double(n) => write!(f, "{n}"),
        }
    }
}

/// Types that can take part in atomic increment and decrement.
///
/// A store only increments values whose [`as_number`](Self::as_number)
/// returns `Some`. The result is written back with
/// [`from_number`](Self::from_number), which may refuse a kind the type
/// cannot hold.
pub trait NumericValue: Sized {
    /// Returns the numeric view of this value, if it is numeric.
    fn as_number(&self) -> Option<Number>;

    /// Builds a value from a number.
    fn from_number(number: Number) -> Option<Self>;

    /// Returns the name of this value's kind, numeric or not.
    fn kind_name(&self) -> &'static str;
}

impl NumericValue for Number {
    fn as_number(&self) -> Option<Number> {
        Some(*self)
    }

    fn from_number(number: Number) -> Option<Self> {
        Some(number)
    }

    fn kind_name(&self) -> &'static str {
        self.kind()
    }
}

macro_rules! impl_numeric_value {
    ($ty:ty, $variant:ident, $kind:literal) => {
        impl NumericValue for $ty {
            fn as_number(&self) -> Option<Number> {
                Some(Number::$variant(*self))
            }

            fn from_number(number: Number) -> Option<Self> {
                match number {
                    Number::$variant(n) => Some(n),
                    _ => None,
                }
            }

            fn kind_name(&self) -> &'static str {
                $kind
            }
        }
    };
}

impl_numeric_value!(i32, Int, "int");
impl_numeric_value!(i64, Long, "long");
impl_numeric_value!(f32, Float, "float");
impl_numeric_value!(f64, Double, "double");
