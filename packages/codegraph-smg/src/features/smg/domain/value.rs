//! Values stored in the heap graph
//!
//! A [`ValueId`] is an opaque handle. What it denotes is recorded in the
//! graph's value table as a [`Value`]: either a known number or an unknown
//! (symbolic) datum. Pointer-ness is not a property of the value itself; a
//! value is a pointer exactly when the graph holds a points-to edge for it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of a value in the heap graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ValueId(u64);

impl ValueId {
    /// Numeric zero and the null pointer
    pub const ZERO: ValueId = ValueId(0);

    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v#{}", self.0)
    }
}

/// Concretely known number
///
/// Integers and floats are distinct runtime representations: they never
/// compare equal to each other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Number {
    Integer(i128),
    Float(f64),
}

impl Number {
    /// Numeric equality. NaN is not equal to anything, itself included.
    pub fn numerically_equal(&self, other: &Number) -> bool {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => a == b,
            (Number::Float(a), Number::Float(b)) => a == b,
            _ => false,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Integer(v) => *v == 0,
            Number::Float(_) => false,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(v) => write!(f, "{}", v),
            Number::Float(v) => write!(f, "{}f", v),
        }
    }
}

/// Entry of the value table
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Value {
    /// Concretely known number
    Numeric(Number),
    /// Unknown datum (fresh read, symbolic input, or pointer)
    Symbolic,
}

impl Value {
    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Numeric(n) => Some(n),
            Value::Symbolic => None,
        }
    }
}
