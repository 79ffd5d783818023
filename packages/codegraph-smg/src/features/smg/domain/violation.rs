//! Memory safety violations recorded on a state
//!
//! Recoverable access errors do not abort the analysis. They are attached
//! to the state that produced them and take part in the lattice order: a
//! state only covers another if it reports at least the same violations.

use super::object::ObjectId;
use crate::errors::SmgError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Violation category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ViolationKind {
    /// Read or write outside the object bounds
    OutOfRange,
    /// Access to a freed object or through the null pointer
    InvalidAccess,
    /// Free of the null object or of an already freed object
    InvalidFree,
}

/// Single violation (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    /// Object involved, `ObjectId::NULL` when none
    pub object: ObjectId,
    pub message: String,
}

impl Violation {
    pub fn new(kind: ViolationKind, object: ObjectId, message: impl Into<String>) -> Self {
        Self {
            kind,
            object,
            message: message.into(),
        }
    }

    /// Classify a recoverable error; `None` for internal errors
    pub fn from_error(error: &SmgError) -> Option<Self> {
        let violation = match error {
            SmgError::OutOfRange { object, .. } => Violation::new(ViolationKind::OutOfRange, *object, error.to_string()),
            SmgError::InvalidAccess { object, .. } => {
                Violation::new(ViolationKind::InvalidAccess, *object, error.to_string())
            }
            SmgError::MaterializationLimit(_)
            | SmgError::DanglingPointer(_)
            | SmgError::InternalInconsistency(_) => return None,
        };
        Some(violation)
    }

    /// Same error, reported for a `free`
    pub fn from_free_error(error: &SmgError) -> Option<Self> {
        Self::from_error(error).map(|mut v| {
            if v.kind == ViolationKind::InvalidAccess {
                v.kind = ViolationKind::InvalidFree;
            }
            v
        })
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}
