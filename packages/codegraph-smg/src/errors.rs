//! Error types for codegraph-smg
//!
//! Provides unified error handling across the crate.
//!
//! Two classes live here:
//! - **Target-program errors** (`OutOfRange`, `InvalidAccess`): recoverable,
//!   attached to the state as a violation and analysis continues.
//! - **Internal errors** (`InternalInconsistency`): a bug in abstraction or
//!   materialization. Drivers must abort the run when `is_fatal()` holds.

use crate::features::smg::domain::{ObjectId, ValueId};
use thiserror::Error;

/// Main error type for codegraph-smg operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmgError {
    /// Read or write outside `[base_offset, base_offset + size)`
    #[error("Out of range access on {object}: [{offset}, {offset}+{size}) exceeds [{base_offset}, {base_offset}+{object_size})")]
    OutOfRange {
        object: ObjectId,
        offset: u64,
        size: u64,
        base_offset: u64,
        object_size: u64,
    },

    /// Access to a freed object or the null object
    #[error("Invalid access on {object}: {reason}")]
    InvalidAccess { object: ObjectId, reason: String },

    /// A pointer value without a points-to edge where one is required
    #[error("Internal inconsistency: value {0} is not a pointer")]
    DanglingPointer(ValueId),

    /// Dereference still targets a summary after the configured number of unfoldings
    #[error("Materialization gave up after {0} unfolding steps")]
    MaterializationLimit(usize),

    /// Broken graph invariant (missing object, malformed segment, ...)
    #[error("Internal inconsistency: {0}")]
    InternalInconsistency(String),
}

impl SmgError {
    /// Create an internal inconsistency error
    pub fn internal(msg: impl Into<String>) -> Self {
        SmgError::InternalInconsistency(msg.into())
    }

    /// Create an invalid access error
    pub fn invalid_access(object: ObjectId, reason: impl Into<String>) -> Self {
        SmgError::InvalidAccess {
            object,
            reason: reason.into(),
        }
    }

    /// Internal errors indicate a bug in the engine, not in the analysed program
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SmgError::DanglingPointer(_) | SmgError::InternalInconsistency(_)
        )
    }
}

/// Result type alias for SMG operations
pub type Result<T> = std::result::Result<T, SmgError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(SmgError::internal("broken").is_fatal());
        assert!(SmgError::DanglingPointer(ValueId::new(7)).is_fatal());
        assert!(!SmgError::invalid_access(ObjectId::NULL, "null").is_fatal());
        assert!(!SmgError::MaterializationLimit(16).is_fatal());
    }

    #[test]
    fn test_out_of_range_message() {
        let err = SmgError::OutOfRange {
            object: ObjectId::new(3),
            offset: 64,
            size: 32,
            base_offset: 0,
            object_size: 64,
        };
        let msg = err.to_string();
        assert!(msg.contains("obj#3"));
        assert!(msg.contains("[64, 64+32)"));
    }
}
