//! Graph edges
//!
//! ```text
//! has-value:  object[offset .. offset+size) = value
//! points-to:  value ↦ (object, offset, nesting_level, specifier)
//! ```

use super::object::ObjectId;
use super::value::ValueId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Content of an object at a bit range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HasValueEdge {
    pub object: ObjectId,
    /// Offset in bits
    pub offset: u64,
    /// Size in bits
    pub size: u64,
    pub value: ValueId,
}

impl HasValueEdge {
    pub fn new(object: ObjectId, offset: u64, size: u64, value: ValueId) -> Self {
        Self {
            object,
            offset,
            size,
            value,
        }
    }

    pub fn end(&self) -> u64 {
        self.offset + self.size
    }

    /// Whether the edge shares at least one bit with `[offset, offset + size)`
    pub fn overlaps(&self, offset: u64, size: u64) -> bool {
        self.offset < offset.saturating_add(size) && offset < self.end()
    }
}

/// Which concretization of a summary target a pointer addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetSpecifier {
    /// Plain region target
    Region,
    /// Counted from the first element of a segment
    First,
    /// The last element of a doubly linked segment
    Last,
    /// Every element: pointers from a segment's nested structures back into it
    All,
}

impl TargetSpecifier {
    /// Specifier a region pointer takes once its target is summarised
    pub fn for_segment(self) -> Self {
        match self {
            TargetSpecifier::Region => TargetSpecifier::First,
            other => other,
        }
    }
}

/// Target of a pointer value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointsToEdge {
    pub target: ObjectId,
    /// Offset in bits within the target
    pub offset: u64,
    pub nesting_level: u32,
    pub specifier: TargetSpecifier,
}

impl PointsToEdge {
    pub fn region(target: ObjectId, offset: u64) -> Self {
        Self {
            target,
            offset,
            nesting_level: 0,
            specifier: TargetSpecifier::Region,
        }
    }

    pub fn segment(target: ObjectId, offset: u64, nesting_level: u32, specifier: TargetSpecifier) -> Self {
        Self {
            target,
            offset,
            nesting_level,
            specifier,
        }
    }

    pub fn retarget(mut self, target: ObjectId) -> Self {
        self.target = target;
        self
    }

    pub fn is_null(&self) -> bool {
        self.target.is_null()
    }
}

impl fmt::Display for PointsToEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}+{} [{:?}, level {}]",
            self.target, self.offset, self.specifier, self.nesting_level
        )
    }
}
