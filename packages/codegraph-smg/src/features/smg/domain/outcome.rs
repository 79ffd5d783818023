//! Results of the abstraction, materialization and merge operations

use super::object::{ListSegment, ObjectId};
use super::state::SmgState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chain start plus the link layout used to walk it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FoldCandidate {
    pub root: ObjectId,
    /// Offset within a node that `next` pointers address
    pub head_offset: u64,
    pub next_offset: u64,
    /// Set for doubly linked candidates
    pub prev_offset: Option<u64>,
}

impl FoldCandidate {
    pub fn singly(root: ObjectId, head_offset: u64, next_offset: u64) -> Self {
        Self {
            root,
            head_offset,
            next_offset,
            prev_offset: None,
        }
    }

    pub fn doubly(root: ObjectId, head_offset: u64, next_offset: u64, prev_offset: u64) -> Self {
        Self {
            root,
            head_offset,
            next_offset,
            prev_offset: Some(prev_offset),
        }
    }

    /// Offsets exempt from content comparison
    pub fn link_offsets(&self) -> Vec<u64> {
        match self.prev_offset {
            Some(prev) => vec![self.next_offset, prev],
            None => vec![self.next_offset],
        }
    }

    /// Segment descriptor with this layout
    pub fn segment(&self, min_length: u32) -> ListSegment {
        match self.prev_offset {
            Some(prev) => ListSegment::doubly(min_length, self.head_offset, self.next_offset, prev),
            None => ListSegment::singly(min_length, self.head_offset, self.next_offset),
        }
    }

    /// Whether an existing segment was built with the same links
    pub fn matches(&self, segment: &ListSegment) -> bool {
        segment.head_offset == self.head_offset
            && segment.next_offset == self.next_offset
            && segment.prev_offset() == self.prev_offset
    }
}

impl fmt::Display for FoldCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.prev_offset {
            Some(prev) => write!(f, "{} (next @{}, prev @{})", self.root, self.next_offset, prev),
            None => write!(f, "{} (next @{})", self.root, self.next_offset),
        }
    }
}

/// Result of folding one candidate
#[derive(Debug, Clone)]
pub enum FoldOutcome {
    /// No chain long enough; the input state stands
    Unchanged,
    /// At least one segment was created
    Folded {
        state: SmgState,
        segments: Vec<ObjectId>,
    },
}

impl FoldOutcome {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, FoldOutcome::Unchanged)
    }

    /// The folded state, or `original` when nothing changed
    pub fn into_state(self, original: SmgState) -> SmgState {
        match self {
            FoldOutcome::Unchanged => original,
            FoldOutcome::Folded { state, .. } => state,
        }
    }
}

/// One concretization of a dereferenced pointer
#[derive(Debug, Clone)]
pub struct Materialized {
    pub state: SmgState,
    /// Concrete region the pointer addresses in `state`
    pub target: ObjectId,
    pub offset: u64,
}

/// Direction of a successful merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Entailment {
    /// The returned (right) state covers the left one
    LeftEntailedInRight,
    /// The returned (left) state covers the right one
    RightEntailedInLeft,
    /// Reserved for a true join; never produced
    Join,
}
