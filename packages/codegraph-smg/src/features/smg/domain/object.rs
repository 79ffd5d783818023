//! Memory objects: plain regions and list segments
//!
//! ```text
//! MemoryObject ::= Region                         // heap, stack, global
//!                | Segment { min_length,          // ≥ min_length nodes
//!                            head_offset,
//!                            next_offset,
//!                            linkage: Singly | Doubly { prev_offset } }
//! ```
//!
//! Every consumer matches on [`ObjectKind`] and [`Linkage`] exhaustively, so
//! adding a new summary shape is a compile error until each engine handles it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of a memory object
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(u64);

impl ObjectId {
    /// The distinguished null object
    pub const NULL: ObjectId = ObjectId(0);

    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj#{}", self.0)
    }
}

/// Link structure of a list segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Linkage {
    /// Only a `next` field
    Singly,
    /// `next` and `prev` fields
    Doubly { prev_offset: u64 },
}

/// Summary of `min_length` or more structurally identical chain nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListSegment {
    /// Least number of concrete nodes represented (0 = zero-or-more)
    pub min_length: u32,
    /// Offset of the node data relative to the object start
    pub head_offset: u64,
    /// Offset of the `next` field
    pub next_offset: u64,
    pub linkage: Linkage,
}

impl ListSegment {
    pub fn singly(min_length: u32, head_offset: u64, next_offset: u64) -> Self {
        Self {
            min_length,
            head_offset,
            next_offset,
            linkage: Linkage::Singly,
        }
    }

    /// Doubly linked segment.
    ///
    /// # Panics
    /// When `next_offset == prev_offset`: a segment whose links alias is a
    /// bug in whoever built it.
    pub fn doubly(min_length: u32, head_offset: u64, next_offset: u64, prev_offset: u64) -> Self {
        assert_ne!(
            next_offset, prev_offset,
            "list segment next and prev fields must differ"
        );
        Self {
            min_length,
            head_offset,
            next_offset,
            linkage: Linkage::Doubly { prev_offset },
        }
    }

    pub fn prev_offset(&self) -> Option<u64> {
        match self.linkage {
            Linkage::Singly => None,
            Linkage::Doubly { prev_offset } => Some(prev_offset),
        }
    }

    pub fn is_doubly_linked(&self) -> bool {
        matches!(self.linkage, Linkage::Doubly { .. })
    }

    /// Offsets excluded when comparing element content
    pub fn link_offsets(&self) -> Vec<u64> {
        match self.linkage {
            Linkage::Singly => vec![self.next_offset],
            Linkage::Doubly { prev_offset } => vec![self.next_offset, prev_offset],
        }
    }

    /// Nesting level of a pointer addressing the first element.
    ///
    /// A pointer with nesting level `k` addresses element `min_length - 1 - k`;
    /// for zero-or-more segments every pointer sits at level 0.
    pub fn head_nesting_level(&self) -> u32 {
        self.min_length.saturating_sub(1)
    }

    pub fn with_min_length(mut self, min_length: u32) -> Self {
        self.min_length = min_length;
        self
    }

    /// Same links and head offset, ignoring the length
    pub fn same_layout(&self, other: &ListSegment) -> bool {
        self.head_offset == other.head_offset
            && self.next_offset == other.next_offset
            && self.linkage == other.linkage
    }
}

impl fmt::Display for ListSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.linkage {
            Linkage::Singly => write!(f, "SLL[{}+]", self.min_length),
            Linkage::Doubly { .. } => write!(f, "DLL[{}+]", self.min_length),
        }
    }
}

/// Variant of a memory object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Region,
    Segment(ListSegment),
}

/// Region of storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryObject {
    pub id: ObjectId,
    /// Size in bits
    pub size: u64,
    /// First valid offset in bits
    pub base_offset: u64,
    /// False once freed; the null object is never valid
    pub valid: bool,
    /// Abstraction hops between this object and a concretely reachable pointer
    pub nesting_level: u32,
    pub kind: ObjectKind,
}

impl MemoryObject {
    pub fn region(id: ObjectId, size: u64) -> Self {
        Self {
            id,
            size,
            base_offset: 0,
            valid: true,
            nesting_level: 0,
            kind: ObjectKind::Region,
        }
    }

    pub fn segment(id: ObjectId, size: u64, segment: ListSegment) -> Self {
        Self {
            id,
            size,
            base_offset: 0,
            valid: true,
            nesting_level: 0,
            kind: ObjectKind::Segment(segment),
        }
    }

    pub fn null() -> Self {
        Self {
            id: ObjectId::NULL,
            size: 0,
            base_offset: 0,
            valid: false,
            nesting_level: 0,
            kind: ObjectKind::Region,
        }
    }

    pub fn with_base_offset(mut self, base_offset: u64) -> Self {
        self.base_offset = base_offset;
        self
    }

    pub fn with_nesting_level(mut self, nesting_level: u32) -> Self {
        self.nesting_level = nesting_level;
        self
    }

    pub fn is_null(&self) -> bool {
        self.id.is_null()
    }

    pub fn is_segment(&self) -> bool {
        matches!(self.kind, ObjectKind::Segment(_))
    }

    pub fn as_segment(&self) -> Option<&ListSegment> {
        match &self.kind {
            ObjectKind::Segment(seg) => Some(seg),
            ObjectKind::Region => None,
        }
    }

    /// Number of list elements this object stands for when folded
    pub fn list_length(&self) -> u32 {
        match &self.kind {
            ObjectKind::Region => 1,
            ObjectKind::Segment(seg) => seg.min_length,
        }
    }

    /// Whether `[offset, offset + size)` lies inside the object
    pub fn contains_range(&self, offset: u64, size: u64) -> bool {
        let end = match offset.checked_add(size) {
            Some(end) => end,
            None => return false,
        };
        // end >= offset >= base_offset, so the subtraction cannot wrap
        offset >= self.base_offset && end - self.base_offset <= self.size
    }

    /// Same size, base offset and validity; used before comparing content
    pub fn same_frame(&self, other: &MemoryObject) -> bool {
        self.size == other.size && self.base_offset == other.base_offset && self.valid == other.valid
    }
}
