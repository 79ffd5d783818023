//! Shape Equality & Subsumption
//!
//! Decides whether two values, possibly living in two different states,
//! describe the same heap shape.
//!
//! ```text
//! equal(v1, v2) ⟺ numbers:   numerically equal (NaN never)
//!                  unknowns:  same handle
//!                  pointers:  same offset/specifier/frame ∧ targets equal
//! targets equal  ⟺ same object nesting level ∧
//!                  region × region:   content equal, freed objects included
//!                  segment × segment: same layout ∧ min order ∧ same position
//!                                     ∧ element content equal (links exempt)
//!                                     ∧ neighbours equal
//! ```
//!
//! Pointer cycles are cut with a visited set of value pairs: a pair met
//! again during the same query is assumed equal (coinductive reading).
//!
//! References:
//! - Dudka, Peringer, Vojnar (2011): "Predator", join and entailment of SMGs
//! - Müller (2016): "Symbolic Memory Graphs in CPAchecker"

use crate::features::smg::domain::{
    HeapGraph, ListSegment, MemoryObject, ObjectId, ObjectKind, PointsToEdge, SmgState, TargetSpecifier, ValueId,
};
use rustc_hash::{FxHashMap, FxHashSet};

/// How segment lengths are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonMode {
    /// Minimum lengths must match
    Exact,
    /// `this.min <= other.min`: the left side may be more general
    Subsumption,
}

/// Pairs of values (left, right) already proven equal in one query
#[derive(Debug, Default)]
pub struct EqualityCache {
    proven: FxHashMap<ValueId, FxHashSet<ValueId>>,
}

impl EqualityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, left: ValueId, right: ValueId) -> bool {
        self.proven
            .get(&left)
            .map(|set| set.contains(&right))
            .unwrap_or(false)
    }

    pub fn insert(&mut self, left: ValueId, right: ValueId) {
        self.proven.entry(left).or_default().insert(right);
    }

    pub fn len(&self) -> usize {
        self.proven.values().map(|set| set.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.proven.is_empty()
    }
}

/// Structural comparator over two graphs
///
/// One comparator serves one top-level query; the visited set is never
/// reset in between.
pub struct ShapeComparator<'a> {
    this: &'a HeapGraph,
    other: &'a HeapGraph,
    mode: ComparisonMode,
    cache: &'a mut EqualityCache,
    visited: FxHashSet<(ValueId, ValueId)>,
}

impl<'a> ShapeComparator<'a> {
    pub fn new(this: &'a HeapGraph, other: &'a HeapGraph, mode: ComparisonMode, cache: &'a mut EqualityCache) -> Self {
        Self {
            this,
            other,
            mode,
            cache,
            visited: FxHashSet::default(),
        }
    }

    pub fn mode(&self) -> ComparisonMode {
        self.mode
    }

    /// Compare `a` (in this graph) with `b` (in the other graph)
    pub fn values_equal(&mut self, a: ValueId, b: ValueId) -> bool {
        let a_is_pointer = self.this.is_pointer(a);
        let b_is_pointer = self.other.is_pointer(b);

        if a_is_pointer != b_is_pointer {
            return false;
        }

        if !a_is_pointer {
            // pointers to the null object behave like the null value
            if let (Some(pa), Some(pb)) = (self.this.points_to(a), self.other.points_to(b)) {
                if pa.is_null() && pb.is_null() {
                    return pa.offset == pb.offset;
                }
            }
            return match (self.this.number(a), self.other.number(b)) {
                (Some(x), Some(y)) => x.numerically_equal(&y),
                _ => a == b,
            };
        }

        if self.cache.contains(a, b) {
            return true;
        }
        if !self.visited.insert((a, b)) {
            return true;
        }

        let (pa, pb) = match (self.this.points_to(a), self.other.points_to(b)) {
            (Some(pa), Some(pb)) => (*pa, *pb),
            _ => return false,
        };

        let equal = self.targets_equal(&pa, &pb);
        if equal {
            self.cache.insert(a, b);
        }
        equal
    }

    fn targets_equal(&mut self, pa: &PointsToEdge, pb: &PointsToEdge) -> bool {
        let this = self.this;
        let other = self.other;
        let (oa, ob) = match (this.object(pa.target), other.object(pb.target)) {
            (Some(oa), Some(ob)) => (oa, ob),
            _ => return false,
        };

        if pa.offset != pb.offset
            || pa.specifier != pb.specifier
            || oa.nesting_level != ob.nesting_level
            || !oa.same_frame(ob)
        {
            return false;
        }

        match (&oa.kind, &ob.kind) {
            (ObjectKind::Region, ObjectKind::Region) => {
                pa.nesting_level == pb.nesting_level && self.check_equal_values_with_exemptions(oa.id, ob.id, &[])
            }
            (ObjectKind::Segment(sa), ObjectKind::Segment(sb)) => self.segments_equal(oa, sa, pa, ob, sb, pb),
            _ => false,
        }
    }

    fn segments_equal(
        &mut self,
        oa: &MemoryObject,
        sa: &ListSegment,
        pa: &PointsToEdge,
        ob: &MemoryObject,
        sb: &ListSegment,
        pb: &PointsToEdge,
    ) -> bool {
        if !sa.same_layout(sb) {
            return false;
        }

        let lengths_ok = match self.mode {
            ComparisonMode::Exact => sa.min_length == sb.min_length,
            ComparisonMode::Subsumption => sa.min_length <= sb.min_length,
        };
        if !lengths_ok || pointer_position(sa, pa) != pointer_position(sb, pb) {
            return false;
        }

        let exempt = sa.link_offsets();
        if !self.check_equal_values_with_exemptions(oa.id, ob.id, &exempt) {
            return false;
        }

        exempt
            .iter()
            .all(|&offset| self.link_values_equal(oa.id, ob.id, offset))
    }

    fn link_values_equal(&mut self, a: ObjectId, b: ObjectId, offset: u64) -> bool {
        let this = self.this;
        let other = self.other;
        match (this.edge_at(a, offset), other.edge_at(b, offset)) {
            (Some(ea), Some(eb)) => ea.size == eb.size && self.values_equal(ea.value, eb.value),
            (None, None) => true,
            _ => false,
        }
    }

    /// Compare the content of two objects, skipping `exempt` offsets.
    ///
    /// Symmetric. A field bound on one side only is tolerated unless it
    /// holds a pointer.
    pub fn check_equal_values_with_exemptions(&mut self, a: ObjectId, b: ObjectId, exempt: &[u64]) -> bool {
        let this = self.this;
        let other = self.other;

        for ea in this.edges(a).filter(|e| !exempt.contains(&e.offset)) {
            match other.edge_at(b, ea.offset) {
                Some(eb) => {
                    if eb.size != ea.size || !self.values_equal(ea.value, eb.value) {
                        return false;
                    }
                }
                None => {
                    if this.is_pointer(ea.value) {
                        return false;
                    }
                }
            }
        }

        other
            .edges(b)
            .filter(|e| !exempt.contains(&e.offset))
            .all(|eb| this.edge_at(a, eb.offset).is_some() || !other.is_pointer(eb.value))
    }

    /// Does the content of `a` cover the content of `b`?
    ///
    /// Fields bound only in `b` are tolerated; a field bound only in `a`
    /// must not hold a pointer.
    pub fn check_covering_values(&mut self, a: ObjectId, b: ObjectId) -> bool {
        let this = self.this;
        let other = self.other;

        for ea in this.edges(a) {
            match other.edge_at(b, ea.offset) {
                Some(eb) => {
                    if eb.size != ea.size || !self.values_equal(ea.value, eb.value) {
                        return false;
                    }
                }
                None => {
                    if this.is_pointer(ea.value) {
                        return false;
                    }
                }
            }
        }
        true
    }
}

/// Distance of the addressed element from the end the specifier counts from
fn pointer_position(segment: &ListSegment, pointer: &PointsToEdge) -> u32 {
    match pointer.specifier {
        TargetSpecifier::Region | TargetSpecifier::First => {
            segment.head_nesting_level().saturating_sub(pointer.nesting_level)
        }
        TargetSpecifier::Last => pointer.nesting_level,
        TargetSpecifier::All => 0,
    }
}

/// Exact equality of two values in two states
pub fn equal(this: &SmgState, a: ValueId, other: &SmgState, b: ValueId) -> bool {
    let mut cache = EqualityCache::new();
    ShapeComparator::new(this.graph(), other.graph(), ComparisonMode::Exact, &mut cache).values_equal(a, b)
}

/// `this ⊑ other`: every concrete heap of `other` is described by `this`.
///
/// A smaller minimum length is more general, so `this` holding `3+` where
/// `other` holds `5+` satisfies the order.
pub fn is_less_or_equal(this: &SmgState, other: &SmgState) -> bool {
    let this_vars = this.variables();
    let other_vars = other.variables();

    if this_vars.len() != other_vars.len() {
        return false;
    }

    if !this
        .violations()
        .iter()
        .all(|v| other.violations().iter().any(|w| w == v))
    {
        return false;
    }

    let mut cache = EqualityCache::new();
    let mut comparator = ShapeComparator::new(this.graph(), other.graph(), ComparisonMode::Subsumption, &mut cache);

    for (key, this_obj) in this_vars.entries() {
        let other_obj = match other_vars.get(&key) {
            Some(obj) => obj,
            None => return false,
        };
        let (a, b) = match (this.graph().object(this_obj), other.graph().object(other_obj)) {
            (Some(a), Some(b)) => (a, b),
            _ => return false,
        };
        if a.size != b.size || a.valid != b.valid {
            return false;
        }
        if !comparator.check_covering_values(this_obj, other_obj) {
            return false;
        }
    }
    true
}
