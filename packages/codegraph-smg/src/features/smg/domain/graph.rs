//! Heap Graph - persistent symbolic memory graph
//!
//! ```text
//! HeapGraph ::= Objects × HasValue × PointsTo × ValueTable
//!
//! Objects  = ObjectId → MemoryObject
//! HasValue = ObjectId → (offset → (size, ValueId))     // non-overlapping
//! PointsTo = ValueId  → (ObjectId, offset, level, specifier)
//! ```
//!
//! ## Persistence
//!
//! Every relation is an `rpds` red-black tree, so an update copies only the
//! path to the touched node and shares the rest. Cloning a graph is O(1); a
//! derived graph never disturbs the graph it was derived from, so analysis
//! branches can keep old states around for backtracking and interpolation.
//! Trees rather than hash tries keep iteration in id order.
//!
//! The public mutators consume the graph and hand back the new version.
//! Engines inside the crate batch their rewrites through the `*_mut`
//! helpers on a graph they own.
//!
//! ## Invariants
//! - `ObjectId::NULL` exists, has size 0, and is never valid.
//! - `ValueId::ZERO` is the number 0 and points to `NULL + 0`.
//! - Has-value edges of one object never overlap.
//! - `incoming[o]` is exactly the set of values whose points-to target is `o`.

use super::edge::{HasValueEdge, PointsToEdge, TargetSpecifier};
use super::object::{ListSegment, MemoryObject, ObjectId, ObjectKind};
use super::value::{Number, Value, ValueId};
use crate::errors::{Result, SmgError};
use rpds::{RedBlackTreeMapSync, RedBlackTreeSetSync};
use std::collections::{BTreeSet, VecDeque};
use std::fmt;

type EdgeMap = RedBlackTreeMapSync<u64, HasValueEdge>;

/// Symbolic memory graph
#[derive(Debug, Clone)]
pub struct HeapGraph {
    objects: RedBlackTreeMapSync<ObjectId, MemoryObject>,
    has_value: RedBlackTreeMapSync<ObjectId, EdgeMap>,
    points_to: RedBlackTreeMapSync<ValueId, PointsToEdge>,
    incoming: RedBlackTreeMapSync<ObjectId, RedBlackTreeSetSync<ValueId>>,
    values: RedBlackTreeMapSync<ValueId, Value>,
    next_object: u64,
    next_value: u64,
}

impl Default for HeapGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl HeapGraph {
    /// Graph holding only the null object and the zero value
    pub fn new() -> Self {
        Self {
            objects: RedBlackTreeMapSync::new_sync().insert(ObjectId::NULL, MemoryObject::null()),
            has_value: RedBlackTreeMapSync::new_sync(),
            points_to: RedBlackTreeMapSync::new_sync().insert(ValueId::ZERO, PointsToEdge::region(ObjectId::NULL, 0)),
            incoming: RedBlackTreeMapSync::new_sync()
                .insert(ObjectId::NULL, RedBlackTreeSetSync::new_sync().insert(ValueId::ZERO)),
            values: RedBlackTreeMapSync::new_sync().insert(ValueId::ZERO, Value::Numeric(Number::Integer(0))),
            next_object: 1,
            next_value: 1,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════════════════

    pub fn object(&self, id: ObjectId) -> Option<&MemoryObject> {
        self.objects.get(&id)
    }

    pub fn contains_object(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    /// All objects, null object included, in id order
    pub fn objects(&self) -> impl Iterator<Item = &MemoryObject> {
        self.objects.values()
    }

    pub fn object_count(&self) -> usize {
        self.objects.size()
    }

    pub fn segments(&self) -> impl Iterator<Item = (&MemoryObject, &ListSegment)> {
        self.objects
            .values()
            .filter_map(|obj| obj.as_segment().map(|seg| (obj, seg)))
    }

    /// Has-value edges of an object in offset order
    pub fn edges(&self, object: ObjectId) -> impl Iterator<Item = &HasValueEdge> {
        self.has_value.get(&object).into_iter().flat_map(|edges| edges.values())
    }

    pub fn edge_at(&self, object: ObjectId, offset: u64) -> Option<&HasValueEdge> {
        self.has_value.get(&object).and_then(|edges| edges.get(&offset))
    }

    /// Value stored at exactly `[offset, offset + size)`, if any
    pub fn value_at(&self, object: ObjectId, offset: u64, size: u64) -> Option<ValueId> {
        self.edge_at(object, offset)
            .filter(|edge| edge.size == size)
            .map(|edge| edge.value)
    }

    pub fn value(&self, value: ValueId) -> Option<&Value> {
        self.values.get(&value)
    }

    pub fn number(&self, value: ValueId) -> Option<Number> {
        self.values.get(&value).and_then(|v| v.as_number().copied())
    }

    pub fn points_to(&self, value: ValueId) -> Option<&PointsToEdge> {
        self.points_to.get(&value)
    }

    /// A value with a points-to edge to something other than the null object
    pub fn is_pointer(&self, value: ValueId) -> bool {
        self.points_to
            .get(&value)
            .map(|edge| !edge.is_null())
            .unwrap_or(false)
    }

    /// Pointer values whose target is `object`
    pub fn pointers_to(&self, object: ObjectId) -> Vec<ValueId> {
        self.incoming
            .get(&object)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Every has-value edge holding `value`
    pub fn edges_holding(&self, value: ValueId) -> Vec<HasValueEdge> {
        self.has_value
            .values()
            .flat_map(|edges| edges.values())
            .filter(|edge| edge.value == value)
            .copied()
            .collect()
    }

    /// Target object of the pointer stored at `offset`, if that field holds a
    /// non-null pointer
    pub fn pointer_target_at(&self, object: ObjectId, offset: u64) -> Option<&PointsToEdge> {
        self.edge_at(object, offset)
            .and_then(|edge| self.points_to.get(&edge.value))
            .filter(|pt| !pt.is_null())
    }

    /// Objects reachable from `roots` through stored pointers, roots included
    pub fn reachable_objects(&self, roots: impl IntoIterator<Item = ObjectId>) -> BTreeSet<ObjectId> {
        self.reach(roots, None)
    }

    /// Like `reachable_objects`, but never entering `blocked`
    pub fn reachable_objects_avoiding(
        &self,
        roots: impl IntoIterator<Item = ObjectId>,
        blocked: ObjectId,
    ) -> BTreeSet<ObjectId> {
        self.reach(roots, Some(blocked))
    }

    /// Every value currently stored in some has-value edge
    pub fn held_values(&self) -> BTreeSet<ValueId> {
        self.has_value
            .values()
            .flat_map(|edges| edges.values())
            .map(|edge| edge.value)
            .collect()
    }

    fn reach(&self, roots: impl IntoIterator<Item = ObjectId>, blocked: Option<ObjectId>) -> BTreeSet<ObjectId> {
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<ObjectId> = roots.into_iter().collect();

        while let Some(obj) = queue.pop_front() {
            if Some(obj) == blocked || !self.objects.contains_key(&obj) || !seen.insert(obj) {
                continue;
            }
            for edge in self.edges(obj) {
                if let Some(pt) = self.points_to.get(&edge.value) {
                    if !pt.is_null() && !seen.contains(&pt.target) {
                        queue.push_back(pt.target);
                    }
                }
            }
        }
        seen
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Functional mutators
    // ═══════════════════════════════════════════════════════════════════════

    /// Allocate a valid region of `size` bits
    pub fn allocate(mut self, size: u64) -> (Self, ObjectId) {
        let id = self.fresh_object_id();
        self.insert_object_mut(MemoryObject::region(id, size));
        (self, id)
    }

    /// Allocate a list segment directly (used by drivers restoring summaries)
    pub fn allocate_segment(mut self, size: u64, segment: ListSegment) -> (Self, ObjectId) {
        let id = self.fresh_object_id();
        self.insert_object_mut(MemoryObject::segment(id, size, segment));
        (self, id)
    }

    /// Invalidate an object. The object stays in the graph.
    pub fn free(mut self, object: ObjectId) -> Result<Self> {
        let obj = self.checked_valid(object)?;
        let mut freed = obj.clone();
        freed.valid = false;
        self.insert_object_mut(freed);
        Ok(self)
    }

    /// Bind `value` at `[offset, offset + size)`, dropping overlapped edges
    pub fn write(mut self, object: ObjectId, offset: u64, size: u64, value: ValueId) -> Result<Self> {
        self.check_access(object, offset, size)?;
        if !self.values.contains_key(&value) {
            return Err(SmgError::internal(format!("write of unknown value {}", value)));
        }
        self.write_mut(HasValueEdge::new(object, offset, size, value));
        Ok(self)
    }

    /// Read `[offset, offset + size)`.
    ///
    /// Unbound ranges yield a fresh unknown value, bound to the range unless
    /// the range partially overlaps existing edges.
    pub fn read(mut self, object: ObjectId, offset: u64, size: u64) -> Result<(Self, ValueId)> {
        self.check_access(object, offset, size)?;
        if let Some(value) = self.value_at(object, offset, size) {
            return Ok((self, value));
        }
        let overlapped = self.edges(object).any(|edge| edge.overlaps(offset, size));
        let fresh = self.fresh_value_mut(Value::Symbolic);
        if !overlapped {
            self.write_mut(HasValueEdge::new(object, offset, size, fresh));
        }
        Ok((self, fresh))
    }

    /// Value for a known number. Integer zero is always `ValueId::ZERO`.
    pub fn new_number(mut self, number: Number) -> (Self, ValueId) {
        if number.is_zero() {
            return (self, ValueId::ZERO);
        }
        let id = self.fresh_value_mut(Value::Numeric(number));
        (self, id)
    }

    /// Fresh unknown value
    pub fn new_unknown(mut self) -> (Self, ValueId) {
        let id = self.fresh_value_mut(Value::Symbolic);
        (self, id)
    }

    /// Fresh pointer value to `target + offset`
    pub fn create_pointer(
        mut self,
        target: ObjectId,
        offset: u64,
        nesting_level: u32,
        specifier: TargetSpecifier,
    ) -> (Self, ValueId) {
        let id = self.new_pointer_mut(PointsToEdge::segment(target, offset, nesting_level, specifier));
        (self, id)
    }

    /// Move every pointer targeting `old` onto `new`, keeping offsets and levels
    pub fn redirect_pointers(self, old: ObjectId, new: ObjectId) -> Self {
        self.redirect_pointers_and_bump_nesting(old, new, 0)
    }

    /// Move every pointer targeting `old` onto `new`, raising its nesting level
    pub fn redirect_pointers_and_bump_nesting(mut self, old: ObjectId, new: ObjectId, amount: u32) -> Self {
        let new_is_segment = self.object(new).map(|o| o.is_segment()).unwrap_or(false);
        for value in self.pointers_to(old) {
            if let Some(edge) = self.points_to.get(&value).copied() {
                let specifier = if new_is_segment {
                    edge.specifier.for_segment()
                } else {
                    TargetSpecifier::Region
                };
                self.set_points_to_mut(
                    value,
                    PointsToEdge::segment(new, edge.offset, edge.nesting_level + amount, specifier),
                );
            }
        }
        self
    }

    /// Remove an object with its content.
    ///
    /// Pointers to it that nothing holds are dropped along with it; a held
    /// pointer still targeting it is an error.
    pub fn remove_object(mut self, object: ObjectId) -> Result<Self> {
        if object.is_null() || !self.contains_object(object) {
            return Err(SmgError::invalid_access(object, "no such object"));
        }

        let stored: Vec<ValueId> = self.edges(object).map(|edge| edge.value).collect();
        let offsets: Vec<u64> = self.edges(object).map(|edge| edge.offset).collect();
        for offset in offsets {
            self.remove_edge_mut(object, offset);
        }

        let incoming = self.pointers_to(object);
        self.remove_orphaned_pointers_mut(stored.into_iter().chain(incoming));
        if !self.pointers_to(object).is_empty() {
            return Err(SmgError::invalid_access(object, "object is still referenced"));
        }

        self.remove_object_mut(object);
        Ok(self)
    }

    /// Rewrite every has-value occurrence of `old` to `new`
    pub fn replace_value(mut self, old: ValueId, new: ValueId) -> Self {
        self.replace_value_mut(old, new);
        self
    }

    // ═══════════════════════════════════════════════════════════════════════
    // In-place helpers for the engines
    // ═══════════════════════════════════════════════════════════════════════

    pub(crate) fn fresh_object_id(&mut self) -> ObjectId {
        let id = ObjectId::new(self.next_object);
        self.next_object += 1;
        id
    }

    pub(crate) fn insert_object_mut(&mut self, object: MemoryObject) {
        self.objects.insert_mut(object.id, object);
    }

    /// Drop an object and its content. Pointers to it must be gone already.
    pub(crate) fn remove_object_mut(&mut self, object: ObjectId) {
        if object.is_null() {
            return;
        }
        self.objects.remove_mut(&object);
        self.has_value.remove_mut(&object);
        if self.incoming.get(&object).map(|s| s.is_empty()).unwrap_or(false) {
            self.incoming.remove_mut(&object);
        }
    }

    pub(crate) fn fresh_value_mut(&mut self, value: Value) -> ValueId {
        let id = ValueId::new(self.next_value);
        self.next_value += 1;
        self.values.insert_mut(id, value);
        id
    }

    pub(crate) fn new_pointer_mut(&mut self, edge: PointsToEdge) -> ValueId {
        let id = self.fresh_value_mut(Value::Symbolic);
        self.set_points_to_mut(id, edge);
        id
    }

    pub(crate) fn write_mut(&mut self, edge: HasValueEdge) {
        let mut edges = self
            .has_value
            .get(&edge.object)
            .cloned()
            .unwrap_or_else(RedBlackTreeMapSync::new_sync);
        let overlapping: Vec<u64> = edges
            .values()
            .filter(|e| e.overlaps(edge.offset, edge.size))
            .map(|e| e.offset)
            .collect();
        for offset in overlapping {
            edges.remove_mut(&offset);
        }
        edges.insert_mut(edge.offset, edge);
        self.has_value.insert_mut(edge.object, edges);
    }

    pub(crate) fn remove_edge_mut(&mut self, object: ObjectId, offset: u64) {
        if let Some(edges) = self.has_value.get(&object) {
            let edges = edges.remove(&offset);
            self.has_value.insert_mut(object, edges);
        }
    }

    pub(crate) fn set_points_to_mut(&mut self, value: ValueId, edge: PointsToEdge) {
        if let Some(old) = self.points_to.get(&value).copied() {
            self.unlink_incoming(old.target, value);
        }
        self.points_to.insert_mut(value, edge);
        let sources = self
            .incoming
            .get(&edge.target)
            .cloned()
            .unwrap_or_else(RedBlackTreeSetSync::new_sync)
            .insert(value);
        self.incoming.insert_mut(edge.target, sources);
    }

    pub(crate) fn remove_points_to_mut(&mut self, value: ValueId) {
        if value.is_zero() {
            return;
        }
        if let Some(old) = self.points_to.get(&value).copied() {
            self.points_to.remove_mut(&value);
            self.unlink_incoming(old.target, value);
        }
    }

    fn unlink_incoming(&mut self, target: ObjectId, value: ValueId) {
        if let Some(sources) = self.incoming.get(&target) {
            let sources = sources.remove(&value);
            self.incoming.insert_mut(target, sources);
        }
    }

    /// Drop points-to edges of `candidates` that no edge holds any more
    pub(crate) fn remove_orphaned_pointers_mut(&mut self, candidates: impl IntoIterator<Item = ValueId>) {
        let held = self.held_values();
        for value in candidates {
            if !held.contains(&value) {
                self.remove_points_to_mut(value);
            }
        }
    }

    pub(crate) fn replace_value_mut(&mut self, old: ValueId, new: ValueId) {
        for edge in self.edges_holding(old) {
            self.write_mut(HasValueEdge { value: new, ..edge });
        }
    }

    pub(crate) fn update_object_mut(&mut self, object: ObjectId, update: impl FnOnce(&mut MemoryObject)) {
        if let Some(mut obj) = self.objects.get(&object).cloned() {
            update(&mut obj);
            self.objects.insert_mut(object, obj);
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Access checks
    // ═══════════════════════════════════════════════════════════════════════

    fn checked_valid(&self, object: ObjectId) -> Result<&MemoryObject> {
        let obj = self
            .objects
            .get(&object)
            .ok_or_else(|| SmgError::invalid_access(object, "unknown object"))?;
        if obj.is_null() {
            return Err(SmgError::invalid_access(object, "null object"));
        }
        if !obj.valid {
            return Err(SmgError::invalid_access(object, "object was freed"));
        }
        Ok(obj)
    }

    fn check_access(&self, object: ObjectId, offset: u64, size: u64) -> Result<()> {
        let obj = self.checked_valid(object)?;
        if !obj.contains_range(offset, size) {
            return Err(SmgError::OutOfRange {
                object,
                offset,
                size,
                base_offset: obj.base_offset,
                object_size: obj.size,
            });
        }
        Ok(())
    }
}

impl fmt::Display for HeapGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for obj in self.objects.values().filter(|o| !o.is_null()) {
            let kind = match &obj.kind {
                ObjectKind::Region => "region".to_string(),
                ObjectKind::Segment(seg) => seg.to_string(),
            };
            writeln!(
                f,
                "{} {} size={} level={}{}",
                obj.id,
                kind,
                obj.size,
                obj.nesting_level,
                if obj.valid { "" } else { " (invalid)" }
            )?;
            for edge in self.edges(obj.id) {
                match self.points_to.get(&edge.value) {
                    Some(pt) => writeln!(f, "  @{}:{} = {} -> {}", edge.offset, edge.size, edge.value, pt)?,
                    None => writeln!(f, "  @{}:{} = {}", edge.offset, edge.size, edge.value)?,
                }
            }
        }
        Ok(())
    }
}
