//! Segment Materialization (Unfold)
//!
//! Dereferencing a pointer into a list segment needs a concrete target.
//! One step splits a segment `S` of minimum length `L` into a concrete
//! element `C` and a residual segment `S'`:
//!
//! ```text
//! front:  p ─▶ S[L+]        ⟹   p ─▶ C ──next──▶ S'[(L-1)+]
//! back:   q ─▶ S[L+] (Last) ⟹   S'[(L-1)+] ──next──▶ C ◀── q
//! L = 0:  (a) S is empty: pointers to S take S's own next (or prev) target
//!         (b) C ──next──▶ S'[0+]
//! ```
//!
//! Steps repeat until the dereferenced pointer lands on a region.

use super::nested::{copy_element, remove_nested};
use crate::errors::{Result, SmgError};
use crate::features::smg::domain::{
    HasValueEdge, HeapGraph, ListSegment, Materialized, MemoryObject, ObjectId, ObjectKind, PointsToEdge, SmgState,
    TargetSpecifier, ValueId,
};
use crate::features::smg::ports::MaterializationPort;
use crate::shared::models::NonEmpty;
use tracing::{debug, trace};

/// Concretize the target of `pointer`.
///
/// Zero-or-more segments fork; the "list ends here" case comes first.
pub fn materialize(state: &SmgState, pointer: ValueId, max_steps: usize) -> Result<NonEmpty<Materialized>> {
    let mut results = Vec::new();
    let budget = Budget {
        limit: max_steps,
        left: max_steps,
    };
    unfold(state.clone(), pointer, budget, &mut results)?;
    debug!(pointer = %pointer, results = results.len(), "materialized");
    NonEmpty::from_vec(results).ok_or_else(|| SmgError::internal("materialization produced no state"))
}

#[derive(Debug, Clone, Copy)]
struct Budget {
    limit: usize,
    left: usize,
}

impl Budget {
    fn spend(self) -> Result<Self> {
        match self.left.checked_sub(1) {
            Some(left) => Ok(Self { left, ..self }),
            None => Err(SmgError::MaterializationLimit(self.limit)),
        }
    }
}

fn unfold(state: SmgState, pointer: ValueId, budget: Budget, out: &mut Vec<Materialized>) -> Result<()> {
    let pt = *state
        .graph()
        .points_to(pointer)
        .ok_or(SmgError::DanglingPointer(pointer))?;
    let target = state
        .graph()
        .object(pt.target)
        .ok_or_else(|| SmgError::internal(format!("pointer {} targets missing object {}", pointer, pt.target)))?;

    let kind = target.kind;
    let segment = match kind {
        ObjectKind::Region => {
            out.push(Materialized {
                state,
                target: pt.target,
                offset: pt.offset,
            });
            return Ok(());
        }
        ObjectKind::Segment(segment) => segment,
    };

    let budget = budget.spend()?;

    let from_back = pt.specifier == TargetSpecifier::Last && segment.is_doubly_linked();
    trace!(segment = %pt.target, min = segment.min_length, from_back, "unfolding segment");

    if segment.min_length == 0 {
        let mut empty = state.graph().clone();
        remove_empty_segment(&mut empty, pt.target, &segment)?;
        unfold(state.clone().with_graph(empty), pointer, budget, out)?;
    }

    let mut graph = state.graph().clone();
    if from_back {
        materialize_back(&mut graph, pt.target, &segment)?;
    } else {
        materialize_front(&mut graph, pt.target, &segment)?;
    }
    unfold(state.with_graph(graph), pointer, budget, out)
}

// ═══════════════════════════════════════════════════════════════════════════
// Steps
// ═══════════════════════════════════════════════════════════════════════════

/// Target of the pointer stored in a link field
fn link_target(graph: &HeapGraph, segment: ObjectId, offset: u64) -> Result<PointsToEdge> {
    let edge = graph
        .edge_at(segment, offset)
        .ok_or_else(|| SmgError::internal(format!("segment {} has no link at {}", segment, offset)))?;
    graph
        .points_to(edge.value)
        .copied()
        .ok_or(SmgError::DanglingPointer(edge.value))
}

/// Fresh concrete element and residual segment sharing `so`'s frame
fn split(graph: &mut HeapGraph, so: &MemoryObject, residual: ListSegment) -> (ObjectId, ObjectId) {
    let concrete = graph.fresh_object_id();
    graph.insert_object_mut(MemoryObject {
        id: concrete,
        kind: ObjectKind::Region,
        ..so.clone()
    });
    let rest = graph.fresh_object_id();
    graph.insert_object_mut(MemoryObject {
        id: rest,
        kind: ObjectKind::Segment(residual),
        ..so.clone()
    });
    (concrete, rest)
}

/// Move the residual's content over from `seg`
fn move_content(graph: &mut HeapGraph, seg: ObjectId, rest: ObjectId) {
    let content: Vec<HasValueEdge> = graph.edges(seg).copied().collect();
    for edge in content {
        graph.write_mut(HasValueEdge { object: rest, ..edge });
    }
}

fn materialize_front(graph: &mut HeapGraph, seg: ObjectId, segment: &ListSegment) -> Result<ObjectId> {
    let so = graph
        .object(seg)
        .cloned()
        .ok_or_else(|| SmgError::internal(format!("missing segment {}", seg)))?;
    let head_level = segment.head_nesting_level();
    let residual = segment.with_min_length(segment.min_length.saturating_sub(1));
    let (concrete, rest) = split(graph, &so, residual);

    copy_element(graph, seg, concrete, &segment.link_offsets());
    move_content(graph, seg, rest);

    let next = graph.new_pointer_mut(PointsToEdge::segment(
        rest,
        segment.head_offset,
        residual.head_nesting_level(),
        TargetSpecifier::First,
    ));
    graph.write_mut(HasValueEdge::new(concrete, segment.next_offset, link_size(graph, seg, segment.next_offset), next));

    if let Some(prev) = segment.prev_offset() {
        if let Some(edge) = graph.edge_at(seg, prev).copied() {
            graph.write_mut(HasValueEdge { object: concrete, ..edge });
        }
        let back = graph.new_pointer_mut(PointsToEdge::region(concrete, segment.head_offset));
        graph.write_mut(HasValueEdge::new(rest, prev, link_size(graph, seg, prev), back));
    }

    for value in graph.pointers_to(seg) {
        let Some(pt) = graph.points_to(value).copied() else { continue };
        let edge = match pt.specifier {
            TargetSpecifier::Region | TargetSpecifier::First if pt.nesting_level >= head_level => {
                PointsToEdge::region(concrete, pt.offset)
            }
            TargetSpecifier::Region | TargetSpecifier::First => PointsToEdge::segment(
                rest,
                pt.offset,
                pt.nesting_level.min(residual.head_nesting_level()),
                TargetSpecifier::First,
            ),
            TargetSpecifier::Last | TargetSpecifier::All => pt.retarget(rest),
        };
        graph.set_points_to_mut(value, edge);
    }

    graph.remove_object_mut(seg);
    trace!(segment = %seg, concrete = %concrete, residual = %rest, "front step");
    Ok(concrete)
}

fn materialize_back(graph: &mut HeapGraph, seg: ObjectId, segment: &ListSegment) -> Result<ObjectId> {
    let so = graph
        .object(seg)
        .cloned()
        .ok_or_else(|| SmgError::internal(format!("missing segment {}", seg)))?;
    let prev = segment
        .prev_offset()
        .ok_or_else(|| SmgError::internal(format!("back materialization of singly linked {}", seg)))?;
    let residual = segment.with_min_length(segment.min_length.saturating_sub(1));
    let (concrete, rest) = split(graph, &so, residual);

    copy_element(graph, seg, concrete, &segment.link_offsets());
    move_content(graph, seg, rest);

    if let Some(edge) = graph.edge_at(seg, segment.next_offset).copied() {
        graph.write_mut(HasValueEdge { object: concrete, ..edge });
    }
    let back = graph.new_pointer_mut(PointsToEdge::segment(rest, segment.head_offset, 0, TargetSpecifier::Last));
    graph.write_mut(HasValueEdge::new(concrete, prev, link_size(graph, seg, prev), back));
    let next = graph.new_pointer_mut(PointsToEdge::region(concrete, segment.head_offset));
    graph.write_mut(HasValueEdge::new(rest, segment.next_offset, link_size(graph, seg, segment.next_offset), next));

    for value in graph.pointers_to(seg) {
        let Some(pt) = graph.points_to(value).copied() else { continue };
        let edge = match pt.specifier {
            TargetSpecifier::Last => PointsToEdge::region(concrete, pt.offset),
            TargetSpecifier::Region | TargetSpecifier::First if pt.nesting_level == 0 && segment.min_length >= 1 => {
                PointsToEdge::region(concrete, pt.offset)
            }
            TargetSpecifier::Region | TargetSpecifier::First => PointsToEdge::segment(
                rest,
                pt.offset,
                pt.nesting_level.saturating_sub(1),
                TargetSpecifier::First,
            ),
            TargetSpecifier::All => pt.retarget(rest),
        };
        graph.set_points_to_mut(value, edge);
    }

    graph.remove_object_mut(seg);
    trace!(segment = %seg, concrete = %concrete, residual = %rest, "back step");
    Ok(concrete)
}

/// Drop a `0+` segment, bridging its neighbours
fn remove_empty_segment(graph: &mut HeapGraph, seg: ObjectId, segment: &ListSegment) -> Result<()> {
    let next = link_target(graph, seg, segment.next_offset)?;
    let prev = match segment.prev_offset() {
        Some(offset) => Some(link_target(graph, seg, offset)?),
        None => None,
    };

    remove_nested(graph, seg);

    for value in graph.pointers_to(seg) {
        let Some(pt) = graph.points_to(value).copied() else { continue };
        let edge = match (pt.specifier, prev) {
            (TargetSpecifier::Last, Some(prev)) => prev,
            _ => next,
        };
        graph.set_points_to_mut(value, edge);
    }

    let stored: Vec<ValueId> = graph.edges(seg).map(|e| e.value).collect();
    graph.remove_object_mut(seg);
    graph.remove_orphaned_pointers_mut(stored);
    trace!(segment = %seg, "segment ends here");
    Ok(())
}

/// Size of the link field, defaulting to a 64-bit pointer
fn link_size(graph: &HeapGraph, seg: ObjectId, offset: u64) -> u64 {
    graph.edge_at(seg, offset).map(|e| e.size).unwrap_or(64)
}

// ═══════════════════════════════════════════════════════════════════════════
// Adapter
// ═══════════════════════════════════════════════════════════════════════════

/// Materialization engine with an unfolding budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentMaterializer {
    pub max_steps: usize,
}

impl SegmentMaterializer {
    pub fn new(max_steps: usize) -> Self {
        Self { max_steps }
    }
}

impl MaterializationPort for SegmentMaterializer {
    fn materialize(&self, state: &SmgState, pointer: ValueId) -> Result<NonEmpty<Materialized>> {
        materialize(state, pointer, self.max_steps)
    }
}
