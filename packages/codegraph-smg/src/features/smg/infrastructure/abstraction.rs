//! List Abstraction (Fold)
//!
//! Rewrites maximal runs of structurally equal list nodes into one list
//! segment carrying a minimum length.
//!
//! ```text
//! R ──next──▶ N ──next──▶ S            SEG[len(R)+len(N)+] ──next──▶ S
//!                                ⟹
//! p ─▶ R  (level k)                    p ─▶ SEG (level k + len(N))
//! q ─▶ N  (level k)                    q ─▶ SEG (level k)
//! ```
//!
//! A pointer with nesting level `k` into a segment of minimum length `m`
//! addresses element `m - 1 - k` counted from the front.
//!
//! References:
//! - Dudka, Peringer, Vojnar (2011): "Predator: A Practical Tool for
//!   Checking Manipulation of Dynamic Data Structures Using Separation Logic"

use super::candidates::{detect_links, find_candidates};
use super::equality::{ComparisonMode, EqualityCache, ShapeComparator};
use super::nested::assign_nested_levels;
use crate::errors::{Result, SmgError};
use crate::features::smg::domain::{
    FoldCandidate, FoldOutcome, HasValueEdge, HeapGraph, MemoryObject, ObjectId, ObjectKind, PointsToEdge, SmgState,
    TargetSpecifier, ValueId,
};
use crate::features::smg::ports::{AbstractionPort, VariableStore};
use std::collections::BTreeSet;
use tracing::{debug, trace};

// ═══════════════════════════════════════════════════════════════════════════
// Public entry points
// ═══════════════════════════════════════════════════════════════════════════

/// Fold the chain starting at `root`, detecting its links (doubly linked
/// when a back link exists).
pub fn fold(state: &SmgState, root: ObjectId, threshold: u32) -> Result<FoldOutcome> {
    match detect_links(state.graph(), root, true) {
        Some(candidate) => fold_candidate(state, &candidate, threshold),
        None => Ok(FoldOutcome::Unchanged),
    }
}

/// Fold every run of at least `threshold + 1` elements along `candidate`
pub fn fold_candidate(state: &SmgState, candidate: &FoldCandidate, threshold: u32) -> Result<FoldOutcome> {
    let pinned: Vec<ObjectId> = state.variables().roots().into_iter().map(|(_, obj)| obj).collect();
    let pinned_set: BTreeSet<ObjectId> = pinned.iter().copied().collect();

    let mut graph = state.graph().clone();
    let reachable_before = graph.reachable_objects(pinned.iter().copied());

    let mut segments = Vec::new();
    let mut dropped_values = Vec::new();
    let mut removed = BTreeSet::new();
    let mut visited = BTreeSet::new();
    let mut start = Some(candidate.root);

    while let Some(current) = start {
        if !visited.insert(current) {
            break;
        }
        if pinned_set.contains(&current) {
            start = successor(&graph, current, candidate);
            continue;
        }

        let (run, next_start) = build_run(&graph, current, candidate, &pinned_set);
        let length: u32 = run
            .iter()
            .filter_map(|id| graph.object(*id))
            .map(|o| o.list_length())
            .sum();

        trace!(root = %current, nodes = run.len(), length, "inspected chain");

        if run.len() >= 2 && length > threshold {
            let mut acc = run[0];
            for &node in &run[1..] {
                acc = fold_pair(&mut graph, acc, node, candidate, &mut dropped_values)?;
                removed.insert(node);
            }
            removed.insert(run[0]);
            finish_segment(&mut graph, acc, candidate, &pinned);
            debug!(segment = %acc, length, nodes = run.len(), "folded chain into list segment");
            visited.extend(run.iter().copied());
            segments.push(acc);
        }

        start = next_start;
    }

    if segments.is_empty() {
        return Ok(FoldOutcome::Unchanged);
    }

    prune_unreachable(&mut graph, &reachable_before, &removed, &pinned, &mut dropped_values);
    graph.remove_orphaned_pointers_mut(dropped_values);

    Ok(FoldOutcome::Folded {
        state: state.clone().with_graph(graph),
        segments,
    })
}

/// Fold candidates until none changes the state
pub fn abstract_state(state: &SmgState, threshold: u32, enable_dll: bool) -> Result<SmgState> {
    let mut current = state.clone();
    let mut rounds = 0usize;

    'outer: loop {
        for candidate in find_candidates(&current, enable_dll) {
            if let FoldOutcome::Folded { state, .. } = fold_candidate(&current, &candidate, threshold)? {
                current = state;
                rounds += 1;
                continue 'outer;
            }
        }
        break;
    }

    if rounds > 0 {
        debug!(rounds, "abstraction reached a fixpoint");
    }
    Ok(current)
}

// ═══════════════════════════════════════════════════════════════════════════
// Chain inspection
// ═══════════════════════════════════════════════════════════════════════════

/// Node reached through the candidate's next field
fn successor(graph: &HeapGraph, node: ObjectId, candidate: &FoldCandidate) -> Option<ObjectId> {
    graph
        .pointer_target_at(node, candidate.next_offset)
        .filter(|pt| pt.offset == candidate.head_offset)
        .map(|pt| pt.target)
}

/// Whether `next` can continue a chain at `current`
fn compatible(graph: &HeapGraph, current: ObjectId, next: ObjectId, candidate: &FoldCandidate) -> bool {
    let (cur, nxt) = match (graph.object(current), graph.object(next)) {
        (Some(cur), Some(nxt)) => (cur, nxt),
        _ => return false,
    };
    if !nxt.valid || !cur.same_frame(nxt) || cur.nesting_level != nxt.nesting_level {
        return false;
    }
    let layout_ok = |o: &MemoryObject| match &o.kind {
        ObjectKind::Region => true,
        ObjectKind::Segment(seg) => candidate.matches(seg),
    };
    if !layout_ok(cur) || !layout_ok(nxt) {
        return false;
    }
    match candidate.prev_offset {
        Some(prev) => graph
            .pointer_target_at(next, prev)
            .map(|pt| pt.target == current)
            .unwrap_or(false),
        None => true,
    }
}

fn same_content(graph: &HeapGraph, a: ObjectId, b: ObjectId, candidate: &FoldCandidate) -> bool {
    let mut cache = EqualityCache::new();
    ShapeComparator::new(graph, graph, ComparisonMode::Exact, &mut cache).check_equal_values_with_exemptions(
        a,
        b,
        &candidate.link_offsets(),
    )
}

/// Longest run of equal nodes from `start`, plus where to resume
fn build_run(
    graph: &HeapGraph,
    start: ObjectId,
    candidate: &FoldCandidate,
    pinned: &BTreeSet<ObjectId>,
) -> (Vec<ObjectId>, Option<ObjectId>) {
    let mut run = vec![start];
    let mut current = start;

    loop {
        let next = match successor(graph, current, candidate) {
            Some(next) => next,
            None => return (run, None),
        };
        if run.contains(&next) || pinned.contains(&next) || !compatible(graph, current, next, candidate) {
            return (run, None);
        }
        // a node linking back into the run closes a cycle and stays concrete
        let after = successor(graph, next, candidate);
        if after.map(|a| a == next || run.contains(&a)).unwrap_or(false) {
            return (run, None);
        }
        if !same_content(graph, current, next, candidate) {
            return (run, Some(next));
        }
        run.push(next);
        current = next;
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Graph rewriting
// ═══════════════════════════════════════════════════════════════════════════

/// Merge `r` and its successor `n` into a fresh segment
fn fold_pair(
    graph: &mut HeapGraph,
    r: ObjectId,
    n: ObjectId,
    candidate: &FoldCandidate,
    dropped_values: &mut Vec<ValueId>,
) -> Result<ObjectId> {
    let ro = graph
        .object(r)
        .cloned()
        .ok_or_else(|| SmgError::internal(format!("fold of missing object {}", r)))?;
    let no = graph
        .object(n)
        .cloned()
        .ok_or_else(|| SmgError::internal(format!("fold of missing object {}", n)))?;

    let len_n = no.list_length();
    let segment = candidate.segment(ro.list_length() + len_n);
    let head_level = segment.head_nesting_level();

    let seg = graph.fresh_object_id();
    graph.insert_object_mut(MemoryObject {
        id: seg,
        kind: ObjectKind::Segment(segment),
        ..ro.clone()
    });

    let content: Vec<HasValueEdge> = graph
        .edges(n)
        .filter(|e| Some(e.offset) != candidate.prev_offset)
        .copied()
        .collect();
    for edge in content {
        graph.write_mut(HasValueEdge { object: seg, ..edge });
    }
    if let Some(prev) = candidate.prev_offset {
        if let Some(edge) = graph.edge_at(r, prev).copied() {
            graph.write_mut(HasValueEdge { object: seg, ..edge });
        }
    }

    for value in graph.pointers_to(n) {
        if let Some(pt) = graph.points_to(value).copied() {
            let edge = PointsToEdge::segment(
                seg,
                pt.offset,
                pt.nesting_level.min(head_level),
                pt.specifier.for_segment(),
            );
            graph.set_points_to_mut(value, edge);
        }
    }
    for value in graph.pointers_to(r) {
        if let Some(pt) = graph.points_to(value).copied() {
            let edge = match pt.specifier {
                TargetSpecifier::All => PointsToEdge::segment(seg, pt.offset, 0, TargetSpecifier::All),
                _ => PointsToEdge::segment(
                    seg,
                    pt.offset,
                    (pt.nesting_level + len_n).min(head_level),
                    TargetSpecifier::First,
                ),
            };
            graph.set_points_to_mut(value, edge);
        }
    }

    dropped_values.extend(graph.edges(r).map(|e| e.value));
    dropped_values.extend(graph.edges(n).map(|e| e.value));
    graph.remove_object_mut(r);
    graph.remove_object_mut(n);

    trace!(r = %r, n = %n, segment = %seg, "folded pair");
    Ok(seg)
}

/// Post-process a finished segment: back link of the successor and
/// nesting of the data reachable from the elements.
fn finish_segment(graph: &mut HeapGraph, seg: ObjectId, candidate: &FoldCandidate, roots: &[ObjectId]) {
    if let Some(prev) = candidate.prev_offset {
        let back = graph
            .pointer_target_at(seg, candidate.next_offset)
            .and_then(|next| graph.edge_at(next.target, prev))
            .map(|edge| edge.value);
        if let Some(value) = back {
            if let Some(pt) = graph.points_to(value).copied() {
                if pt.target == seg {
                    graph.set_points_to_mut(value, PointsToEdge::segment(seg, pt.offset, 0, TargetSpecifier::Last));
                }
            }
        }
    }
    assign_nested_levels(graph, seg, roots);
}

/// Remove data that only the folded-away elements could reach
fn prune_unreachable(
    graph: &mut HeapGraph,
    reachable_before: &BTreeSet<ObjectId>,
    removed: &BTreeSet<ObjectId>,
    roots: &[ObjectId],
    dropped_values: &mut Vec<ValueId>,
) {
    let reachable_after = graph.reachable_objects(roots.iter().copied());
    let garbage: Vec<ObjectId> = reachable_before
        .iter()
        .copied()
        .filter(|obj| !reachable_after.contains(obj) && !removed.contains(obj) && !obj.is_null())
        .collect();

    for obj in garbage {
        dropped_values.extend(graph.edges(obj).map(|e| e.value));
        for value in graph.pointers_to(obj) {
            graph.remove_points_to_mut(value);
        }
        graph.remove_object_mut(obj);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Adapter
// ═══════════════════════════════════════════════════════════════════════════

/// Fold engine bound to a threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListAbstraction {
    pub threshold: u32,
    pub enable_dll: bool,
}

impl ListAbstraction {
    pub fn new(threshold: u32, enable_dll: bool) -> Self {
        Self { threshold, enable_dll }
    }
}

impl AbstractionPort for ListAbstraction {
    fn find_candidates(&self, state: &SmgState) -> Vec<FoldCandidate> {
        find_candidates(state, self.enable_dll)
    }

    fn fold(&self, state: &SmgState, root: ObjectId) -> Result<FoldOutcome> {
        match detect_links(state.graph(), root, self.enable_dll) {
            Some(candidate) => fold_candidate(state, &candidate, self.threshold),
            None => Ok(FoldOutcome::Unchanged),
        }
    }

    fn abstract_state(&self, state: &SmgState) -> Result<SmgState> {
        abstract_state(state, self.threshold, self.enable_dll)
    }
}
