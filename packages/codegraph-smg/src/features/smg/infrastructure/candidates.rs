//! Abstraction candidate discovery
//!
//! A candidate is an object reachable from the program variables whose
//! layout looks like a list node: some pointer field leads to another
//! object of the same size that has a pointer (or null) in the same field.

use crate::features::smg::domain::{FoldCandidate, HeapGraph, ObjectId, SmgState};
use crate::features::smg::ports::VariableStore;
use std::collections::BTreeSet;
use tracing::trace;

/// Link layout of `object` seen as a list node, if any
pub fn detect_links(graph: &HeapGraph, object: ObjectId, enable_dll: bool) -> Option<FoldCandidate> {
    let obj = graph.object(object)?;
    if !obj.valid {
        return None;
    }

    if let Some(seg) = obj.as_segment() {
        return Some(FoldCandidate {
            root: object,
            head_offset: seg.head_offset,
            next_offset: seg.next_offset,
            prev_offset: if enable_dll { seg.prev_offset() } else { None },
        });
    }

    for edge in graph.edges(object) {
        let pt = match graph.points_to(edge.value) {
            Some(pt) if !pt.is_null() && pt.target != object => *pt,
            _ => continue,
        };
        let next = match graph.object(pt.target) {
            Some(next) if next.valid && next.size == obj.size && next.base_offset == obj.base_offset => next,
            _ => continue,
        };

        let linked = match next.as_segment() {
            Some(seg) => seg.next_offset == edge.offset && seg.head_offset == pt.offset,
            None => graph
                .edge_at(next.id, edge.offset)
                .map(|e| e.size == edge.size && (e.value.is_zero() || graph.is_pointer(e.value)))
                .unwrap_or(false),
        };
        if !linked {
            continue;
        }

        let prev_offset = if enable_dll {
            detect_prev(graph, object, next.id, edge.offset)
        } else {
            None
        };

        return Some(FoldCandidate {
            root: object,
            head_offset: pt.offset,
            next_offset: edge.offset,
            prev_offset,
        });
    }
    None
}

/// Offset in `next` holding a pointer back to `object`
fn detect_prev(graph: &HeapGraph, object: ObjectId, next: ObjectId, next_offset: u64) -> Option<u64> {
    if graph.object(next)?.is_segment() {
        return graph.object(next)?.as_segment()?.prev_offset();
    }
    graph
        .edges(next)
        .filter(|e| e.offset != next_offset)
        .find(|e| {
            graph
                .points_to(e.value)
                .map(|pt| pt.target == object)
                .unwrap_or(false)
        })
        .map(|e| e.offset)
}

/// Candidates reachable from the variables, chain heads first.
///
/// Objects bound to variables are never candidates themselves.
pub fn find_candidates(state: &SmgState, enable_dll: bool) -> Vec<FoldCandidate> {
    let graph = state.graph();
    let pinned: BTreeSet<ObjectId> = state.variables().roots().into_iter().map(|(_, obj)| obj).collect();
    let reachable = graph.reachable_objects(pinned.iter().copied());

    let candidates: Vec<FoldCandidate> = reachable
        .iter()
        .filter(|&&obj| !pinned.contains(&obj) && !obj.is_null())
        .filter_map(|&obj| detect_links(graph, obj, enable_dll))
        .collect();

    // targets of some candidate's next link have a predecessor
    let successors: BTreeSet<ObjectId> = candidates
        .iter()
        .filter_map(|c| graph.pointer_target_at(c.root, c.next_offset))
        .map(|pt| pt.target)
        .collect();

    let (heads, rest): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .partition(|c| !successors.contains(&c.root));

    trace!(heads = heads.len(), inner = rest.len(), "abstraction candidates");
    heads.into_iter().chain(rest).collect()
}
