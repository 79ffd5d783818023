//! Nested structures below list segments
//!
//! Objects reachable only through the data fields of a segment belong to
//! its elements. They carry an object nesting level one above the segment
//! and are copied along when an element is materialized.

use crate::features::smg::domain::{
    HasValueEdge, HeapGraph, MemoryObject, ObjectId, PointsToEdge, TargetSpecifier, ValueId,
};
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Link offsets of `object` if it is a segment, else nothing
fn link_offsets(graph: &HeapGraph, object: ObjectId) -> Vec<u64> {
    graph
        .object(object)
        .and_then(|o| o.as_segment())
        .map(|seg| seg.link_offsets())
        .unwrap_or_default()
}

/// Objects nested below `segment`, breadth first
pub(crate) fn nested_objects(graph: &HeapGraph, segment: ObjectId) -> Vec<ObjectId> {
    let level = match graph.object(segment) {
        Some(obj) => obj.nesting_level,
        None => return Vec::new(),
    };
    let links = link_offsets(graph, segment);

    let mut order = Vec::new();
    let mut seen = BTreeSet::new();
    let mut queue: VecDeque<ObjectId> = graph
        .edges(segment)
        .filter(|e| !links.contains(&e.offset))
        .filter_map(|e| graph.points_to(e.value))
        .filter(|pt| !pt.is_null())
        .map(|pt| pt.target)
        .collect();

    while let Some(obj) = queue.pop_front() {
        if obj == segment || seen.contains(&obj) {
            continue;
        }
        match graph.object(obj) {
            Some(o) if o.nesting_level > level => {}
            _ => continue,
        }
        seen.insert(obj);
        order.push(obj);
        for edge in graph.edges(obj) {
            if let Some(pt) = graph.points_to(edge.value) {
                if !pt.is_null() {
                    queue.push_back(pt.target);
                }
            }
        }
    }
    order
}

/// Raise the nesting level of everything hanging off `segment`'s data
/// fields and turn back-pointers into the segment into `All` pointers.
///
/// Objects also reachable from `roots` or from the segment's neighbours
/// without passing the segment are shared, not nested.
pub(crate) fn assign_nested_levels(graph: &mut HeapGraph, segment: ObjectId, roots: &[ObjectId]) {
    let (seg_level, links) = match graph.object(segment).and_then(|o| o.as_segment().map(|s| (o, s))) {
        Some((obj, seg)) => (obj.nesting_level, seg.link_offsets()),
        None => return,
    };

    let mut outside: Vec<ObjectId> = roots.to_vec();
    for &offset in &links {
        if let Some(pt) = graph.pointer_target_at(segment, offset) {
            outside.push(pt.target);
        }
    }
    let shared = graph.reachable_objects_avoiding(outside, segment);

    let mut assigned: BTreeMap<ObjectId, u32> = BTreeMap::new();
    let mut queue: VecDeque<(ObjectId, u32)> = graph
        .edges(segment)
        .filter(|e| !links.contains(&e.offset))
        .filter_map(|e| graph.points_to(e.value))
        .filter(|pt| !pt.is_null())
        .map(|pt| (pt.target, seg_level + 1))
        .collect();

    while let Some((obj, level)) = queue.pop_front() {
        if obj == segment || shared.contains(&obj) || assigned.contains_key(&obj) {
            continue;
        }
        assigned.insert(obj, level);
        let inner_links = link_offsets(graph, obj);
        for edge in graph.edges(obj) {
            if let Some(pt) = graph.points_to(edge.value) {
                if pt.is_null() || pt.target == segment {
                    continue;
                }
                let next_level = if inner_links.is_empty() || inner_links.contains(&edge.offset) {
                    level
                } else {
                    level + 1
                };
                queue.push_back((pt.target, next_level));
            }
        }
    }

    let mut back_pointers = Vec::new();
    for (&obj, &level) in &assigned {
        graph.update_object_mut(obj, |o| o.nesting_level = level);
        for edge in graph.edges(obj) {
            if let Some(pt) = graph.points_to(edge.value) {
                if pt.target == segment {
                    back_pointers.push((edge.value, pt.offset));
                }
            }
        }
    }
    for (value, offset) in back_pointers {
        graph.set_points_to_mut(value, PointsToEdge::segment(segment, offset, 0, TargetSpecifier::All));
    }
}

/// Copy one element's data fields from `segment` onto `concrete`, skipping
/// `skip` offsets. Nested objects are duplicated one level down; `All`
/// pointers back into the segment are bound to `concrete`.
pub(crate) fn copy_element(graph: &mut HeapGraph, segment: ObjectId, concrete: ObjectId, skip: &[u64]) {
    let nested = nested_objects(graph, segment);

    let mut mapping: BTreeMap<ObjectId, ObjectId> = BTreeMap::new();
    for &old in &nested {
        if let Some(obj) = graph.object(old).cloned() {
            let id = graph.fresh_object_id();
            graph.insert_object_mut(MemoryObject {
                id,
                nesting_level: obj.nesting_level.saturating_sub(1),
                ..obj
            });
            mapping.insert(old, id);
        }
    }

    let mut translated: FxHashMap<ValueId, ValueId> = FxHashMap::default();
    let mut copy_edges = |graph: &mut HeapGraph, from: ObjectId, to: ObjectId, skip: &[u64]| {
        let edges: Vec<HasValueEdge> = graph.edges(from).filter(|e| !skip.contains(&e.offset)).copied().collect();
        for edge in edges {
            let value = translate(graph, edge.value, &mapping, segment, concrete, &mut translated);
            graph.write_mut(HasValueEdge {
                object: to,
                value,
                ..edge
            });
        }
    };

    copy_edges(graph, segment, concrete, skip);
    for (&old, &new) in &mapping {
        copy_edges(graph, old, new, &[]);
    }
}

fn translate(
    graph: &mut HeapGraph,
    value: ValueId,
    mapping: &BTreeMap<ObjectId, ObjectId>,
    segment: ObjectId,
    concrete: ObjectId,
    translated: &mut FxHashMap<ValueId, ValueId>,
) -> ValueId {
    if let Some(&done) = translated.get(&value) {
        return done;
    }
    let pt = match graph.points_to(value) {
        Some(pt) => *pt,
        None => return value,
    };
    let edge = if let Some(&copy) = mapping.get(&pt.target) {
        pt.retarget(copy)
    } else if pt.target == segment && pt.specifier == TargetSpecifier::All {
        PointsToEdge::region(concrete, pt.offset)
    } else {
        return value;
    };
    let fresh = graph.new_pointer_mut(edge);
    translated.insert(value, fresh);
    fresh
}

/// Delete everything nested below `segment` together with the pointers into it
pub(crate) fn remove_nested(graph: &mut HeapGraph, segment: ObjectId) {
    for obj in nested_objects(graph, segment) {
        for value in graph.pointers_to(obj) {
            graph.remove_points_to_mut(value);
        }
        graph.remove_object_mut(obj);
    }
}
