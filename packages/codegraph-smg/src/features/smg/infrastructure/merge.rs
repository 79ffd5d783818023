//! State Merge
//!
//! Two states reaching the same program location are merged only when one
//! already covers the other; the covering state is kept. No real join is
//! computed.
//!
//! ```text
//! merge(L, R) = (L, RightEntailedInLeft)   if L ⊑ R
//!             = (R, LeftEntailedInRight)   if R ⊑ L
//!             = ⊥                          otherwise
//! ```
//!
//! Purely concrete states are never merged: without a summary on either
//! side the comparison would only rediscover plain equality.

use super::abstraction::ListAbstraction;
use super::candidates::detect_links;
use super::equality;
use crate::errors::Result;
use crate::features::smg::domain::{Entailment, HeapGraph, ObjectId, SmgState, ValueId, VariableKey};
use crate::features::smg::ports::{AbstractionPort, StateLatticePort, VariableStore};
use rustc_hash::FxHashMap;
use tracing::debug;

/// Merge two states; `None` when neither covers the other.
///
/// `abstraction` is applied to both sides first when given.
pub fn merge(
    left: &SmgState,
    right: &SmgState,
    abstraction: Option<&dyn AbstractionPort>,
) -> Result<Option<(SmgState, Entailment)>> {
    let (left, right) = match abstraction {
        Some(engine) => (engine.abstract_state(left)?, engine.abstract_state(right)?),
        None => (left.clone(), right.clone()),
    };

    if !left.has_segments() && !right.has_segments() {
        debug!("merge refused: no list segment on either side");
        return Ok(None);
    }

    if shares_concrete_list_node(&left) || shares_concrete_list_node(&right) {
        debug!("merge refused: two variables point to one concrete list node");
        return Ok(None);
    }

    let result = if equality::is_less_or_equal(&left, &right) {
        Some((left, Entailment::RightEntailedInLeft))
    } else if equality::is_less_or_equal(&right, &left) {
        Some((right, Entailment::LeftEntailedInRight))
    } else {
        None
    };

    debug!(entailment = ?result.as_ref().map(|(_, e)| *e), "merge");
    Ok(result)
}

/// Two distinct variables holding pointers to the same concrete list node
pub fn shares_concrete_list_node(state: &SmgState) -> bool {
    let graph = state.graph();
    let mut holders: FxHashMap<ObjectId, VariableKey> = FxHashMap::default();

    for (key, object) in state.variables().roots() {
        for edge in graph.edges(object) {
            let Some(target) = pointer_target(graph, edge.value) else { continue };
            match holders.get(&target) {
                Some(existing) if *existing != key => {
                    if is_concrete_list_node(graph, target) {
                        return true;
                    }
                }
                Some(_) => {}
                None => {
                    holders.insert(target, key.clone());
                }
            }
        }
    }
    false
}

fn pointer_target(graph: &HeapGraph, value: ValueId) -> Option<ObjectId> {
    graph
        .points_to(value)
        .filter(|pt| !pt.is_null())
        .map(|pt| pt.target)
}

/// A region linked like a list node, or the successor of a segment
fn is_concrete_list_node(graph: &HeapGraph, object: ObjectId) -> bool {
    match graph.object(object) {
        Some(obj) if !obj.is_segment() => {}
        _ => return false,
    }
    if detect_links(graph, object, false).is_some() {
        return true;
    }
    graph.segments().any(|(seg_obj, seg)| {
        graph
            .pointer_target_at(seg_obj.id, seg.next_offset)
            .map(|pt| pt.target == object)
            .unwrap_or(false)
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// Adapter
// ═══════════════════════════════════════════════════════════════════════════

/// Lattice operations over abstract states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeLattice {
    pub abstraction: ListAbstraction,
    pub abstract_before_merge: bool,
}

impl ShapeLattice {
    pub fn new(abstraction: ListAbstraction, abstract_before_merge: bool) -> Self {
        Self {
            abstraction,
            abstract_before_merge,
        }
    }
}

impl StateLatticePort for ShapeLattice {
    fn is_less_or_equal(&self, this: &SmgState, other: &SmgState) -> bool {
        equality::is_less_or_equal(this, other)
    }

    fn equal(&self, this: &SmgState, a: ValueId, other: &SmgState, b: ValueId) -> bool {
        equality::equal(this, a, other, b)
    }

    fn merge(&self, left: &SmgState, right: &SmgState) -> Result<Option<(SmgState, Entailment)>> {
        let abstraction: Option<&dyn AbstractionPort> = if self.abstract_before_merge {
            Some(&self.abstraction)
        } else {
            None
        };
        merge(left, right, abstraction)
    }
}
