//! Custom assertions for test verification
//!
//! This module provides shape-specific assertions for codegraph-smg testing.

use super::builders::PTR;
use codegraph_smg::features::smg::{is_less_or_equal, ListSegment, ObjectId, PointsToEdge, SmgState, ValueId};

/// Pointer value stored in variable `name`
pub fn variable_pointer(state: &SmgState, name: &str) -> ValueId {
    let var = state
        .resolve(name)
        .unwrap_or_else(|| panic!("variable {name} not declared"));
    state
        .graph()
        .value_at(var, 0, PTR)
        .unwrap_or_else(|| panic!("variable {name} holds no value"))
}

/// Points-to edge of the pointer stored in variable `name`
pub fn variable_target(state: &SmgState, name: &str) -> PointsToEdge {
    let value = variable_pointer(state, name);
    *state
        .graph()
        .points_to(value)
        .unwrap_or_else(|| panic!("variable {name} does not hold a pointer"))
}

/// Segment descriptor of `object`, failing when it is a region
pub fn segment_of(state: &SmgState, object: ObjectId) -> ListSegment {
    let obj = state
        .graph()
        .object(object)
        .unwrap_or_else(|| panic!("object {object} missing"));
    *obj.as_segment()
        .unwrap_or_else(|| panic!("object {object} is not a list segment"))
}

/// Assert the state holds exactly the given segment minimum lengths (any order)
pub fn assert_segment_lengths(state: &SmgState, expected: &[u32]) {
    let mut found: Vec<u32> = state.graph().segments().map(|(_, s)| s.min_length).collect();
    let mut expected = expected.to_vec();
    found.sort_unstable();
    expected.sort_unstable();
    assert_eq!(found, expected, "segment lengths differ:\n{}", state.graph());
}

/// Assert `a` and `b` subsume each other
pub fn assert_equivalent(a: &SmgState, b: &SmgState) {
    assert!(is_less_or_equal(a, b), "left does not cover right:\n{}\n---\n{}", a.graph(), b.graph());
    assert!(is_less_or_equal(b, a), "right does not cover left:\n{}\n---\n{}", a.graph(), b.graph());
}

/// Assert `object` is still a concrete region
pub fn assert_region(state: &SmgState, object: ObjectId) {
    let obj = state
        .graph()
        .object(object)
        .unwrap_or_else(|| panic!("object {object} was removed"));
    assert!(!obj.is_segment(), "object {object} was summarised");
}
