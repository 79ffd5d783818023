//! Shape equality and subsumption integration tests

mod common;
use common::*;

use codegraph_smg::features::smg::{
    equal, fold, is_less_or_equal, materialize, ComparisonMode, EqualityCache, Number, ShapeComparator, SmgState,
    TargetSpecifier, ValueId, ViolationKind,
};
use pretty_assertions::assert_eq;

#[test]
fn test_two_node_cycle_terminates() {
    let (state, a) = SmgState::new().allocate_heap(NODE_SIZE);
    let (state, b) = state.allocate_heap(NODE_SIZE);
    let state = state.write_pointer(a, NEXT, PTR, b, 0).unwrap();
    let state = state.write_pointer(b, NEXT, PTR, a, 0).unwrap();

    let (state, p) = state.new_pointer(a, 0);
    let (state, q) = state.new_pointer(a, 0);
    assert!(equal(&state, p, &state, p));
    assert!(equal(&state, p, &state, q));
}

#[test]
fn test_lists_in_different_states() {
    let left = ListBuilder::singly(3).data(1).build().state;
    let same = ListBuilder::singly(3).data(1).build().state;
    let other_data = ListBuilder::singly(3).data(2).build().state;
    let longer = ListBuilder::singly(4).data(1).build().state;

    let head = |s: &SmgState| variable_pointer(s, "head");
    assert!(equal(&left, head(&left), &same, head(&same)));
    assert!(!equal(&left, head(&left), &other_data, head(&other_data)));
    assert!(!equal(&left, head(&left), &longer, head(&longer)));
}

#[test]
fn test_exempted_offsets() {
    let list = ListBuilder::singly(3).build();
    let graph = list.state.graph();
    let mut cache = EqualityCache::new();
    let mut comparator = ShapeComparator::new(graph, graph, ComparisonMode::Exact, &mut cache);

    assert!(comparator.check_equal_values_with_exemptions(list.nodes[0], list.nodes[1], &[NEXT]));
    assert!(!comparator.check_equal_values_with_exemptions(list.nodes[0], list.nodes[1], &[]));
}

#[test]
fn test_numbers() {
    let state = SmgState::new();
    let (state, nan) = state.new_number(Number::Float(f64::NAN));
    let (state, one) = state.new_number(Number::Integer(1));
    let (state, one_again) = state.new_number(Number::Integer(1));
    let (state, one_float) = state.new_number(Number::Float(1.0));
    let (state, unknown) = state.new_unknown();
    let (state, other_unknown) = state.new_unknown();

    assert!(!equal(&state, nan, &state, nan));
    assert!(equal(&state, one, &state, one_again));
    assert!(!equal(&state, one, &state, one_float));
    assert!(equal(&state, unknown, &state, unknown));
    assert!(!equal(&state, unknown, &state, other_unknown));
}

#[test]
fn test_pointer_position_in_segment() {
    let (state, seg) = segment_state(3, false);
    let (state, last) = point_into(state, "last", seg, 0, TargetSpecifier::First);
    let head = variable_pointer(&state, "head");

    assert!(!equal(&state, head, &state, last));
    assert!(equal(&state, head, &state, head));
}

#[test]
fn test_exact_and_subsumption_modes() {
    let (three, _) = segment_state(3, false);
    let (four, _) = segment_state(4, false);
    let a = variable_pointer(&three, "head");
    let b = variable_pointer(&four, "head");

    assert!(!equal(&three, a, &four, b));

    let mut cache = EqualityCache::new();
    let mut comparator = ShapeComparator::new(three.graph(), four.graph(), ComparisonMode::Subsumption, &mut cache);
    assert!(comparator.values_equal(a, b));
    assert!(!cache.is_empty());
}

#[test]
fn test_out_of_range_write_is_recorded() {
    let (state, seg) = segment_state(3, false);
    let (state, v) = state.new_number(Number::Integer(5));
    let state = state.write_value(seg, NODE_SIZE, PTR, v).unwrap();

    assert_eq!(state.violations().len(), 1);
    assert_eq!(state.violations()[0].kind, ViolationKind::OutOfRange);
}

#[test]
fn test_violations_order_states() {
    let (clean, _) = segment_state(3, false);
    let (violated, seg) = segment_state(3, false);
    let (violated, v) = violated.new_number(Number::Integer(5));
    let violated = violated.write_value(seg, NODE_SIZE, PTR, v).unwrap();

    assert!(is_less_or_equal(&clean, &violated));
    assert!(!is_less_or_equal(&violated, &clean));
}

#[test]
fn test_variable_sets_must_match() {
    let (one, _) = segment_state(3, false);
    let (two, seg) = segment_state(3, false);
    let (two, _) = point_into(two, "other", seg, 2, TargetSpecifier::First);

    assert!(!is_less_or_equal(&one, &two));
    assert!(!is_less_or_equal(&two, &one));
}

#[test]
fn test_sublist_copies_at_different_levels_are_unequal() {
    let (state, tops) = list_of_lists(&[2, 2, 2, 2]);
    let state = fold(&state, tops[0], 2).unwrap().into_state(state);
    let results = materialize(&state, variable_pointer(&state, "head"), 16).unwrap();
    let state = results.first().state.clone();
    let element = results.first().target;

    let graph = state.graph();
    let own = graph.pointer_target_at(element, DATA).unwrap().target;
    let rest = graph.pointer_target_at(element, NEXT).unwrap().target;
    let summarised = graph.pointer_target_at(rest, DATA).unwrap().target;

    // same content, one level apart
    let (state, to_own) = state.new_pointer(own, 0);
    let (state, to_summarised) = state.new_pointer(summarised, 0);
    let (state, to_own_again) = state.new_pointer(own, 0);
    assert!(!equal(&state, to_own, &state, to_summarised));
    assert!(!equal(&state, to_summarised, &state, to_own));
    assert!(equal(&state, to_own, &state, to_own_again));
}

/// Two freed 128-bit objects with `left`/`right` stored in their second field
fn freed_pair(left: i128, right: i128) -> (SmgState, ValueId, ValueId) {
    let (state, a) = SmgState::new().allocate_heap(128);
    let (state, b) = state.allocate_heap(128);
    let (state, x) = state.new_number(Number::Integer(left));
    let (state, y) = state.new_number(Number::Integer(right));
    let state = state.write_value(a, 64, 64, x).unwrap();
    let state = state.write_value(b, 64, 64, y).unwrap();
    let state = state.free(a).unwrap().free(b).unwrap();
    let (state, pa) = state.new_pointer(a, 0);
    let (state, pb) = state.new_pointer(b, 0);
    (state, pa, pb)
}

#[test]
fn test_freed_regions_are_compared_by_content() {
    let (state, pa, pb) = freed_pair(1, 2);
    assert!(!equal(&state, pa, &state, pb));
    assert!(state.violations().is_empty());

    let (state, pa, pb) = freed_pair(7, 7);
    assert!(equal(&state, pa, &state, pb));
}
