//! Materialization (unfold) integration tests

mod common;
use common::*;

use codegraph_smg::config::{Preset, SmgConfig};
use codegraph_smg::errors::SmgError;
use codegraph_smg::features::smg::{fold, materialize, SmgService, TargetSpecifier};
use pretty_assertions::assert_eq;

#[test]
fn test_unfold_abstracted_list_keeps_data() {
    let service = SmgService::from_preset(Preset::Balanced);
    let list = ListBuilder::singly(6).data(42).build();
    let state = service.abstract_state(&list.state).unwrap();

    let results = service.materialize(&state, variable_pointer(&state, "head")).unwrap();
    assert_eq!(results.len(), 1);

    let m = results.first();
    let graph = m.state.graph();
    let data = graph.value_at(m.target, DATA, PTR).unwrap();
    assert_eq!(graph.number(data).map(|n| n.to_string()), Some("42".to_string()));

    let rest = graph.pointer_target_at(m.target, NEXT).unwrap();
    assert_eq!(segment_of(&m.state, rest.target).min_length, 5);
    assert_eq!(variable_target(&m.state, "head").target, m.target);
}

#[test]
fn test_one_or_more_leaves_zero_or_more_residual() {
    let (state, seg) = segment_state(1, false);
    let results = materialize(&state, variable_pointer(&state, "head"), 16).unwrap();
    assert_eq!(results.len(), 1);

    let m = results.first();
    let graph = m.state.graph();
    assert!(!graph.object(m.target).unwrap().is_segment());
    assert!(!graph.contains_object(seg));
    assert_eq!(variable_target(&m.state, "head").target, m.target);

    let rest = graph.pointer_target_at(m.target, NEXT).unwrap();
    assert_eq!(segment_of(&m.state, rest.target).min_length, 0);
    assert_segment_lengths(&m.state, &[0]);
}

#[test]
fn test_zero_or_more_ends_here_first() {
    let (state, _) = segment_state(0, false);
    let results = materialize(&state, variable_pointer(&state, "head"), 16).unwrap();
    assert_eq!(results.len(), 2);

    assert!(results[0].target.is_null());
    assert_segment_lengths(&results[0].state, &[]);

    let one = &results[1];
    assert!(!one.target.is_null());
    let tail = one.state.graph().pointer_target_at(one.target, NEXT).unwrap();
    assert_eq!(segment_of(&one.state, tail.target).min_length, 0);
}

#[test]
fn test_doubly_linked_back_step() {
    let (state, seg) = segment_state(2, true);
    let (state, tail) = point_into(state, "tail", seg, 0, TargetSpecifier::Last);

    let results = materialize(&state, tail, 16).unwrap();
    assert_eq!(results.len(), 1);
    let m = results.first();
    let graph = m.state.graph();

    // S'[1+] <-> C, C is the last element
    let back = graph.pointer_target_at(m.target, PREV).unwrap();
    assert_eq!(back.specifier, TargetSpecifier::Last);
    assert_eq!(segment_of(&m.state, back.target).min_length, 1);
    assert_eq!(graph.pointer_target_at(back.target, NEXT).unwrap().target, m.target);
    assert!(graph.value_at(m.target, NEXT, PTR).map(|v| v.is_zero()).unwrap_or(false));

    // head now addresses the residual's only guaranteed element
    let head = variable_target(&m.state, "head");
    assert_eq!(head.target, back.target);
    assert_eq!(head.nesting_level, 0);
    assert_eq!(variable_target(&m.state, "tail").target, m.target);
}

#[test]
fn test_doubly_linked_empty_tail_takes_prev() {
    let (state, seg) = segment_state(0, true);
    let (state, tail) = point_into(state, "tail", seg, 0, TargetSpecifier::Last);

    let results = materialize(&state, tail, 16).unwrap();
    assert_eq!(results.len(), 2);
    assert!(results[0].target.is_null());
    assert!(!results[1].target.is_null());
}

#[test]
fn test_nested_sublist_is_copied_for_the_element() {
    let (state, tops) = list_of_lists(&[2, 2, 2, 2]);
    let state = fold(&state, tops[0], 2).unwrap().into_state(state);
    assert_segment_lengths(&state, &[4]);

    let head = variable_pointer(&state, "head");
    let results = materialize(&state, head, 16).unwrap();
    let m = results.first();
    let graph = m.state.graph();

    let own = graph.pointer_target_at(m.target, DATA).unwrap().target;
    let rest = graph.pointer_target_at(m.target, NEXT).unwrap().target;
    let summarised = graph.pointer_target_at(rest, DATA).unwrap().target;

    assert_ne!(own, summarised);
    assert_eq!(graph.object(own).unwrap().nesting_level, 0);
    assert_eq!(graph.object(summarised).unwrap().nesting_level, 1);
}

#[test]
fn test_step_limit_is_not_fatal() {
    let (state, seg) = segment_state(8, false);
    // last element of eight
    let (state, deep) = point_into(state, "deep", seg, 0, TargetSpecifier::First);

    let config = SmgConfig::from_preset(Preset::Fast).max_materialization_steps(3);
    let service = SmgService::new(config).unwrap();
    let err = service.materialize(&state, deep).unwrap_err();
    assert_eq!(err, SmgError::MaterializationLimit(3));
    assert!(!err.is_fatal());

    let results = materialize(&state, deep, 64).unwrap();
    assert_eq!(results.len(), 1);
}
