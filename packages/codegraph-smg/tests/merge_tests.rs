//! Merge integration tests

mod common;
use common::*;

use codegraph_smg::config::{Preset, SmgConfig};
use codegraph_smg::features::smg::{merge, Entailment, Number, SmgService, SmgState};
use pretty_assertions::assert_eq;

fn kept_lengths(state: &SmgState) -> Vec<u32> {
    state.graph().segments().map(|(_, s)| s.min_length).collect()
}

#[test]
fn test_merge_keeps_more_general_side() {
    let service = SmgService::default();
    let (five, _) = segment_state(5, false);
    let (six, _) = segment_state(6, false);

    let (kept, entailment) = service.merge(&five, &six).unwrap().unwrap();
    assert_eq!(entailment, Entailment::RightEntailedInLeft);
    assert_eq!(kept_lengths(&kept), vec![5]);

    let (kept, entailment) = service.merge(&six, &five).unwrap().unwrap();
    assert_eq!(entailment, Entailment::LeftEntailedInRight);
    assert_eq!(kept_lengths(&kept), vec![5]);
}

#[test]
fn test_concrete_lists_merge_after_abstraction() {
    let service = SmgService::from_preset(Preset::Balanced);
    let five = ListBuilder::singly(5).build().state;
    let seven = ListBuilder::singly(7).build().state;

    let (kept, entailment) = service.merge(&seven, &five).unwrap().unwrap();
    assert_eq!(entailment, Entailment::LeftEntailedInRight);
    assert_eq!(kept_lengths(&kept), vec![5]);
}

#[test]
fn test_concrete_lists_without_abstraction_never_merge() {
    let config = SmgConfig::default().abstract_before_merge(false);
    let service = SmgService::new(config).unwrap();
    let five = ListBuilder::singly(5).build().state;

    assert!(service.merge(&five, &five).unwrap().is_none());
}

#[test]
fn test_short_concrete_lists_never_merge() {
    let two = ListBuilder::singly(2).build().state;
    assert!(SmgService::default().merge(&two, &two).unwrap().is_none());
}

#[test]
fn test_incomparable_data() {
    let ones = ListBuilder::singly(5).data(1).build().state;
    let twos = ListBuilder::singly(5).data(2).build().state;
    assert!(SmgService::default().merge(&ones, &twos).unwrap().is_none());
}

#[test]
fn test_shared_concrete_node_is_refused() {
    // head, alias -> n -> SEG[3+], n carries different data so it stays concrete
    let (state, seg) = segment_state(3, false);
    let (state, n) = state.allocate_heap(NODE_SIZE);
    let (state, nine) = state.new_number(Number::Integer(9));
    let state = state.write_value(n, DATA, PTR, nine).unwrap();
    let state = state.write_pointer(n, NEXT, PTR, seg, 0).unwrap();
    let head = state.resolve("head").unwrap();
    let state = state.write_pointer(head, 0, PTR, n, 0).unwrap();
    let (state, alias) = state.add_global("alias", PTR);
    let state = state.write_pointer(alias, 0, PTR, n, 0).unwrap();

    assert!(merge(&state, &state, None).unwrap().is_none());
    assert!(SmgService::default().merge(&state, &state).unwrap().is_none());
}
