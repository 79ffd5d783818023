//! Property-based tests for the shape lattice
//!
//! Invariants that hold for ALL list lengths:
//! - Monotonicity: a smaller minimum length covers a larger one
//! - Round trip: fold, unfold once, fold again gives an equivalent state
//! - Merge direction: the more general side is kept

mod common;
use common::*;

use codegraph_smg::config::SmgConfig;
use codegraph_smg::features::smg::{abstract_state, is_less_or_equal, materialize, merge, Entailment};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_subsumption_monotone(m1 in 0u32..10, m2 in 0u32..10) {
        let (a, _) = segment_state(m1, false);
        let (b, _) = segment_state(m2, false);

        if m1 <= m2 {
            prop_assert!(is_less_or_equal(&a, &b));
        }
        if m1 < m2 {
            prop_assert!(!is_less_or_equal(&b, &a));
        }
    }

    #[test]
    fn prop_fold_unfold_round_trip(len in 4usize..12, data in 1i128..100) {
        let list = ListBuilder::singly(len).data(data).build();
        let folded = abstract_state(&list.state, 3, true).unwrap();
        prop_assert_eq!(folded.graph().segments().count(), 1);

        let results = materialize(&folded, variable_pointer(&folded, "head"), 64).unwrap();
        prop_assert_eq!(results.len(), 1);

        let refolded = abstract_state(&results.first().state, 3, true).unwrap();
        prop_assert!(is_less_or_equal(&folded, &refolded));
        prop_assert!(is_less_or_equal(&refolded, &folded));
    }

    #[test]
    fn prop_merge_keeps_smaller_minimum(m1 in 1u32..8, m2 in 1u32..8) {
        let (left, _) = segment_state(m1, false);
        let (right, _) = segment_state(m2, false);

        let (kept, entailment) = merge(&left, &right, None).unwrap().unwrap();
        let kept_min = kept.graph().segments().map(|(_, s)| s.min_length).next();
        prop_assert_eq!(kept_min, Some(m1.min(m2)));
        if m1 <= m2 {
            prop_assert_eq!(entailment, Entailment::RightEntailedInLeft);
        } else {
            prop_assert_eq!(entailment, Entailment::LeftEntailedInRight);
        }
    }

    #[test]
    fn prop_threshold_range_validates(threshold in 1u32..=64, steps in 1usize..=10000) {
        let config = SmgConfig::default()
            .abstraction_threshold(threshold)
            .max_materialization_steps(steps);
        prop_assert!(config.validate().is_ok());
    }
}
