//! SMG Infrastructure - engines implementing the ports
//!
//! - `equality`: shape comparison, lattice order
//! - `candidates`: list node detection
//! - `abstraction`: fold
//! - `materialization`: unfold
//! - `merge`: covering-state merge
//! - `nested`: nesting levels and copies of per-element data

pub mod abstraction;
pub mod candidates;
pub mod equality;
pub mod materialization;
pub mod merge;
pub(crate) mod nested;

pub use abstraction::{abstract_state, fold, fold_candidate, ListAbstraction};
pub use candidates::{detect_links, find_candidates};
pub use equality::{equal, is_less_or_equal, ComparisonMode, EqualityCache, ShapeComparator};
pub use materialization::{materialize, SegmentMaterializer};
pub use merge::{merge, shares_concrete_list_node, ShapeLattice};
