//! SMG Ports - Interface Layer (Hexagonal Architecture)
//!
//! Traits separating the application service from the engines.
//!
//! ## Usage
//! ```rust,ignore
//! use codegraph_smg::features::smg::ports::StateLatticePort;
//!
//! fn covered<L: StateLatticePort>(lattice: &L, reached: &[SmgState], new: &SmgState) -> bool {
//!     reached.iter().any(|old| lattice.is_less_or_equal(old, new))
//! }
//! ```

use super::domain::{Entailment, FoldCandidate, FoldOutcome, Materialized, ObjectId, SmgState, ValueId, VariableKey, VariableMap};
use crate::errors::Result;
use crate::shared::models::NonEmpty;

// ═══════════════════════════════════════════════════════════════════════════
// Secondary Ports (Driven/Output)
// ═══════════════════════════════════════════════════════════════════════════

/// Named program variables and the objects they live in
pub trait VariableStore {
    /// Innermost binding of `name`
    fn resolve(&self, name: &str) -> Option<ObjectId>;

    /// Every binding; the roots of heap reachability
    fn roots(&self) -> Vec<(VariableKey, ObjectId)>;
}

impl VariableStore for VariableMap {
    fn resolve(&self, name: &str) -> Option<ObjectId> {
        VariableMap::resolve(self, name)
    }

    fn roots(&self) -> Vec<(VariableKey, ObjectId)> {
        self.entries()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Primary Ports (Driving/Input)
// ═══════════════════════════════════════════════════════════════════════════

/// List abstraction (fold)
pub trait AbstractionPort {
    /// Chain roots reachable from the variables, heads first
    fn find_candidates(&self, state: &SmgState) -> Vec<FoldCandidate>;

    /// Fold the chain starting at `root`
    fn fold(&self, state: &SmgState, root: ObjectId) -> Result<FoldOutcome>;

    /// Fold until nothing changes
    fn abstract_state(&self, state: &SmgState) -> Result<SmgState>;
}

/// Segment unfolding on dereference
pub trait MaterializationPort {
    /// Concretize the target of `pointer`; one result per case split
    fn materialize(&self, state: &SmgState, pointer: ValueId) -> Result<NonEmpty<Materialized>>;
}

/// Order and merge of abstract states
pub trait StateLatticePort {
    /// `this` covers every heap `other` describes
    fn is_less_or_equal(&self, this: &SmgState, other: &SmgState) -> bool;

    /// Exact shape equality of two values
    fn equal(&self, this: &SmgState, a: ValueId, other: &SmgState, b: ValueId) -> bool;

    /// The more general state of the two, if one covers the other
    fn merge(&self, left: &SmgState, right: &SmgState) -> Result<Option<(SmgState, Entailment)>>;
}
