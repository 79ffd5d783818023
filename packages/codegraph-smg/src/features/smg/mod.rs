//! Symbolic Memory Graphs - shape abstraction for linked lists
//!
//! ## Hexagonal Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Application Layer                            │
//! │                    SmgService                                   │
//! │                         │ uses                                  │
//! │                         ▼                                       │
//! │                    Ports Layer                                  │
//! │  AbstractionPort, MaterializationPort, StateLatticePort,        │
//! │  VariableStore                                                  │
//! │                         ▲ implements                            │
//! │                         │                                       │
//! │                 Infrastructure Layer                            │
//! │  ListAbstraction, SegmentMaterializer, ShapeLattice             │
//! │                         │ operates on                           │
//! │                         ▼                                       │
//! │                    Domain Layer                                 │
//! │  HeapGraph, MemoryObject, ListSegment, SmgState                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Academic SOTA
//! - **Predator**: Dudka, Peringer, Vojnar (2011, 2013)
//! - **CPAchecker SMG**: Müller (2016), Baier et al. (2024)
//! - **Separation Logic list segments**: Berdine, Calcagno, O'Hearn (2005)
//!
//! ## Features
//!
//! ### 1. Heap graph (`domain`)
//! Regions, singly/doubly linked list segments with a minimum length,
//! has-value and points-to edges, persistent copy-on-write storage.
//!
//! ### 2. Abstraction (`infrastructure::abstraction`)
//! Folds runs of equal list nodes into segments, tracks nested lists.
//!
//! ### 3. Materialization (`infrastructure::materialization`)
//! Unfolds concrete elements on dereference, from the front or the back.
//!
//! ### 4. Comparison (`infrastructure::equality`, `infrastructure::merge`)
//! Cycle-safe shape equality, subsumption order, covering-state merge.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::SmgService;
pub use domain::{
    Entailment, FoldCandidate, FoldOutcome, HasValueEdge, HeapGraph, Linkage, ListSegment, Materialized, MemoryObject,
    Number, ObjectId, ObjectKind, PointsToEdge, SmgState, StackFrame, TargetSpecifier, Value, ValueId, VariableKey,
    VariableMap, Violation, ViolationKind,
};
pub use infrastructure::{
    abstract_state, equal, find_candidates, fold, is_less_or_equal, materialize, merge, ComparisonMode, EqualityCache,
    ShapeComparator,
};
pub use ports::{AbstractionPort, MaterializationPort, StateLatticePort, VariableStore};
