//! SMG Domain - heap graph model and program state
//!
//! ## DDD Concepts Applied
//! - **Value Object**: `ValueId`, `ObjectId`, edges, `ListSegment`, `Violation`
//! - **Entity**: `MemoryObject` (identity is its `ObjectId`)
//! - **Aggregate**: `HeapGraph`, wrapped by `SmgState` together with the
//!   program variables
//!
//! Nothing in here knows about abstraction or comparison; the engines in
//! `infrastructure` operate on these types.

pub mod edge;
pub mod graph;
pub mod object;
pub mod outcome;
pub mod state;
pub mod value;
pub mod violation;

pub use edge::{HasValueEdge, PointsToEdge, TargetSpecifier};
pub use graph::HeapGraph;
pub use object::{Linkage, ListSegment, MemoryObject, ObjectId, ObjectKind};
pub use outcome::{Entailment, FoldCandidate, FoldOutcome, Materialized};
pub use state::{SmgState, StackFrame, VariableKey, VariableMap};
pub use value::{Number, Value, ValueId};
pub use violation::{Violation, ViolationKind};
