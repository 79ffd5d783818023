//! SMG Application Layer - driver-facing service
//!
//! ## Hexagonal Architecture
//! - **Application**: Binds a validated configuration to the ports (this module)
//! - **Domain**: Heap graph and state
//! - **Ports**: Interface definitions
//! - **Infrastructure**: Engines

use super::domain::{Entailment, FoldCandidate, FoldOutcome, Materialized, ObjectId, SmgState, ValueId};
use super::infrastructure::{ListAbstraction, SegmentMaterializer, ShapeLattice};
use super::ports::{AbstractionPort, MaterializationPort, StateLatticePort};
use crate::config::{ConfigResult, Preset, SmgConfig};
use crate::errors::Result;
use crate::shared::models::NonEmpty;
use tracing::{debug, error};

/// SMG Service - Main Application Service
///
/// ## Example
/// ```rust,ignore
/// use codegraph_smg::features::smg::application::SmgService;
/// use codegraph_smg::config::Preset;
///
/// let service = SmgService::from_preset(Preset::Balanced);
/// let abstracted = service.abstract_state(&state)?;
/// for m in service.materialize(&abstracted, pointer)? {
///     // continue the analysis on m.state with m.target
/// }
/// ```
pub struct SmgService {
    /// Configuration
    config: SmgConfig,

    /// Fold engine
    abstraction: Box<dyn AbstractionPort>,

    /// Unfold engine
    materializer: Box<dyn MaterializationPort>,

    /// Order and merge
    lattice: Box<dyn StateLatticePort>,
}

impl SmgService {
    /// Create a service from a configuration, validating it first
    pub fn new(config: SmgConfig) -> ConfigResult<Self> {
        config.validate()?;

        let abstraction = ListAbstraction::new(config.abstraction_threshold, config.enable_dll_abstraction);
        let abstract_before_merge = config.abstract_before_merge && config.enable_abstraction;

        Ok(Self {
            abstraction: Box::new(abstraction),
            materializer: Box::new(SegmentMaterializer::new(config.max_materialization_steps)),
            lattice: Box::new(ShapeLattice::new(abstraction, abstract_before_merge)),
            config,
        })
    }

    /// Create a service from a preset (presets are always valid)
    pub fn from_preset(preset: Preset) -> Self {
        let config = SmgConfig::from_preset(preset);
        let abstraction = ListAbstraction::new(config.abstraction_threshold, config.enable_dll_abstraction);
        Self {
            abstraction: Box::new(abstraction),
            materializer: Box::new(SegmentMaterializer::new(config.max_materialization_steps)),
            lattice: Box::new(ShapeLattice::new(abstraction, config.abstract_before_merge)),
            config,
        }
    }

    /// Replace the fold engine (builder pattern)
    pub fn with_abstraction(mut self, abstraction: Box<dyn AbstractionPort>) -> Self {
        self.abstraction = abstraction;
        self
    }

    /// Replace the unfold engine (builder pattern)
    pub fn with_materializer(mut self, materializer: Box<dyn MaterializationPort>) -> Self {
        self.materializer = materializer;
        self
    }

    /// Replace the lattice (builder pattern)
    pub fn with_lattice(mut self, lattice: Box<dyn StateLatticePort>) -> Self {
        self.lattice = lattice;
        self
    }

    pub fn config(&self) -> &SmgConfig {
        &self.config
    }

    pub fn find_candidates(&self, state: &SmgState) -> Vec<FoldCandidate> {
        self.abstraction.find_candidates(state)
    }

    /// Fold the chain at `root`; a no-op when abstraction is disabled
    pub fn fold(&self, state: &SmgState, root: ObjectId) -> Result<FoldOutcome> {
        if !self.config.enable_abstraction {
            return Ok(FoldOutcome::Unchanged);
        }
        report("fold", self.abstraction.fold(state, root))
    }

    /// Fold everything foldable; the input state when abstraction is disabled
    pub fn abstract_state(&self, state: &SmgState) -> Result<SmgState> {
        if !self.config.enable_abstraction {
            return Ok(state.clone());
        }
        report("abstract_state", self.abstraction.abstract_state(state))
    }

    pub fn materialize(&self, state: &SmgState, pointer: ValueId) -> Result<NonEmpty<Materialized>> {
        report("materialize", self.materializer.materialize(state, pointer))
    }

    pub fn is_less_or_equal(&self, this: &SmgState, other: &SmgState) -> bool {
        self.lattice.is_less_or_equal(this, other)
    }

    pub fn equal(&self, this: &SmgState, a: ValueId, other: &SmgState, b: ValueId) -> bool {
        self.lattice.equal(this, a, other, b)
    }

    pub fn merge(&self, left: &SmgState, right: &SmgState) -> Result<Option<(SmgState, Entailment)>> {
        let merged = report("merge", self.lattice.merge(left, right))?;
        if let Some((_, entailment)) = &merged {
            debug!(?entailment, "states merged");
        }
        Ok(merged)
    }
}

impl Default for SmgService {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}

/// Log engine bugs before handing them to the driver
fn report<T>(operation: &str, result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        if err.is_fatal() {
            error!(operation, error = %err, "internal inconsistency in SMG engine");
        } else {
            debug!(operation, error = %err, "SMG operation failed");
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::features::smg::domain::{ListSegment, Number};

    #[test]
    fn test_invalid_config_rejected() {
        let config = SmgConfig::default().abstraction_threshold(0);
        assert!(matches!(SmgService::new(config), Err(ConfigError::Range { .. })));
    }

    #[test]
    fn test_disabled_abstraction_is_identity() {
        let config = SmgConfig::default()
            .enable_abstraction(false)
            .enable_dll_abstraction(false);
        let service = SmgService::new(config).unwrap();

        let (state, head) = SmgState::new().add_global("head", 64);
        let (graph, seg) = state.graph().clone().allocate_segment(128, ListSegment::singly(2, 0, 0));
        let state = state.with_graph(graph).write_pointer(head, 0, 64, seg, 0).unwrap();

        let out = service.abstract_state(&state).unwrap();
        assert_eq!(out.graph().object_count(), state.graph().object_count());
        assert!(service.fold(&state, seg).unwrap().is_unchanged());
    }

    #[test]
    fn test_materialize_through_service() {
        let service = SmgService::from_preset(Preset::Fast);
        let (state, head) = SmgState::new().add_global("head", 64);
        let (graph, seg) = state.graph().clone().allocate_segment(128, ListSegment::singly(1, 0, 0));
        let state = state.with_graph(graph);
        let state = state.write_value(seg, 0, 64, ValueId::ZERO).unwrap();
        let (state, one) = state.new_number(Number::Integer(1));
        let state = state.write_value(seg, 64, 64, one).unwrap();
        let (state, p) = state.new_pointer(seg, 0);
        let state = state.write_value(head, 0, 64, p).unwrap();

        let results = service.materialize(&state, p).unwrap();
        assert_eq!(results.len(), 1);
        assert!(!results.first().target.is_null());
    }
}
