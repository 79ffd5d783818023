/*
 * Codegraph SMG - Symbolic Memory Graphs for shape analysis
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : Common models (NonEmpty)
 * - features/    : Vertical slices (smg: domain → ports → infrastructure → application)
 * - config/      : Presets, validation, YAML import/export
 *
 * Engines:
 * - Abstraction: fold runs of equal list nodes into list segments
 * - Materialization: unfold concrete elements on dereference
 * - Lattice: shape equality, subsumption, merge
 */

// Crate-level lint configuration
#![allow(clippy::too_many_arguments)] // Graph rewrites thread many offsets
#![allow(clippy::type_complexity)] // Merge results carry state plus direction
#![allow(clippy::module_inception)] // Module naming intentional
#![allow(clippy::new_without_default)] // Default impl not always needed

// ═══════════════════════════════════════════════════════════════════════════
// Module Exports - Feature-First Architecture
// ═══════════════════════════════════════════════════════════════════════════

/// Shared models and utilities
pub mod shared;

/// Feature modules (vertical slices)
pub mod features;

/// Configuration system (presets, validation, YAML)
pub mod config;

/// Error types
pub mod errors;

pub use config::{ConfigError, ConfigResult, Preset, SmgConfig, SmgConfigPatch};
pub use errors::{Result, SmgError};
pub use features::smg::SmgService;
