//! SMG engine configuration
//!
//! References:
//! - Dudka, Peringer, Vojnar (2011): "Predator: A Practical Tool for Checking
//!   Manipulation of Dynamic Data Structures Using Separation Logic"
//! - Dudka, Peringer, Vojnar (2013): "Byte-Precise Verification of Low-Level
//!   List Manipulation"

use super::error::{ConfigError, ConfigResult};
use super::preset::Preset;
use serde::{Deserialize, Serialize};

/// Shape abstraction settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmgConfig {
    /// Run fold passes over chains reachable from variables
    pub enable_abstraction: bool,

    /// Chains of at least `threshold + 1` elements are folded (1..=64)
    pub abstraction_threshold: u32,

    /// Detect `prev` links and fold doubly linked chains
    pub enable_dll_abstraction: bool,

    /// Abstract both states before comparing them in `merge`
    pub abstract_before_merge: bool,

    /// Bound on unfolding steps for one dereference (1..=10000)
    pub max_materialization_steps: usize,
}

impl SmgConfig {
    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::Fast => Self {
                enable_abstraction: true,
                abstraction_threshold: 2,
                enable_dll_abstraction: false,
                abstract_before_merge: true,
                max_materialization_steps: 16,
            },
            Preset::Balanced | Preset::Custom => Self {
                enable_abstraction: true,
                abstraction_threshold: 3,
                enable_dll_abstraction: true,
                abstract_before_merge: true,
                max_materialization_steps: 64,
            },
            Preset::Thorough => Self {
                enable_abstraction: true,
                abstraction_threshold: 5,
                enable_dll_abstraction: true,
                abstract_before_merge: true,
                max_materialization_steps: 1024,
            },
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.abstraction_threshold == 0 || self.abstraction_threshold > 64 {
            return Err(ConfigError::range_with_hint(
                "abstraction_threshold",
                self.abstraction_threshold,
                1,
                64,
                "A chain needs at least two elements to fold",
            ));
        }

        if self.max_materialization_steps == 0 || self.max_materialization_steps > 10000 {
            return Err(ConfigError::range_with_hint(
                "max_materialization_steps",
                self.max_materialization_steps,
                1,
                10000,
                "Dereferencing a segment needs at least one unfolding step",
            ));
        }

        if self.enable_dll_abstraction && !self.enable_abstraction {
            return Err(ConfigError::Validation(
                "enable_dll_abstraction requires enable_abstraction".to_string(),
            ));
        }

        Ok(())
    }

    /// Builder: Set enable_abstraction
    pub fn enable_abstraction(mut self, v: bool) -> Self {
        self.enable_abstraction = v;
        self
    }

    /// Builder: Set abstraction_threshold
    pub fn abstraction_threshold(mut self, v: u32) -> Self {
        self.abstraction_threshold = v;
        self
    }

    /// Builder: Set enable_dll_abstraction
    pub fn enable_dll_abstraction(mut self, v: bool) -> Self {
        self.enable_dll_abstraction = v;
        self
    }

    /// Builder: Set abstract_before_merge
    pub fn abstract_before_merge(mut self, v: bool) -> Self {
        self.abstract_before_merge = v;
        self
    }

    /// Builder: Set max_materialization_steps
    pub fn max_materialization_steps(mut self, v: usize) -> Self {
        self.max_materialization_steps = v;
        self
    }

    /// Apply a partial override
    pub fn apply_patch(mut self, patch: SmgConfigPatch) -> Self {
        if let Some(v) = patch.enable_abstraction {
            self.enable_abstraction = v;
        }
        if let Some(v) = patch.abstraction_threshold {
            self.abstraction_threshold = v;
        }
        if let Some(v) = patch.enable_dll_abstraction {
            self.enable_dll_abstraction = v;
        }
        if let Some(v) = patch.abstract_before_merge {
            self.abstract_before_merge = v;
        }
        if let Some(v) = patch.max_materialization_steps {
            self.max_materialization_steps = v;
        }
        self
    }
}

impl Default for SmgConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}

/// Patch type for SmgConfig
///
/// All fields are optional - only specified fields will be applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SmgConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_abstraction: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abstraction_threshold: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_dll_abstraction: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abstract_before_merge: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_materialization_steps: Option<usize>,
}

impl From<&SmgConfig> for SmgConfigPatch {
    fn from(config: &SmgConfig) -> Self {
        Self {
            enable_abstraction: Some(config.enable_abstraction),
            abstraction_threshold: Some(config.abstraction_threshold),
            enable_dll_abstraction: Some(config.enable_dll_abstraction),
            abstract_before_merge: Some(config.abstract_before_merge),
            max_materialization_steps: Some(config.max_materialization_steps),
        }
    }
}
