//! Preset configurations
//!
//! Presets provide complete default configurations for common use cases.

use super::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Configuration preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// CI/CD: Aggressive folding, singly linked lists only
    ///
    /// - Threshold: 2 (fold chains of 3+)
    /// - DLL abstraction: off
    /// - Materialization: at most 16 unfolding steps
    Fast,

    /// Development: Default
    ///
    /// - Threshold: 3 (fold chains of 4+)
    /// - DLL abstraction: on
    /// - Materialization: at most 64 unfolding steps
    #[default]
    Balanced,

    /// Verification: Keeps more concrete prefix before summarising
    ///
    /// - Threshold: 5 (fold chains of 6+)
    /// - DLL abstraction: on
    /// - Materialization: at most 1024 unfolding steps
    Thorough,

    /// Custom: User-defined (YAML only)
    ///
    /// Starts from the balanced defaults.
    Custom,
}

impl Preset {
    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Balanced => "balanced",
            Self::Thorough => "thorough",
            Self::Custom => "custom",
        }
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "balanced" => Ok(Self::Balanced),
            "thorough" => Ok(Self::Thorough),
            "custom" => Ok(Self::Custom),
            _ => Err(ConfigError::UnknownPreset(s.to_string())),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
