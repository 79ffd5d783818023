//! Configuration System
//!
//! Three levels, from simplest to most complete:
//! - Level 1: Preset - one-liner
//! - Level 2: Builder overrides on top of a preset
//! - Level 3: YAML (`version: 1`) with partial overrides
//!
//! # Examples
//!
//! ```rust,ignore
//! use codegraph_smg::config::{Preset, SmgConfig};
//!
//! // Level 1
//! let config = SmgConfig::from_preset(Preset::Fast);
//!
//! // Level 2
//! let config = SmgConfig::from_preset(Preset::Balanced)
//!     .abstraction_threshold(4)
//!     .enable_dll_abstraction(false);
//! config.validate()?;
//!
//! // Level 3
//! let config = SmgConfig::from_yaml_file("smg.yaml")?;
//! ```

pub mod error;
pub mod io;
pub mod preset;
pub mod smg_config;

pub use error::{ConfigError, ConfigResult};
pub use io::ConfigExportV1;
pub use preset::Preset;
pub use smg_config::{SmgConfig, SmgConfigPatch};
