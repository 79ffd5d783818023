//! Configuration I/O (YAML loading)

use super::error::{ConfigError, ConfigResult};
use super::preset::Preset;
use super::smg_config::{SmgConfig, SmgConfigPatch};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported schema versions
const SUPPORTED_VERSIONS: &[u32] = &[1];

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigExportV1 {
    /// Schema version (always 1 for v1)
    pub version: u32,

    /// Base preset
    pub preset: String,

    /// Fine-grained overrides
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smg: Option<SmgConfigPatch>,
}

impl SmgConfig {
    /// Parse and validate a v1 YAML document
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let export: ConfigExportV1 = serde_yaml::from_str(content)?;

        if !SUPPORTED_VERSIONS.contains(&export.version) {
            return Err(ConfigError::UnsupportedVersion {
                found: export.version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let preset: Preset = export.preset.parse()?;
        let mut config = SmgConfig::from_preset(preset);
        if let Some(patch) = export.smg {
            config = config.apply_patch(patch);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load and validate a v1 YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Export as a `custom` preset with every field overridden
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let export = ConfigExportV1 {
            version: 1,
            preset: Preset::Custom.to_string(),
            smg: Some(SmgConfigPatch::from(self)),
        };
        serde_yaml::to_string(&export).map_err(ConfigError::Yaml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_yaml_roundtrip() {
        let config = SmgConfig::from_preset(Preset::Thorough).abstraction_threshold(9);
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("version: 1"));
        assert!(yaml.contains("preset: custom"));
        assert!(yaml.contains("abstraction_threshold: 9"));

        let loaded = SmgConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_yaml_loading_from_file() {
        let yaml_content = r#"
version: 1
preset: fast
smg:
  abstraction_threshold: 4
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml_content.as_bytes()).unwrap();

        let config = SmgConfig::from_yaml_file(temp_file.path()).unwrap();
        assert_eq!(config.abstraction_threshold, 4);
        assert!(!config.enable_dll_abstraction);
    }

    #[test]
    fn test_yaml_missing_version() {
        let result = SmgConfig::from_yaml_str("preset: fast\n");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_yaml_unsupported_version() {
        let result = SmgConfig::from_yaml_str("version: 2\npreset: fast\n");
        assert!(matches!(result, Err(ConfigError::UnsupportedVersion { found: 2, .. })));
    }

    #[test]
    fn test_yaml_unknown_preset() {
        let result = SmgConfig::from_yaml_str("version: 1\npreset: turbo\n");
        assert!(matches!(result, Err(ConfigError::UnknownPreset(_))));
    }

    #[test]
    fn test_yaml_unknown_override_field() {
        let yaml = "version: 1\npreset: fast\nsmg:\n  abstraction_treshold: 4\n";
        assert!(matches!(SmgConfig::from_yaml_str(yaml), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_yaml_override_is_validated() {
        let yaml = "version: 1\npreset: balanced\nsmg:\n  max_materialization_steps: 0\n";
        assert!(matches!(SmgConfig::from_yaml_str(yaml), Err(ConfigError::Range { .. })));
    }
}
