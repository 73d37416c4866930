//! Config loading and validation.

use super::model::EngineConfig;
use crate::error::{Result, SsotError};
use globset::Glob;
use std::path::Path;

impl EngineConfig {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            SsotError::io(
                format!("failed to read config file '{}'", path.display()),
                e,
            )
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to an empty mapping.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: EngineConfig = serde_yaml::from_str(yaml)
            .map_err(|e| SsotError::User(format!("failed to parse engine config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `max_passes` must be positive
    /// - `override_key`, `stage_field` and `template_marker` must be non-empty
    /// - `known_stages` must be non-empty
    /// - every `ignore_globs` entry must compile
    pub fn validate(&self) -> Result<()> {
        if self.max_passes == 0 {
            return Err(SsotError::User(
                "config validation failed: max_passes must be greater than 0".to_string(),
            ));
        }

        for (name, value) in [
            ("override_key", &self.override_key),
            ("stage_field", &self.stage_field),
            ("template_marker", &self.template_marker),
        ] {
            if value.is_empty() {
                return Err(SsotError::User(format!(
                    "config validation failed: {} must be non-empty",
                    name
                )));
            }
        }

        if self.known_stages.is_empty() {
            return Err(SsotError::User(
                "config validation failed: known_stages must list at least one stage".to_string(),
            ));
        }

        for pattern in &self.ignore_globs {
            Glob::new(pattern).map_err(|e| {
                SsotError::User(format!(
                    "config validation failed: invalid ignore glob '{}': {}",
                    pattern, e
                ))
            })?;
        }

        Ok(())
    }
}
