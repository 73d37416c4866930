//! Stage selection and per-stage override resolution.
//!
//! A descriptor may carry an override map under a reserved key:
//!
//! ```yaml
//! service:
//!   name: whoami
//! stage_overrides:
//!   prod:
//!     service:
//!       replicas: 3
//! ```
//!
//! Resolving for a stage removes the override map, deep-merges the matching
//! entry onto the rest of the tree and records the stage name in the tree.

use crate::config::EngineConfig;
use crate::error::{Result, SsotError};
use crate::tree::{deep_merge, key};
use serde_yaml::Value;
use std::fmt;
use tracing::debug;

/// The active deployment stage for one resolution run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Stage(String);

impl Stage {
    /// Parse a stage name, accepting only names listed in `known`.
    pub fn parse(name: &str, known: &[String]) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SsotError::User("stage name must not be empty".to_string()));
        }
        if !known.iter().any(|k| k == name) {
            return Err(SsotError::User(format!(
                "unknown stage '{}' (expected one of: {})",
                name,
                known.join(", ")
            )));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key names used by stage resolution.
#[derive(Debug, Clone, Copy)]
pub struct StageKeys<'a> {
    /// Reserved key holding the override map.
    pub override_key: &'a str,
    /// Field receiving the active stage name.
    pub stage_field: &'a str,
}

impl<'a> StageKeys<'a> {
    pub fn from_config(config: &'a EngineConfig) -> Self {
        Self {
            override_key: &config.override_key,
            stage_field: &config.stage_field,
        }
    }
}

/// Apply the override subtree for `stage` and strip the override map.
///
/// An absent override map, or one without an entry for `stage`, leaves the
/// tree unchanged apart from the injected stage field. Running this again on
/// its own output with the same stage changes nothing.
pub fn resolve(mut tree: Value, stage: &Stage, keys: StageKeys<'_>) -> Result<Value> {
    let root = tree.as_mapping_mut().ok_or_else(|| {
        SsotError::Resolution("descriptor root must be a mapping".to_string())
    })?;

    let overrides = root.remove(keys.override_key).unwrap_or(Value::Null);
    let selected = match overrides {
        Value::Null => None,
        Value::Mapping(mut map) => map.remove(stage.as_str()),
        other => {
            return Err(SsotError::Resolution(format!(
                "'{}' must be a mapping of stage name to overrides, found {}",
                keys.override_key,
                type_name(&other)
            )));
        }
    };

    match selected {
        Some(Value::Null) | None => {
            debug!(stage = %stage, "no overrides declared for stage");
        }
        Some(layer @ Value::Mapping(_)) => {
            debug!(stage = %stage, "applying stage overrides");
            deep_merge(&mut tree, layer);
        }
        Some(other) => {
            return Err(SsotError::Resolution(format!(
                "overrides for stage '{}' must be a mapping, found {}",
                stage,
                type_name(&other)
            )));
        }
    }

    if let Some(root) = tree.as_mapping_mut() {
        root.insert(key(keys.stage_field), key(stage.as_str()));
    }
    Ok(tree)
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
