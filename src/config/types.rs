//! Configuration types and defaults for ssot-render.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;

/// Well-known networks injected into every deployment-type section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkDefaults {
    /// Shared network definitions keyed by network name.
    pub shared: BTreeMap<String, Value>,

    /// Suffix appended to `service.name` to build the internal network name.
    pub internal_suffix: String,

    /// Definition used for the internal network when the service declares none.
    pub internal_definition: Value,
}

impl Default for NetworkDefaults {
    fn default() -> Self {
        let shared = ["secured", "exposed", "interconnect"]
            .into_iter()
            .map(|name| (name.to_string(), flag_mapping("external")))
            .collect();

        Self {
            shared,
            internal_suffix: default_internal_suffix(),
            internal_definition: flag_mapping("internal"),
        }
    }
}

impl NetworkDefaults {
    /// Internal network identifier for a service.
    pub fn internal_name(&self, service_name: &str) -> String {
        format!("{}{}", service_name, self.internal_suffix)
    }
}

fn flag_mapping(key: &str) -> Value {
    let mut map = Mapping::new();
    map.insert(Value::String(key.to_string()), Value::Bool(true));
    Value::Mapping(map)
}

// Default value functions for serde
pub(crate) fn default_max_passes() -> usize {
    10
}
pub(crate) fn default_override_key() -> String {
    "stage_overrides".to_string()
}
pub(crate) fn default_stage_field() -> String {
    "stage".to_string()
}
pub(crate) fn default_known_stages() -> Vec<String> {
    vec!["dev".to_string(), "test".to_string(), "prod".to_string()]
}
pub(crate) fn default_template_marker() -> String {
    ".j2".to_string()
}
pub(crate) fn default_snapshot_file() -> String {
    ".ssot.json".to_string()
}
pub(crate) fn default_ignore_globs() -> Vec<String> {
    vec![".git/**".to_string(), "**/.DS_Store".to_string()]
}
pub(crate) fn default_custom_templates_dir() -> String {
    "custom_templates".to_string()
}
pub(crate) fn default_templates_dir() -> String {
    "templates".to_string()
}
pub(crate) fn default_files_dir() -> String {
    "files".to_string()
}
pub(crate) fn default_deployments_dir() -> String {
    "deployments".to_string()
}
pub(crate) fn default_internal_suffix() -> String {
    "_internal".to_string()
}
