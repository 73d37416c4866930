//! Engine configuration struct definition.

use super::types::*;
use serde::{Deserialize, Serialize};

/// Configuration for one ssot-render invocation.
///
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // =========================================================================
    // Resolution settings
    // =========================================================================
    /// Pass ceiling for the fixed-point resolver.
    #[serde(default = "default_max_passes")]
    pub max_passes: usize,

    /// Reserved top-level key holding the per-stage override map.
    #[serde(default = "default_override_key")]
    pub override_key: String,

    /// Top-level field that receives the active stage name.
    #[serde(default = "default_stage_field")]
    pub stage_field: String,

    /// Stage names accepted by `--stage`.
    #[serde(default = "default_known_stages")]
    pub known_stages: Vec<String>,

    // =========================================================================
    // Template settings
    // =========================================================================
    /// File suffix marking a file as a template (stripped from output names).
    #[serde(default = "default_template_marker")]
    pub template_marker: String,

    /// Name of the resolved-context sidecar written next to rendered output.
    #[serde(default = "default_snapshot_file")]
    pub snapshot_file: String,

    /// Globs (relative to a source directory) excluded from template discovery.
    #[serde(default = "default_ignore_globs")]
    pub ignore_globs: Vec<String>,

    // =========================================================================
    // Layout settings
    // =========================================================================
    /// Directory under the service root holding service-local overrides.
    #[serde(default = "default_custom_templates_dir")]
    pub custom_templates_dir: String,

    /// Directory under the engine root holding shared default templates.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,

    /// Name of the "files" tree, both as source and output subdirectory.
    #[serde(default = "default_files_dir")]
    pub files_dir: String,

    /// Default output root for rendered deployments.
    #[serde(default = "default_deployments_dir")]
    pub deployments_dir: String,

    // =========================================================================
    // Enrichment settings
    // =========================================================================
    /// Networks injected by network enrichment.
    #[serde(default)]
    pub networks: NetworkDefaults,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_passes: default_max_passes(),
            override_key: default_override_key(),
            stage_field: default_stage_field(),
            known_stages: default_known_stages(),
            template_marker: default_template_marker(),
            snapshot_file: default_snapshot_file(),
            ignore_globs: default_ignore_globs(),
            custom_templates_dir: default_custom_templates_dir(),
            templates_dir: default_templates_dir(),
            files_dir: default_files_dir(),
            deployments_dir: default_deployments_dir(),
            networks: NetworkDefaults::default(),
        }
    }
}
