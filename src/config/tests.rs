//! Tests for engine config loading.

use crate::config::{EngineConfig, NetworkDefaults};
use crate::error::SsotError;
use serde_yaml::Value;

#[test]
fn test_default_config() {
    let config = EngineConfig::default();

    assert_eq!(config.max_passes, 10);
    assert_eq!(config.override_key, "stage_overrides");
    assert_eq!(config.stage_field, "stage");
    assert_eq!(config.known_stages, vec!["dev", "test", "prod"]);
    assert_eq!(config.template_marker, ".j2");
    assert_eq!(config.snapshot_file, ".ssot.json");
    assert_eq!(config.custom_templates_dir, "custom_templates");
    assert_eq!(config.templates_dir, "templates");
    assert_eq!(config.deployments_dir, "deployments");
    assert_eq!(config.networks.shared.len(), 3);
}

#[test]
fn test_parse_empty_yaml_uses_defaults() {
    let config = EngineConfig::from_yaml("").unwrap();
    assert_eq!(config.max_passes, 10);
    assert_eq!(config.template_marker, ".j2");
}

#[test]
fn test_parse_partial_yaml() {
    let yaml = r#"
max_passes: 4
known_stages: [dev, staging, prod]
"#;
    let config = EngineConfig::from_yaml(yaml).unwrap();

    assert_eq!(config.max_passes, 4);
    assert_eq!(config.known_stages, vec!["dev", "staging", "prod"]);
    assert_eq!(config.override_key, "stage_overrides");
}

#[test]
fn test_parse_network_overrides() {
    let yaml = r#"
networks:
  shared:
    proxy:
      external: true
  internal_suffix: "-net"
"#;
    let config = EngineConfig::from_yaml(yaml).unwrap();

    assert_eq!(config.networks.shared.len(), 1);
    assert!(config.networks.shared.contains_key("proxy"));
    assert_eq!(config.networks.internal_name("api"), "api-net");
    // Fields left out fall back to defaults.
    assert_eq!(
        config.networks.internal_definition,
        NetworkDefaults::default().internal_definition
    );
}

#[test]
fn test_unknown_fields_ignored() {
    let yaml = "future_option: 42\nmax_passes: 3\n";
    let config = EngineConfig::from_yaml(yaml).unwrap();
    assert_eq!(config.max_passes, 3);
}

#[test]
fn test_zero_max_passes_rejected() {
    let err = EngineConfig::from_yaml("max_passes: 0").unwrap_err();
    assert!(matches!(err, SsotError::User(_)));
    assert!(err.to_string().contains("max_passes"));
}

#[test]
fn test_empty_marker_rejected() {
    let err = EngineConfig::from_yaml("template_marker: ''").unwrap_err();
    assert!(err.to_string().contains("template_marker"));
}

#[test]
fn test_invalid_glob_rejected() {
    let err = EngineConfig::from_yaml("ignore_globs: ['a[']").unwrap_err();
    assert!(err.to_string().contains("invalid ignore glob"));
}

#[test]
fn test_internal_name_uses_suffix() {
    let defaults = NetworkDefaults::default();
    assert_eq!(defaults.internal_name("whoami"), "whoami_internal");
    assert_eq!(
        defaults.shared.get("secured").and_then(|v| v.get("external")),
        Some(&Value::Bool(true))
    );
}

#[test]
fn test_load_missing_file_is_io_error() {
    let err = EngineConfig::load("/nonexistent/engine.yaml").unwrap_err();
    assert!(matches!(err, SsotError::Io { .. }));
}
