//! Derived defaults injected into the resolved tree before rendering.
//!
//! Each step is a pure function from tree to tree that treats a missing
//! section as "feature disabled". They run in a fixed order:
//!
//! 1. [`apply_network_defaults`] - well-known networks and internal network joins
//! 2. [`derive_routing_port`] - the port published for routing
//! 3. [`apply_host_network_flag`] - the `host_network` flag for templates

mod host_network;
mod network;
mod routing;

pub use host_network::{HOST_NETWORK_FIELD, apply_host_network_flag};
pub use network::{INTERNAL_NETWORK_FIELD, apply_network_defaults};
pub use routing::{derive_routing_port, port_from_healthcheck};

use crate::config::NetworkDefaults;
use crate::error::{Result, SsotError};
use crate::stage::type_name;
use serde_yaml::Value;

/// Parameters shared by the enrichment steps.
#[derive(Debug, Clone, Copy)]
pub struct EnrichOptions<'a> {
    /// Deployment type being rendered (`deployments.<type>`), if any.
    pub deployment_type: Option<&'a str>,
    /// Networks to inject.
    pub networks: &'a NetworkDefaults,
}

/// Run every enrichment step in order.
pub fn enrich(tree: Value, options: EnrichOptions<'_>) -> Result<Value> {
    let tree = apply_network_defaults(tree, options.deployment_type, options.networks)?;
    let tree = derive_routing_port(tree)?;
    apply_host_network_flag(tree, options.deployment_type)
}

/// Error for a section that exists but has the wrong shape.
fn shape_error(path: &str, expected: &str, found: &Value) -> SsotError {
    SsotError::Resolution(format!(
        "'{}' must be {}, found {}",
        path,
        expected,
        type_name(found)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::lookup;

    #[test]
    fn test_enrich_runs_all_steps() {
        let tree: Value = serde_yaml::from_str(
            r#"
service:
  name: web
  network_mode: host
  healthcheck:
    test: "curl -f http://localhost:3000/"
routing:
  enabled: true
deployments:
  docker_compose: {}
"#,
        )
        .unwrap();
        let networks = NetworkDefaults::default();
        let options = EnrichOptions {
            deployment_type: Some("docker_compose"),
            networks: &networks,
        };
        let tree = enrich(tree, options).unwrap();

        assert_eq!(
            tree.get(INTERNAL_NETWORK_FIELD).and_then(Value::as_str),
            Some("web_internal")
        );
        assert_eq!(
            lookup(&tree, &["service", "ports"]),
            Some(&serde_yaml::from_str::<Value>("[{port: 3000}]").unwrap())
        );
        assert_eq!(tree.get(HOST_NETWORK_FIELD), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_enrich_is_idempotent() {
        let tree: Value = serde_yaml::from_str(
            r#"
service: {name: api, networks: [secured]}
dependencies: {db: {image: postgres}}
routing: {enabled: true, port: 8080}
deployments: {docker_compose: {networks: {secured: {external: false}}}}
"#,
        )
        .unwrap();
        let networks = NetworkDefaults::default();
        let options = EnrichOptions {
            deployment_type: Some("docker_compose"),
            networks: &networks,
        };
        let once = enrich(tree, options).unwrap();
        let twice = enrich(once.clone(), options).unwrap();
        assert_eq!(once, twice);
    }
}
