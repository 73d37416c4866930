//! Host-network flag.

use crate::tree::{is_truthy_flag, key, lookup};
use serde_yaml::Value;

/// Top-level flag templates read to suppress port publishing.
pub const HOST_NETWORK_FIELD: &str = "host_network";

/// Set `host_network` to whether the service runs on the host network.
///
/// `deployments.<type>.network_mode: host` is the primary location. The older
/// `deployments.<type>.host_network: true` and `service.network_mode: host`
/// forms are still honoured.
pub fn apply_host_network_flag(
    mut tree: Value,
    deployment_type: Option<&str>,
) -> crate::error::Result<Value> {
    let declared_in_deployment = deployment_type
        .and_then(|t| lookup(&tree, &["deployments", t, "network_mode"]))
        .is_some_and(is_host_mode);
    let legacy_flag = deployment_type.is_some_and(|t| {
        is_truthy_flag(lookup(&tree, &["deployments", t, HOST_NETWORK_FIELD]))
    });
    let declared_in_service = lookup(&tree, &["service", "network_mode"]).is_some_and(is_host_mode);

    if let Some(root) = tree.as_mapping_mut() {
        root.insert(
            key(HOST_NETWORK_FIELD),
            Value::Bool(declared_in_deployment || legacy_flag || declared_in_service),
        );
    }
    Ok(tree)
}

fn is_host_mode(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|mode| mode.trim().eq_ignore_ascii_case("host"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    fn flag(tree: &Value) -> Option<bool> {
        tree.get(HOST_NETWORK_FIELD).and_then(Value::as_bool)
    }

    #[test]
    fn test_deployment_network_mode() {
        let tree = apply_host_network_flag(
            yaml("service: {name: x}\ndeployments: {docker_compose: {network_mode: host}}"),
            Some("docker_compose"),
        )
        .unwrap();
        assert_eq!(flag(&tree), Some(true));
    }

    #[test]
    fn test_legacy_service_network_mode() {
        let tree = apply_host_network_flag(
            yaml("service: {name: x, network_mode: HOST}"),
            Some("docker_compose"),
        )
        .unwrap();
        assert_eq!(flag(&tree), Some(true));
    }

    #[test]
    fn test_legacy_deployment_flag() {
        let tree = apply_host_network_flag(
            yaml("service: {name: x}\ndeployments: {docker_compose: {host_network: true}}"),
            Some("docker_compose"),
        )
        .unwrap();
        assert_eq!(flag(&tree), Some(true));
    }

    #[test]
    fn test_other_deployment_type_ignored() {
        let tree = apply_host_network_flag(
            yaml("service: {name: x}\ndeployments: {swarm: {network_mode: host}}"),
            Some("docker_compose"),
        )
        .unwrap();
        assert_eq!(flag(&tree), Some(false));
    }

    #[test]
    fn test_absent_sections_mean_false() {
        let tree = apply_host_network_flag(yaml("service: {name: x}"), None).unwrap();
        assert_eq!(flag(&tree), Some(false));

        let tree = apply_host_network_flag(
            yaml("service: {name: x, network_mode: bridge}"),
            Some("docker_compose"),
        )
        .unwrap();
        assert_eq!(flag(&tree), Some(false));
    }
}
