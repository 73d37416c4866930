//! Network defaults for a deployment type.

use super::shape_error;
use crate::config::NetworkDefaults;
use crate::error::{Result, SsotError};
use crate::tree::{ensure_mapping, key, key_text, lookup};
use serde_yaml::{Mapping, Value};
use tracing::debug;

/// Top-level field receiving the internal network name.
pub const INTERNAL_NETWORK_FIELD: &str = "internal_network";

/// Fill in network definitions and join the service and its dependencies to
/// the internal network.
///
/// Only runs when `deployments.<deployment_type>` exists. Definitions the
/// service already declares under `deployments.<type>.networks` are kept;
/// defaults only fill gaps. Join-lists (`networks` of the service and of each
/// dependency) end up containing the internal network exactly once, with
/// their existing order kept and duplicates dropped.
pub fn apply_network_defaults(
    mut tree: Value,
    deployment_type: Option<&str>,
    defaults: &NetworkDefaults,
) -> Result<Value> {
    let Some(deployment_type) = deployment_type else {
        return Ok(tree);
    };
    match lookup(&tree, &["deployments", deployment_type]) {
        None => return Ok(tree),
        Some(Value::Null | Value::Mapping(_)) => {}
        Some(other) => {
            return Err(shape_error(
                &format!("deployments.{}", deployment_type),
                "a mapping",
                other,
            ));
        }
    }

    let service_name = match lookup(&tree, &["service", "name"]) {
        Some(Value::String(name)) => name.clone(),
        _ => {
            return Err(SsotError::Resolution(
                "network defaults need 'service.name' to be a string".to_string(),
            ));
        }
    };
    let internal = defaults.internal_name(&service_name);
    debug!(network = %internal, deployment_type, "applying network defaults");

    let Some(root) = tree.as_mapping_mut() else {
        return Ok(tree);
    };

    let deployments = ensure_mapping(root, "deployments");
    let section = ensure_mapping(deployments, deployment_type);
    if !matches!(section.get("networks"), None | Some(Value::Null | Value::Mapping(_))) {
        let found = section.get("networks").cloned().unwrap_or(Value::Null);
        return Err(shape_error(
            &format!("deployments.{}.networks", deployment_type),
            "a mapping",
            &found,
        ));
    }
    let definitions = ensure_mapping(section, "networks");
    for (name, definition) in &defaults.shared {
        if !definitions.contains_key(name.as_str()) {
            definitions.insert(key(name), definition.clone());
        }
    }
    if !definitions.contains_key(internal.as_str()) {
        definitions.insert(key(&internal), defaults.internal_definition.clone());
    }

    root.insert(key(INTERNAL_NETWORK_FIELD), key(&internal));

    if let Some(service) = root.get_mut("service") {
        join_network(service, &internal, "service")?;
    }

    match root.get_mut("dependencies") {
        None | Some(Value::Null) => {}
        Some(Value::Mapping(dependencies)) => {
            for (name, dependency) in dependencies.iter_mut() {
                let label = format!("dependencies.{}", key_text(name));
                join_network(dependency, &internal, &label)?;
            }
        }
        Some(Value::Sequence(dependencies)) => {
            for (index, dependency) in dependencies.iter_mut().enumerate() {
                join_network(dependency, &internal, &format!("dependencies.{}", index))?;
            }
        }
        Some(other) => {
            return Err(shape_error(
                "dependencies",
                "a mapping or a sequence",
                other,
            ));
        }
    }

    Ok(tree)
}

/// Add `network` to the join-list of one service definition.
///
/// Join-lists may be a sequence of names or a mapping of name to attachment
/// options; both forms are supported.
fn join_network(definition: &mut Value, network: &str, label: &str) -> Result<()> {
    if definition.is_null() {
        *definition = Value::Mapping(Mapping::new());
    }
    let definition = match definition {
        Value::Mapping(map) => map,
        other => return Err(shape_error(label, "a mapping", other)),
    };

    let joins = definition
        .entry(key("networks"))
        .or_insert_with(|| Value::Sequence(Vec::new()));
    if joins.is_null() {
        *joins = Value::Sequence(Vec::new());
    }

    match joins {
        Value::Sequence(names) => {
            let mut unique: Vec<Value> = Vec::with_capacity(names.len() + 1);
            for name in names.drain(..) {
                if !unique.contains(&name) {
                    unique.push(name);
                }
            }
            if !unique.iter().any(|n| n.as_str() == Some(network)) {
                unique.push(key(network));
            }
            *names = unique;
        }
        Value::Mapping(attachments) => {
            if !attachments.contains_key(network) {
                attachments.insert(key(network), Value::Null);
            }
        }
        other => {
            return Err(shape_error(
                &format!("{}.networks", label),
                "a sequence or a mapping",
                other,
            ));
        }
    }
    Ok(())
}
