//! Routing port derivation.

use super::shape_error;
use crate::error::{Result, SsotError};
use crate::tree::{ensure_mapping, is_truthy_flag, key, lookup};
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::sync::LazyLock;
use tracing::debug;

static PORT_IN_COMMAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":(\d+)").expect("Invalid port regex"));

/// Decide which port `service.ports` publishes when routing is enabled.
///
/// Priority:
/// 1. `routing.port` - always wins and replaces any existing port list
/// 2. a non-empty `service.ports` - left untouched
/// 3. the first `:<number>` in `service.healthcheck.test`
///
/// When none of these yields a port the tree stays port-less.
pub fn derive_routing_port(mut tree: Value) -> Result<Value> {
    if !is_truthy_flag(lookup(&tree, &["routing", "enabled"])) {
        return Ok(tree);
    }

    let port = match explicit_port(&tree)? {
        Some(port) => {
            debug!(port, "using explicit routing port");
            port
        }
        None => {
            if has_ports(&tree)? {
                return Ok(tree);
            }
            let command = healthcheck_command(&tree);
            match command.as_deref().and_then(port_from_healthcheck) {
                Some(port) => {
                    debug!(port, "derived routing port from healthcheck");
                    port
                }
                None => {
                    debug!("routing enabled but no port could be determined");
                    return Ok(tree);
                }
            }
        }
    };

    let Some(root) = tree.as_mapping_mut() else {
        return Ok(tree);
    };
    let service = ensure_mapping(root, "service");
    let mut entry = Mapping::new();
    entry.insert(key("port"), Value::Number(port.into()));
    service.insert(key("ports"), Value::Sequence(vec![Value::Mapping(entry)]));
    Ok(tree)
}

/// Extract the first plausible port (`:<1-65535>`) from a command string.
///
/// ```
/// use ssot_render::enrich::port_from_healthcheck;
///
/// assert_eq!(port_from_healthcheck("curl -f http://localhost:9090/health"), Some(9090));
/// assert_eq!(port_from_healthcheck("pg_isready"), None);
/// ```
pub fn port_from_healthcheck(command: &str) -> Option<u16> {
    PORT_IN_COMMAND
        .captures_iter(command)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u16>().ok())
        .find(|port| *port != 0)
}

fn explicit_port(tree: &Value) -> Result<Option<u16>> {
    let invalid = |shown: String| {
        SsotError::Resolution(format!(
            "'routing.port' must be a port number between 1 and 65535, found '{}'",
            shown
        ))
    };

    match lookup(tree, &["routing", "port"]) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => match s.trim().parse::<u16>() {
            Ok(port) if port != 0 => Ok(Some(port)),
            _ => Err(invalid(s.clone())),
        },
        Some(Value::Number(n)) => match n.as_u64().and_then(|p| u16::try_from(p).ok()) {
            Some(port) if port != 0 => Ok(Some(port)),
            _ => Err(invalid(n.to_string())),
        },
        Some(other) => Err(shape_error("routing.port", "a port number", other)),
    }
}

fn has_ports(tree: &Value) -> Result<bool> {
    match lookup(tree, &["service", "ports"]) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Sequence(ports)) => Ok(!ports.is_empty()),
        Some(other) => Err(shape_error("service.ports", "a sequence", other)),
    }
}

/// The healthcheck command as one string; list forms are joined with spaces.
fn healthcheck_command(tree: &Value) -> Option<String> {
    match lookup(tree, &["service", "healthcheck", "test"])? {
        Value::String(s) => Some(s.clone()),
        Value::Sequence(parts) => Some(
            parts
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(" "),
        ),
        _ => None,
    }
}
