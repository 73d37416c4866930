//! The Config Tree: loading and navigating the per-service descriptor.
//!
//! The tree is a plain `serde_yaml::Value`. JSON text is accepted unchanged
//! since a JSON document is also a YAML document, so the loader does not care
//! whether a host orchestrator already rendered and serialized the descriptor
//! or whether it is the raw `service.yml` from disk.

mod merge;


pub use merge::deep_merge;

use crate::error::{Result, SsotError};
use serde_yaml::{Mapping, Value};
use std::path::Path;

/// Origin label used for descriptors passed inline on the command line.
pub const INLINE_ORIGIN: &str = "<ssot>";

/// Parse descriptor text into a Config Tree.
///
/// The root must be a mapping with a `service.name` string, and every mapping
/// key must be a scalar. `origin` names the source in error messages (a path
/// or [`INLINE_ORIGIN`]).
pub fn parse_descriptor(text: &str, origin: &str) -> Result<Value> {
    let tree: Value = serde_yaml::from_str(text).map_err(|e| SsotError::Parse {
        origin: origin.to_string(),
        message: e.to_string(),
    })?;

    if !tree.is_mapping() {
        return Err(SsotError::Parse {
            origin: origin.to_string(),
            message: "descriptor root must be a mapping".to_string(),
        });
    }

    if let Some(path) = find_collection_key(&tree, &mut Vec::new()) {
        return Err(SsotError::Parse {
            origin: origin.to_string(),
            message: format!(
                "'{}' contains a mapping key that is not a scalar; \
                 quote the placeholder (e.g. \"{{{{ image }}}}\") so it stays a string",
                path
            ),
        });
    }

    match lookup(&tree, &["service", "name"]) {
        Some(Value::String(name)) if !name.trim().is_empty() => Ok(tree),
        _ => Err(SsotError::Parse {
            origin: origin.to_string(),
            message: "missing required field 'service.name'".to_string(),
        }),
    }
}

/// Path to the first mapping whose keys include a mapping or a sequence.
///
/// An unquoted `image: {{ image }}` is valid YAML: a flow mapping whose only
/// key is another flow mapping. Nothing downstream can render such a value.
fn find_collection_key(value: &Value, prefix: &mut Vec<String>) -> Option<String> {
    match value {
        Value::Mapping(map) => {
            if map.keys().any(|k| matches!(k, Value::Mapping(_) | Value::Sequence(_))) {
                return Some(if prefix.is_empty() {
                    "<root>".to_string()
                } else {
                    prefix.join(".")
                });
            }
            for (k, v) in map {
                prefix.push(key_text(k));
                let found = find_collection_key(v, prefix);
                prefix.pop();
                if found.is_some() {
                    return found;
                }
            }
            None
        }
        Value::Sequence(items) => items.iter().enumerate().find_map(|(i, item)| {
            prefix.push(i.to_string());
            let found = find_collection_key(item, prefix);
            prefix.pop();
            found
        }),
        Value::Tagged(tagged) => find_collection_key(&tagged.value, prefix),
        _ => None,
    }
}

/// Text of a scalar used as a path segment or label.
pub fn key_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|text| text.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// Read and parse a descriptor file.
pub fn load_descriptor<P: AsRef<Path>>(path: P) -> Result<Value> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| {
        SsotError::io(format!("failed to read descriptor '{}'", path.display()), e)
    })?;
    parse_descriptor(&text, &path.display().to_string())
}

/// Build a mapping key.
pub fn key(name: &str) -> Value {
    Value::String(name.to_string())
}

/// Follow a chain of mapping keys, returning `None` at the first gap.
pub fn lookup<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(root, |node, segment| node.get(*segment))
}

/// Return the mapping stored under `name`, creating it when absent or null.
///
/// A non-mapping value under `name` is replaced; callers only use this on keys
/// whose shape the engine owns.
pub fn ensure_mapping<'a>(parent: &'a mut Mapping, name: &str) -> &'a mut Mapping {
    let entry = parent
        .entry(key(name))
        .or_insert_with(|| Value::Mapping(Mapping::new()));
    if !entry.is_mapping() {
        *entry = Value::Mapping(Mapping::new());
    }
    match entry {
        Value::Mapping(map) => map,
        _ => unreachable!("entry was just normalized to a mapping"),
    }
}

/// Interpret a value as a boolean flag: `true`, or the strings `true`/`yes`/`on`.
pub fn is_truthy_flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "on"),
        _ => false,
    }
}
