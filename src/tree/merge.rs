//! Last-write-wins deep merge of Config Trees.

use serde_yaml::{Mapping, Value};

/// Overlay `layer` onto `target`, updating `target` in place.
///
/// - Mappings merge recursively: keys missing from `layer` keep their value in
///   `target`, keys present in both are merged again.
/// - Everything else in `layer` (scalars, sequences, null) replaces the
///   target value wholesale. Sequences are never concatenated, so a port list
///   in an override replaces the base list instead of duplicating entries.
/// - A mapping merged onto a non-mapping target replaces it.
pub fn deep_merge(target: &mut Value, layer: Value) {
    match layer {
        Value::Mapping(map) => merge_mapping(target, map),
        other => *target = other,
    }
}

fn merge_mapping(target: &mut Value, layer: Mapping) {
    match target {
        Value::Mapping(existing) => {
            for (key, value) in layer {
                match existing.get_mut(&key) {
                    Some(slot) => deep_merge(slot, value),
                    None => {
                        existing.insert(key, value);
                    }
                }
            }
        }
        _ => *target = Value::Mapping(layer),
    }
}
