//! Fixed-point resolution of self-referencing descriptor fields.
//!
//! Any string value in the tree may reference other fields:
//!
//! ```yaml
//! service:
//!   name: whoami
//!   hostname: "{{ service.name }}.{{ domain }}"
//! domain: "{{ stage }}.example.org"
//! ```
//!
//! One pass only resolves one level of indirection, so the resolver repeats
//! passes until nothing changes. Each pass renders every string still holding
//! template syntax against a snapshot of the tree from the previous pass; the
//! rest of the tree is left alone.
//!
//! Before every pass the pending fields form a reference graph: an edge runs
//! from a field to each other pending field that one of its expressions reads,
//! either directly or through an enclosing mapping or sequence. Any cycle in
//! that graph, a field reading itself included, can never settle and is
//! rejected before it is rendered.
//!
//! Termination:
//! - no template syntax left: converged
//! - the reference graph has a cycle: error
//! - a pass changes nothing but syntax remains: a field refers to itself
//!   (error)
//! - a pass reproduces an earlier tree: the references oscillate (error)
//! - the pass ceiling is reached: [`ConvergenceWarning`], the last tree is kept

use crate::error::{Result, SsotError};
use crate::template::{TemplateEngine, TemplateError, contains_syntax};
use crate::tree::key_text;
use serde_yaml::Value;
use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use tracing::{debug, warn};

/// One step on the way from the root to a nested value.
#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Key(Value),
    Index(usize),
}

type FieldPath = Vec<Segment>;

fn segment_labels(path: &[Segment]) -> Vec<String> {
    path.iter()
        .map(|segment| match segment {
            Segment::Key(k) => key_text(k),
            Segment::Index(i) => i.to_string(),
        })
        .collect()
}

fn path_string(path: &[Segment]) -> String {
    segment_labels(path).join(".")
}

/// The pass ceiling was reached while fields still held template syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvergenceWarning {
    /// Passes performed.
    pub passes: usize,
    /// Dotted paths of the fields that were still unresolved.
    pub unresolved: Vec<String>,
}

impl fmt::Display for ConvergenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tree did not stabilize after {} passes; unresolved fields: {}",
            self.passes,
            self.unresolved.join(", ")
        )
    }
}

/// Result of [`render_recursively`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// The resolved tree (best effort when `warning` is set).
    pub tree: Value,
    /// Passes that changed at least one field.
    pub passes: usize,
    /// Set when the pass ceiling stopped resolution early.
    pub warning: Option<ConvergenceWarning>,
}

/// Resolve template references inside `tree` against the tree itself.
///
/// A string consisting of a single `{{ expr }}` is replaced by the referenced
/// value with its type intact; any other string is rendered to text.
pub fn render_recursively(tree: Value, max_passes: usize) -> Result<Resolved> {
    let engine = TemplateEngine::new();
    let mut tree = tree;
    let mut pending = Vec::new();
    collect_pending(&tree, &mut Vec::new(), &mut pending);

    let mut seen = HashSet::new();
    seen.insert(fingerprint(&tree));

    let mut passes = 0;
    while !pending.is_empty() {
        reject_cycles(&engine, &tree, &pending)?;

        if passes == max_passes {
            let warning = ConvergenceWarning {
                passes,
                unresolved: pending.iter().map(|p| path_string(p)).collect(),
            };
            warn!("{}", warning);
            return Ok(Resolved {
                tree,
                passes,
                warning: Some(warning),
            });
        }

        let snapshot = tree.clone();
        let mut changed = false;
        let mut next_pending = Vec::new();

        for path in &pending {
            let Some(Value::String(source)) = value_at(&snapshot, path) else {
                continue;
            };
            let rendered = render_field(&engine, source, &snapshot, path)?;

            if let Some(slot) = value_at_mut(&mut tree, path)
                && *slot != rendered
            {
                *slot = rendered.clone();
                changed = true;
            }
            let mut prefix = path.clone();
            collect_pending(&rendered, &mut prefix, &mut next_pending);
        }

        if !changed {
            let fields: Vec<String> = next_pending.iter().map(|p| path_string(p)).collect();
            return Err(SsotError::Resolution(format!(
                "circular reference: {} resolve to themselves",
                fields.join(", ")
            )));
        }

        passes += 1;
        debug!(pass = passes, remaining = next_pending.len(), "resolution pass complete");

        if !seen.insert(fingerprint(&tree)) {
            let fields: Vec<String> = next_pending.iter().map(|p| path_string(p)).collect();
            return Err(SsotError::Resolution(format!(
                "circular reference: {} oscillate without settling",
                fields.join(", ")
            )));
        }
        pending = next_pending;
    }

    Ok(Resolved {
        tree,
        passes,
        warning: None,
    })
}

fn field_error(path: &[Segment], err: TemplateError) -> SsotError {
    SsotError::template(format!("field '{}'", path_string(path)), err)
}

fn render_field(
    engine: &TemplateEngine,
    source: &str,
    context: &Value,
    path: &[Segment],
) -> Result<Value> {
    match engine.evaluate_whole(source, context) {
        Some(result) => result.map_err(|e| field_error(path, e)),
        None => engine
            .render(source, context)
            .map(Value::String)
            .map_err(|e| field_error(path, e)),
    }
}

/// Fail when the pending fields read each other in a loop.
fn reject_cycles(engine: &TemplateEngine, tree: &Value, pending: &[FieldPath]) -> Result<()> {
    let labels: Vec<Vec<String>> = pending.iter().map(|p| segment_labels(p)).collect();

    let mut edges = Vec::with_capacity(pending.len());
    for path in pending {
        let references = match value_at(tree, path) {
            Some(Value::String(source)) => engine
                .references(source)
                .map_err(|e| field_error(path, e))?,
            _ => Default::default(),
        };
        let targets: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, target)| references.iter().any(|r| overlaps(r, target)))
            .map(|(i, _)| i)
            .collect();
        edges.push(targets);
    }

    match find_cycle(&edges) {
        Some(cycle) => {
            let fields: Vec<String> = cycle.iter().map(|&i| path_string(&pending[i])).collect();
            Err(SsotError::Resolution(format!(
                "circular reference: {}",
                fields.join(" -> ")
            )))
        }
        None => Ok(()),
    }
}

/// Whether reading `reference` (`service.name`) reads `target`, or a value
/// that contains it, or a value inside it.
fn overlaps(reference: &str, target: &[String]) -> bool {
    reference
        .split('.')
        .zip(target)
        .all(|(part, segment)| part == segment.as_str())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// First cycle found by depth-first search, as node indices with the start
/// repeated at the end.
fn find_cycle(edges: &[Vec<usize>]) -> Option<Vec<usize>> {
    fn visit(
        node: usize,
        edges: &[Vec<usize>],
        marks: &mut [Mark],
        stack: &mut Vec<usize>,
    ) -> Option<Vec<usize>> {
        marks[node] = Mark::OnStack;
        stack.push(node);
        for &next in &edges[node] {
            match marks[next] {
                Mark::OnStack => {
                    let start = stack.iter().position(|&n| n == next)?;
                    let mut cycle = stack[start..].to_vec();
                    cycle.push(next);
                    return Some(cycle);
                }
                Mark::Unvisited => {
                    if let Some(cycle) = visit(next, edges, marks, stack) {
                        return Some(cycle);
                    }
                }
                Mark::Done => {}
            }
        }
        stack.pop();
        marks[node] = Mark::Done;
        None
    }

    let mut marks = vec![Mark::Unvisited; edges.len()];
    let mut stack = Vec::new();
    (0..edges.len()).find_map(|node| {
        if marks[node] == Mark::Unvisited {
            visit(node, edges, &mut marks, &mut stack)
        } else {
            None
        }
    })
}

fn collect_pending(value: &Value, prefix: &mut FieldPath, out: &mut Vec<FieldPath>) {
    match value {
        Value::String(s) if contains_syntax(s) => out.push(prefix.clone()),
        Value::Sequence(items) => {
            for (i, item) in items.iter().enumerate() {
                prefix.push(Segment::Index(i));
                collect_pending(item, prefix, out);
                prefix.pop();
            }
        }
        Value::Mapping(map) => {
            for (k, v) in map {
                prefix.push(Segment::Key(k.clone()));
                collect_pending(v, prefix, out);
                prefix.pop();
            }
        }
        Value::Tagged(tagged) => collect_pending(&tagged.value, prefix, out),
        _ => {}
    }
}

fn value_at<'a>(root: &'a Value, path: &[Segment]) -> Option<&'a Value> {
    path.iter().try_fold(root, |node, segment| {
        let node = match node {
            Value::Tagged(tagged) => &tagged.value,
            other => other,
        };
        match (node, segment) {
            (Value::Mapping(map), Segment::Key(k)) => map.get(k),
            (Value::Sequence(items), Segment::Index(i)) => items.get(*i),
            _ => None,
        }
    })
}

fn value_at_mut<'a>(root: &'a mut Value, path: &[Segment]) -> Option<&'a mut Value> {
    path.iter().try_fold(root, |node, segment| {
        let node = match node {
            Value::Tagged(tagged) => &mut tagged.value,
            other => other,
        };
        match (node, segment) {
            (Value::Mapping(map), Segment::Key(k)) => map.get_mut(k),
            (Value::Sequence(items), Segment::Index(i)) => items.get_mut(*i),
            _ => None,
        }
    })
}

fn fingerprint(tree: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    tree.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::lookup;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    fn resolve(text: &str) -> Result<Resolved> {
        render_recursively(yaml(text), 10)
    }

    #[test]
    fn test_tree_without_placeholders_is_untouched() {
        let resolved = resolve("service: {name: x, ports: [{port: 80}]}").unwrap();
        assert_eq!(resolved.tree, yaml("service: {name: x, ports: [{port: 80}]}"));
        assert_eq!(resolved.passes, 0);
        assert!(resolved.warning.is_none());
    }

    #[test]
    fn test_single_level_reference() {
        let resolved = resolve("service: {name: svc, label: '{{ service.name }}-{{ service.name }}'}")
            .unwrap();
        assert_eq!(
            lookup(&resolved.tree, &["service", "label"]).and_then(Value::as_str),
            Some("svc-svc")
        );
        assert_eq!(resolved.passes, 1);
    }

    #[test]
    fn test_transitive_references() {
        let resolved = resolve(
            r#"
a: "{{ b }}!"
b: "{{ c }}"
c: "{{ d }}"
d: end
"#,
        )
        .unwrap();
        assert_eq!(resolved.tree.get("a").and_then(Value::as_str), Some("end!"));
        assert_eq!(resolved.tree.get("b").and_then(Value::as_str), Some("end"));
        assert_eq!(resolved.passes, 3);
    }

    #[test]
    fn test_whole_placeholder_keeps_type() {
        let resolved = resolve(
            r#"
defaults: {port: 8080, labels: {tier: web}}
routing: {port: "{{ defaults.port }}"}
service: {name: x, labels: "{{ defaults.labels }}"}
"#,
        )
        .unwrap();
        assert_eq!(
            lookup(&resolved.tree, &["routing", "port"]),
            Some(&Value::Number(8080.into()))
        );
        assert_eq!(
            lookup(&resolved.tree, &["service", "labels"]),
            Some(&yaml("{tier: web}"))
        );
    }

    #[test]
    fn test_copied_mapping_placeholders_are_resolved() {
        let resolved = resolve(
            r#"
name: svc
template: {host: "{{ name }}.local"}
copy: "{{ template }}"
"#,
        )
        .unwrap();
        assert_eq!(
            lookup(&resolved.tree, &["copy", "host"]).and_then(Value::as_str),
            Some("svc.local")
        );
    }

    #[test]
    fn test_placeholders_in_sequences() {
        let resolved = resolve("name: svc\nhosts: ['{{ name }}.a', '{{ name }}.b']").unwrap();
        assert_eq!(resolved.tree.get("hosts"), Some(&yaml("[svc.a, svc.b]")));
    }

    #[test]
    fn test_idempotent() {
        let once = resolve(
            r#"
service: {name: api, host: "{{ service.name }}.{{ domain }}"}
domain: "{{ stage }}.example.org"
stage: test
"#,
        )
        .unwrap()
        .tree;
        let twice = render_recursively(once.clone(), 10).unwrap();
        assert_eq!(twice.tree, once);
        assert_eq!(twice.passes, 0);
        assert_eq!(
            lookup(&once, &["service", "host"]).and_then(Value::as_str),
            Some("api.test.example.org")
        );
    }

    #[test]
    fn test_missing_top_level_renders_empty() {
        let resolved = resolve("a: 'x{{ nope }}y'").unwrap();
        assert_eq!(resolved.tree.get("a").and_then(Value::as_str), Some("xy"));
    }

    #[test]
    fn test_absent_intermediate_is_resolution_error() {
        let err = resolve("a: '{{ routing.port }}'").unwrap_err();
        assert!(matches!(err, SsotError::Resolution(_)));
        assert!(err.to_string().contains("field 'a'"));
    }

    #[test]
    fn test_syntax_error_is_render_error() {
        let err = resolve("a: '{{ b '").unwrap_err();
        assert!(matches!(err, SsotError::Render { .. }));
    }

    #[test]
    fn test_self_reference_rejected() {
        let err = resolve("a: '{{ a }}'").unwrap_err();
        assert!(matches!(err, SsotError::Resolution(_)));
        assert!(err.to_string().contains("circular reference: a -> a"));
    }

    #[test]
    fn test_two_cycle_rejected() {
        let err = resolve("a: '{{ b }}'\nb: '{{ a }}'").unwrap_err();
        assert!(matches!(err, SsotError::Resolution(_)));
        assert!(err.to_string().contains("circular reference"));
    }

    #[test]
    fn test_self_growth_rejected_before_rendering() {
        let err = render_recursively(yaml("service: {name: x}\npath: '{{ path }}/x'"), 40)
            .unwrap_err();
        assert!(matches!(err, SsotError::Resolution(_)));
        assert!(err.to_string().contains("path -> path"), "{}", err);
    }

    #[test]
    fn test_mutual_growth_rejected() {
        let err = render_recursively(yaml("a: '{{ b }}x'\nb: '{{ a }}'"), 40).unwrap_err();
        assert!(matches!(err, SsotError::Resolution(_)));
        let message = err.to_string();
        assert!(message.contains("a -> b -> a") || message.contains("b -> a -> b"), "{}", message);
    }

    #[test]
    fn test_reading_enclosing_mapping_is_a_cycle() {
        let err = resolve("env: {A: x, ALL: '{{ env | tojson }}'}").unwrap_err();
        assert!(err.to_string().contains("env.ALL -> env.ALL"), "{}", err);
    }

    #[test]
    fn test_cycle_through_copied_mapping_rejected() {
        let err = resolve("a: '{{ b }}'\nb: {x: '{{ a }}'}").unwrap_err();
        assert!(matches!(err, SsotError::Resolution(_)));
        assert!(err.to_string().contains("circular reference"));
    }

    #[test]
    fn test_sibling_fields_are_not_a_cycle() {
        let resolved = resolve("service: {name: x, host: '{{ service.name }}.local', alias: '{{ service.host }}'}")
            .unwrap();
        assert_eq!(
            lookup(&resolved.tree, &["service", "alias"]).and_then(Value::as_str),
            Some("x.local")
        );
    }

    #[test]
    fn test_overlaps() {
        let target = vec!["service".to_string(), "name".to_string()];
        assert!(overlaps("service.name", &target));
        assert!(overlaps("service", &target));
        assert!(overlaps("service.name.first", &target));
        assert!(!overlaps("service.image", &target));
        assert!(!overlaps("services", &target));
    }

    #[test]
    fn test_find_cycle() {
        assert_eq!(find_cycle(&[vec![1], vec![2], vec![]]), None);
        assert_eq!(find_cycle(&[vec![0]]), Some(vec![0, 0]));
        assert_eq!(find_cycle(&[vec![1], vec![2], vec![1]]), Some(vec![1, 2, 1]));
    }

    #[test]
    fn test_ceiling_is_soft() {
        let resolved = render_recursively(
            yaml("a: '{{ b }}'\nb: '{{ c }}'\nc: '{{ d }}'\nd: done"),
            2,
        )
        .unwrap();
        let warning = resolved.warning.expect("ceiling should produce a warning");
        assert_eq!(warning.passes, 2);
        assert_eq!(warning.unresolved, vec!["a".to_string()]);
        assert_eq!(resolved.tree.get("b").and_then(Value::as_str), Some("done"));
        assert_eq!(resolved.tree.get("a").and_then(Value::as_str), Some("{{ d }}"));
    }

    #[test]
    fn test_path_string_formats_indices() {
        let path = vec![
            Segment::Key(Value::String("service".to_string())),
            Segment::Key(Value::String("ports".to_string())),
            Segment::Index(0),
        ];
        assert_eq!(path_string(&path), "service.ports.0");
    }
}
