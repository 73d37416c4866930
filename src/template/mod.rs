//! Jinja template rendering against a Config Tree.
//!
//! Rendering is backed by [`minijinja`], configured the way the shared
//! deployment templates are written: a block tag on its own line leaves no
//! trace in the output (`trim_blocks` plus `lstrip_blocks`), output is never
//! HTML-escaped and a trailing newline survives.
//!
//! # Undefined values
//!
//! A missing key renders as an empty string and is falsy. Reading a field
//! *through* an undefined value (`missing.child`) is an error, since that
//! almost always means the descriptor lacks a whole section the template
//! relies on. Null renders as an empty string.

#[cfg(test)]
mod tests;

use minijinja::{AutoEscape, Environment, ErrorKind, Output, State, UndefinedBehavior};
use regex::Regex;
use serde_yaml::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

/// A template that is nothing but one `{{ expr }}`.
static WHOLE_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\{\{-?(.*?)-?\}\}$").expect("placeholder regex must compile")
});

/// Error type for template parsing and rendering failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// The template text is malformed.
    Syntax {
        message: String,
        line: Option<usize>,
    },
    /// A field was looked up through an undefined value.
    UndefinedParent {
        message: String,
        line: Option<usize>,
    },
    /// Anything else that failed while evaluating (bad operand, unknown filter).
    Evaluation {
        message: String,
        line: Option<usize>,
    },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (kind, message, line) = match self {
            TemplateError::Syntax { message, line } => ("syntax error", message, line),
            TemplateError::UndefinedParent { message, line } => {
                ("undefined parent", message, line)
            }
            TemplateError::Evaluation { message, line } => ("evaluation error", message, line),
        };
        match line {
            Some(line) => write!(f, "{} on line {}: {}", kind, line, message),
            None => write!(f, "{}: {}", kind, message),
        }
    }
}

impl std::error::Error for TemplateError {}

impl From<minijinja::Error> for TemplateError {
    fn from(err: minijinja::Error) -> Self {
        let line = err.line();
        let message = match err.detail() {
            Some(detail) => detail.to_string(),
            None => err.kind().to_string(),
        };
        match err.kind() {
            ErrorKind::SyntaxError => TemplateError::Syntax { message, line },
            ErrorKind::UndefinedError => TemplateError::UndefinedParent { message, line },
            _ => TemplateError::Evaluation { message, line },
        }
    }
}

/// A configured Jinja environment. Build one and reuse it for a whole run.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        env.set_undefined_behavior(UndefinedBehavior::Lenient);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_formatter(format_value);
        Self { env }
    }

    /// Render `source` with `context` as the root of every lookup.
    pub fn render(&self, source: &str, context: &Value) -> Result<String, TemplateError> {
        Ok(self.env.render_str(source, context)?)
    }

    /// Evaluate a template that consists of exactly one `{{ expr }}`.
    ///
    /// Returns `None` for any other template. The result keeps the type of
    /// the referenced value (numbers stay numbers, mappings stay mappings);
    /// an undefined result becomes an empty string, matching [`render`].
    ///
    /// [`render`]: TemplateEngine::render
    pub fn evaluate_whole(
        &self,
        source: &str,
        context: &Value,
    ) -> Option<Result<Value, TemplateError>> {
        let expression = whole_placeholder(source)?;
        Some(self.evaluate(expression, context))
    }

    fn evaluate(&self, expression: &str, context: &Value) -> Result<Value, TemplateError> {
        let value = self.env.compile_expression(expression)?.eval(context)?;
        if value.is_undefined() {
            return Ok(Value::String(String::new()));
        }
        serde_yaml::to_value(&value).map_err(|e| TemplateError::Evaluation {
            message: e.to_string(),
            line: None,
        })
    }

    /// Dotted paths of the context values `source` reads (`service.name`).
    ///
    /// Loop variables and names the template sets itself are excluded.
    pub fn references(&self, source: &str) -> Result<BTreeSet<String>, TemplateError> {
        let template = self.env.template_from_str(source)?;
        Ok(template.undeclared_variables(true).into_iter().collect())
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn format_value(
    out: &mut Output<'_>,
    state: &State<'_, '_>,
    value: &minijinja::Value,
) -> Result<(), minijinja::Error> {
    if value.is_none() {
        return Ok(());
    }
    minijinja::escape_formatter(out, state, value)
}

fn whole_placeholder(source: &str) -> Option<&str> {
    let inner = WHOLE_PLACEHOLDER.captures(source)?.get(1)?.as_str();
    let nested = ["{{", "}}", "{%", "%}", "{#"];
    if nested.iter().any(|tag| inner.contains(tag)) {
        return None;
    }
    Some(inner)
}

/// Render `source` in one step with a fresh [`TemplateEngine`].
///
/// # Examples
///
/// ```
/// use ssot_render::template::render_str;
///
/// let context: serde_yaml::Value = serde_yaml::from_str("service: {name: svc}").unwrap();
/// let result = render_str("{{ service.name }}-{{ service.name }}", &context).unwrap();
/// assert_eq!(result, "svc-svc");
/// ```
pub fn render_str(source: &str, context: &Value) -> Result<String, TemplateError> {
    TemplateEngine::new().render(source, context)
}

/// Whether `text` contains anything the engine would interpret.
pub fn contains_syntax(text: &str) -> bool {
    text.contains("{{") || text.contains("{%") || text.contains("{#")
}
