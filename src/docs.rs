//! Documentation rendering with embedded artifacts.
//!
//! The documentation page is an ordinary template. Before it is rendered, the
//! text of already-generated artifacts (compose manifest, env files) is added
//! to the context under caller-chosen keys so the page can quote them.

use crate::error::{Result, SsotError};
use crate::fs::atomic_write;
use crate::template::render_str;
use crate::tree::key;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// A context field filled with the contents of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub key: String,
    pub path: PathBuf,
}

impl Embed {
    pub fn new(key: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            path: path.into(),
        }
    }

    /// The embeds a docker-compose deployment exposes to its documentation.
    pub fn compose_defaults(compose_dir: &Path) -> Vec<Self> {
        vec![
            Self::new("DOCKER_COMPOSE_CONTENT", compose_dir.join("docker-compose.yml")),
            Self::new("DOT_ENV_CONTENT", compose_dir.join(".env")),
            Self::new("STACK_ENV_CONTENT", compose_dir.join("stack.env")),
        ]
    }
}

impl FromStr for Embed {
    type Err = String;

    /// Parses `KEY=PATH`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((key, path)) if !key.trim().is_empty() && !path.is_empty() => {
                Ok(Self::new(key.trim(), path))
            }
            _ => Err(format!("expected KEY=PATH, got '{}'", s)),
        }
    }
}

/// Text to embed for `path`: its trimmed content, or a placeholder line.
pub fn embedded_text(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(content) => content.trim().to_string(),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            format!("File not found at: {}", path.display())
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read artifact for embedding");
            format!("Error reading file {}: {}", path.display(), e)
        }
    }
}

/// Add every embed to the top level of `context`.
pub fn embed_artifacts(mut context: Value, embeds: &[Embed]) -> Value {
    if !context.is_mapping() {
        context = Value::Mapping(Mapping::new());
    }
    if let Some(root) = context.as_mapping_mut() {
        for embed in embeds {
            root.insert(key(&embed.key), Value::String(embedded_text(&embed.path)));
        }
    }
    context
}

/// Render the documentation template at `template_path` into `output_path`.
///
/// Returns `None` when the template does not exist; documentation is optional.
pub fn render_documentation(
    template_path: &Path,
    output_path: &Path,
    context: Value,
    embeds: &[Embed],
) -> Result<Option<PathBuf>> {
    if !template_path.is_file() {
        info!(
            template = %template_path.display(),
            "documentation template not found, skipping"
        );
        return Ok(None);
    }

    let origin = template_path.display().to_string();
    let source = fs::read_to_string(template_path)
        .map_err(|e| SsotError::io(format!("failed to read '{}'", origin), e))?;
    let context = embed_artifacts(context, embeds);

    let rendered =
        render_str(&source, &context).map_err(|e| SsotError::template(origin, e))?;

    atomic_write(output_path, rendered.as_bytes())?;
    info!(path = %output_path.display(), "rendered documentation");
    Ok(Some(output_path.to_path_buf()))
}
