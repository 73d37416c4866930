//! Rendering a template source list into an output directory.
//!
//! Rendering happens in two phases. [`plan_all`] resolves and renders every
//! identifier in memory and stops at the first failure; [`write_all`] then
//! writes the finished artifacts. A broken template therefore never leaves a
//! half-updated deployment directory behind.

use crate::error::{Result, SsotError};
use crate::fs::atomic_write;
use crate::sources::SourceList;
use crate::template::TemplateEngine;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One output file, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Identifier of the source that produced it.
    pub identifier: String,
    /// Output path relative to the output base, marker stripped.
    pub relative_path: PathBuf,
    pub content: Vec<u8>,
    /// `false` for files copied byte-for-byte.
    pub rendered: bool,
}

/// Render or copy every identifier in `sources` against `context`.
///
/// Identifiers ending in `marker` are rendered and lose the marker; all other
/// files are copied unchanged.
pub fn plan_all(sources: &SourceList, context: &Value, marker: &str) -> Result<Vec<Artifact>> {
    let engine = TemplateEngine::new();
    let mut artifacts = Vec::new();
    let mut claimed: BTreeMap<PathBuf, String> = BTreeMap::new();

    for identifier in sources.identifiers()? {
        let Some(resolved) = sources.resolve(&identifier)? else {
            continue;
        };

        let (relative, is_template) = match identifier.strip_suffix(marker) {
            Some(stripped) if !marker.is_empty() && !stripped.is_empty() => (stripped, true),
            _ => (identifier.as_str(), false),
        };
        let relative_path = PathBuf::from(relative);

        if let Some(previous) = claimed.insert(relative_path.clone(), identifier.clone()) {
            return Err(SsotError::User(format!(
                "'{}' and '{}' both produce '{}'",
                previous, identifier, relative
            )));
        }

        let content = if is_template {
            let origin = format!("{}/{}", resolved.origin, identifier);
            let source = String::from_utf8(resolved.content).map_err(|_| SsotError::Render {
                template: origin.clone(),
                message: "template is not valid UTF-8".to_string(),
            })?;
            let text = engine
                .render(&source, context)
                .map_err(|e| SsotError::template(origin.clone(), e))?;
            debug!(template = %origin, "rendered template");
            text.into_bytes()
        } else {
            resolved.content
        };

        artifacts.push(Artifact {
            identifier,
            relative_path,
            content,
            rendered: is_template,
        });
    }

    Ok(artifacts)
}

/// Write planned artifacts under `output_base`, returning the paths written.
pub fn write_all(artifacts: &[Artifact], output_base: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let path = output_base.join(&artifact.relative_path);
        atomic_write(&path, &artifact.content)?;
        if artifact.rendered {
            info!(path = %path.display(), "rendered");
        } else {
            info!(path = %path.display(), "copied");
        }
        written.push(path);
    }
    Ok(written)
}

/// Render every template in `sources` into `output_base`.
///
/// Fails without writing anything if any template fails to render.
pub fn render_all(
    sources: &SourceList,
    output_base: &Path,
    context: &Value,
    marker: &str,
) -> Result<Vec<PathBuf>> {
    let artifacts = plan_all(sources, context, marker)?;
    if artifacts.is_empty() {
        info!(output = %output_base.display(), "no templates found");
    }
    write_all(&artifacts, output_base)
}

/// Persist the final context as JSON so later steps can reuse it.
pub fn write_snapshot(context: &Value, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(context).map_err(|e| SsotError::Render {
        template: path.display().to_string(),
        message: format!("failed to serialize context: {}", e),
    })?;
    atomic_write(path, format!("{}\n", json).as_bytes())?;
    info!(path = %path.display(), "wrote context snapshot");
    Ok(())
}

/// Load a snapshot written by [`write_snapshot`].
pub fn read_snapshot(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| SsotError::io(format!("failed to read '{}'", path.display()), e))?;
    serde_json::from_str(&text).map_err(|e| SsotError::Parse {
        origin: path.display().to_string(),
        message: e.to_string(),
    })
}
