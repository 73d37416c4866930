//! From descriptor to final rendering context.
//!
//! load → stage overrides → fixed-point resolution → derived defaults

use crate::config::EngineConfig;
use crate::enrich::{EnrichOptions, enrich};
use crate::error::Result;
use crate::resolve::{ConvergenceWarning, render_recursively};
use crate::stage::{self, Stage, StageKeys};
use crate::tree::{INLINE_ORIGIN, load_descriptor, parse_descriptor};
use serde_yaml::Value;
use std::path::PathBuf;
use tracing::{debug, info};

/// Where the descriptor comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorInput {
    /// A `service.yml` (or JSON) file.
    File(PathBuf),
    /// Already-serialized descriptor text, typically rendered once upstream.
    Inline(String),
}

impl DescriptorInput {
    pub fn load(&self) -> Result<Value> {
        match self {
            DescriptorInput::File(path) => load_descriptor(path),
            DescriptorInput::Inline(text) => parse_descriptor(text, INLINE_ORIGIN),
        }
    }

    /// Label for log lines.
    pub fn origin(&self) -> String {
        match self {
            DescriptorInput::File(path) => path.display().to_string(),
            DescriptorInput::Inline(_) => INLINE_ORIGIN.to_string(),
        }
    }
}

/// The final context plus anything worth reporting about how it was built.
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    pub tree: Value,
    pub passes: usize,
    pub warning: Option<ConvergenceWarning>,
}

/// Build the rendering context for `stage`.
///
/// `deployment_type` selects the `deployments.<type>` section that network
/// and host-network defaults apply to.
pub fn build_context(
    input: &DescriptorInput,
    stage: &Stage,
    deployment_type: Option<&str>,
    config: &EngineConfig,
) -> Result<Context> {
    let tree = input.load()?;
    debug!(origin = %input.origin(), "descriptor loaded");
    resolve_tree(tree, stage, deployment_type, config)
}

/// Run every stage after loading on an already-parsed tree.
pub fn resolve_tree(
    tree: Value,
    stage: &Stage,
    deployment_type: Option<&str>,
    config: &EngineConfig,
) -> Result<Context> {
    let tree = stage::resolve(tree, stage, StageKeys::from_config(config))?;
    let resolved = render_recursively(tree, config.max_passes)?;
    let tree = enrich(
        resolved.tree,
        EnrichOptions {
            deployment_type,
            networks: &config.networks,
        },
    )?;

    info!(stage = %stage, passes = resolved.passes, "context resolved");
    Ok(Context {
        tree,
        passes: resolved.passes,
        warning: resolved.warning,
    })
}
