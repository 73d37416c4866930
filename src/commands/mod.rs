//! Command implementations for ssot-render.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations, plus the helpers they share for turning arguments into
//! an engine configuration, a stage and a descriptor input.

mod check;
mod docs;
mod files;
mod render;
mod resolve;

use crate::cli::{Cli, Command, InputArgs};
use crate::config::EngineConfig;
use crate::error::{Result, SsotError};
use crate::pipeline::DescriptorInput;
use crate::stage::Stage;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Descriptor file looked up in the service root when none is given.
const DEFAULT_DESCRIPTOR: &str = "service.yml";

/// Dispatch a command to its implementation.
pub fn dispatch(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Render(args) => render::cmd_render(args, config),
        Command::Files(args) => files::cmd_files(args, config),
        Command::Docs(args) => docs::cmd_docs(args, config),
        Command::Resolve(args) => resolve::cmd_resolve(args, config),
        Command::Check(args) => check::cmd_check(args, config),
    }
}

/// Load the engine config, falling back to built-in defaults.
fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading engine config");
            EngineConfig::load(path)
        }
        None => Ok(EngineConfig::default()),
    }
}

/// Apply a `--max-passes` override.
fn with_max_passes(mut config: EngineConfig, max_passes: Option<usize>) -> Result<EngineConfig> {
    if let Some(passes) = max_passes {
        if passes == 0 {
            return Err(SsotError::User(
                "--max-passes must be greater than 0".to_string(),
            ));
        }
        config.max_passes = passes;
    }
    Ok(config)
}

impl InputArgs {
    /// The descriptor source, defaulting to `service.yml` under `service_root`.
    fn descriptor_input(&self, service_root: &Path) -> DescriptorInput {
        match (&self.ssot, &self.descriptor) {
            (Some(text), _) => DescriptorInput::Inline(text.clone()),
            (None, Some(path)) => DescriptorInput::File(path.clone()),
            (None, None) => DescriptorInput::File(service_root.join(DEFAULT_DESCRIPTOR)),
        }
    }

    /// The active stage; `--stage` is required whenever a descriptor is resolved.
    fn stage(&self, config: &EngineConfig) -> Result<Stage> {
        let name = self
            .stage
            .as_deref()
            .ok_or_else(|| SsotError::User("--stage is required".to_string()))?;
        Stage::parse(name, &config.known_stages)
    }
}

/// Output root: explicit, or `deployments/` under the service root.
fn output_root(explicit: Option<&Path>, service_root: &Path, config: &EngineConfig) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| service_root.join(&config.deployments_dir))
}
