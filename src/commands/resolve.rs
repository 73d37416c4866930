//! Implementation of the `resolve` command.

use super::with_max_passes;
use crate::cli::{OutputFormat, ResolveArgs};
use crate::config::EngineConfig;
use crate::error::{Result, SsotError};
use crate::pipeline::build_context;
use serde_yaml::Value;

/// Execute the `resolve` command: print the final context to stdout.
pub fn cmd_resolve(args: ResolveArgs, config: EngineConfig) -> Result<()> {
    let config = with_max_passes(config, args.input.max_passes)?;
    let stage = args.input.stage(&config)?;
    let input = args.input.descriptor_input(&args.service_root);

    let context = build_context(&input, &stage, args.deployment_type.as_deref(), &config)?;
    print!("{}", format_context(&context.tree, args.format)?);
    Ok(())
}

fn format_context(tree: &Value, format: OutputFormat) -> Result<String> {
    let serialize_error = |message: String| SsotError::Render {
        template: "resolved context".to_string(),
        message,
    };
    match format {
        OutputFormat::Yaml => serde_yaml::to_string(tree).map_err(|e| serialize_error(e.to_string())),
        OutputFormat::Json => serde_json::to_string_pretty(tree)
            .map(|json| format!("{}\n", json))
            .map_err(|e| serialize_error(e.to_string())),
    }
}
