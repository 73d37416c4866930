//! Implementation of the `docs` command.

use super::{output_root, with_max_passes};
use crate::cli::DocsArgs;
use crate::config::EngineConfig;
use crate::docs::{Embed, render_documentation};
use crate::error::Result;
use crate::pipeline::build_context;
use crate::render::read_snapshot;

/// Deployment type whose artifacts are embedded by default.
const DEFAULT_EMBED_TYPE: &str = "docker_compose";

/// Execute the `docs` command.
///
/// The context comes from `--snapshot` when given, otherwise the descriptor
/// is resolved. A missing documentation template is not an error.
pub fn cmd_docs(args: DocsArgs, config: EngineConfig) -> Result<()> {
    if !args.template_file.is_file() {
        return render_documentation(
            &args.template_file,
            &args.output_file,
            serde_yaml::Value::Null,
            &[],
        )
        .map(|_| ());
    }

    let config = with_max_passes(config, args.input.max_passes)?;
    let output_root = output_root(args.output_root.as_deref(), &args.service_root, &config);

    let context = match &args.snapshot {
        Some(snapshot) => read_snapshot(snapshot)?,
        None => {
            let stage = args.input.stage(&config)?;
            let input = args.input.descriptor_input(&args.service_root);
            build_context(&input, &stage, Some(DEFAULT_EMBED_TYPE), &config)?.tree
        }
    };

    let embeds = if args.embeds.is_empty() {
        Embed::compose_defaults(&output_root.join(DEFAULT_EMBED_TYPE))
    } else {
        args.embeds
    };

    render_documentation(&args.template_file, &args.output_file, context, &embeds)?;
    Ok(())
}
