//! Implementation of the `render` command.

use super::{output_root, with_max_passes};
use crate::cli::RenderArgs;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::pipeline::build_context;
use crate::render::{render_all, write_snapshot};
use crate::sources::SourceList;
use std::path::PathBuf;
use tracing::info;

/// Execute the `render` command.
///
/// Sources, highest priority first: every `--template-dir`, or by default
/// `<service>/custom_templates/<type>` then `<engine>/templates/<type>`.
/// Output goes to `<output-root>/<type>`.
pub fn cmd_render(args: RenderArgs, config: EngineConfig) -> Result<()> {
    let config = with_max_passes(config, args.input.max_passes)?;
    let stage = args.input.stage(&config)?;
    let input = args.input.descriptor_input(&args.service_root);
    let deployment_type = args.deployment_type.as_str();

    let context = build_context(&input, &stage, Some(deployment_type), &config)?;

    let dirs: Vec<PathBuf> = if args.template_dirs.is_empty() {
        vec![
            args.service_root
                .join(&config.custom_templates_dir)
                .join(deployment_type),
            args.engine_root
                .join(&config.templates_dir)
                .join(deployment_type),
        ]
    } else {
        args.template_dirs
    };
    let sources = SourceList::from_dirs(dirs, &config.ignore_globs)?;

    let output_base =
        output_root(args.output_root.as_deref(), &args.service_root, &config).join(deployment_type);
    let written = render_all(&sources, &output_base, &context.tree, &config.template_marker)?;

    if !args.no_snapshot {
        write_snapshot(&context.tree, &output_base.join(&config.snapshot_file))?;
    }

    info!(
        deployment_type,
        stage = %stage,
        files = written.len(),
        "render complete"
    );
    Ok(())
}
