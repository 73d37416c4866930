//! Implementation of the `files` command.

use super::{output_root, with_max_passes};
use crate::cli::FilesArgs;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::pipeline::build_context;
use crate::render::render_all;
use crate::sources::SourceList;
use tracing::info;

/// Execute the `files` command.
///
/// Renders `<service>/custom_templates/files` (then any `--template-dir`)
/// into `<output-root>/files`. A service without such a directory simply
/// produces nothing.
pub fn cmd_files(args: FilesArgs, config: EngineConfig) -> Result<()> {
    let config = with_max_passes(config, args.input.max_passes)?;
    let stage = args.input.stage(&config)?;
    let input = args.input.descriptor_input(&args.service_root);

    let context = build_context(&input, &stage, None, &config)?;

    let mut dirs = vec![
        args.service_root
            .join(&config.custom_templates_dir)
            .join(&config.files_dir),
    ];
    dirs.extend(args.template_dirs);
    let sources = SourceList::from_dirs(dirs, &config.ignore_globs)?;

    let output_base =
        output_root(args.output_root.as_deref(), &args.service_root, &config).join(&config.files_dir);
    let written = render_all(&sources, &output_base, &context.tree, &config.template_marker)?;

    info!(stage = %stage, files = written.len(), "files complete");
    Ok(())
}
