//! CLI argument parsing for ssot-render.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use crate::docs::Embed;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// ssot-render: render deployment manifests from a single service descriptor.
///
/// The descriptor (`service.yml`) is resolved for one stage, its fields are
/// allowed to reference each other, derived defaults are filled in, and the
/// result is rendered through a priority-ordered list of template directories.
#[derive(Parser, Debug)]
#[command(name = "ssot-render")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Engine configuration file (YAML). Built-in defaults apply when omitted.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. `info`, `debug` or `ssot_render=trace`.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render one deployment type's templates.
    ///
    /// Service-local `custom_templates/<type>` files override the engine's
    /// `templates/<type>` files with the same relative path.
    Render(RenderArgs),

    /// Render or copy the service's `custom_templates/files` tree.
    Files(FilesArgs),

    /// Render the documentation page with generated artifacts embedded.
    Docs(DocsArgs),

    /// Print the fully resolved context.
    Resolve(ResolveArgs),

    /// Render every service under a directory for each stage and validate
    /// the output without writing anything.
    Check(CheckArgs),
}

/// Where the descriptor comes from and how to resolve it.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Descriptor file. Defaults to `service.yml` in the service root.
    #[arg(long, value_name = "FILE", conflicts_with = "ssot")]
    pub descriptor: Option<PathBuf>,

    /// Descriptor text (YAML or JSON), e.g. already rendered by a pipeline.
    #[arg(long, value_name = "TEXT")]
    pub ssot: Option<String>,

    /// Active stage (e.g. dev, test, prod).
    #[arg(long)]
    pub stage: Option<String>,

    /// Override the resolution pass ceiling.
    #[arg(long)]
    pub max_passes: Option<usize>,
}

/// Arguments for the `render` command.
#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Deployment type to render (e.g. docker_compose).
    #[arg(long)]
    pub deployment_type: String,

    /// Template directory, highest priority first. Replaces the default
    /// custom/shared pair when given.
    #[arg(long = "template-dir", value_name = "DIR")]
    pub template_dirs: Vec<PathBuf>,

    /// Service directory holding `custom_templates/`.
    #[arg(long, default_value = ".")]
    pub service_root: PathBuf,

    /// Engine directory holding the shared `templates/`.
    #[arg(long, default_value = ".")]
    pub engine_root: PathBuf,

    /// Output root. Defaults to `deployments/` in the service root.
    #[arg(long)]
    pub output_root: Option<PathBuf>,

    /// Do not write the resolved context snapshot next to the output.
    #[arg(long)]
    pub no_snapshot: bool,
}

/// Arguments for the `files` command.
#[derive(Args, Debug)]
pub struct FilesArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Additional lower-priority template directories.
    #[arg(long = "template-dir", value_name = "DIR")]
    pub template_dirs: Vec<PathBuf>,

    /// Service directory holding `custom_templates/files`.
    #[arg(long, default_value = ".")]
    pub service_root: PathBuf,

    /// Output root. Defaults to `deployments/` in the service root.
    #[arg(long)]
    pub output_root: Option<PathBuf>,
}

/// Arguments for the `docs` command.
#[derive(Args, Debug)]
pub struct DocsArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Documentation template.
    #[arg(long, default_value = "documentation.md")]
    pub template_file: PathBuf,

    /// Where to write the rendered page.
    #[arg(long, default_value = "documentation.md")]
    pub output_file: PathBuf,

    /// Embed a file's content as a context field (KEY=PATH). Repeatable.
    /// Without any, the docker-compose manifest and env files are embedded.
    #[arg(long = "embed", value_name = "KEY=PATH")]
    pub embeds: Vec<Embed>,

    /// Use a context snapshot written by `render` instead of the descriptor.
    #[arg(long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Service directory.
    #[arg(long, default_value = ".")]
    pub service_root: PathBuf,

    /// Output root the default embeds are read from. Defaults to
    /// `deployments/` in the service root.
    #[arg(long)]
    pub output_root: Option<PathBuf>,
}

/// Serialization format for `resolve`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Yaml,
    Json,
}

/// Arguments for the `resolve` command.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Deployment type whose defaults should be applied.
    #[arg(long)]
    pub deployment_type: Option<String>,

    /// Service directory. Only used to find the default descriptor.
    #[arg(long, default_value = ".")]
    pub service_root: PathBuf,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,
}

/// Arguments for the `check` command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Directory searched recursively for `service.yml` files.
    #[arg(long)]
    pub apps_root: PathBuf,

    /// Stages to check. Defaults to every known stage.
    #[arg(long, value_delimiter = ',')]
    pub stages: Vec<String>,

    /// Deployment type to render.
    #[arg(long)]
    pub deployment_type: String,

    /// Engine directory holding the shared `templates/`.
    #[arg(long, default_value = ".")]
    pub engine_root: PathBuf,

    /// Override the resolution pass ceiling.
    #[arg(long)]
    pub max_passes: Option<usize>,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
