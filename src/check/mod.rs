//! Dry-run validation of every service under an applications directory.
//!
//! For each `service.yml` and each stage the full pipeline runs in memory:
//! the descriptor is resolved, every template is rendered, and each rendered
//! `.yml`/`.yaml` artifact must parse as YAML. Nothing is written to disk.

mod display;


pub use display::print_report;

use crate::config::EngineConfig;
use crate::error::{Result, SsotError};
use crate::pipeline::{DescriptorInput, build_context};
use crate::render::{Artifact, plan_all};
use crate::resolve::ConvergenceWarning;
use crate::sources::SourceList;
use crate::stage::Stage;
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// File name that marks a service directory.
pub const DESCRIPTOR_FILE: &str = "service.yml";

/// What to check.
#[derive(Debug, Clone, Copy)]
pub struct CheckOptions<'a> {
    /// Directory searched recursively for descriptors.
    pub apps_root: &'a Path,
    pub stages: &'a [Stage],
    pub deployment_type: &'a str,
    /// Root holding the shared `templates/<type>` directories.
    pub engine_root: &'a Path,
}

/// Outcome of one service/stage combination.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    /// Service directory name.
    pub service: String,
    pub descriptor: PathBuf,
    pub stage: Stage,
    /// Artifacts rendered for this combination.
    pub artifacts: usize,
    /// Set when resolution stopped at the pass ceiling. The check still
    /// passes, but the rendered files may carry unresolved placeholders.
    pub warning: Option<ConvergenceWarning>,
    /// Failure description, `None` on success.
    pub failure: Option<String>,
}

impl CheckOutcome {
    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

/// A combination that rendered and validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckPass {
    pub artifacts: usize,
    pub warning: Option<ConvergenceWarning>,
}

/// Results of a full check run.
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    pub services: usize,
    pub outcomes: Vec<CheckOutcome>,
}

impl CheckReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.passed()).count()
    }

    pub fn warned(&self) -> usize {
        self.outcomes.iter().filter(|o| o.warning.is_some()).count()
    }

    /// `Ok` when every check passed, otherwise a validation error.
    pub fn into_result(self) -> Result<()> {
        match self.failed() {
            0 => Ok(()),
            failed => Err(SsotError::Validation(format!(
                "{} of {} checks failed",
                failed,
                self.total()
            ))),
        }
    }
}

/// Every descriptor below `apps_root`, sorted by path.
pub fn find_descriptors(apps_root: &Path) -> Result<Vec<PathBuf>> {
    if !apps_root.is_dir() {
        return Err(SsotError::User(format!(
            "applications directory not found: {}",
            apps_root.display()
        )));
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(apps_root)
        .follow_links(false)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
    {
        let entry = entry.map_err(|e| {
            let context = format!("failed to walk '{}'", apps_root.display());
            match e.into_io_error() {
                Some(source) => SsotError::io(context, source),
                None => SsotError::User(context),
            }
        })?;
        if entry.file_type().is_file() && entry.file_name() == DESCRIPTOR_FILE {
            found.push(entry.into_path());
        }
    }
    found.sort();
    Ok(found)
}

/// Check every service and stage, collecting failures instead of stopping.
pub fn check_apps(options: CheckOptions<'_>, config: &EngineConfig) -> Result<CheckReport> {
    let descriptors = find_descriptors(options.apps_root)?;
    if descriptors.is_empty() {
        info!(root = %options.apps_root.display(), "no '{}' files found", DESCRIPTOR_FILE);
    }

    let mut report = CheckReport {
        services: descriptors.len(),
        outcomes: Vec::new(),
    };
    for descriptor in &descriptors {
        let service = service_label(descriptor);
        for stage in options.stages {
            debug!(service = %service, stage = %stage, "checking");
            let (artifacts, warning, failure) =
                match check_one(descriptor, stage, options, config) {
                    Ok(pass) => (pass.artifacts, pass.warning, None),
                    Err(e) => (0, None, Some(e.to_string())),
                };
            report.outcomes.push(CheckOutcome {
                service: service.clone(),
                descriptor: descriptor.clone(),
                stage: stage.clone(),
                artifacts,
                warning,
                failure,
            });
        }
    }
    Ok(report)
}

/// Render one service for one stage in memory and validate the YAML output.
pub fn check_one(
    descriptor: &Path,
    stage: &Stage,
    options: CheckOptions<'_>,
    config: &EngineConfig,
) -> Result<CheckPass> {
    let service_root = descriptor.parent().unwrap_or(Path::new("."));
    let context = build_context(
        &DescriptorInput::File(descriptor.to_path_buf()),
        stage,
        Some(options.deployment_type),
        config,
    )?;

    let sources = SourceList::from_dirs(
        [
            service_root
                .join(&config.custom_templates_dir)
                .join(options.deployment_type),
            options
                .engine_root
                .join(&config.templates_dir)
                .join(options.deployment_type),
        ],
        &config.ignore_globs,
    )?;
    let artifacts = plan_all(&sources, &context.tree, &config.template_marker)?;
    if artifacts.is_empty() {
        return Err(SsotError::Validation(format!(
            "no templates found for deployment type '{}'",
            options.deployment_type
        )));
    }

    for artifact in &artifacts {
        validate_artifact(artifact)?;
    }
    Ok(CheckPass {
        artifacts: artifacts.len(),
        warning: context.warning,
    })
}

/// YAML artifacts must parse; other files are not inspected.
fn validate_artifact(artifact: &Artifact) -> Result<()> {
    let is_yaml = artifact
        .relative_path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext, "yml" | "yaml"));
    if !is_yaml {
        return Ok(());
    }

    serde_yaml::from_slice::<Value>(&artifact.content)
        .map(|_| ())
        .map_err(|e| {
            SsotError::Validation(format!(
                "'{}' is not valid YAML: {}",
                artifact.relative_path.display(),
                e
            ))
        })
}

fn service_label(descriptor: &Path) -> String {
    descriptor
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| descriptor.display().to_string())
}
