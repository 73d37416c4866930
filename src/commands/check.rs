//! Implementation of the `check` command.

use super::with_max_passes;
use crate::check::{CheckOptions, check_apps, print_report};
use crate::cli::CheckArgs;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::stage::Stage;

/// Execute the `check` command.
///
/// Every failing combination is reported before the command fails, so one
/// broken service does not hide problems in the others.
pub fn cmd_check(args: CheckArgs, config: EngineConfig) -> Result<()> {
    let config = with_max_passes(config, args.max_passes)?;
    let names = if args.stages.is_empty() {
        config.known_stages.clone()
    } else {
        args.stages
    };
    let stages = names
        .iter()
        .map(|name| Stage::parse(name, &config.known_stages))
        .collect::<Result<Vec<_>>>()?;

    let report = check_apps(
        CheckOptions {
            apps_root: &args.apps_root,
            stages: &stages,
            deployment_type: &args.deployment_type,
            engine_root: &args.engine_root,
        },
        &config,
    )?;
    print_report(&report);
    report.into_result()
}
