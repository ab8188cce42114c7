//! `graft update` - re-inject a service with changed configuration.

use std::collections::BTreeMap;

use crate::{
    cli::{GlobalArgs, UpdateArgs},
    commands,
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

pub fn execute(
    args: UpdateArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let project = commands::project_dir(&global)?;
    let engine = commands::engine(&global, &config, args.run_steps)?;

    let changes: BTreeMap<_, _> = args.set.into_iter().collect();
    let options = commands::injection_options(
        &config,
        args.environment,
        args.write.dry_run,
        args.write.backup,
        args.skip_validation,
    );

    let result = engine.update_service(&args.service, &changes, &project, &options);

    if output.is_json() {
        output.json(&result)?;
    } else if result.success {
        let verb = if result.injection.dry_run {
            "Would update"
        } else {
            "Updated"
        };
        output.success(&format!("{verb} {}", args.service))?;
        output.injection_report(&result.injection)?;
    }

    if result.success {
        return Ok(());
    }
    // A rejected update or a failed removal means only one half has errors.
    if result.removal.errors.is_empty() {
        Err(commands::first_error(&result.injection.errors))
    } else {
        Err(commands::first_error(&result.removal.errors))
    }
}
