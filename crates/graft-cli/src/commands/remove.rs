//! `graft remove` - undo an injection.

use crate::{
    cli::{GlobalArgs, RemoveArgs},
    commands,
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

pub fn execute(
    args: RemoveArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let project = commands::project_dir(&global)?;
    let engine = commands::engine(&global, &config, false)?;

    let mut options = commands::injection_options(
        &config,
        None,
        args.write.dry_run,
        args.write.backup,
        false,
    );
    options.overwrite = args.force;

    let result = engine.remove_service(&args.service, &project, &options);

    if output.is_json() {
        output.json(&result)?;
    } else if result.success {
        let verb = if result.dry_run { "Would remove" } else { "Removed" };
        output.success(&format!("{verb} {}", args.service))?;
        output.removal_report(&result)?;
    }

    if result.success {
        Ok(())
    } else {
        Err(commands::first_error(&result.errors))
    }
}
