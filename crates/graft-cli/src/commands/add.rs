//! `graft add` - inject a service into the project.

use tracing::info;

use graft_core::domain::ServiceConfiguration;

use crate::{
    cli::{AddArgs, GlobalArgs},
    commands,
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

pub fn execute(
    args: AddArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let project = commands::project_dir(&global)?;
    let engine = commands::engine(&global, &config, args.run_steps)?;

    let name = args.name.clone().unwrap_or_else(|| args.provider.clone());
    let mut service = ServiceConfiguration::new(&name, args.service_type, &args.provider);
    for (key, value) in args.set {
        service = service.with_config(key, value);
    }
    for dependency in args.depends_on {
        service = service.depends_on(dependency);
    }

    let mut options = commands::injection_options(
        &config,
        args.environment,
        args.write.dry_run,
        args.write.backup,
        args.skip_validation,
    );
    options.overwrite = args.force;

    info!(service = %name, key = %service.key(), "Injecting service");
    let result = engine.inject_service(service, &project, &options);

    if output.is_json() {
        output.json(&result)?;
    } else if result.success {
        let verb = if result.dry_run { "Would inject" } else { "Injected" };
        output.success(&format!(
            "{verb} {} ({}/{})",
            name, args.service_type, args.provider
        ))?;
        output.injection_report(&result)?;
    }

    if result.success {
        Ok(())
    } else {
        for warning in &result.warnings {
            output.warning(warning)?;
        }
        Err(commands::first_error(&result.errors))
    }
}
