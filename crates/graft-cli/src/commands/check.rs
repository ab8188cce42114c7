//! `graft check` - compatibility report for a planned set of services.

use graft_core::{
    domain::{ConflictKind, DomainError, ServiceConfiguration},
    error::GraftError,
};

use crate::{
    cli::{CheckArgs, GlobalArgs},
    commands,
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

pub fn execute(
    args: CheckArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let project = commands::project_dir(&global)?;
    let engine = commands::engine(&global, &config, false)?;

    let planned: Vec<ServiceConfiguration> = args
        .services
        .into_iter()
        .map(|spec| ServiceConfiguration::new(spec.name, spec.service_type, spec.provider))
        .collect();

    let report = engine.validate_compatibility(&planned, &project)?;

    if output.is_json() {
        output.json(&report)?;
    } else {
        for conflict in &report.conflicts {
            output.warning(&format!(
                "{} conflict: {} / {}: {}",
                conflict.kind, conflict.first.name, conflict.second.name, conflict.reason
            ))?;
        }
        for missing in &report.missing {
            output.warning(&format!("missing: {}", missing.reason))?;
        }
        if report.compatible {
            output.success("Services are compatible")?;
            if !report.order.is_empty() {
                output.print(&format!("  injection order: {}", report.order.join(" -> ")))?;
            }
        }
    }

    if report.compatible {
        return Ok(());
    }

    let cycle: Vec<String> = report
        .conflicts
        .iter()
        .filter(|c| c.kind == ConflictKind::Circular)
        .flat_map(|c| [c.first.name.clone(), c.second.name.clone()])
        .collect();
    if !cycle.is_empty() {
        return Err(CliError::Core(GraftError::Domain(
            DomainError::DependencyCycle { nodes: cycle },
        )));
    }

    let service = planned
        .iter()
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    Err(CliError::Core(GraftError::Domain(DomainError::Incompatible {
        service,
        reasons: report.reasons(),
    })))
}
