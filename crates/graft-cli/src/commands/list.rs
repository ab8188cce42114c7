//! Implementation of the `graft list` command.

use crate::{
    cli::{GlobalArgs, ListArgs, ListFormat},
    commands,
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

pub fn execute(
    args: ListArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let project = commands::project_dir(&global)?;
    let engine = commands::engine(&global, &config, false)?;
    let records = engine.list_services(&project)?;

    let format = if output.is_json() {
        ListFormat::Json
    } else {
        args.format
    };

    match format {
        ListFormat::Table => {
            if records.is_empty() {
                output.info("No services injected yet. Try: graft templates")?;
                return Ok(());
            }
            output.header("Injected Services:")?;
            for record in &records {
                let service = &record.configuration;
                output.print(&format!(
                    "  {:<16} {:<24} {}  {}",
                    service.name,
                    service.key().to_string(),
                    record.injected_at.format("%Y-%m-%d %H:%M"),
                    record.id
                ))?;
            }
        }
        // Machine-readable formats bypass quiet mode.
        ListFormat::Json => output.json(&records)?,
        ListFormat::List => {
            for record in &records {
                println!("{}", record.name());
            }
        }
        ListFormat::Csv => {
            println!("name,type,provider,environment,id");
            for record in &records {
                let service = &record.configuration;
                println!(
                    "{},{},{},{},{}",
                    service.name, service.service_type, service.provider, record.environment,
                    record.id
                );
            }
        }
    }

    Ok(())
}
