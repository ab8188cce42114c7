//! `graft templates` - show the template catalog.

use crate::{
    cli::{GlobalArgs, ListFormat, TemplatesArgs},
    commands,
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

pub fn execute(
    args: TemplatesArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let templates = commands::template_service(&global, &config)?;
    let infos = templates.list_template_info(args.service_type)?;

    let format = if output.is_json() {
        ListFormat::Json
    } else {
        args.format
    };

    match format {
        ListFormat::Table => {
            output.header("Available Templates:")?;
            for info in &infos {
                output.print(&format!(
                    "  {:<22} {:<8} {}",
                    info.key, info.version, info.description
                ))?;
                if !info.requires.is_empty() {
                    output.print(&format!("  {:<22} requires: {}", "", info.requires.join(", ")))?;
                }
            }

            let stats = templates.get_statistics()?;
            output.print("")?;
            output.info(&format!("{} templates loaded", stats.total))?;
            if stats.rejected > 0 {
                output.warning(&format!(
                    "{} manifests were skipped as invalid (run with -v for details)",
                    stats.rejected
                ))?;
            }
        }
        ListFormat::Json => output.json(&infos)?,
        ListFormat::List => {
            for info in &infos {
                println!("{}", info.key);
            }
        }
        ListFormat::Csv => {
            println!("type,provider,version,points");
            for info in &infos {
                println!(
                    "{},{},{},{}",
                    info.service_type, info.provider, info.version, info.injection_points
                );
            }
        }
    }

    Ok(())
}
