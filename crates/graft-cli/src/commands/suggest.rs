//! `graft suggest` - service types the project is probably missing.

use crate::{
    cli::{GlobalArgs, SuggestArgs},
    commands,
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

pub fn execute(
    args: SuggestArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let project = commands::project_dir(&global)?;
    let engine = commands::engine(&global, &config, false)?;
    let suggestions = engine.suggest_services(&project, args.preset)?;

    if output.is_json() {
        output.json(&suggestions)?;
        return Ok(());
    }

    if suggestions.is_empty() {
        output.success("Nothing to suggest")?;
        return Ok(());
    }

    output.header("Suggested Services:")?;
    for suggestion in &suggestions {
        output.print(&format!(
            "  {:<14} {}",
            suggestion.service_type.to_string(),
            suggestion.reason
        ))?;
        match suggestion.providers.first() {
            Some(provider) => output.print(&format!(
                "  {:<14} graft add {} {}   (available: {})",
                "",
                suggestion.service_type,
                provider,
                suggestion.providers.join(", ")
            ))?,
            None => output.print(&format!("  {:<14} no template installed", ""))?,
        }
    }

    Ok(())
}
