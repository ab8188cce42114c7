//! Output management and formatting.

use std::io::{self, IsTerminal};

use console::Term;
use owo_colors::OwoColorize;
use serde::Serialize;

use graft_core::application::{InjectionResult, RemovalResult};

use crate::cli::global::{GlobalArgs, OutputFormat};
use crate::config::AppConfig;

/// Manages CLI output based on configuration.
pub struct OutputManager {
    resolved_format: OutputFormat,
    quiet: bool,
    no_color: bool,
    term: Term,
}

impl OutputManager {
    /// Build an `OutputManager` from parsed CLI flags and loaded config.
    ///
    /// An explicit `--output-format` wins over `output.format` in the
    /// config; `auto` resolves to human on a TTY and plain otherwise.
    pub fn new(args: &GlobalArgs, config: &AppConfig) -> Self {
        let requested = match args.output_format {
            OutputFormat::Auto => parse_format(&config.output.format),
            explicit => explicit,
        };
        let resolved_format = match requested {
            OutputFormat::Auto if io::stdout().is_terminal() => OutputFormat::Human,
            OutputFormat::Auto => OutputFormat::Plain,
            other => other,
        };

        Self {
            resolved_format,
            quiet: args.quiet,
            no_color: args.no_color
                || config.output.no_color
                || resolved_format != OutputFormat::Human,
            term: Term::stdout(),
        }
    }

    // ── Public write methods ───────────────────────────────────────────────

    /// Generic message; suppressed in quiet mode.
    pub fn print(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.term.write_line(msg)
    }

    /// Success indicator: `✓ <msg>`.
    pub fn success(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{2713} {msg}")
        } else {
            format!("{} {}", "\u{2713}".green().bold(), msg.green())
        };
        self.term.write_line(&line)
    }

    /// Warning indicator: `⚠ <msg>`.
    pub fn warning(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{26a0} {msg}")
        } else {
            format!("{} {}", "\u{26a0}".yellow().bold(), msg.yellow())
        };
        self.term.write_line(&line)
    }

    /// Informational indicator: `ℹ <msg>`.
    pub fn info(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{2139} {msg}")
        } else {
            format!("{} {}", "\u{2139}".blue().bold(), msg.blue())
        };
        self.term.write_line(&line)
    }

    /// Bold cyan header line.
    pub fn header(&self, text: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            text.to_owned()
        } else {
            text.cyan().bold().to_string()
        };
        self.term.write_line(&line)
    }

    /// Indented `marker path` line used for file changes.
    fn change(&self, marker: char, text: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            format!("  {marker} {text}")
        } else {
            match marker {
                '+' => format!("  {} {text}", marker.green()),
                '-' => format!("  {} {text}", marker.red()),
                _ => format!("  {} {text}", marker.yellow()),
            }
        };
        self.term.write_line(&line)
    }

    /// Pretty JSON on stdout.  Never suppressed: scripts rely on it.
    pub fn json<T: Serialize>(&self, value: &T) -> io::Result<()> {
        let rendered = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        self.term.write_line(&rendered)
    }

    // ── Result rendering ───────────────────────────────────────────────────

    /// Files, env vars, dependencies, warnings and next steps of an
    /// injection.  The headline is left to the caller.
    pub fn injection_report(&self, result: &InjectionResult) -> io::Result<()> {
        for path in &result.files_created {
            self.change('+', path.as_str())?;
        }
        for path in result
            .files_modified
            .iter()
            .filter(|p| !result.files_created.contains(p))
        {
            self.change('~', path.as_str())?;
        }
        if !result.env_vars_added.is_empty() {
            self.print(&format!(
                "  env: {}",
                result.env_vars_added.join(", ")
            ))?;
        }
        for package in &result.dependencies_added {
            self.print(&format!("  dependency: {package}"))?;
        }
        for warning in &result.warnings {
            self.warning(warning)?;
        }
        if !result.next_steps.is_empty() {
            self.header("Next steps:")?;
            for (i, step) in result.next_steps.iter().enumerate() {
                self.print(&format!("  {}. {step}", i + 1))?;
            }
        }
        Ok(())
    }

    pub fn removal_report(&self, result: &RemovalResult) -> io::Result<()> {
        for path in &result.files_removed {
            self.change('-', path.as_str())?;
        }
        for path in &result.files_skipped {
            self.print(&format!("  (already gone) {path}"))?;
        }
        if !result.files_retained.is_empty() {
            self.info("Modified files were left in place; review them by hand:")?;
            for path in &result.files_retained {
                self.change('~', path.as_str())?;
            }
        }
        for warning in &result.warnings {
            self.warning(warning)?;
        }
        Ok(())
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    /// `true` if ANSI colours are enabled.
    pub fn supports_color(&self) -> bool {
        !self.no_color
    }

    /// The resolved (non-Auto) output format.
    pub fn format(&self) -> OutputFormat {
        self.resolved_format
    }

    pub fn is_json(&self) -> bool {
        self.resolved_format == OutputFormat::Json
    }
}

fn parse_format(value: &str) -> OutputFormat {
    match value.trim().to_ascii_lowercase().as_str() {
        "human" => OutputFormat::Human,
        "plain" => OutputFormat::Plain,
        "json" => OutputFormat::Json,
        _ => OutputFormat::Auto,
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn args(format: OutputFormat, no_color: bool) -> GlobalArgs {
        GlobalArgs {
            verbose: 0,
            quiet: false,
            no_color,
            config: None,
            project: ".".into(),
            templates: None,
            output_format: format,
        }
    }

    #[test]
    fn explicit_format_wins_over_config() {
        let mut config = AppConfig::default();
        config.output.format = "json".into();

        let out = OutputManager::new(&args(OutputFormat::Plain, false), &config);
        assert_eq!(out.format(), OutputFormat::Plain);

        let out = OutputManager::new(&args(OutputFormat::Auto, false), &config);
        assert!(out.is_json());
    }

    #[test]
    fn colour_only_for_human_output() {
        let config = AppConfig::default();
        assert!(OutputManager::new(&args(OutputFormat::Human, false), &config).supports_color());
        assert!(!OutputManager::new(&args(OutputFormat::Human, true), &config).supports_color());
        assert!(!OutputManager::new(&args(OutputFormat::Plain, false), &config).supports_color());
    }

    #[test]
    fn unknown_config_format_falls_back_to_auto() {
        assert_eq!(parse_format("JSON"), OutputFormat::Json);
        assert_eq!(parse_format("fancy"), OutputFormat::Auto);
    }

    #[test]
    fn reports_write_without_error() {
        let out = OutputManager::new(&args(OutputFormat::Plain, true), &AppConfig::default());
        let result = InjectionResult {
            success: true,
            env_vars_added: vec!["STRIPE_SECRET_KEY".into()],
            next_steps: vec!["Set STRIPE_SECRET_KEY in your environment".into()],
            warnings: vec!["skipped a point".into()],
            ..InjectionResult::default()
        };
        assert!(out.injection_report(&result).is_ok());
        assert!(out.removal_report(&RemovalResult::default()).is_ok());
    }
}
