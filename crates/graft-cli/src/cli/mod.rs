//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::str::FromStr;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;

use graft_core::domain::{ProjectPreset, ServiceType};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "graft",
    bin_name = "graft",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Add, update and remove pluggable services in existing projects",
    long_about = "graft injects pre-authored service templates (databases, auth, \
                  payments, ...) into a project, records what it changed, and can \
                  later update or remove the same service.",
    after_help = "EXAMPLES:\n\
        \x20 graft templates\n\
        \x20 graft add payment stripe --name payments --set currency=eur\n\
        \x20 graft check auth/clerk database/postgres\n\
        \x20 graft remove payments --dry-run",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Inject a service into the project.
    #[command(
        visible_alias = "a",
        about = "Inject a service",
        after_help = "EXAMPLES:\n\
            \x20 graft add database postgres\n\
            \x20 graft add payment stripe --name payments --set secretKey=sk_test\n\
            \x20 graft add auth clerk --dry-run"
    )]
    Add(AddArgs),

    /// Remove an injected service.
    #[command(
        visible_alias = "rm",
        about = "Remove an injected service",
        after_help = "EXAMPLES:\n\
            \x20 graft remove payments\n\
            \x20 graft remove 2b1c0f8e-... --dry-run"
    )]
    Remove(RemoveArgs),

    /// Re-inject a service with changed configuration.
    #[command(
        about = "Update an injected service",
        after_help = "EXAMPLES:\n\
            \x20 graft update payments --set currency=eur"
    )]
    Update(UpdateArgs),

    /// List services injected into the project.
    #[command(visible_alias = "ls", about = "List injected services")]
    List(ListArgs),

    /// List available service templates.
    #[command(
        about = "List available templates",
        after_help = "EXAMPLES:\n\
            \x20 graft templates\n\
            \x20 graft templates --type auth --format json"
    )]
    Templates(TemplatesArgs),

    /// Check services for conflicts and missing dependencies.
    #[command(
        about = "Check service compatibility",
        after_help = "EXAMPLES:\n\
            \x20 graft check auth/clerk auth/auth0\n\
            \x20 graft check payment/stripe:payments database/postgres"
    )]
    Check(CheckArgs),

    /// Suggest service types the project is missing.
    #[command(about = "Suggest services")]
    Suggest(SuggestArgs),

    /// Initialise a graft configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 graft init           # per-user config\n\
            \x20 graft init --local   # .graft.toml in CWD"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 graft completions bash > ~/.local/share/bash-completion/completions/graft\n\
            \x20 graft completions zsh  > ~/.zfunc/_graft"
    )]
    Completions(CompletionsArgs),

    /// Manage the graft configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 graft config get engine.environment\n\
            \x20 graft config set engine.backup_files true\n\
            \x20 graft config list"
    )]
    Config(ConfigCommands),
}

// ── add ───────────────────────────────────────────────────────────────────────

/// Flags shared by commands that write to the project.
#[derive(Debug, Args)]
pub struct WriteArgs {
    /// Preview without writing any files.
    #[arg(long = "dry-run", help = "Show what would change without changing it")]
    pub dry_run: bool,

    /// Copy files to `.graft/backups/` before touching them.
    #[arg(long = "backup", help = "Back up files before changing them")]
    pub backup: bool,
}

/// Arguments for `graft add`.
#[derive(Debug, Args)]
pub struct AddArgs {
    /// Service type.
    #[arg(value_name = "TYPE", value_parser = parse_service_type)]
    pub service_type: ServiceType,

    /// Provider, e.g. `stripe`.
    #[arg(value_name = "PROVIDER")]
    pub provider: String,

    /// Name for this injection (default: the provider).
    #[arg(short = 'n', long = "name", value_name = "NAME")]
    pub name: Option<String>,

    /// Configuration values.
    #[arg(
        short = 's',
        long = "set",
        value_name = "KEY=VALUE",
        value_parser = parse_key_value,
        help = "Configuration value (repeatable); VALUE is parsed as JSON when possible"
    )]
    pub set: Vec<(String, Value)>,

    /// Target environment.
    #[arg(short = 'e', long = "env", value_name = "ENV")]
    pub environment: Option<String>,

    /// Another service this one depends on.
    #[arg(long = "depends-on", value_name = "SERVICE")]
    pub depends_on: Vec<String>,

    /// Proceed despite compatibility problems (never cycles).
    #[arg(
        short = 'f',
        long = "force",
        visible_alias = "overwrite",
        help = "Override compatibility checks"
    )]
    pub force: bool,

    /// Skip required-configuration checks.
    #[arg(long = "skip-validation")]
    pub skip_validation: bool,

    /// Run post-injection commands in the project.
    #[arg(long = "run-steps", help = "Execute post-injection commands")]
    pub run_steps: bool,

    #[command(flatten)]
    pub write: WriteArgs,
}

// ── remove / update ───────────────────────────────────────────────────────────

/// Arguments for `graft remove`.
#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Service name or id.
    #[arg(value_name = "SERVICE")]
    pub service: String,

    /// Remove even when other services depend on it.
    #[arg(short = 'f', long = "force", help = "Ignore dependent services")]
    pub force: bool,

    #[command(flatten)]
    pub write: WriteArgs,
}

/// Arguments for `graft update`.
#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Service name or id.
    #[arg(value_name = "SERVICE")]
    pub service: String,

    /// Configuration changes, merged over the recorded configuration.
    #[arg(
        short = 's',
        long = "set",
        value_name = "KEY=VALUE",
        value_parser = parse_key_value
    )]
    pub set: Vec<(String, Value)>,

    #[arg(short = 'e', long = "env", value_name = "ENV")]
    pub environment: Option<String>,

    #[arg(long = "skip-validation")]
    pub skip_validation: bool,

    #[arg(long = "run-steps", help = "Execute post-injection commands")]
    pub run_steps: bool,

    #[command(flatten)]
    pub write: WriteArgs,
}

// ── list / templates ──────────────────────────────────────────────────────────

/// Arguments for `graft list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Output format.
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: ListFormat,
}

/// Arguments for `graft templates`.
#[derive(Debug, Args)]
pub struct TemplatesArgs {
    /// Only templates of this type.
    #[arg(long = "type", value_name = "TYPE", value_parser = parse_service_type)]
    pub service_type: Option<ServiceType>,

    /// Output format.
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: ListFormat,
}

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    /// Human-readable table.
    Table,
    /// One name per line.
    List,
    /// JSON array.
    Json,
    /// CSV rows.
    Csv,
}

// ── check / suggest ───────────────────────────────────────────────────────────

/// A service named on the command line as `TYPE/PROVIDER[:NAME]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
    pub service_type: ServiceType,
    pub provider: String,
    pub name: String,
}

impl FromStr for ServiceSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (reference, name) = match s.split_once(':') {
            Some((reference, name)) => (reference, Some(name.trim())),
            None => (s, None),
        };
        let (service_type, provider) = reference
            .split_once('/')
            .ok_or_else(|| format!("expected TYPE/PROVIDER[:NAME], got '{s}'"))?;
        let service_type = parse_service_type(service_type)?;
        let provider = provider.trim();
        if provider.is_empty() {
            return Err(format!("missing provider in '{s}'"));
        }

        Ok(Self {
            service_type,
            provider: provider.to_string(),
            name: name
                .filter(|n| !n.is_empty())
                .unwrap_or(provider)
                .to_string(),
        })
    }
}

/// Arguments for `graft check`.
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Services to check together with those already injected.
    #[arg(value_name = "TYPE/PROVIDER[:NAME]", required = true)]
    pub services: Vec<ServiceSpec>,
}

/// Arguments for `graft suggest`.
#[derive(Debug, Args)]
pub struct SuggestArgs {
    /// Project archetype to suggest for.
    #[arg(long = "preset", value_name = "PRESET", value_parser = parse_preset)]
    pub preset: Option<ProjectPreset>,
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `graft init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Write to `.graft.toml` in the current directory.
    #[arg(long = "local", help = "Create local configuration in current directory")]
    pub local: bool,

    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `graft completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `graft config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `engine.environment`.
        key: String,
    },
    /// Set a key in the configuration file.
    Set {
        /// Dotted key path.
        key: String,
        /// New value.
        value: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the active configuration file.
    Path,
}

// ── value parsers ─────────────────────────────────────────────────────────────

pub fn parse_service_type(s: &str) -> Result<ServiceType, String> {
    ServiceType::from_str(s.trim()).map_err(|e| e.to_string())
}

fn parse_preset(s: &str) -> Result<ProjectPreset, String> {
    ProjectPreset::from_str(s.trim()).map_err(|e| e.to_string())
}

/// `KEY=VALUE`; the value is JSON when it parses as JSON, a string otherwise.
pub fn parse_key_value(s: &str) -> Result<(String, Value), String> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_add_command() {
        let cli = Cli::parse_from([
            "graft", "add", "payment", "stripe", "--name", "payments", "--set", "currency=eur",
            "--set", "retries=3", "--dry-run",
        ]);
        let Commands::Add(args) = cli.command else {
            panic!("expected Add command");
        };
        assert_eq!(args.service_type, ServiceType::Payment);
        assert_eq!(args.provider, "stripe");
        assert_eq!(args.name.as_deref(), Some("payments"));
        assert_eq!(
            args.set,
            vec![
                ("currency".to_string(), json!("eur")),
                ("retries".to_string(), json!(3))
            ]
        );
        assert!(args.write.dry_run);
    }

    #[test]
    fn service_type_aliases_are_accepted() {
        let cli = Cli::parse_from(["graft", "add", "db", "postgres"]);
        let Commands::Add(args) = cli.command else {
            panic!("expected Add command");
        };
        assert_eq!(args.service_type, ServiceType::Database);
    }

    #[test]
    fn unknown_service_type_is_rejected() {
        assert!(Cli::try_parse_from(["graft", "add", "blockchain", "eth"]).is_err());
    }

    #[test]
    fn key_value_parsing() {
        assert_eq!(parse_key_value("a=true").unwrap(), ("a".into(), json!(true)));
        assert_eq!(
            parse_key_value("url=postgres://x=y").unwrap(),
            ("url".into(), json!("postgres://x=y"))
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn service_spec_parsing() {
        let spec: ServiceSpec = "auth/clerk".parse().unwrap();
        assert_eq!(spec.service_type, ServiceType::Auth);
        assert_eq!(spec.name, "clerk");

        let named: ServiceSpec = "payment/stripe:payments".parse().unwrap();
        assert_eq!(named.provider, "stripe");
        assert_eq!(named.name, "payments");

        assert!("stripe".parse::<ServiceSpec>().is_err());
        assert!("auth/".parse::<ServiceSpec>().is_err());
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::parse_from(["graft", "list", "--project", "/tmp/app", "-vv"]);
        assert_eq!(cli.global.project, std::path::PathBuf::from("/tmp/app"));
        assert_eq!(cli.global.verbose, 2);
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        let result = Cli::try_parse_from(["graft", "--quiet", "--verbose", "list"]);
        assert!(result.is_err());
    }
}
