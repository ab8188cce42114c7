//! Command handlers, one module per subcommand.
//!
//! Handlers receive parsed arguments plus the global flags, loaded config
//! and output manager, and return [`CliResult`].  Wiring the engine out of
//! adapters happens here so every handler builds it the same way.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, instrument};

use graft_adapters::{
    FileLocker, InMemoryStore, JsonCodec, JsonMetadataStore, LocalFilesystem,
    ProcessCommandRunner, TemplateLoader, TomlCodec, TypeScriptEditor, discover_templates_dir,
};
use graft_core::{
    application::{InjectionOptions, InjectionService, TemplateService},
    error::GraftError,
};

use crate::{
    cli::GlobalArgs,
    config::AppConfig,
    error::{CliError, CliResult},
};

pub mod add;
pub mod check;
pub mod completions;
pub mod config;
pub mod init;
pub mod list;
pub mod remove;
pub mod suggest;
pub mod templates;
pub mod update;

/// The `--project` directory, which must exist.
pub(crate) fn project_dir(global: &GlobalArgs) -> CliResult<PathBuf> {
    if !global.project.is_dir() {
        return Err(CliError::ProjectNotFound {
            path: global.project.clone(),
        });
    }
    Ok(global.project.clone())
}

/// `--templates` / `GRAFT_TEMPLATES_DIR`, then `templates.path`, then the
/// usual locations next to the binary and working directory.
pub(crate) fn templates_dir(global: &GlobalArgs, config: &AppConfig) -> CliResult<PathBuf> {
    let explicit = global
        .templates
        .clone()
        .or_else(|| config.templates.path.clone());

    match explicit {
        Some(dir) if dir.is_dir() => Ok(dir),
        Some(dir) => Err(CliError::ConfigError {
            message: format!("templates directory '{}' does not exist", dir.display()),
            source: None,
        }),
        None => discover_templates_dir().ok_or(CliError::TemplatesNotFound),
    }
}

/// Load the template catalog.
#[instrument(skip_all)]
pub(crate) fn template_service(
    global: &GlobalArgs,
    config: &AppConfig,
) -> CliResult<Arc<TemplateService>> {
    let dir = templates_dir(global, config)?;
    debug!(templates = %dir.display(), "Loading templates");

    let service = TemplateService::with_source(
        Box::new(InMemoryStore::new()),
        Box::new(TemplateLoader::new(dir)),
    );
    service.initialize()?;
    Ok(Arc::new(service))
}

/// Wire an [`InjectionService`] over the local filesystem.
///
/// Post-injection commands only run when asked for, either per call or via
/// `engine.run_post_steps`.
pub(crate) fn engine(
    global: &GlobalArgs,
    config: &AppConfig,
    run_steps: bool,
) -> CliResult<InjectionService> {
    let templates = template_service(global, config)?;

    let engine = InjectionService::new(
        templates,
        Arc::new(LocalFilesystem::new()),
        Box::new(JsonMetadataStore::new()),
        Box::new(FileLocker::new()),
    )
    .with_codec(Box::new(JsonCodec))
    .with_codec(Box::new(TomlCodec))
    .with_editor(Box::new(TypeScriptEditor::new()));

    if run_steps || config.engine.run_post_steps {
        Ok(engine.with_runner(Box::new(ProcessCommandRunner::new())))
    } else {
        Ok(engine)
    }
}

/// Options shared by `add` and `update`, with config supplying defaults.
pub(crate) fn injection_options(
    config: &AppConfig,
    environment: Option<String>,
    dry_run: bool,
    backup: bool,
    skip_validation: bool,
) -> InjectionOptions {
    InjectionOptions {
        dry_run,
        backup_files: backup || config.engine.backup_files,
        skip_validation,
        environment: environment.unwrap_or_else(|| config.engine.environment.clone()),
        ..InjectionOptions::default()
    }
}

/// Turn the collected errors of a failed engine call into one CLI error.
pub(crate) fn first_error(errors: &[GraftError]) -> CliError {
    match errors.first() {
        Some(err) => CliError::Core(err.clone()),
        None => CliError::Core(GraftError::Internal {
            message: "operation failed without reporting an error".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use tempfile::TempDir;

    fn global(project: PathBuf, templates: Option<PathBuf>) -> GlobalArgs {
        GlobalArgs {
            verbose: 0,
            quiet: false,
            no_color: true,
            config: None,
            project,
            templates,
            output_format: OutputFormat::Plain,
        }
    }

    #[test]
    fn missing_project_is_not_found() {
        let args = global(PathBuf::from("/definitely/not/a/project"), None);
        assert!(matches!(
            project_dir(&args),
            Err(CliError::ProjectNotFound { .. })
        ));
    }

    #[test]
    fn flag_wins_over_config_for_templates() {
        let flag = TempDir::new().unwrap();
        let configured = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.templates.path = Some(configured.path().to_path_buf());

        let args = global(".".into(), Some(flag.path().to_path_buf()));
        assert_eq!(templates_dir(&args, &config).unwrap(), flag.path());

        let args = global(".".into(), None);
        assert_eq!(templates_dir(&args, &config).unwrap(), configured.path());
    }

    #[test]
    fn missing_templates_dir_is_a_config_error() {
        let args = global(".".into(), Some(PathBuf::from("/no/such/templates")));
        assert!(matches!(
            templates_dir(&args, &AppConfig::default()),
            Err(CliError::ConfigError { .. })
        ));
    }

    #[test]
    fn options_fall_back_to_config() {
        let mut config = AppConfig::default();
        config.engine.environment = "staging".into();
        config.engine.backup_files = true;

        let options = injection_options(&config, None, true, false, false);
        assert_eq!(options.environment, "staging");
        assert!(options.backup_files);
        assert!(options.dry_run);

        let options = injection_options(&config, Some("production".into()), false, false, true);
        assert_eq!(options.environment, "production");
        assert!(options.skip_validation);
    }

    #[test]
    fn first_error_never_panics() {
        assert!(matches!(
            first_error(&[]),
            CliError::Core(GraftError::Internal { .. })
        ));
    }
}
