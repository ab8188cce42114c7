//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `graft-adapters` crate provides implementations.

use std::path::{Path, PathBuf};

use serde_json::Value;

#[cfg(test)]
use mockall::automock;

use crate::domain::{RelativePath, ServiceInjectionMetadata, ServiceTemplate, StructuredEdit, TemplateKey};
use crate::error::GraftResult;

/// Port for filesystem operations.
///
/// Implemented by:
/// - `graft_adapters::filesystem::LocalFilesystem` (production)
/// - `graft_adapters::filesystem::MemoryFilesystem` (testing)
///
/// Paths are absolute: services join project-relative targets onto the
/// project root before calling in.
#[cfg_attr(test, automock)]
pub trait Filesystem: Send + Sync {
    fn read_to_string(&self, path: &Path) -> GraftResult<String>;

    /// Write content to a file, replacing it. Parents must exist.
    fn write_file(&self, path: &Path, content: &str) -> GraftResult<()>;

    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> GraftResult<()>;

    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    fn remove_file(&self, path: &Path) -> GraftResult<()>;

    /// Remove a directory only if it is empty. Returns whether it was removed.
    fn remove_dir_if_empty(&self, path: &Path) -> GraftResult<bool>;

    /// Copy a file, creating the destination's parents.
    fn copy_file(&self, from: &Path, to: &Path) -> GraftResult<()> {
        let content = self.read_to_string(from)?;
        if let Some(parent) = to.parent() {
            self.create_dir_all(parent)?;
        }
        self.write_file(to, &content)
    }
}

/// Port for template storage and retrieval.
///
/// Implemented by:
/// - `graft_adapters::template_store::InMemoryStore`
pub trait TemplateStore: Send + Sync {
    /// Insert or replace a template. Returns the template it replaced.
    fn insert(&self, template: ServiceTemplate) -> GraftResult<Option<ServiceTemplate>>;

    fn get(&self, key: &TemplateKey) -> GraftResult<Option<ServiceTemplate>>;

    /// All templates, ordered by key.
    fn list(&self) -> GraftResult<Vec<ServiceTemplate>>;

    fn remove(&self, key: &TemplateKey) -> GraftResult<Option<ServiceTemplate>>;
}

/// A manifest the loader could not turn into a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedTemplate {
    pub source: PathBuf,
    pub errors: Vec<String>,
}

/// Everything one scan of a template location produced.
#[derive(Debug, Clone, Default)]
pub struct TemplateBatch {
    pub templates: Vec<ServiceTemplate>,
    pub rejected: Vec<RejectedTemplate>,
}

/// Port for discovering template definitions.
///
/// Implemented by:
/// - `graft_adapters::TemplateLoader` (recursive `service.toml` scan)
#[cfg_attr(test, automock)]
pub trait TemplateSource: Send + Sync {
    fn load(&self) -> GraftResult<TemplateBatch>;
}

/// Port for the per-project record of injected services.
///
/// Implemented by:
/// - `graft_adapters::metadata_store::JsonMetadataStore` (`.graft/services.json`)
/// - `graft_adapters::metadata_store::MemoryMetadataStore` (testing)
#[cfg_attr(test, automock)]
pub trait MetadataStore: Send + Sync {
    /// All records for the project; empty when none were ever written.
    fn load(&self, project: &Path) -> GraftResult<Vec<ServiceInjectionMetadata>>;

    /// Replace the project's records. An empty slice clears the store.
    fn save(&self, project: &Path, records: &[ServiceInjectionMetadata]) -> GraftResult<()>;
}

/// A held project lock, released on drop.
pub struct ProjectLock {
    _guard: Option<Box<dyn Send>>,
}

impl ProjectLock {
    pub fn new(guard: impl Send + 'static) -> Self {
        Self {
            _guard: Some(Box::new(guard)),
        }
    }

    /// A lock that guards nothing.
    pub fn noop() -> Self {
        Self { _guard: None }
    }
}

impl std::fmt::Debug for ProjectLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectLock")
            .field("held", &self._guard.is_some())
            .finish()
    }
}

/// Port for exclusive access to a project's metadata.
///
/// Implemented by:
/// - `graft_adapters::lock::FileLocker` (advisory lock on `.graft/lock`)
/// - `graft_adapters::lock::NoopLocker` (testing)
#[cfg_attr(test, automock)]
pub trait ProjectLocker: Send + Sync {
    /// Acquire the lock or fail fast with `ProjectLocked`.
    fn lock(&self, project: &Path) -> GraftResult<ProjectLock>;
}

/// Port for a structured document format (JSON, TOML).
///
/// Documents cross the port as `serde_json::Value` so merging is
/// format-agnostic.
#[cfg_attr(test, automock)]
pub trait StructuredCodec: Send + Sync {
    fn format(&self) -> &'static str;

    fn handles(&self, path: &RelativePath) -> bool;

    fn parse(&self, text: &str) -> GraftResult<Value>;

    fn render(&self, value: &Value) -> GraftResult<String>;
}

/// Port for syntax-aware source edits in one language.
///
/// Implemented by:
/// - `graft_adapters::editor::TypeScriptEditor`
///
/// Every verb takes the current source and returns the edited source. A verb
/// whose effect is already present returns the source unchanged.
#[cfg_attr(test, automock)]
pub trait StructuredEditor: Send + Sync {
    fn language(&self) -> &'static str;

    fn handles(&self, path: &RelativePath) -> bool;

    fn add_import(
        &self,
        source: &str,
        module: &str,
        names: &[String],
        default: Option<String>,
    ) -> GraftResult<String>;

    fn add_export(&self, source: &str, statement: &str) -> GraftResult<String>;

    fn add_declaration(
        &self,
        source: &str,
        name: &str,
        kind: Option<String>,
        declaration: &str,
    ) -> GraftResult<String>;

    fn modify_function(
        &self,
        source: &str,
        name: &str,
        add_parameter: Option<String>,
        add_statement: Option<String>,
    ) -> GraftResult<String>;

    /// Dispatch one edit to its verb.
    fn apply(&self, source: &str, edit: &StructuredEdit) -> GraftResult<String> {
        match edit {
            StructuredEdit::AddImport {
                module,
                names,
                default,
            } => self.add_import(source, module, names, default.clone()),
            StructuredEdit::AddExport { statement } => self.add_export(source, statement),
            StructuredEdit::AddDeclaration { name, kind, source: declaration } => {
                self.add_declaration(source, name, kind.clone(), declaration)
            }
            StructuredEdit::ModifyFunction {
                name,
                add_parameter,
                add_statement,
            } => self.modify_function(source, name, add_parameter.clone(), add_statement.clone()),
        }
    }
}

/// What a finished command reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Port for running post-injection shell commands.
///
/// Implemented by:
/// - `graft_adapters::runner::ProcessCommandRunner`
#[cfg_attr(test, automock)]
pub trait CommandRunner: Send + Sync {
    fn run(&self, command: &str, cwd: &Path) -> GraftResult<CommandOutput>;
}
