//! Application layer errors.
//!
//! These errors represent failures in orchestration and I/O, not business
//! rules. Business rule violations are `DomainError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur during application orchestration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApplicationError {
    /// Filesystem operation failed.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// A template manifest could not be read or parsed.
    #[error("Failed to load template at {path}: {reason}")]
    TemplateLoad { path: PathBuf, reason: String },

    /// The project's metadata file exists but cannot be understood.
    #[error("Service metadata at {path} is corrupt: {reason}")]
    MetadataCorrupt { path: PathBuf, reason: String },

    #[error("No injected service matches '{reference}'")]
    ServiceNotFound { reference: String },

    #[error("'{name}' matches several injected services: {}", .ids.join(", "))]
    AmbiguousService { name: String, ids: Vec<String> },

    /// Another graft process holds the project lock.
    #[error("Project at {path} is locked by another graft process")]
    ProjectLocked { path: PathBuf },

    /// Store access failed (lock poisoned, etc.).
    #[error("Template store error")]
    StoreLockError,

    #[error("Cannot parse {path} as {format}: {reason}")]
    ParseFailed {
        path: String,
        format: &'static str,
        reason: String,
    },

    #[error("No structured format is known for {path}")]
    UnsupportedFormat { path: String },

    #[error("No structured editor handles {path}")]
    NoEditorForPath { path: String },

    #[error("Edit of {path} failed: {reason}")]
    EditFailed { path: String, reason: String },

    #[error("Pattern '{pattern}' not found in {path}")]
    PatternNotFound { path: String, pattern: String },

    #[error("{strategy} requires {path} to exist")]
    TargetMissing {
        path: String,
        strategy: &'static str,
    },

    #[error("Command '{command}' failed: {reason}")]
    CommandFailed { command: String, reason: String },

    /// Port/Adapter not configured.
    #[error("Required adapter not configured: {name}")]
    AdapterNotConfigured { name: &'static str },

    /// Validation failed (application-level, not domain).
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
            ],
            Self::TemplateLoad { path, .. } => vec![
                format!("Check the manifest at {}", path.display()),
                "Run: graft templates --verbose to see rejected templates".into(),
            ],
            Self::MetadataCorrupt { path, .. } => vec![
                format!("Inspect or restore {}", path.display()),
                "Backups of modified files live under .graft/backups/".into(),
            ],
            Self::ServiceNotFound { .. } => vec![
                "Try: graft list to see injected services".into(),
                "Services can be referenced by id or by name".into(),
            ],
            Self::AmbiguousService { .. } => {
                vec!["Use the service id instead of its name".into()]
            }
            Self::ProjectLocked { path } => vec![
                format!("Another graft command is running in {}", path.display()),
                "Wait for it to finish and try again".into(),
            ],
            Self::StoreLockError => vec![
                "The template store is locked".into(),
                "Try again in a moment".into(),
            ],
            Self::NoEditorForPath { .. } | Self::UnsupportedFormat { .. } => vec![
                "The template targets a file type graft cannot edit structurally".into(),
                "Use a text strategy (append, prepend, replace) in the template".into(),
            ],
            Self::AdapterNotConfigured { name } => vec![
                format!("Required component not configured: {}", name),
                "This is likely a configuration error".into(),
            ],
            _ => vec!["Check the error details above".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ServiceNotFound { .. } => ErrorCategory::NotFound,
            Self::AmbiguousService { .. } | Self::ValidationFailed(_) => ErrorCategory::Validation,
            Self::ProjectLocked { .. } => ErrorCategory::Compatibility,
            Self::AdapterNotConfigured { .. } => ErrorCategory::Configuration,
            Self::TemplateLoad { .. } => ErrorCategory::Validation,
            Self::FilesystemError { .. }
            | Self::MetadataCorrupt { .. }
            | Self::StoreLockError
            | Self::ParseFailed { .. }
            | Self::UnsupportedFormat { .. }
            | Self::NoEditorForPath { .. }
            | Self::EditFailed { .. }
            | Self::PatternNotFound { .. }
            | Self::TargetMissing { .. }
            | Self::CommandFailed { .. } => ErrorCategory::Internal,
        }
    }
}
