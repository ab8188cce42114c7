// ============================================================================
// domain/error.rs - DOMAIN ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (results carry them by value)
/// - Categorizable (for CLI display and exit codes)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Validation Errors (400-level equivalent)
    // ========================================================================
    /// A template definition broke one or more structural rules.
    ///
    /// Every problem found is listed, not just the first one.
    #[error("Invalid template '{template}': {}", .errors.join("; "))]
    InvalidTemplate {
        template: String,
        errors: Vec<String>,
    },

    #[error("Invalid configuration for service '{service}': {}", .errors.join("; "))]
    InvalidConfiguration {
        service: String,
        errors: Vec<String>,
    },

    #[error("unknown service type '{0}'")]
    UnknownServiceType(String),

    #[error("Invalid condition: {0}")]
    InvalidCondition(String),

    #[error("Absolute paths not allowed: {path}")]
    AbsolutePathNotAllowed { path: String },

    #[error("Path escapes the project root: {path}")]
    PathEscapesProject { path: String },

    #[error("Required field missing: {field}")]
    MissingRequiredField { field: &'static str },

    // ========================================================================
    // Compatibility Errors (409-level equivalent)
    // ========================================================================
    #[error("Service '{service}' cannot be added: {}", .reasons.join("; "))]
    Incompatible {
        service: String,
        reasons: Vec<String>,
    },

    /// Never overridable: ordering cannot proceed while this holds.
    #[error("Circular dependency between: {}", .nodes.join(", "))]
    DependencyCycle { nodes: Vec<String> },

    // ========================================================================
    // Not Found Errors (404-level equivalent)
    // ========================================================================
    #[error("No template registered for {key}")]
    TemplateNotFound { key: String },
}

impl DomainError {
    /// Shorthand for a single-message template error.
    pub fn invalid_template(template: impl Into<String>, error: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            template: template.into(),
            errors: vec![error.into()],
        }
    }

    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidTemplate { template, errors } => {
                let mut out = vec![format!("Template '{}' failed validation:", template)];
                out.extend(errors.iter().map(|e| format!("  • {e}")));
                out.push("Fix the service.toml manifest and try again".into());
                out
            }
            Self::InvalidConfiguration { errors, .. } => {
                let mut out: Vec<String> = errors.iter().map(|e| format!("  • {e}")).collect();
                out.push("Pass missing values with --set key=value".into());
                out
            }
            Self::UnknownServiceType(_) => vec![
                "Supported service types:".into(),
                "  database, auth, payment, notification, analytics, monitoring,".into(),
                "  cache, storage, api, messaging, search, cdn, logger".into(),
            ],
            Self::Incompatible { reasons, .. } => {
                let mut out: Vec<String> = reasons.iter().map(|r| format!("  • {r}")).collect();
                out.push("Remove the conflicting service first: graft remove <id>".into());
                out.push("Or force the injection with --overwrite".into());
                out
            }
            Self::DependencyCycle { nodes } => vec![
                format!("These services depend on each other: {}", nodes.join(" -> ")),
                "Break the cycle by removing one of the declared dependencies".into(),
            ],
            Self::TemplateNotFound { key } => vec![
                format!("No template found for {}", key),
                "Try: graft templates to see available templates".into(),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidTemplate { .. }
            | Self::InvalidConfiguration { .. }
            | Self::UnknownServiceType(_)
            | Self::InvalidCondition(_)
            | Self::AbsolutePathNotAllowed { .. }
            | Self::PathEscapesProject { .. }
            | Self::MissingRequiredField { .. } => ErrorCategory::Validation,
            Self::Incompatible { .. } => ErrorCategory::Compatibility,
            Self::DependencyCycle { .. } => ErrorCategory::Cycle,
            Self::TemplateNotFound { .. } => ErrorCategory::NotFound,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Compatibility,
    Cycle,
    NotFound,
    Internal,
}
