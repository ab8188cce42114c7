//! Plain-data options and results of the engine API.
//!
//! Every mutating call returns one of these structs instead of a bare
//! `Result`: typed errors and warning strings travel together, and callers
//! can serialize the whole outcome.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{PackageRef, RelativePath, ServiceType};
use crate::error::GraftError;

pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Caller switches for inject, remove and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectionOptions {
    /// Plan only: report paths, write nothing.
    pub dry_run: bool,
    /// Downgrade compatibility failures to warnings.
    pub overwrite: bool,
    /// Skip required-config validation.
    pub skip_validation: bool,
    /// Snapshot existing targets to `.graft/backups/<timestamp>/` first.
    pub backup_files: bool,
    pub environment: String,
    /// Shallow overrides applied on top of the configuration.
    pub custom_config: BTreeMap<String, Value>,
}

impl Default for InjectionOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            overwrite: false,
            skip_validation: false,
            backup_files: false,
            environment: DEFAULT_ENVIRONMENT.to_string(),
            custom_config: BTreeMap::new(),
        }
    }
}

impl InjectionOptions {
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn overwrite(mut self) -> Self {
        self.overwrite = true;
        self
    }

    pub fn skip_validation(mut self) -> Self {
        self.skip_validation = true;
        self
    }

    pub fn with_backups(mut self) -> Self {
        self.backup_files = true;
        self
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.custom_config.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InjectionResult {
    pub success: bool,
    pub dry_run: bool,
    pub service_id: Option<Uuid>,
    /// Every file target written, whether or not it existed before.
    pub files_modified: Vec<RelativePath>,
    /// Targets and parent directories that did not exist before.
    pub files_created: Vec<RelativePath>,
    pub env_vars_added: Vec<String>,
    pub dependencies_added: Vec<PackageRef>,
    pub next_steps: Vec<String>,
    pub errors: Vec<GraftError>,
    pub warnings: Vec<String>,
}

impl InjectionResult {
    pub(crate) fn failed(error: impl Into<GraftError>, warnings: Vec<String>) -> Self {
        Self {
            errors: vec![error.into()],
            warnings,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RemovalResult {
    pub success: bool,
    pub dry_run: bool,
    pub service_id: Option<Uuid>,
    /// Files and directories the injection created and this removal deleted
    /// (or would delete).
    pub files_removed: Vec<RelativePath>,
    /// Created files that were already gone.
    pub files_skipped: Vec<RelativePath>,
    /// Pre-existing files the service modified; left in place.
    pub files_retained: Vec<RelativePath>,
    pub errors: Vec<GraftError>,
    pub warnings: Vec<String>,
}

impl RemovalResult {
    pub(crate) fn failed(error: impl Into<GraftError>) -> Self {
        Self {
            errors: vec![error.into()],
            ..Self::default()
        }
    }
}

/// Remove-then-reinject outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateResult {
    pub success: bool,
    pub removal: RemovalResult,
    pub injection: InjectionResult,
}

/// Catalog summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemplateStatistics {
    pub total: usize,
    /// Manifests skipped at load because they failed validation.
    pub rejected: usize,
    pub by_type: HashMap<ServiceType, usize>,
    pub by_provider: HashMap<String, usize>,
}

/// Template summary for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateInfo {
    pub key: String,
    pub name: String,
    pub service_type: ServiceType,
    pub provider: String,
    pub version: String,
    pub description: String,
    pub injection_points: usize,
    pub requires: Vec<String>,
}
