//! Caller-supplied service configuration and the durable record of an
//! injection.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::common::RelativePath;
use super::template::{PackageRef, ServiceTemplate, TemplateKey};
use crate::domain::error::DomainError;
use crate::domain::value_objects::ServiceType;

fn default_enabled() -> bool {
    true
}

/// What the caller wants injected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfiguration {
    pub name: String,
    pub service_type: ServiceType,
    pub provider: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub config: BTreeMap<String, Value>,
    /// Environments this service applies to; empty means all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environments: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<String>,
}

impl ServiceConfiguration {
    pub fn new(
        name: impl Into<String>,
        service_type: ServiceType,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            service_type,
            provider: provider.into(),
            enabled: true,
            config: BTreeMap::new(),
            environments: Vec::new(),
            dependencies: Vec::new(),
            conflicts: Vec::new(),
        }
    }

    /// The minimal configuration used for an auto-added dependency.
    pub fn placeholder_for(template: &ServiceTemplate) -> Self {
        Self::new(
            template.name.clone(),
            template.service_type,
            template.provider.clone(),
        )
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    pub fn depends_on(mut self, reference: impl Into<String>) -> Self {
        self.dependencies.push(reference.into());
        self
    }

    pub fn conflicts_with(mut self, reference: impl Into<String>) -> Self {
        self.conflicts.push(reference.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn key(&self) -> TemplateKey {
        TemplateKey::new(self.service_type, &self.provider)
    }

    /// Whether a dependency or conflict reference names this service.
    pub fn matches_reference(&self, reference: &str) -> bool {
        let reference = reference.trim();
        self.name.eq_ignore_ascii_case(reference) || self.provider.eq_ignore_ascii_case(reference)
    }

    pub fn applies_to(&self, environment: &str) -> bool {
        self.environments.is_empty()
            || self
                .environments
                .iter()
                .any(|e| e.eq_ignore_ascii_case(environment))
    }

    /// Overlay `overrides` onto the configuration map (shallow, key by key).
    pub fn merge_config(&mut self, overrides: &BTreeMap<String, Value>) {
        for (key, value) in overrides {
            self.config.insert(key.clone(), value.clone());
        }
    }

    /// Fill configuration defaults declared by the template.
    pub fn apply_defaults(&mut self, template: &ServiceTemplate) {
        for field in &template.config_fields {
            if let Some(default) = &field.default {
                self.config
                    .entry(field.key.clone())
                    .or_insert_with(|| default.clone());
            }
        }
    }

    /// Check required configuration fields, reporting all that are missing.
    pub fn validate_against(&self, template: &ServiceTemplate) -> Result<(), DomainError> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("service name must not be empty".to_string());
        }

        for field in template.config_fields.iter().filter(|f| f.required) {
            let missing = match self.config.get(&field.key) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            };
            if missing && field.default.is_none() {
                errors.push(format!("missing required config field '{}'", field.key));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::InvalidConfiguration {
                service: self.name.clone(),
                errors,
            })
        }
    }
}

/// The durable record of one successful injection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInjectionMetadata {
    pub id: Uuid,
    pub configuration: ServiceConfiguration,
    pub injected_at: DateTime<Utc>,
    pub environment: String,
    pub template_version: String,
    /// Files and directories the injection brought into existence.
    #[serde(default)]
    pub files_created: Vec<RelativePath>,
    /// Every file the injection wrote, created ones included.
    #[serde(default)]
    pub files_modified: Vec<RelativePath>,
    #[serde(default)]
    pub env_vars_added: Vec<String>,
    #[serde(default)]
    pub dependencies_added: Vec<PackageRef>,
}

impl ServiceInjectionMetadata {
    pub fn new(
        configuration: ServiceConfiguration,
        environment: impl Into<String>,
        template_version: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            configuration,
            injected_at: Utc::now(),
            environment: environment.into(),
            template_version: template_version.into(),
            files_created: Vec::new(),
            files_modified: Vec::new(),
            env_vars_added: Vec::new(),
            dependencies_added: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.configuration.name
    }

    /// Files the injection wrote that existed before it ran.
    pub fn pre_existing_files(&self) -> impl Iterator<Item = &RelativePath> {
        self.files_modified
            .iter()
            .filter(|p| !self.files_created.contains(p))
    }
}
