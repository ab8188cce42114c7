use serde::{Deserialize, Serialize};
use std::fmt;

use super::service::ServiceConfiguration;
use crate::domain::value_objects::ServiceType;

/// A dependency reference with no matching template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MissingDependency {
    pub service_id: String,
    #[serde(default)]
    pub provider: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictKind {
    /// One side lists the other under `conflicts`.
    Explicit,
    /// Both provide a type that allows only one active service.
    Exclusive,
    Circular,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Explicit => "explicit",
            Self::Exclusive => "exclusive",
            Self::Circular => "circular",
        })
    }
}

/// Names one side of a conflict.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceRef {
    pub name: String,
    pub provider: String,
    pub service_type: ServiceType,
}

impl From<&ServiceConfiguration> for ServiceRef {
    fn from(config: &ServiceConfiguration) -> Self {
        Self {
            name: config.name.clone(),
            provider: config.provider.clone(),
            service_type: config.service_type,
        }
    }
}

impl fmt::Display for ServiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/{})", self.name, self.service_type, self.provider)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConflictReport {
    pub first: ServiceRef,
    pub second: ServiceRef,
    pub reason: String,
    pub kind: ConflictKind,
}

impl ConflictReport {
    /// Whether this report is about the unordered pair `{a, b}`.
    pub fn involves_pair(&self, a: &str, b: &str) -> bool {
        (self.first.name == a && self.second.name == b)
            || (self.first.name == b && self.second.name == a)
    }

    pub fn involves(&self, name: &str) -> bool {
        self.first.name == name || self.second.name == name
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-> {}: {}", self.first, self.second, self.reason)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyResolutionResult {
    pub resolved: Vec<ServiceConfiguration>,
    pub missing: Vec<MissingDependency>,
    pub conflicts: Vec<ConflictReport>,
}

impl DependencyResolutionResult {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.conflicts.is_empty()
    }

    pub fn has_cycle(&self) -> bool {
        self.conflicts
            .iter()
            .any(|c| c.kind == ConflictKind::Circular)
    }
}

/// Resolution and ordering folded into one answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityReport {
    pub compatible: bool,
    pub conflicts: Vec<ConflictReport>,
    pub missing: Vec<MissingDependency>,
    /// Service names in injection order; empty when a cycle blocks ordering.
    pub order: Vec<String>,
}

impl CompatibilityReport {
    /// Human-readable lines, one per problem.
    pub fn reasons(&self) -> Vec<String> {
        self.conflicts
            .iter()
            .map(ToString::to_string)
            .chain(
                self.missing
                    .iter()
                    .map(|m| format!("missing dependency '{}': {}", m.service_id, m.reason)),
            )
            .collect()
    }
}

/// Advisory output of the suggestion heuristics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSuggestion {
    pub service_type: ServiceType,
    pub reason: String,
    /// Providers with a registered template, if any.
    pub providers: Vec<String>,
}
