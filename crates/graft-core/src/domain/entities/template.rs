//! Service template aggregate.
//!
//! A [`ServiceTemplate`] is the immutable, declarative description of one
//! provider's integration: which files to touch and how, which environment
//! variables and packages it needs, and which other services it requires or
//! refuses to coexist with.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ServiceTemplate (Aggregate Root)                           │
//! │  ├── TemplateKey (service_type, provider) - identity        │
//! │  ├── Vec<InjectionPoint>                                    │
//! │  │    ├── target: RelativePath                              │
//! │  │    ├── kind: file | directory | config                   │
//! │  │    ├── condition: Option<Condition>                      │
//! │  │    ├── priority: i32 (higher first)                      │
//! │  │    └── mutation: Mutation (tagged by strategy)           │
//! │  ├── Vec<EnvVariableSpec>                                   │
//! │  ├── Vec<DependencySpec> (packages)                         │
//! │  ├── Vec<PostInjectionStep>                                 │
//! │  ├── requires / conflicts (service references)              │
//! │  └── Vec<ConfigFieldSpec>                                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Decisions
//!
//! ### 1. Why a tagged `Mutation` instead of `strategy` + optional fields?
//!
//! Each strategy carries exactly the data it needs. A `Replace` may hold a
//! `pattern`; an `AstModify` holds a [`StructuredEdit`] and nothing else. An
//! injection point with an AST edit but no fragment, or a fragment but no
//! strategy, cannot be expressed.
//!
//! ### 2. Why is validation aggregated?
//!
//! Template authors fix manifests in batches. [`ServiceTemplate::validate`]
//! walks the whole definition and reports every problem in one
//! [`DomainError::InvalidTemplate`].

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::RelativePath;
use super::condition::Condition;
use crate::domain::error::DomainError;
use crate::domain::value_objects::{DependencyKind, InjectionKind, ServiceType};

// ============================================================================
// Identity
// ============================================================================

/// Uniqueness key of a template: `(service_type, provider)`.
///
/// Providers compare case-insensitively; the key stores them lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateKey {
    pub service_type: ServiceType,
    pub provider: String,
}

impl TemplateKey {
    pub fn new(service_type: ServiceType, provider: impl AsRef<str>) -> Self {
        Self {
            service_type,
            provider: provider.as_ref().trim().to_ascii_lowercase(),
        }
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service_type, self.provider)
    }
}

// ============================================================================
// Injection points
// ============================================================================

/// An edit expressed against a language's syntax rather than its text.
///
/// The engine never interprets these itself; it hands them to the
/// `StructuredEditor` registered for the target file's language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum StructuredEdit {
    /// `import Default, { a, b } from "module";`
    AddImport {
        module: String,
        #[serde(default)]
        names: Vec<String>,
        #[serde(default)]
        default: Option<String>,
    },
    /// A complete export statement, appended when absent.
    AddExport { statement: String },
    /// A top-level declaration, skipped when `name` is already declared.
    AddDeclaration {
        name: String,
        #[serde(default)]
        kind: Option<String>,
        source: String,
    },
    /// Adjust an existing function's signature and/or body.
    ModifyFunction {
        name: String,
        #[serde(default)]
        add_parameter: Option<String>,
        #[serde(default)]
        add_statement: Option<String>,
    },
}

impl StructuredEdit {
    pub fn verb(&self) -> &'static str {
        match self {
            Self::AddImport { .. } => "add-import",
            Self::AddExport { .. } => "add-export",
            Self::AddDeclaration { .. } => "add-declaration",
            Self::ModifyFunction { .. } => "modify-function",
        }
    }

    fn collect_errors(&self, errors: &mut Vec<String>, at: &str) {
        match self {
            Self::AddImport {
                module,
                names,
                default,
            } => {
                if module.trim().is_empty() {
                    errors.push(format!("{at}: add-import needs a module"));
                }
                if names.is_empty() && default.is_none() {
                    errors.push(format!("{at}: add-import needs names or a default binding"));
                }
            }
            Self::AddExport { statement } => {
                if statement.trim().is_empty() {
                    errors.push(format!("{at}: add-export statement is empty"));
                }
            }
            Self::AddDeclaration { name, source, .. } => {
                if name.trim().is_empty() || source.trim().is_empty() {
                    errors.push(format!("{at}: add-declaration needs a name and a source"));
                }
            }
            Self::ModifyFunction {
                name,
                add_parameter,
                add_statement,
            } => {
                if name.trim().is_empty() {
                    errors.push(format!("{at}: modify-function needs a function name"));
                }
                if add_parameter.is_none() && add_statement.is_none() {
                    errors.push(format!(
                        "{at}: modify-function needs add_parameter or add_statement"
                    ));
                }
            }
        }
    }
}

/// How an injection point changes its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum Mutation {
    /// Overwrite the file, or with `pattern` replace every occurrence.
    Replace {
        fragment: String,
        #[serde(default)]
        pattern: Option<String>,
    },
    Append {
        fragment: String,
    },
    Prepend {
        fragment: String,
    },
    /// Structured merge when the format is known, append otherwise.
    Merge {
        fragment: String,
    },
    /// Deep merge of a JSON or TOML document.
    StructuredMerge {
        fragment: String,
    },
    AstModify {
        edit: StructuredEdit,
    },
}

impl Mutation {
    pub fn strategy(&self) -> &'static str {
        match self {
            Self::Replace { .. } => "replace",
            Self::Append { .. } => "append",
            Self::Prepend { .. } => "prepend",
            Self::Merge { .. } => "merge",
            Self::StructuredMerge { .. } => "structured-merge",
            Self::AstModify { .. } => "ast-modify",
        }
    }

    pub fn fragment(&self) -> Option<&str> {
        match self {
            Self::Replace { fragment, .. }
            | Self::Append { fragment }
            | Self::Prepend { fragment }
            | Self::Merge { fragment }
            | Self::StructuredMerge { fragment } => Some(fragment),
            Self::AstModify { .. } => None,
        }
    }
}

/// One place a template changes the project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjectionPoint {
    pub target: RelativePath,
    #[serde(default)]
    pub kind: InjectionKind,
    #[serde(default)]
    pub condition: Option<Condition>,
    #[serde(default)]
    pub priority: i32,
    pub mutation: Mutation,
    #[serde(default)]
    pub description: Option<String>,
}

impl InjectionPoint {
    pub fn new(target: RelativePath, mutation: Mutation) -> Self {
        Self {
            target,
            kind: InjectionKind::File,
            condition: None,
            priority: 0,
            mutation,
            description: None,
        }
    }

    pub fn directory(target: RelativePath) -> Self {
        Self {
            kind: InjectionKind::Directory,
            ..Self::new(
                target,
                Mutation::Append {
                    fragment: String::new(),
                },
            )
        }
    }

    pub fn with_kind(mut self, kind: InjectionKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn collect_errors(&self, index: usize, errors: &mut Vec<String>) {
        let at = format!("injection point #{} ({})", index + 1, self.target);

        if let Some(condition) = &self.condition {
            if let Err(e) = condition.validate() {
                errors.push(format!("{at}: {e}"));
            }
        }

        if self.kind == InjectionKind::Directory {
            return;
        }

        match &self.mutation {
            Mutation::Replace { fragment, pattern } => {
                if pattern.as_deref().is_some_and(str::is_empty) {
                    errors.push(format!("{at}: replace pattern must not be empty"));
                }
                if pattern.is_none() && fragment.is_empty() {
                    errors.push(format!("{at}: replace needs a fragment"));
                }
            }
            Mutation::AstModify { edit } => {
                if self.kind != InjectionKind::File {
                    errors.push(format!("{at}: ast-modify only applies to file points"));
                }
                edit.collect_errors(errors, &at);
            }
            other => {
                if other.fragment().is_some_and(|f| f.trim().is_empty()) {
                    errors.push(format!("{at}: {} needs a fragment", other.strategy()));
                }
            }
        }
    }
}

// ============================================================================
// Requirements
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVariableSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<String>,
    /// Configuration key that supplies this variable, when not `name` itself.
    #[serde(default)]
    pub config_key: Option<String>,
}

impl EnvVariableSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            required: false,
            default: None,
            config_key: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_config_key(mut self, key: impl Into<String>) -> Self {
        self.config_key = Some(key.into());
        self
    }

    /// Whether `config` supplies a value for this variable.
    pub fn is_set_by(&self, config: &std::collections::BTreeMap<String, Value>) -> bool {
        let present = |key: &str| {
            config
                .get(key)
                .is_some_and(|v| !v.is_null() && v.as_str() != Some(""))
        };
        present(&self.name) || self.config_key.as_deref().is_some_and(present)
    }
}

/// A package the service needs in the target project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencySpec {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub kind: DependencyKind,
    #[serde(default)]
    pub condition: Option<Condition>,
}

impl DependencySpec {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            kind: DependencyKind::Runtime,
            condition: None,
        }
    }

    pub fn with_kind(mut self, kind: DependencyKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn to_package_ref(&self) -> PackageRef {
        PackageRef {
            name: self.name.clone(),
            version: self.version.clone(),
            kind: self.kind,
        }
    }
}

/// A package actually recorded as added by an injection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageRef {
    pub name: String,
    pub version: String,
    pub kind: DependencyKind,
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} ({})", self.name, self.version, self.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostInjectionStep {
    pub description: String,
    #[serde(default)]
    pub command: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigFieldSpec {
    pub key: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub description: String,
}

// ============================================================================
// Aggregate root
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceTemplate {
    pub name: String,
    pub service_type: ServiceType,
    pub provider: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    pub injection_points: Vec<InjectionPoint>,
    #[serde(default)]
    pub env_variables: Vec<EnvVariableSpec>,
    #[serde(default)]
    pub dependencies: Vec<DependencySpec>,
    #[serde(default)]
    pub post_injection_steps: Vec<PostInjectionStep>,
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default)]
    pub conflicts: Vec<String>,
    #[serde(default)]
    pub config_fields: Vec<ConfigFieldSpec>,
}

impl ServiceTemplate {
    pub fn builder(
        name: impl Into<String>,
        service_type: ServiceType,
        provider: impl Into<String>,
    ) -> ServiceTemplateBuilder {
        ServiceTemplateBuilder::new(name, service_type, provider)
    }

    pub fn key(&self) -> TemplateKey {
        TemplateKey::new(self.service_type, &self.provider)
    }

    /// Whether a dependency or conflict reference names this template.
    pub fn matches_reference(&self, reference: &str) -> bool {
        let reference = reference.trim();
        self.name.eq_ignore_ascii_case(reference) || self.provider.eq_ignore_ascii_case(reference)
    }

    /// Injection points in application order: descending priority, stable.
    pub fn ordered_points(&self) -> Vec<&InjectionPoint> {
        let mut points: Vec<&InjectionPoint> = self.injection_points.iter().collect();
        points.sort_by(|a, b| b.priority.cmp(&a.priority));
        points
    }

    /// Check every structural rule and report all violations at once.
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("name must not be empty".to_string());
        }
        if self.provider.trim().is_empty() {
            errors.push("provider must not be empty".to_string());
        } else if !self
            .provider
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            errors.push(format!(
                "provider '{}' may only contain letters, digits, '-', '_' and '.'",
                self.provider
            ));
        }
        if self.version.trim().is_empty() {
            errors.push("version must not be empty".to_string());
        }
        if self.injection_points.is_empty() {
            errors.push("at least one injection point is required".to_string());
        }

        for (index, point) in self.injection_points.iter().enumerate() {
            point.collect_errors(index, &mut errors);
        }

        let mut seen_env = HashSet::new();
        for var in &self.env_variables {
            if !is_env_name(&var.name) {
                errors.push(format!(
                    "environment variable '{}' must be UPPER_SNAKE_CASE",
                    var.name
                ));
            }
            if !seen_env.insert(var.name.as_str()) {
                errors.push(format!("environment variable '{}' declared twice", var.name));
            }
        }

        for dep in &self.dependencies {
            if dep.name.trim().is_empty() {
                errors.push("package dependency name must not be empty".to_string());
            }
            if dep.version.trim().is_empty() {
                errors.push(format!("package '{}' needs a version", dep.name));
            }
            if let Some(Err(e)) = dep.condition.as_ref().map(Condition::validate) {
                errors.push(format!("package '{}': {e}", dep.name));
            }
        }

        for step in &self.post_injection_steps {
            if step.description.trim().is_empty() {
                errors.push("post-injection step needs a description".to_string());
            }
        }

        let mut seen_fields = HashSet::new();
        for field in &self.config_fields {
            if field.key.trim().is_empty() {
                errors.push("config field key must not be empty".to_string());
            } else if !seen_fields.insert(field.key.as_str()) {
                errors.push(format!("config field '{}' declared twice", field.key));
            }
        }

        for reference in &self.requires {
            if self.matches_reference(reference) {
                errors.push(format!("template cannot require itself ('{reference}')"));
            }
        }
        for reference in &self.conflicts {
            if self.requires.iter().any(|r| r.eq_ignore_ascii_case(reference)) {
                errors.push(format!("'{reference}' is both required and conflicting"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::InvalidTemplate {
                template: self.key().to_string(),
                errors,
            })
        }
    }
}

fn is_env_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase() || c == '_')
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

// ============================================================================
// Builder
// ============================================================================

/// Fluent construction of a [`ServiceTemplate`], validated on `build`.
#[derive(Debug, Clone)]
pub struct ServiceTemplateBuilder {
    template: ServiceTemplate,
}

impl ServiceTemplateBuilder {
    fn new(name: impl Into<String>, service_type: ServiceType, provider: impl Into<String>) -> Self {
        Self {
            template: ServiceTemplate {
                name: name.into(),
                service_type,
                provider: provider.into(),
                version: "1.0.0".to_string(),
                description: String::new(),
                injection_points: Vec::new(),
                env_variables: Vec::new(),
                dependencies: Vec::new(),
                post_injection_steps: Vec::new(),
                requires: Vec::new(),
                conflicts: Vec::new(),
                config_fields: Vec::new(),
            },
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.template.version = version.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.template.description = description.into();
        self
    }

    pub fn point(mut self, point: InjectionPoint) -> Self {
        self.template.injection_points.push(point);
        self
    }

    pub fn env_var(mut self, var: EnvVariableSpec) -> Self {
        self.template.env_variables.push(var);
        self
    }

    pub fn dependency(mut self, dep: DependencySpec) -> Self {
        self.template.dependencies.push(dep);
        self
    }

    pub fn step(mut self, description: impl Into<String>, command: Option<&str>) -> Self {
        self.template.post_injection_steps.push(PostInjectionStep {
            description: description.into(),
            command: command.map(str::to_string),
        });
        self
    }

    pub fn requires(mut self, reference: impl Into<String>) -> Self {
        self.template.requires.push(reference.into());
        self
    }

    pub fn conflicts_with(mut self, reference: impl Into<String>) -> Self {
        self.template.conflicts.push(reference.into());
        self
    }

    pub fn config_field(mut self, key: impl Into<String>, required: bool) -> Self {
        self.template.config_fields.push(ConfigFieldSpec {
            key: key.into(),
            required,
            default: None,
            description: String::new(),
        });
        self
    }

    pub fn config_field_with_default(mut self, key: impl Into<String>, default: Value) -> Self {
        self.template.config_fields.push(ConfigFieldSpec {
            key: key.into(),
            required: true,
            default: Some(default),
            description: String::new(),
        });
        self
    }

    pub fn build(self) -> Result<ServiceTemplate, DomainError> {
        self.template.validate()?;
        Ok(self.template)
    }
}
