//! Fragment rendering.
//!
//! Fragments are plain text with `{{VARIABLE}}` placeholders. Rendering is a
//! linear scan-and-replace; there are no conditionals or loops. Anything that
//! needs branching belongs in an injection point [`Condition`] instead.
//!
//! [`Condition`]: super::condition::Condition

use std::collections::{BTreeMap, HashMap};

use chrono::Datelike;
use serde_json::Value;

use super::service::ServiceConfiguration;

/// Context for fragment rendering.
///
/// ## Built-in Variables
///
/// | Variable | Example | Source |
/// |----------|---------|--------|
/// | `SERVICE_NAME` | "Billing Gateway" | Configuration name |
/// | `SERVICE_NAME_SNAKE` | "billing_gateway" | Computed |
/// | `SERVICE_NAME_KEBAB` | "billing-gateway" | Computed |
/// | `SERVICE_NAME_PASCAL` | "BillingGateway" | Computed |
/// | `PROVIDER` | "stripe" | Configuration provider |
/// | `SERVICE_TYPE` | "payment" | Configuration type |
/// | `ENVIRONMENT` | "production" | Injection options |
/// | `YEAR` | "2026" | System time |
/// | `config.<key>` | "sk_test_..." | Configuration values |
///
/// String config values render verbatim; every other JSON value renders as
/// its compact JSON text.
#[derive(Debug, Clone)]
pub struct RenderContext {
    service_name: String,
    variables: HashMap<String, String>,
}

impl RenderContext {
    pub fn new(service_name: impl Into<String>) -> Self {
        let name = service_name.into();
        let mut vars = HashMap::new();

        vars.insert("SERVICE_NAME".to_string(), name.clone());
        vars.insert("SERVICE_NAME_SNAKE".to_string(), to_snake_case(&name));
        vars.insert("SERVICE_NAME_KEBAB".to_string(), to_kebab_case(&name));
        vars.insert("SERVICE_NAME_PASCAL".to_string(), to_pascal_case(&name));
        vars.insert("YEAR".to_string(), chrono::Utc::now().year().to_string());

        Self {
            service_name: name,
            variables: vars,
        }
    }

    /// Build the full context for one injection.
    pub fn for_service(config: &ServiceConfiguration, environment: &str) -> Self {
        Self::new(config.name.clone())
            .with_variable("PROVIDER", config.provider.clone())
            .with_variable("SERVICE_TYPE", config.service_type.as_str())
            .with_variable("ENVIRONMENT", environment)
            .with_config(&config.config)
    }

    /// Add a custom variable, consuming self and returning a new context.
    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    /// Expose every configuration entry as `config.<key>`.
    pub fn with_config(mut self, config: &BTreeMap<String, Value>) -> Self {
        for (key, value) in config {
            let rendered = match value {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            self.variables.insert(format!("config.{key}"), rendered);
        }
        self
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(|s| s.as_str())
    }

    /// Replace every `{{VARIABLE}}` placeholder.
    ///
    /// Unknown placeholders stay as literal text.
    pub fn render(&self, template: &str) -> String {
        if !template.contains("{{") {
            return template.to_string();
        }

        let mut result = template.to_string();
        for (key, value) in &self.variables {
            let placeholder = format!("{{{{{key}}}}}");
            result = result.replace(&placeholder, value);
        }
        result
    }
}

// ============================================================================
// String Case Conversion Helpers
// ============================================================================

pub(crate) fn to_snake_case(s: &str) -> String {
    split_words(s).join("_")
}

pub(crate) fn to_kebab_case(s: &str) -> String {
    split_words(s).join("-")
}

pub(crate) fn to_pascal_case(s: &str) -> String {
    split_words(s)
        .into_iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => {
                    let mut out = String::new();
                    out.extend(first.to_uppercase());
                    out.push_str(chars.as_str());
                    out
                }
                None => String::new(),
            }
        })
        .collect()
}

/// Split an identifier into lowercase words.
///
/// Boundaries: explicit separators (`_`, `-`, `.`, whitespace), a
/// lowercase-to-uppercase transition (`myApp`) and the end of an acronym
/// (`HTTPServer` splits before `S`).
fn split_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '_' || c == '-' || c == '.' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(current.to_lowercase());
                current.clear();
            }
            continue;
        }

        if let Some(&next) = chars.peek() {
            if c.is_lowercase() && next.is_uppercase() {
                current.push(c);
                words.push(current.to_lowercase());
                current.clear();
                continue;
            }

            if c.is_uppercase()
                && next.is_uppercase()
                && chars.clone().nth(1).is_some_and(|n| n.is_lowercase())
            {
                current.push(c);
                words.push(current.to_lowercase());
                current.clear();
                continue;
            }
        }

        current.push(c);
    }

    if !current.is_empty() {
        words.push(current.to_lowercase());
    }

    words
}
