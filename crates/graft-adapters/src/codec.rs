//! Structured document codecs for `merge` and `structured-merge` points.
//!
//! Both codecs go through `serde_json::Value`, so the engine's deep merge is
//! the same for every format. Key order is preserved on the way through.

use serde_json::Value;

use graft_core::{
    application::{ApplicationError, ports::StructuredCodec},
    domain::RelativePath,
    error::GraftResult,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl StructuredCodec for JsonCodec {
    fn format(&self) -> &'static str {
        "json"
    }

    fn handles(&self, path: &RelativePath) -> bool {
        matches!(path.extension().as_deref(), Some("json"))
    }

    fn parse(&self, text: &str) -> GraftResult<Value> {
        if text.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        serde_json::from_str(text).map_err(|e| {
            ApplicationError::ParseFailed {
                path: String::new(),
                format: "json",
                reason: e.to_string(),
            }
            .into()
        })
    }

    fn render(&self, value: &Value) -> GraftResult<String> {
        let mut text = serde_json::to_string_pretty(value).map_err(|e| {
            ApplicationError::ParseFailed {
                path: String::new(),
                format: "json",
                reason: e.to_string(),
            }
        })?;
        text.push('\n');
        Ok(text)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TomlCodec;

impl StructuredCodec for TomlCodec {
    fn format(&self) -> &'static str {
        "toml"
    }

    fn handles(&self, path: &RelativePath) -> bool {
        matches!(path.extension().as_deref(), Some("toml"))
    }

    fn parse(&self, text: &str) -> GraftResult<Value> {
        toml::from_str(text).map_err(|e| {
            ApplicationError::ParseFailed {
                path: String::new(),
                format: "toml",
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// TOML has no null; null values are dropped before rendering.
    fn render(&self, value: &Value) -> GraftResult<String> {
        toml::to_string_pretty(&without_nulls(value.clone())).map_err(|e| {
            ApplicationError::ParseFailed {
                path: String::new(),
                format: "toml",
                reason: e.to_string(),
            }
            .into()
        })
    }
}

fn without_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, without_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter(|v| !v.is_null())
                .map(without_nulls)
                .collect(),
        ),
        other => other,
    }
}
