//! Typed predicates that guard injection points and package dependencies.
//!
//! Conditions are data, not code: a template author writes them in the
//! manifest as a small tree and the engine evaluates them against the
//! service configuration, the target environment and the project on disk.
//!
//! ```toml
//! [injection_points.condition]
//! op = "all"
//! conditions = [
//!     { op = "equals", key = "mode", value = "subscriptions" },
//!     { op = "not", condition = { op = "file-exists", path = "src/billing.ts" } },
//! ]
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::RelativePath;
use crate::domain::error::DomainError;

/// A predicate tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Condition {
    Always,
    Equals {
        key: String,
        value: Value,
    },
    NotEquals {
        key: String,
        value: Value,
    },
    /// True when the key is present and neither null nor an empty string.
    IsSet {
        key: String,
    },
    /// True when the injection environment is one of `any_of`.
    Environment {
        any_of: Vec<String>,
    },
    FileExists {
        path: String,
    },
    Not {
        condition: Box<Condition>,
    },
    All {
        conditions: Vec<Condition>,
    },
    Any {
        conditions: Vec<Condition>,
    },
}

/// Everything a condition may look at.
pub struct ConditionContext<'a> {
    pub config: &'a BTreeMap<String, Value>,
    pub environment: &'a str,
    pub exists: &'a dyn Fn(&RelativePath) -> bool,
}

impl<'a> ConditionContext<'a> {
    pub fn new(
        config: &'a BTreeMap<String, Value>,
        environment: &'a str,
        exists: &'a dyn Fn(&RelativePath) -> bool,
    ) -> Self {
        Self {
            config,
            environment,
            exists,
        }
    }

    /// Look a key up, falling back to a dotted walk into nested objects.
    fn lookup(&self, key: &str) -> Option<&'a Value> {
        if let Some(value) = self.config.get(key) {
            return Some(value);
        }

        let mut parts = key.split('.');
        let mut current = self.config.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }
}

impl Condition {
    pub fn evaluate(&self, ctx: &ConditionContext<'_>) -> bool {
        match self {
            Self::Always => true,
            Self::Equals { key, value } => ctx.lookup(key).is_some_and(|v| loosely_equal(v, value)),
            Self::NotEquals { key, value } => {
                !ctx.lookup(key).is_some_and(|v| loosely_equal(v, value))
            }
            Self::IsSet { key } => match ctx.lookup(key) {
                None | Some(Value::Null) => false,
                Some(Value::String(s)) => !s.is_empty(),
                Some(_) => true,
            },
            Self::Environment { any_of } => any_of
                .iter()
                .any(|env| env.eq_ignore_ascii_case(ctx.environment)),
            Self::FileExists { path } => RelativePath::try_new(path)
                .map(|p| (ctx.exists)(&p))
                .unwrap_or(false),
            Self::Not { condition } => !condition.evaluate(ctx),
            Self::All { conditions } => conditions.iter().all(|c| c.evaluate(ctx)),
            Self::Any { conditions } => conditions.iter().any(|c| c.evaluate(ctx)),
        }
    }

    /// Structural checks, collected rather than short-circuited.
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut errors = Vec::new();
        self.collect_errors(&mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::InvalidCondition(errors.join("; ")))
        }
    }

    fn collect_errors(&self, errors: &mut Vec<String>) {
        match self {
            Self::Equals { key, .. } | Self::NotEquals { key, .. } | Self::IsSet { key } => {
                if key.trim().is_empty() {
                    errors.push("condition key must not be empty".into());
                }
            }
            Self::Environment { any_of } => {
                if any_of.is_empty() {
                    errors.push("environment condition needs at least one environment".into());
                }
            }
            Self::FileExists { path } => {
                if let Err(e) = RelativePath::try_new(path) {
                    errors.push(format!("file-exists path: {e}"));
                }
            }
            Self::Not { condition } => condition.collect_errors(errors),
            Self::All { conditions } | Self::Any { conditions } => {
                for c in conditions {
                    c.collect_errors(errors);
                }
            }
            Self::Always => {}
        }
    }
}

/// Strict JSON equality, except that a string expectation also matches the
/// textual form of a scalar (`"3"` matches `3`, `"true"` matches `true`).
fn loosely_equal(actual: &Value, expected: &Value) -> bool {
    if actual == expected {
        return true;
    }
    match (actual, expected) {
        (Value::Number(n), Value::String(s)) => n.to_string() == *s,
        (Value::Bool(b), Value::String(s)) => b.to_string() == *s,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> BTreeMap<String, Value> {
        let mut map = BTreeMap::new();
        map.insert("mode".into(), json!("subscriptions"));
        map.insert("retries".into(), json!(3));
        map.insert("empty".into(), json!(""));
        map.insert("webhooks".into(), json!({ "enabled": true }));
        map
    }

    fn eval(condition: &Condition, env: &str) -> bool {
        let config = config();
        let exists = |p: &RelativePath| p.as_str() == "src/index.ts";
        condition.evaluate(&ConditionContext::new(&config, env, &exists))
    }

    #[test]
    fn leaf_predicates() {
        assert!(eval(&Condition::Always, "dev"));
        assert!(eval(
            &Condition::Equals {
                key: "mode".into(),
                value: json!("subscriptions")
            },
            "dev"
        ));
        assert!(eval(
            &Condition::Equals {
                key: "retries".into(),
                value: json!("3")
            },
            "dev"
        ));
        assert!(eval(
            &Condition::NotEquals {
                key: "missing".into(),
                value: json!(1)
            },
            "dev"
        ));
        assert!(!eval(&Condition::IsSet { key: "empty".into() }, "dev"));
        assert!(eval(
            &Condition::IsSet {
                key: "webhooks.enabled".into()
            },
            "dev"
        ));
    }

    #[test]
    fn environment_and_files() {
        let prod = Condition::Environment {
            any_of: vec!["production".into()],
        };
        assert!(eval(&prod, "PRODUCTION"));
        assert!(!eval(&prod, "development"));

        assert!(eval(
            &Condition::FileExists {
                path: "./src/index.ts".into()
            },
            "dev"
        ));
        assert!(!eval(
            &Condition::FileExists {
                path: "../escape".into()
            },
            "dev"
        ));
    }

    #[test]
    fn combinators() {
        let tree = Condition::All {
            conditions: vec![
                Condition::IsSet { key: "mode".into() },
                Condition::Not {
                    condition: Box::new(Condition::Any { conditions: vec![] }),
                },
            ],
        };
        assert!(eval(&tree, "dev"));
    }

    #[test]
    fn parses_from_tagged_json() {
        let parsed: Condition = serde_json::from_value(json!({
            "op": "any",
            "conditions": [
                { "op": "is-set", "key": "mode" },
                { "op": "environment", "any_of": ["test"] }
            ]
        }))
        .unwrap();

        assert!(matches!(parsed, Condition::Any { ref conditions } if conditions.len() == 2));
    }

    #[test]
    fn validate_reports_every_problem() {
        let bad = Condition::All {
            conditions: vec![
                Condition::IsSet { key: " ".into() },
                Condition::Environment { any_of: vec![] },
            ],
        };

        let err = bad.validate().unwrap_err();
        let text = err.to_string();
        assert!(text.contains("key must not be empty"));
        assert!(text.contains("at least one environment"));
    }
}
