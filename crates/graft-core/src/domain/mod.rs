// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for graft.
//!
//! This module contains pure business logic. All I/O (reading templates,
//! touching project files, persisting metadata, locking) is handled via ports
//! (traits) defined in the application layer.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No async**: Domain logic is synchronous
//! - **No I/O**: No filesystem, network, or external calls
//! - **Plain data**: Every entity is `Clone` and serde-serialisable
//! - **Rich domain model**: Validation, condition evaluation, merging and
//!   graph ordering live here, not in services
//!
// Public API - what the world sees
pub mod entities;
pub mod error;
pub mod graph;
pub mod merge;
pub mod value_objects;

mod validation;

// Re-exports for convenience
pub use entities::{
    CompatibilityReport, ConditionContext, ConfigFieldSpec, ConflictKind, ConflictReport,
    DependencyResolutionResult, DependencySpec, EnvVariableSpec, InjectionPoint,
    MissingDependency, Mutation, PackageRef, PostInjectionStep, RelativePath, RenderContext,
    ServiceConfiguration, ServiceInjectionMetadata, ServiceRef, ServiceSuggestion,
    ServiceTemplate, ServiceTemplateBuilder, StructuredEdit, TemplateKey, condition::Condition,
};

pub use error::{DomainError, ErrorCategory};
pub use graph::DependencyGraph;
pub use merge::deep_merge;
pub use validation::DomainValidator;
pub use value_objects::{DependencyKind, InjectionKind, ProjectPreset, ServiceType};

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use serde_json::json;

    use super::*;

    fn stripe() -> ServiceTemplate {
        ServiceTemplate::builder("stripe", ServiceType::Payment, "stripe")
            .version("2.1.0")
            .point(InjectionPoint::new(
                RelativePath::try_new("config/payment.ts").unwrap(),
                Mutation::Replace {
                    fragment: "export const key = process.env.STRIPE_KEY;".into(),
                    pattern: None,
                },
            ))
            .env_var(EnvVariableSpec::new("STRIPE_KEY").required())
            .config_field("currency", true)
            .build()
            .unwrap()
    }

    // ========================================================================
    // Value Object Tests
    // ========================================================================

    #[test]
    fn service_type_parses_aliases() {
        assert_eq!(ServiceType::from_str("DB").unwrap(), ServiceType::Database);
        assert_eq!(ServiceType::from_str("email").unwrap(), ServiceType::Notification);
        assert!(matches!(
            ServiceType::from_str("blockchain"),
            Err(DomainError::UnknownServiceType(_))
        ));
    }

    #[test]
    fn only_database_and_auth_are_exclusive() {
        let exclusive: Vec<_> = ServiceType::ALL
            .iter()
            .filter(|t| t.is_exclusive())
            .collect();
        assert_eq!(exclusive, vec![&ServiceType::Database, &ServiceType::Auth]);
    }

    #[test]
    fn service_type_serializes_lowercase() {
        let json = serde_json::to_string(&ServiceType::Cdn).unwrap();
        assert_eq!(json, "\"cdn\"");
    }

    // ========================================================================
    // RelativePath Tests
    // ========================================================================

    #[test]
    fn relative_path_normalises_and_rejects_escapes() {
        let p = RelativePath::try_new("./src//lib/./index.ts").unwrap();
        assert_eq!(p.as_str(), "src/lib/index.ts");
        assert_eq!(p.extension().as_deref(), Some("ts"));
        assert_eq!(p.parent().unwrap().as_str(), "src/lib");

        assert!(matches!(
            RelativePath::try_new("/etc/passwd"),
            Err(DomainError::AbsolutePathNotAllowed { .. })
        ));
        assert!(matches!(
            RelativePath::try_new("src/../../outside"),
            Err(DomainError::PathEscapesProject { .. })
        ));
        assert!(RelativePath::try_new("  ").is_err());
    }

    #[test]
    fn relative_path_deserialization_validates() {
        let ok: Result<RelativePath, _> = serde_json::from_value(json!("a/b.json"));
        assert!(ok.is_ok());
        let bad: Result<RelativePath, _> = serde_json::from_value(json!("../b.json"));
        assert!(bad.is_err());
    }

    // ========================================================================
    // Template Tests
    // ========================================================================

    #[test]
    fn template_key_lowercases_provider() {
        let key = TemplateKey::new(ServiceType::Auth, " Clerk ");
        assert_eq!(key.to_string(), "auth/clerk");
    }

    #[test]
    fn template_validation_aggregates_every_problem() {
        let template = ServiceTemplate {
            name: "".into(),
            service_type: ServiceType::Auth,
            provider: "bad provider!".into(),
            version: "".into(),
            description: String::new(),
            injection_points: vec![InjectionPoint::new(
                RelativePath::try_new("src/auth.ts").unwrap(),
                Mutation::Append {
                    fragment: "   ".into(),
                },
            )],
            env_variables: vec![
                EnvVariableSpec::new("lower_case"),
                EnvVariableSpec::new("DUP"),
                EnvVariableSpec::new("DUP"),
            ],
            dependencies: vec![DependencySpec::new("", "1.0")],
            post_injection_steps: vec![],
            requires: vec![],
            conflicts: vec![],
            config_fields: vec![],
        };

        match template.validate() {
            Err(DomainError::InvalidTemplate { errors, .. }) => {
                assert!(errors.len() >= 6, "got {errors:?}");
                assert!(errors.iter().any(|e| e.contains("name must not be empty")));
                assert!(errors.iter().any(|e| e.contains("append needs a fragment")));
                assert!(errors.iter().any(|e| e.contains("declared twice")));
                assert!(errors.iter().any(|e| e.contains("UPPER_SNAKE_CASE")));
            }
            other => panic!("expected InvalidTemplate, got {other:?}"),
        }
    }

    #[test]
    fn ast_modify_requires_a_usable_edit() {
        let result = ServiceTemplate::builder("clerk", ServiceType::Auth, "clerk")
            .point(InjectionPoint::new(
                RelativePath::try_new("src/index.ts").unwrap(),
                Mutation::AstModify {
                    edit: StructuredEdit::AddImport {
                        module: "@clerk/clerk-sdk-node".into(),
                        names: vec![],
                        default: None,
                    },
                },
            ))
            .build();

        let err = result.unwrap_err().to_string();
        assert!(err.contains("add-import needs names or a default binding"));
    }

    #[test]
    fn ordered_points_sort_by_descending_priority_stably() {
        let path = |p: &str| RelativePath::try_new(p).unwrap();
        let append = |f: &str| Mutation::Append {
            fragment: f.into(),
        };
        let template = ServiceTemplate::builder("x", ServiceType::Cache, "redis")
            .point(InjectionPoint::new(path("a"), append("a")))
            .point(InjectionPoint::new(path("b"), append("b")).with_priority(10))
            .point(InjectionPoint::new(path("c"), append("c")))
            .point(InjectionPoint::new(path("d"), append("d")).with_priority(10))
            .build()
            .unwrap();

        let order: Vec<_> = template
            .ordered_points()
            .iter()
            .map(|p| p.target.as_str().to_string())
            .collect();
        assert_eq!(order, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn mutation_deserializes_from_strategy_tag() {
        let m: Mutation = serde_json::from_value(json!({
            "strategy": "structured-merge",
            "fragment": "{}"
        }))
        .unwrap();
        assert_eq!(m.strategy(), "structured-merge");
    }

    // ========================================================================
    // Configuration Tests
    // ========================================================================

    #[test]
    fn configuration_validation_reports_missing_fields() {
        let template = stripe();
        let config = ServiceConfiguration::new("payments", ServiceType::Payment, "stripe");

        match DomainValidator::validate_configuration(&config, &template) {
            Err(DomainError::InvalidConfiguration { service, errors }) => {
                assert_eq!(service, "payments");
                assert_eq!(errors, vec!["missing required config field 'currency'"]);
            }
            other => panic!("expected InvalidConfiguration, got {other:?}"),
        }

        let config = config.with_config("currency", "usd");
        assert!(DomainValidator::validate_configuration(&config, &template).is_ok());
    }

    #[test]
    fn configuration_for_another_template_is_rejected() {
        let config = ServiceConfiguration::new("payments", ServiceType::Payment, "paypal");
        assert!(DomainValidator::validate_configuration(&config, &stripe()).is_err());
    }

    #[test]
    fn env_var_set_by_config_key_or_name() {
        let spec = EnvVariableSpec::new("STRIPE_WEBHOOK_SECRET").with_config_key("webhookSecret");
        let config = ServiceConfiguration::new("p", ServiceType::Payment, "stripe")
            .with_config("webhookSecret", "whsec_123");
        assert!(spec.is_set_by(&config.config));

        let other = ServiceConfiguration::new("p", ServiceType::Payment, "stripe");
        assert!(!spec.is_set_by(&other.config));
    }

    #[test]
    fn defaults_fill_only_absent_keys() {
        let template = ServiceTemplate::builder("pg", ServiceType::Database, "postgres")
            .point(InjectionPoint::new(
                RelativePath::try_new("db.ts").unwrap(),
                Mutation::Append {
                    fragment: "x".into(),
                },
            ))
            .config_field_with_default("pool", json!(5))
            .config_field_with_default("ssl", json!(false))
            .build()
            .unwrap();

        let mut config = ServiceConfiguration::new("db", ServiceType::Database, "postgres")
            .with_config("ssl", true);
        config.apply_defaults(&template);

        assert_eq!(config.config["pool"], json!(5));
        assert_eq!(config.config["ssl"], json!(true));
    }

    // ========================================================================
    // Error Tests
    // ========================================================================

    #[test]
    fn error_categories() {
        assert_eq!(
            DomainError::DependencyCycle { nodes: vec![] }.category(),
            ErrorCategory::Cycle
        );
        assert_eq!(
            DomainError::Incompatible {
                service: "a".into(),
                reasons: vec![]
            }
            .category(),
            ErrorCategory::Compatibility
        );
        assert!(!DomainError::UnknownServiceType("x".into())
            .suggestions()
            .is_empty());
    }
}
