pub mod common;
pub mod condition;
pub mod render;
pub mod resolution;
pub mod service;
pub mod template;

pub use common::RelativePath;
pub use condition::{Condition, ConditionContext};
pub use render::RenderContext;
pub use resolution::{
    CompatibilityReport, ConflictKind, ConflictReport, DependencyResolutionResult,
    MissingDependency, ServiceRef, ServiceSuggestion,
};
pub use service::{ServiceConfiguration, ServiceInjectionMetadata};
pub use template::{
    ConfigFieldSpec, DependencySpec, EnvVariableSpec, InjectionPoint, Mutation, PackageRef,
    PostInjectionStep, ServiceTemplate, ServiceTemplateBuilder, StructuredEdit, TemplateKey,
};
