//! graft core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers of the graft
//! service injection engine, following hexagonal (ports and adapters)
//! architecture.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            graft-cli (CLI)              │
//! │     (Drives the InjectionService)       │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │  InjectionService ─▶ DependencyResolver │
//! │         │                  │            │
//! │         ▼                  ▼            │
//! │   MutationEngine     TemplateService    │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │ Filesystem, TemplateSource/Store,       │
//! │ MetadataStore, ProjectLocker, Codec,    │
//! │ StructuredEditor, CommandRunner         │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │     graft-adapters (Infrastructure)     │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │        Domain Layer (Pure Logic)        │
//! │ ServiceTemplate, ServiceConfiguration,  │
//! │ Condition, DependencyGraph, deep_merge  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use graft_core::prelude::*;
//!
//! let templates = Arc::new(TemplateService::with_source(store, loader));
//! let engine = InjectionService::new(templates, filesystem, metadata, locker);
//!
//! let config = ServiceConfiguration::new("payments", ServiceType::Payment, "stripe");
//! let result = engine.inject_service(config, project, &InjectionOptions::default());
//! assert!(result.success);
//! ```

// Re-export domain layer (stable, well-defined API)
pub mod domain;

// Re-export application layer (orchestration logic)
pub mod application;

// Re-export error types
pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        DependencyResolver, InjectionOptions, InjectionResult, InjectionService, RemovalResult,
        TemplateService, UpdateResult,
        ports::{
            CommandRunner, Filesystem, MetadataStore, ProjectLocker, StructuredCodec,
            StructuredEditor, TemplateSource, TemplateStore,
        },
    };
    pub use crate::domain::{
        CompatibilityReport, Condition, InjectionPoint, Mutation, ProjectPreset, RelativePath,
        ServiceConfiguration, ServiceInjectionMetadata, ServiceTemplate, ServiceType,
        StructuredEdit, TemplateKey,
    };
    pub use crate::error::{GraftError, GraftResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
