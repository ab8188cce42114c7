//! Application layer for graft.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (InjectionService, DependencyResolver,
//!   MutationEngine, TemplateService)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Results**: Plain-data options and outcomes of the engine API
//! - **Errors**: Application-specific error types
//!
//! The application layer coordinates the domain layer but contains no
//! business rules itself. Those live in `crate::domain`.

pub mod error;
pub mod ports;
pub mod results;
pub mod services;

// Re-export main services
pub use services::{
    DependencyResolver, InjectionService, MutationEngine, TemplateService, BACKUP_DIR, STATE_DIR,
};

// Re-export port traits (for adapter implementation)
pub use ports::{
    CommandOutput, CommandRunner, Filesystem, MetadataStore, ProjectLock, ProjectLocker,
    RejectedTemplate, StructuredCodec, StructuredEditor, TemplateBatch, TemplateSource,
    TemplateStore,
};

pub use results::{
    DEFAULT_ENVIRONMENT, InjectionOptions, InjectionResult, RemovalResult, TemplateInfo,
    TemplateStatistics, UpdateResult,
};

pub use error::ApplicationError;
