//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish the engine's
//! use cases: look templates up, resolve a service graph, mutate a project,
//! and keep the project's record of injected services.

pub mod injection_service;
pub mod mutation;
pub mod resolver;
pub mod template_service;

#[cfg(test)]
pub(crate) mod testing;

pub use injection_service::{BACKUP_DIR, InjectionService, STATE_DIR};
pub use mutation::{MutationContext, MutationEngine, PointOutcome};
pub use resolver::DependencyResolver;
pub use template_service::TemplateService;
