//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `graft-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `Filesystem`: File operations on the target project
//!   - `TemplateSource` / `TemplateStore`: Template discovery and lookup
//!   - `MetadataStore` / `ProjectLocker`: Durable, exclusive project state
//!   - `StructuredCodec` / `StructuredEditor`: Format- and language-aware edits
//!   - `CommandRunner`: Post-injection commands
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (The `InjectionService` public methods; the CLI is the only driver)

pub mod output;

pub use output::{
    CommandOutput, CommandRunner, Filesystem, MetadataStore, ProjectLock, ProjectLocker,
    RejectedTemplate, StructuredCodec, StructuredEditor, TemplateBatch, TemplateSource,
    TemplateStore,
};

#[cfg(test)]
pub use output::{MockCommandRunner, MockProjectLocker, MockTemplateSource};
