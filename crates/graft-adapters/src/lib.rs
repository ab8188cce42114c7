//! Infrastructure adapters for graft.
//!
//! This crate implements the ports defined in `graft_core::application::ports`.
//! It contains all external dependencies and I/O operations: the project
//! filesystem, template discovery, the metadata file, the project lock,
//! document codecs, source editors and the command runner.

pub mod codec;
pub mod editor;
pub mod filesystem;
pub mod lock;
pub mod metadata_store;
pub mod runner;
pub mod template_loader;
pub mod template_store;

// Re-export commonly used adapters
pub use codec::{JsonCodec, TomlCodec};
pub use editor::TypeScriptEditor;
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use lock::{FileLocker, NoopLocker};
pub use metadata_store::{JsonMetadataStore, MemoryMetadataStore};
pub use runner::ProcessCommandRunner;
pub use template_loader::{TemplateLoader, discover_templates_dir};
pub use template_store::InMemoryStore;
