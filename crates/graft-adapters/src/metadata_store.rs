//! Per-project service records.
//!
//! The production store keeps one JSON document per project at
//! `<project>/.graft/services.json`:
//!
//! ```json
//! { "version": 1, "services": [ ... ] }
//! ```

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use graft_core::{
    application::{ApplicationError, STATE_DIR, ports::MetadataStore},
    domain::ServiceInjectionMetadata,
    error::GraftResult,
};

pub const METADATA_FILE: &str = "services.json";
pub const METADATA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct MetadataDocument {
    version: u32,
    #[serde(default)]
    services: Vec<ServiceInjectionMetadata>,
}

/// JSON file store, written atomically through a temp file and rename.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMetadataStore;

impl JsonMetadataStore {
    pub fn new() -> Self {
        Self
    }

    pub fn path_for(project: &Path) -> PathBuf {
        project.join(STATE_DIR).join(METADATA_FILE)
    }
}

impl MetadataStore for JsonMetadataStore {
    #[instrument(skip(self), fields(project = %project.display()))]
    fn load(&self, project: &Path) -> GraftResult<Vec<ServiceInjectionMetadata>> {
        let path = Self::path_for(project);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let raw = fs::read_to_string(&path).map_err(|e| ApplicationError::FilesystemError {
            path: path.clone(),
            reason: format!("Failed to read metadata: {e}"),
        })?;
        let document: MetadataDocument =
            serde_json::from_str(&raw).map_err(|e| ApplicationError::MetadataCorrupt {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        if document.version != METADATA_VERSION {
            return Err(ApplicationError::MetadataCorrupt {
                path,
                reason: format!(
                    "unsupported metadata version {} (expected {METADATA_VERSION})",
                    document.version
                ),
            }
            .into());
        }

        debug!(records = document.services.len(), "Loaded service metadata");
        Ok(document.services)
    }

    #[instrument(skip(self, records), fields(project = %project.display(), records = records.len()))]
    fn save(&self, project: &Path, records: &[ServiceInjectionMetadata]) -> GraftResult<()> {
        let path = Self::path_for(project);
        let io_error = |path: &Path, what: &str, e: std::io::Error| ApplicationError::FilesystemError {
            path: path.to_path_buf(),
            reason: format!("Failed to {what}: {e}"),
        };

        if records.is_empty() {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| io_error(&path, "remove metadata", e))?;
                debug!("Removed empty metadata file");
            }
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, "create state directory", e))?;
        }

        let document = MetadataDocument {
            version: METADATA_VERSION,
            services: records.to_vec(),
        };
        let content = serde_json::to_string_pretty(&document).map_err(|e| {
            ApplicationError::MetadataCorrupt {
                path: path.clone(),
                reason: format!("Failed to serialize metadata: {e}"),
            }
        })?;

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, content).map_err(|e| io_error(&temp_path, "write metadata", e))?;
        fs::rename(&temp_path, &path).map_err(|e| io_error(&path, "save metadata", e))?;

        debug!(path = %path.display(), "Saved service metadata");
        Ok(())
    }
}

/// In-memory store keyed by project path. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryMetadataStore {
    inner: Arc<RwLock<HashMap<PathBuf, Vec<ServiceInjectionMetadata>>>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetadataStore for MemoryMetadataStore {
    fn load(&self, project: &Path) -> GraftResult<Vec<ServiceInjectionMetadata>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| ApplicationError::StoreLockError)?;
        Ok(inner.get(project).cloned().unwrap_or_default())
    }

    fn save(&self, project: &Path, records: &[ServiceInjectionMetadata]) -> GraftResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?;
        if records.is_empty() {
            inner.remove(project);
        } else {
            inner.insert(project.to_path_buf(), records.to_vec());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_core::domain::{RelativePath, ServiceConfiguration, ServiceType};
    use tempfile::TempDir;

    fn record(name: &str) -> ServiceInjectionMetadata {
        let mut record = ServiceInjectionMetadata::new(
            ServiceConfiguration::new(name, ServiceType::Payment, "stripe")
                .with_config("currency", "usd"),
            String::from("development"),
            String::from("1.0.0"),
        );
        record.files_created = vec![RelativePath::try_new("src/stripe.ts").unwrap()];
        record
    }

    #[test]
    fn missing_file_means_no_records() {
        let project = TempDir::new().unwrap();
        assert!(JsonMetadataStore::new().load(project.path()).unwrap().is_empty());
    }

    #[test]
    fn saved_records_load_back() {
        let project = TempDir::new().unwrap();
        let store = JsonMetadataStore::new();
        let records = vec![record("payments"), record("billing")];

        store.save(project.path(), &records).unwrap();

        assert_eq!(store.load(project.path()).unwrap(), records);
        let path = JsonMetadataStore::path_for(project.path());
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["version"], 1);
        assert_eq!(raw["services"][0]["configuration"]["name"], "payments");
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn saving_nothing_removes_the_file() {
        let project = TempDir::new().unwrap();
        let store = JsonMetadataStore::new();
        store.save(project.path(), &[record("payments")]).unwrap();

        store.save(project.path(), &[]).unwrap();

        assert!(!JsonMetadataStore::path_for(project.path()).exists());
        assert!(store.load(project.path()).unwrap().is_empty());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let project = TempDir::new().unwrap();
        let path = JsonMetadataStore::path_for(project.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        let err = JsonMetadataStore::new().load(project.path()).unwrap_err();
        assert!(err.to_string().contains("corrupt"));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let project = TempDir::new().unwrap();
        let path = JsonMetadataStore::path_for(project.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{ "version": 9, "services": [] }"#).unwrap();

        assert!(JsonMetadataStore::new().load(project.path()).is_err());
    }

    #[test]
    fn memory_store_is_per_project() {
        let store = MemoryMetadataStore::new();
        store.save(Path::new("/a"), &[record("payments")]).unwrap();

        assert_eq!(store.load(Path::new("/a")).unwrap().len(), 1);
        assert!(store.load(Path::new("/b")).unwrap().is_empty());
    }
}
