//! In-crate fakes for service tests. Adapter crates ship the real ones.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::application::ApplicationError;
use crate::application::ports::{
    Filesystem, MetadataStore, ProjectLock, ProjectLocker, StructuredCodec, TemplateStore,
};
use crate::application::services::TemplateService;
use crate::domain::{
    InjectionPoint, Mutation, RelativePath, ServiceInjectionMetadata, ServiceTemplate,
    ServiceTemplateBuilder, ServiceType, TemplateKey,
};
use crate::error::GraftResult;

#[derive(Default)]
pub struct MemoryFs {
    files: Mutex<BTreeMap<PathBuf, String>>,
    dirs: Mutex<BTreeSet<PathBuf>>,
}

impl MemoryFs {
    pub fn put(&self, path: &str, content: &str) {
        let path = PathBuf::from(path);
        if let Some(parent) = path.parent() {
            self.create_dir_all(parent).unwrap();
        }
        self.files.lock().unwrap().insert(path, content.to_string());
    }

    pub fn read(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(Path::new(path)).cloned()
    }

    /// Every file and directory, sorted.
    pub fn tree(&self) -> Vec<String> {
        let mut all: Vec<String> = self
            .dirs
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.display().to_string())
            .chain(self.paths())
            .collect();
        all.sort();
        all
    }

    pub fn paths(&self) -> Vec<String> {
        self.files
            .lock()
            .unwrap()
            .keys()
            .map(|p| p.display().to_string())
            .collect()
    }
}

impl Filesystem for MemoryFs {
    fn read_to_string(&self, path: &Path) -> GraftResult<String> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| {
                ApplicationError::FilesystemError {
                    path: path.to_path_buf(),
                    reason: "not found".into(),
                }
                .into()
            })
    }

    fn write_file(&self, path: &Path, content: &str) -> GraftResult<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> GraftResult<()> {
        let mut dirs = self.dirs.lock().unwrap();
        for ancestor in path.ancestors() {
            dirs.insert(ancestor.to_path_buf());
        }
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path) || self.is_dir(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.lock().unwrap().contains(path)
    }

    fn remove_file(&self, path: &Path) -> GraftResult<()> {
        self.files.lock().unwrap().remove(path);
        Ok(())
    }

    fn remove_dir_if_empty(&self, path: &Path) -> GraftResult<bool> {
        let occupied = self.files.lock().unwrap().keys().any(|p| p.starts_with(path))
            || self
                .dirs
                .lock()
                .unwrap()
                .iter()
                .any(|d| d != path && d.starts_with(path));
        if occupied {
            return Ok(false);
        }
        Ok(self.dirs.lock().unwrap().remove(path))
    }
}

pub struct JsonTestCodec;

impl StructuredCodec for JsonTestCodec {
    fn format(&self) -> &'static str {
        "json"
    }

    fn handles(&self, path: &RelativePath) -> bool {
        path.extension().as_deref() == Some("json")
    }

    fn parse(&self, text: &str) -> GraftResult<Value> {
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
        Ok(serde_json::to_string_pretty(value).unwrap_or_default())
    }
}

#[derive(Default)]
pub struct MemoryTemplates(Mutex<BTreeMap<TemplateKey, ServiceTemplate>>);

impl TemplateStore for MemoryTemplates {
    fn insert(&self, template: ServiceTemplate) -> GraftResult<Option<ServiceTemplate>> {
        Ok(self.0.lock().unwrap().insert(template.key(), template))
    }

    fn get(&self, key: &TemplateKey) -> GraftResult<Option<ServiceTemplate>> {
        Ok(self.0.lock().unwrap().get(key).cloned())
    }

    fn list(&self) -> GraftResult<Vec<ServiceTemplate>> {
        Ok(self.0.lock().unwrap().values().cloned().collect())
    }

    fn remove(&self, key: &TemplateKey) -> GraftResult<Option<ServiceTemplate>> {
        Ok(self.0.lock().unwrap().remove(key))
    }
}

#[derive(Default)]
pub struct MemoryMetadata(Mutex<HashMap<PathBuf, Vec<ServiceInjectionMetadata>>>);

impl MetadataStore for MemoryMetadata {
    fn load(&self, project: &Path) -> GraftResult<Vec<ServiceInjectionMetadata>> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .get(project)
            .cloned()
            .unwrap_or_default())
    }

    fn save(&self, project: &Path, records: &[ServiceInjectionMetadata]) -> GraftResult<()> {
        self.0
            .lock()
            .unwrap()
            .insert(project.to_path_buf(), records.to_vec());
        Ok(())
    }
}

pub struct NoLock;

impl ProjectLocker for NoLock {
    fn lock(&self, _project: &Path) -> GraftResult<ProjectLock> {
        Ok(ProjectLock::noop())
    }
}

/// A template with a single append point at `src/<provider>.ts`.
pub fn simple_template(service_type: ServiceType, provider: &str) -> ServiceTemplateBuilder {
    ServiceTemplate::builder(provider, service_type, provider).point(InjectionPoint::new(
        RelativePath::try_new(format!("src/{provider}.ts")).unwrap(),
        Mutation::Append {
            fragment: format!("// {provider}\n"),
        },
    ))
}

pub fn catalog(templates: Vec<ServiceTemplate>) -> Arc<TemplateService> {
    let service = TemplateService::new(Box::new(MemoryTemplates::default()));
    for template in templates {
        service.register_template(template).unwrap();
    }
    Arc::new(service)
}
