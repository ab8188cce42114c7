//! Template Service - the catalog of service templates.
//!
//! Wraps a [`TemplateStore`] and, optionally, a [`TemplateSource`] that fills
//! it. Loading is lazy: the first read triggers one scan, later reads reuse
//! the store. Registering by hand works with or without a source.

use std::sync::Mutex;

use tracing::{debug, info, instrument, warn};

use crate::{
    application::{
        ApplicationError,
        ports::{RejectedTemplate, TemplateSource, TemplateStore},
        results::{TemplateInfo, TemplateStatistics},
    },
    domain::{DomainError, DomainValidator, ServiceTemplate, ServiceType, TemplateKey},
    error::GraftResult,
};

#[derive(Debug, Default)]
struct LoadState {
    initialized: bool,
    rejected: Vec<RejectedTemplate>,
}

/// Service for template lookup and registration.
pub struct TemplateService {
    store: Box<dyn TemplateStore>,
    source: Option<Box<dyn TemplateSource>>,
    state: Mutex<LoadState>,
}

impl TemplateService {
    /// A catalog filled only through [`register_template`](Self::register_template).
    pub fn new(store: Box<dyn TemplateStore>) -> Self {
        Self {
            store,
            source: None,
            state: Mutex::new(LoadState::default()),
        }
    }

    /// A catalog that scans `source` on first use.
    pub fn with_source(store: Box<dyn TemplateStore>, source: Box<dyn TemplateSource>) -> Self {
        Self {
            source: Some(source),
            ..Self::new(store)
        }
    }

    /// Scan the source once. Later calls are no-ops.
    ///
    /// Invalid manifests are skipped and counted; they never fail the scan.
    #[instrument(skip_all)]
    pub fn initialize(&self) -> GraftResult<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| ApplicationError::StoreLockError)?;
        if state.initialized {
            return Ok(());
        }

        if let Some(source) = &self.source {
            let batch = source.load()?;

            for rejected in &batch.rejected {
                warn!(
                    source = %rejected.source.display(),
                    errors = %rejected.errors.join("; "),
                    "Skipping invalid template"
                );
            }

            let mut loaded = 0usize;
            for template in batch.templates {
                match DomainValidator::validate_template(&template) {
                    Ok(()) => {
                        self.insert(template)?;
                        loaded += 1;
                    }
                    Err(DomainError::InvalidTemplate { template: key, errors }) => {
                        warn!(template = %key, errors = %errors.join("; "), "Skipping invalid template");
                        state.rejected.push(RejectedTemplate {
                            source: key.into(),
                            errors,
                        });
                    }
                    Err(other) => return Err(other.into()),
                }
            }

            state.rejected.extend(batch.rejected);
            info!(
                loaded,
                rejected = state.rejected.len(),
                "Template catalog initialized"
            );
        }

        state.initialized = true;
        Ok(())
    }

    /// Validate and add a template, replacing any with the same key.
    #[instrument(skip_all, fields(template = %template.key()))]
    pub fn register_template(&self, template: ServiceTemplate) -> GraftResult<()> {
        DomainValidator::validate_template(&template)?;
        self.insert(template)
    }

    fn insert(&self, template: ServiceTemplate) -> GraftResult<()> {
        let key = template.key();
        if let Some(previous) = self.store.insert(template)? {
            info!(
                template = %key,
                previous_version = %previous.version,
                "Replaced existing template"
            );
        } else {
            debug!(template = %key, "Registered template");
        }
        Ok(())
    }

    pub fn get_template(
        &self,
        service_type: ServiceType,
        provider: &str,
    ) -> GraftResult<Option<ServiceTemplate>> {
        self.initialize()?;
        self.store.get(&TemplateKey::new(service_type, provider))
    }

    /// Like [`get_template`](Self::get_template), but absence is an error.
    pub fn require_template(&self, key: &TemplateKey) -> GraftResult<ServiceTemplate> {
        self.initialize()?;
        self.store.get(key)?.ok_or_else(|| {
            DomainError::TemplateNotFound {
                key: key.to_string(),
            }
            .into()
        })
    }

    pub fn has_template(&self, service_type: ServiceType, provider: &str) -> GraftResult<bool> {
        Ok(self.get_template(service_type, provider)?.is_some())
    }

    pub fn list_templates(&self, filter: Option<ServiceType>) -> GraftResult<Vec<ServiceTemplate>> {
        self.initialize()?;
        let mut templates = self.store.list()?;
        if let Some(service_type) = filter {
            templates.retain(|t| t.service_type == service_type);
        }
        Ok(templates)
    }

    pub fn list_template_info(&self, filter: Option<ServiceType>) -> GraftResult<Vec<TemplateInfo>> {
        Ok(self
            .list_templates(filter)?
            .into_iter()
            .map(|t| TemplateInfo {
                key: t.key().to_string(),
                name: t.name,
                service_type: t.service_type,
                provider: t.provider,
                version: t.version,
                description: t.description,
                injection_points: t.injection_points.len(),
                requires: t.requires,
            })
            .collect())
    }

    /// Find the template a dependency reference points at.
    ///
    /// An exact name match wins over a provider match; among equals the
    /// lowest key wins.
    pub fn find_by_reference(&self, reference: &str) -> GraftResult<Option<ServiceTemplate>> {
        let templates = self.list_templates(None)?;
        let reference = reference.trim();

        let by_name = templates
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(reference));
        if let Some(found) = by_name {
            return Ok(Some(found.clone()));
        }

        Ok(templates
            .into_iter()
            .find(|t| t.provider.eq_ignore_ascii_case(reference)))
    }

    pub fn get_statistics(&self) -> GraftResult<TemplateStatistics> {
        let templates = self.list_templates(None)?;
        let rejected = self
            .state
            .lock()
            .map_err(|_| ApplicationError::StoreLockError)?
            .rejected
            .len();

        let mut stats = TemplateStatistics {
            total: templates.len(),
            rejected,
            ..TemplateStatistics::default()
        };
        for template in &templates {
            *stats.by_type.entry(template.service_type).or_default() += 1;
            *stats
                .by_provider
                .entry(template.provider.to_ascii_lowercase())
                .or_default() += 1;
        }
        Ok(stats)
    }

    /// Manifests skipped during the last scan.
    pub fn rejected(&self) -> GraftResult<Vec<RejectedTemplate>> {
        self.initialize()?;
        Ok(self
            .state
            .lock()
            .map_err(|_| ApplicationError::StoreLockError)?
            .rejected
            .clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{MockTemplateSource, TemplateBatch};
    use crate::application::services::testing::{MemoryTemplates, simple_template};
    use crate::error::GraftError;

    fn loaded(batch: TemplateBatch) -> TemplateService {
        let mut source = MockTemplateSource::new();
        source.expect_load().times(1).return_once(move || Ok(batch));
        TemplateService::with_source(Box::new(MemoryTemplates::default()), Box::new(source))
    }

    #[test]
    fn source_is_scanned_once_on_first_read() {
        let service = loaded(TemplateBatch {
            templates: vec![simple_template(ServiceType::Payment, "stripe").build().unwrap()],
            rejected: vec![],
        });

        assert!(service.has_template(ServiceType::Payment, "stripe").unwrap());
        assert!(service.has_template(ServiceType::Payment, "STRIPE").unwrap());
        assert_eq!(service.list_templates(None).unwrap().len(), 1);
    }

    #[test]
    fn invalid_templates_are_skipped_and_counted() {
        let mut broken = simple_template(ServiceType::Auth, "clerk").build().unwrap();
        broken.injection_points.clear();

        let service = loaded(TemplateBatch {
            templates: vec![
                broken,
                simple_template(ServiceType::Database, "postgres").build().unwrap(),
            ],
            rejected: vec![RejectedTemplate {
                source: "templates/bad/service.toml".into(),
                errors: vec!["missing field `provider`".into()],
            }],
        });

        let stats = service.get_statistics().unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.rejected, 2);
        assert_eq!(stats.by_type.get(&ServiceType::Database), Some(&1));
        assert_eq!(service.rejected().unwrap().len(), 2);
    }

    #[test]
    fn require_template_reports_the_missing_key() {
        let service = TemplateService::new(Box::new(MemoryTemplates::default()));
        let err = service
            .require_template(&TemplateKey::new(ServiceType::Cache, "redis"))
            .unwrap_err();

        assert!(matches!(
            err,
            GraftError::Domain(DomainError::TemplateNotFound { ref key }) if key == "cache/redis"
        ));
    }

    #[test]
    fn register_rejects_invalid_template() {
        let service = TemplateService::new(Box::new(MemoryTemplates::default()));
        let mut template = simple_template(ServiceType::Cache, "redis").build().unwrap();
        template.version.clear();

        assert!(service.register_template(template).is_err());
        assert!(service.list_templates(None).unwrap().is_empty());
    }

    #[test]
    fn register_replaces_same_key() {
        let service = TemplateService::new(Box::new(MemoryTemplates::default()));
        service
            .register_template(simple_template(ServiceType::Cache, "redis").build().unwrap())
            .unwrap();
        service
            .register_template(
                simple_template(ServiceType::Cache, "redis")
                    .version("2.0.0")
                    .build()
                    .unwrap(),
            )
            .unwrap();

        let templates = service.list_templates(Some(ServiceType::Cache)).unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].version, "2.0.0");
    }

    #[test]
    fn name_match_beats_provider_match() {
        let service = TemplateService::new(Box::new(MemoryTemplates::default()));
        let mut by_provider = simple_template(ServiceType::Database, "postgres").build().unwrap();
        by_provider.name = "primary-db".into();
        let mut by_name = simple_template(ServiceType::Cache, "redis").build().unwrap();
        by_name.name = "postgres".into();
        service.register_template(by_provider).unwrap();
        service.register_template(by_name).unwrap();

        let found = service.find_by_reference("postgres").unwrap().unwrap();
        assert_eq!(found.service_type, ServiceType::Cache);
        assert!(service.find_by_reference("mysql").unwrap().is_none());
    }

    #[test]
    fn filtered_info_lists_summaries() {
        let service = TemplateService::new(Box::new(MemoryTemplates::default()));
        service
            .register_template(
                simple_template(ServiceType::Auth, "clerk")
                    .requires("postgres")
                    .build()
                    .unwrap(),
            )
            .unwrap();
        service
            .register_template(simple_template(ServiceType::Payment, "stripe").build().unwrap())
            .unwrap();

        let info = service.list_template_info(Some(ServiceType::Auth)).unwrap();
        assert_eq!(info.len(), 1);
        assert_eq!(info[0].key, "auth/clerk");
        assert_eq!(info[0].injection_points, 1);
        assert_eq!(info[0].requires, vec!["postgres".to_string()]);
    }
}
