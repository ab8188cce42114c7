//! In-memory template store.

use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock},
};

use graft_core::{
    application::{ApplicationError, ports::TemplateStore},
    domain::{ServiceTemplate, TemplateKey},
    error::GraftResult,
};

/// Thread-safe in-memory template store keyed by `type/provider`.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<BTreeMap<TemplateKey, ServiceTemplate>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|inner| inner.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TemplateStore for InMemoryStore {
    fn insert(&self, template: ServiceTemplate) -> GraftResult<Option<ServiceTemplate>> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?;
        Ok(inner.insert(template.key(), template))
    }

    fn get(&self, key: &TemplateKey) -> GraftResult<Option<ServiceTemplate>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| ApplicationError::StoreLockError)?;
        Ok(inner.get(key).cloned())
    }

    fn list(&self) -> GraftResult<Vec<ServiceTemplate>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| ApplicationError::StoreLockError)?;
        Ok(inner.values().cloned().collect())
    }

    fn remove(&self, key: &TemplateKey) -> GraftResult<Option<ServiceTemplate>> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?;
        Ok(inner.remove(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_core::domain::{InjectionPoint, Mutation, RelativePath, ServiceType};

    fn template(service_type: ServiceType, provider: &str, version: &str) -> ServiceTemplate {
        ServiceTemplate::builder(provider, service_type, provider)
            .version(version)
            .point(InjectionPoint::new(
                RelativePath::try_new("src/index.ts").unwrap(),
                Mutation::Append {
                    fragment: "// x\n".into(),
                },
            ))
            .build()
            .unwrap()
    }

    #[test]
    fn insert_replaces_same_key() {
        let store = InMemoryStore::new();
        assert!(store.insert(template(ServiceType::Payment, "stripe", "1.0.0")).unwrap().is_none());

        let previous = store
            .insert(template(ServiceType::Payment, "Stripe", "2.0.0"))
            .unwrap()
            .unwrap();
        assert_eq!(previous.version, "1.0.0");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn list_is_ordered_by_key() {
        let store = InMemoryStore::new();
        store.insert(template(ServiceType::Payment, "stripe", "1.0.0")).unwrap();
        store.insert(template(ServiceType::Auth, "clerk", "1.0.0")).unwrap();
        store.insert(template(ServiceType::Auth, "auth0", "1.0.0")).unwrap();

        let keys: Vec<String> = store
            .list()
            .unwrap()
            .iter()
            .map(|t| t.key().to_string())
            .collect();
        assert_eq!(keys, vec!["auth/auth0", "auth/clerk", "payment/stripe"]);
    }

    #[test]
    fn remove_returns_the_template() {
        let store = InMemoryStore::new();
        store.insert(template(ServiceType::Cache, "redis", "1.0.0")).unwrap();
        let key = TemplateKey::new(ServiceType::Cache, "redis");

        assert!(store.remove(&key).unwrap().is_some());
        assert!(store.get(&key).unwrap().is_none());
        assert!(store.is_empty());
    }
}
