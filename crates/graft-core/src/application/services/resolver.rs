//! Dependency Resolver - expansion, conflicts and ordering over a set of
//! services.
//!
//! Read-only: it queries the template catalog and never touches a project.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::{
    application::services::TemplateService,
    domain::{
        CompatibilityReport, ConflictKind, ConflictReport, DependencyGraph,
        DependencyResolutionResult, DomainError, MissingDependency, ProjectPreset,
        ServiceConfiguration, ServiceRef, ServiceSuggestion, ServiceType,
    },
    error::{GraftError, GraftResult},
};

pub struct DependencyResolver {
    templates: Arc<TemplateService>,
}

/// Mutable state of one `resolve_dependencies` walk.
struct Expansion<'a> {
    inputs: &'a [ServiceConfiguration],
    result: DependencyResolutionResult,
    done: HashSet<String>,
}

impl DependencyResolver {
    pub fn new(templates: Arc<TemplateService>) -> Self {
        Self { templates }
    }

    /// Everything `service` depends on: its own list plus its template's
    /// `requires`, without duplicates.
    fn dependency_refs(&self, service: &ServiceConfiguration) -> GraftResult<Vec<String>> {
        let mut refs: Vec<String> = Vec::new();
        let template_requires = self
            .templates
            .get_template(service.service_type, &service.provider)?
            .map(|t| t.requires)
            .unwrap_or_default();

        for reference in service.dependencies.iter().chain(template_requires.iter()) {
            if !refs.iter().any(|r| r.eq_ignore_ascii_case(reference)) {
                refs.push(reference.clone());
            }
        }
        Ok(refs)
    }

    fn conflict_refs(&self, service: &ServiceConfiguration) -> GraftResult<Vec<String>> {
        let mut refs = service.conflicts.clone();
        if let Some(template) = self
            .templates
            .get_template(service.service_type, &service.provider)?
        {
            refs.extend(template.conflicts);
        }
        Ok(refs)
    }

    /// Expand every declared dependency, then report conflicts across the
    /// expanded set.
    ///
    /// `resolved` is in dependency-first order, one entry per service name.
    #[instrument(skip_all, fields(services = services.len()))]
    pub fn resolve_dependencies(
        &self,
        services: &[ServiceConfiguration],
    ) -> GraftResult<DependencyResolutionResult> {
        let mut expansion = Expansion {
            inputs: services,
            result: DependencyResolutionResult::default(),
            done: HashSet::new(),
        };

        for service in services {
            let mut branch = Vec::new();
            self.visit(service.clone(), &mut branch, &mut expansion)?;
        }

        let mut result = expansion.result;
        self.collect_conflicts(services, &mut result)?;

        debug!(
            resolved = result.resolved.len(),
            missing = result.missing.len(),
            conflicts = result.conflicts.len(),
            "Dependencies resolved"
        );
        Ok(result)
    }

    fn visit(
        &self,
        service: ServiceConfiguration,
        branch: &mut Vec<ServiceConfiguration>,
        expansion: &mut Expansion<'_>,
    ) -> GraftResult<()> {
        let name = service.name.to_ascii_lowercase();

        if let Some(position) = branch
            .iter()
            .position(|s| s.name.eq_ignore_ascii_case(&service.name))
        {
            let mut chain: Vec<&str> = branch[position..].iter().map(|s| s.name.as_str()).collect();
            chain.push(&service.name);
            let reason = format!("circular dependency detected: {}", chain.join(" -> "));

            // The last branch entry is the one that referenced `service`.
            let referrer = branch.last().map(ServiceRef::from);
            if let Some(referrer) = referrer {
                let report = ConflictReport {
                    first: ServiceRef::from(&service),
                    second: referrer,
                    reason,
                    kind: ConflictKind::Circular,
                };
                let duplicate = expansion.result.conflicts.iter().any(|c| {
                    c.kind == ConflictKind::Circular
                        && c.involves_pair(&report.first.name, &report.second.name)
                });
                if !duplicate {
                    warn!(conflict = %report.reason, "Dependency cycle");
                    expansion.result.conflicts.push(report);
                }
            }
            return Ok(());
        }

        if expansion.done.contains(&name) {
            return Ok(());
        }

        branch.push(service.clone());
        for reference in self.dependency_refs(&service)? {
            if let Some(existing) = find_by_reference(expansion.inputs, &reference)
                .or_else(|| find_by_reference(&expansion.result.resolved, &reference))
                .cloned()
            {
                self.visit(existing, branch, expansion)?;
            } else if let Some(template) = self.templates.find_by_reference(&reference)? {
                debug!(dependency = %reference, required_by = %service.name, "Adding placeholder");
                self.visit(
                    ServiceConfiguration::placeholder_for(&template),
                    branch,
                    expansion,
                )?;
            } else {
                let missing = MissingDependency {
                    service_id: reference.clone(),
                    provider: None,
                    reason: format!("Required by {}", service.name),
                };
                let seen = expansion
                    .result
                    .missing
                    .iter()
                    .any(|m| m.service_id == missing.service_id && m.provider == missing.provider);
                if !seen {
                    expansion.result.missing.push(missing);
                }
            }
        }
        branch.pop();

        if expansion.done.insert(name) {
            expansion.result.resolved.push(service);
        }
        Ok(())
    }

    fn collect_conflicts(
        &self,
        inputs: &[ServiceConfiguration],
        result: &mut DependencyResolutionResult,
    ) -> GraftResult<()> {
        // Two inputs sharing a name would otherwise vanish into one entry.
        for (i, a) in inputs.iter().enumerate() {
            for b in &inputs[i + 1..] {
                if a.name.eq_ignore_ascii_case(&b.name) && a.key() != b.key() {
                    result.conflicts.push(ConflictReport {
                        first: ServiceRef::from(a),
                        second: ServiceRef::from(b),
                        reason: format!("Duplicate service name '{}'", a.name),
                        kind: ConflictKind::Explicit,
                    });
                }
            }
        }

        let services = &result.resolved;
        let mut found = Vec::new();
        for (i, a) in services.iter().enumerate() {
            let a_conflicts = self.conflict_refs(a)?;
            for b in &services[i + 1..] {
                if a.enabled
                    && b.enabled
                    && a.service_type == b.service_type
                    && a.service_type.is_exclusive()
                {
                    found.push(ConflictReport {
                        first: ServiceRef::from(a),
                        second: ServiceRef::from(b),
                        reason: format!("Multiple {} services not supported", a.service_type),
                        kind: ConflictKind::Exclusive,
                    });
                    continue;
                }

                let a_names_b = a_conflicts.iter().any(|r| b.matches_reference(r));
                let b_names_a = self
                    .conflict_refs(b)?
                    .iter()
                    .any(|r| a.matches_reference(r));
                if a_names_b || b_names_a {
                    found.push(ConflictReport {
                        first: ServiceRef::from(a),
                        second: ServiceRef::from(b),
                        reason: format!("{} conflicts with {}", a.name, b.name),
                        kind: ConflictKind::Explicit,
                    });
                }
            }
        }

        result.conflicts.extend(found);
        Ok(())
    }

    /// Order services so each comes after everything it depends on.
    ///
    /// Ties keep input order. References to services outside the set are
    /// ignored.
    #[instrument(skip_all, fields(services = services.len()))]
    pub fn calculate_injection_order(
        &self,
        services: &[ServiceConfiguration],
    ) -> GraftResult<Vec<ServiceConfiguration>> {
        let mut graph = DependencyGraph::new(services.iter().map(|s| s.name.clone()).collect());

        for (index, service) in services.iter().enumerate() {
            for reference in self.dependency_refs(service)? {
                if let Some(dep) = position_by_reference(services, &reference) {
                    graph.add_dependency(index, dep);
                }
            }
        }

        let order = graph.order()?;
        Ok(order.into_iter().map(|i| services[i].clone()).collect())
    }

    /// Resolution and ordering in one report.
    pub fn check_compatibility(
        &self,
        services: &[ServiceConfiguration],
    ) -> GraftResult<CompatibilityReport> {
        let resolution = self.resolve_dependencies(services)?;

        let order = match self.calculate_injection_order(&resolution.resolved) {
            Ok(ordered) => ordered.into_iter().map(|s| s.name).collect(),
            Err(GraftError::Domain(DomainError::DependencyCycle { nodes })) => {
                debug!(nodes = %nodes.join(", "), "No order: dependency cycle");
                Vec::new()
            }
            Err(other) => return Err(other),
        };

        Ok(CompatibilityReport {
            compatible: resolution.is_clean(),
            conflicts: resolution.conflicts,
            missing: resolution.missing,
            order,
        })
    }

    /// Advisory suggestions from co-occurrence heuristics and an optional
    /// project preset.
    pub fn suggest_services(
        &self,
        current: &[ServiceConfiguration],
        preset: Option<ProjectPreset>,
    ) -> GraftResult<Vec<ServiceSuggestion>> {
        let present: HashSet<ServiceType> = current
            .iter()
            .filter(|s| s.enabled)
            .map(|s| s.service_type)
            .collect();
        let has = |t: ServiceType| present.contains(&t);

        let mut wanted: Vec<(ServiceType, String)> = Vec::new();
        let mut suggest = |t: ServiceType, reason: &str| {
            if !present.contains(&t) && !wanted.iter().any(|(w, _)| *w == t) {
                wanted.push((t, reason.to_string()));
            }
        };

        if has(ServiceType::Auth) {
            suggest(
                ServiceType::Notification,
                "Auth flows send verification and password reset emails",
            );
        }
        if has(ServiceType::Payment) {
            suggest(
                ServiceType::Notification,
                "Payments need receipts and failure notices",
            );
            suggest(ServiceType::Analytics, "Track conversion and revenue");
        }
        if has(ServiceType::Database) {
            suggest(ServiceType::Cache, "Cache frequent queries in front of the database");
        }
        if !current.is_empty() {
            suggest(ServiceType::Monitoring, "Catch errors and latency regressions in production");
        }

        if let Some(preset) = preset {
            let reason = format!("Common in {preset} projects");
            for &service_type in preset.recommended() {
                suggest(service_type, &reason);
            }
        }

        let mut suggestions = Vec::with_capacity(wanted.len());
        for (service_type, reason) in wanted {
            let providers = self
                .templates
                .list_templates(Some(service_type))?
                .into_iter()
                .map(|t| t.provider)
                .collect();
            suggestions.push(ServiceSuggestion {
                service_type,
                reason,
                providers,
            });
        }
        Ok(suggestions)
    }
}

/// Name matches win over provider matches.
fn position_by_reference(services: &[ServiceConfiguration], reference: &str) -> Option<usize> {
    let reference = reference.trim();
    services
        .iter()
        .position(|s| s.name.eq_ignore_ascii_case(reference))
        .or_else(|| {
            services
                .iter()
                .position(|s| s.provider.eq_ignore_ascii_case(reference))
        })
}

fn find_by_reference<'a>(
    services: &'a [ServiceConfiguration],
    reference: &str,
) -> Option<&'a ServiceConfiguration> {
    position_by_reference(services, reference).map(|i| &services[i])
}
