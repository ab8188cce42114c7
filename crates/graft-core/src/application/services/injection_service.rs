//! Injection Service - the engine's entry point.
//!
//! Drives one service through its lifecycle:
//!
//! ```text
//! Requested ──validate──▶ Validated ──check──▶ Compatible ──mutate──▶ Applied ──persist──▶ Recorded
//!                                       │                                                  │
//!                                       └──▶ Conflict-Blocked                  remove ──▶ Removed
//! ```
//!
//! Every fatal check runs before the first write. Once mutation starts, a
//! failing injection point becomes a warning and the remaining points still
//! run. Calls that write hold the project lock throughout; dry runs never
//! take it, so they leave no trace in the project.
//!
//! Every target an injection writes is reported in `files_modified`;
//! `files_created` is the subset that did not exist before, plus any parent
//! directories the engine had to create. Removal deletes `files_created`
//! and leaves the rest in place.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    application::{
        ApplicationError,
        ports::{
            CommandRunner, Filesystem, MetadataStore, ProjectLock, ProjectLocker,
            StructuredCodec, StructuredEditor,
        },
        results::{InjectionOptions, InjectionResult, RemovalResult, UpdateResult},
        services::{
            DependencyResolver, TemplateService,
            mutation::{MutationContext, MutationEngine, PointOutcome},
        },
    },
    domain::{
        CompatibilityReport, ConflictKind, DomainError, DomainValidator, InjectionKind,
        ProjectPreset, RelativePath, RenderContext, ServiceConfiguration,
        ServiceInjectionMetadata, ServiceSuggestion, ServiceTemplate, ServiceType,
    },
    error::{GraftError, GraftResult},
};

/// Project-relative directory graft keeps its own state in.
pub const STATE_DIR: &str = ".graft";
pub const BACKUP_DIR: &str = ".graft/backups";

/// A planned change to one target.
struct PlannedPoint {
    target: RelativePath,
    kind: InjectionKind,
    exists: bool,
    missing_parents: Vec<RelativePath>,
}

/// An injection that passed every fatal check and may now write.
struct Prepared {
    template: ServiceTemplate,
    config: ServiceConfiguration,
    /// Auto-resolved dependencies that are not injected yet.
    pending: Vec<ServiceConfiguration>,
    /// The record this injection replaces, if any.
    superseded: Option<ServiceInjectionMetadata>,
}

pub struct InjectionService {
    templates: Arc<TemplateService>,
    resolver: DependencyResolver,
    engine: MutationEngine,
    filesystem: Arc<dyn Filesystem>,
    metadata: Box<dyn MetadataStore>,
    locker: Box<dyn ProjectLocker>,
    runner: Option<Box<dyn CommandRunner>>,
}

impl InjectionService {
    pub fn new(
        templates: Arc<TemplateService>,
        filesystem: Arc<dyn Filesystem>,
        metadata: Box<dyn MetadataStore>,
        locker: Box<dyn ProjectLocker>,
    ) -> Self {
        Self {
            resolver: DependencyResolver::new(templates.clone()),
            engine: MutationEngine::new(filesystem.clone()),
            templates,
            filesystem,
            metadata,
            locker,
            runner: None,
        }
    }

    pub fn with_codec(mut self, codec: Box<dyn StructuredCodec>) -> Self {
        self.engine = self.engine.with_codec(codec);
        self
    }

    pub fn with_editor(mut self, editor: Box<dyn StructuredEditor>) -> Self {
        self.engine = self.engine.with_editor(editor);
        self
    }

    /// Execute post-injection commands instead of only listing them.
    pub fn with_runner(mut self, runner: Box<dyn CommandRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    pub fn templates(&self) -> &TemplateService {
        &self.templates
    }

    pub fn resolver(&self) -> &DependencyResolver {
        &self.resolver
    }

    fn lock(&self, project: &Path, options: &InjectionOptions) -> GraftResult<ProjectLock> {
        if options.dry_run {
            debug!("Dry run, project lock not taken");
            return Ok(ProjectLock::noop());
        }
        self.locker.lock(project)
    }

    // -------------------------------------------------------------------------
    // Inject
    // -------------------------------------------------------------------------

    #[instrument(
        skip_all,
        fields(
            service = %config.name,
            template = %config.key(),
            project = %project.display(),
            dry_run = options.dry_run
        )
    )]
    pub fn inject_service(
        &self,
        config: ServiceConfiguration,
        project: &Path,
        options: &InjectionOptions,
    ) -> InjectionResult {
        let _lock = match self.lock(project, options) {
            Ok(lock) => lock,
            Err(e) => return InjectionResult::failed(e, Vec::new()),
        };

        let mut warnings = Vec::new();
        let outcome = self
            .prepare(config, project, options, None, &mut warnings)
            .and_then(|prepared| self.apply_prepared(prepared, project, options, &mut warnings));
        match outcome {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Injection aborted");
                InjectionResult::failed(e, warnings)
            }
        }
    }

    /// Requested -> Validated -> Compatible, without writing anything.
    ///
    /// `previous` is a record the new injection supersedes (the update
    /// path); it is left out of conflict checks.
    fn prepare(
        &self,
        mut config: ServiceConfiguration,
        project: &Path,
        options: &InjectionOptions,
        previous: Option<&ServiceInjectionMetadata>,
        warnings: &mut Vec<String>,
    ) -> GraftResult<Prepared> {
        let template = self.templates.require_template(&config.key())?;
        config.merge_config(&options.custom_config);
        config.apply_defaults(&template);

        if options.skip_validation {
            debug!("Skipping configuration validation");
        } else {
            DomainValidator::validate_configuration(&config, &template)?;
        }
        if !config.applies_to(&options.environment) {
            warnings.push(format!(
                "'{}' is not configured for environment '{}'",
                config.name, options.environment
            ));
        }

        let records = self.metadata.load(project)?;
        let mut superseded = previous.cloned();
        let skip = superseded.as_ref().map(|p| p.id);
        if let Some(existing) = records
            .iter()
            .find(|r| Some(r.id) != skip && r.name().eq_ignore_ascii_case(&config.name))
        {
            let reason = format!("'{}' is already injected (id {})", config.name, existing.id);
            if options.overwrite {
                warnings.push(format!("{reason}; replacing its record"));
                superseded = Some(existing.clone());
            } else {
                return Err(DomainError::Incompatible {
                    service: config.name.clone(),
                    reasons: vec![reason],
                }
                .into());
            }
        }

        let existing: Vec<ServiceConfiguration> = records
            .iter()
            .filter(|r| Some(r.id) != skip && Some(r.id) != superseded.as_ref().map(|s| s.id))
            .map(|r| r.configuration.clone())
            .collect();
        let pending = self.check_new_service(&config, &existing, options, warnings)?;

        Ok(Prepared {
            template,
            config,
            pending,
            superseded,
        })
    }

    /// Compatible -> Applied -> Recorded.
    fn apply_prepared(
        &self,
        prepared: Prepared,
        project: &Path,
        options: &InjectionOptions,
        warnings: &mut Vec<String>,
    ) -> GraftResult<InjectionResult> {
        let Prepared {
            template,
            config,
            pending,
            superseded,
        } = prepared;

        let render = RenderContext::for_service(&config, &options.environment);
        let ctx = MutationContext {
            project,
            render: &render,
            config: &config.config,
            environment: &options.environment,
        };
        let plan = self.plan_points(&template, &ctx);

        let mut result = InjectionResult {
            dry_run: options.dry_run,
            env_vars_added: env_vars_added(&template, &config),
            dependencies_added: template
                .dependencies
                .iter()
                .filter(|d| self.engine.condition_holds(d.condition.as_ref(), &ctx))
                .map(|d| d.to_package_ref())
                .collect(),
            ..InjectionResult::default()
        };

        if options.dry_run {
            for planned in &plan {
                for dir in &planned.missing_parents {
                    push_unique(&mut result.files_created, dir);
                }
                if !planned.exists {
                    push_unique(&mut result.files_created, &planned.target);
                }
                if planned.kind != InjectionKind::Directory {
                    push_unique(&mut result.files_modified, &planned.target);
                }
            }
            result.next_steps = self.next_steps(&template, &config, &pending);
            result.warnings = std::mem::take(warnings);
            result.success = true;
            info!(
                files = result.files_modified.len(),
                "Dry run complete"
            );
            return Ok(result);
        }

        if options.backup_files {
            let existing_files: Vec<&RelativePath> = plan
                .iter()
                .filter(|p| p.exists && p.kind != InjectionKind::Directory)
                .map(|p| &p.target)
                .collect();
            self.backup(project, existing_files)?;
        }

        let owned_before = |target: &RelativePath| {
            superseded
                .as_ref()
                .is_some_and(|s| s.files_created.contains(target))
        };
        let touched_before = |target: &RelativePath| {
            superseded
                .as_ref()
                .is_some_and(|s| s.files_modified.contains(target))
        };

        for point in template.ordered_points() {
            match self.engine.apply(point, &ctx) {
                Ok(PointOutcome::Applied {
                    target,
                    created,
                    changed,
                    dirs_created,
                }) => {
                    for dir in &dirs_created {
                        push_unique(&mut result.files_created, dir);
                    }
                    if created || owned_before(&target) {
                        push_unique(&mut result.files_created, &target);
                    }
                    if point.kind != InjectionKind::Directory
                        && (created || changed || owned_before(&target) || touched_before(&target))
                    {
                        push_unique(&mut result.files_modified, &target);
                    }
                }
                Ok(PointOutcome::Skipped { .. }) => {}
                Err(e) => {
                    warn!(target = %point.target, error = %e, "Injection point failed");
                    warnings.push(format!("{}: {}", point.target, e));
                }
            }
        }

        result.next_steps = self.run_post_steps(&template, &config, &pending, project, warnings);

        let mut record = ServiceInjectionMetadata::new(
            config.clone(),
            options.environment.clone(),
            template.version.clone(),
        );
        record.files_created = result.files_created.clone();
        record.files_modified = result.files_modified.clone();
        record.env_vars_added = result.env_vars_added.clone();
        record.dependencies_added = result.dependencies_added.clone();

        // Files the replaced record created and this run left alone stay
        // owned, so a later removal still cleans them up.
        if let Some(old) = &superseded {
            for path in &old.files_created {
                if self.filesystem.exists(&MutationEngine::absolute(project, path)) {
                    push_unique(&mut record.files_created, path);
                }
            }
        }

        let mut records = self.metadata.load(project)?;
        records.retain(|r| Some(r.id) != superseded.as_ref().map(|s| s.id));
        let id = record.id;
        records.push(record);
        self.metadata.save(project, &records)?;

        info!(
            id = %id,
            created = result.files_created.len(),
            modified = result.files_modified.len(),
            warnings = warnings.len(),
            "Service injected"
        );

        result.service_id = Some(id);
        result.warnings = std::mem::take(warnings);
        result.success = true;
        Ok(result)
    }

    /// Compatibility of `config` against what is already injected.
    ///
    /// Only problems the new service introduces count. Returns the
    /// auto-resolved dependencies that are not injected yet.
    fn check_new_service(
        &self,
        config: &ServiceConfiguration,
        existing: &[ServiceConfiguration],
        options: &InjectionOptions,
        warnings: &mut Vec<String>,
    ) -> GraftResult<Vec<ServiceConfiguration>> {
        let mut all = existing.to_vec();
        all.push(config.clone());

        let resolution = self.resolver.resolve_dependencies(&all)?;
        let baseline = if existing.is_empty() {
            Default::default()
        } else {
            self.resolver.resolve_dependencies(existing)?
        };

        let conflicts: Vec<_> = resolution
            .conflicts
            .iter()
            .filter(|c| !baseline.conflicts.contains(c))
            .collect();
        let missing: Vec<_> = resolution
            .missing
            .iter()
            .filter(|m| !baseline.missing.contains(m))
            .collect();

        if let Some(cycle) = conflicts.iter().find(|c| c.kind == ConflictKind::Circular) {
            return Err(DomainError::DependencyCycle {
                nodes: vec![cycle.first.name.clone(), cycle.second.name.clone()],
            }
            .into());
        }

        let reasons: Vec<String> = conflicts
            .iter()
            .map(|c| c.to_string())
            .chain(
                missing
                    .iter()
                    .map(|m| format!("missing dependency '{}': {}", m.service_id, m.reason)),
            )
            .collect();

        if !reasons.is_empty() {
            if options.overwrite {
                warn!(problems = reasons.len(), "Compatibility problems overridden");
                warnings.extend(reasons.into_iter().map(|r| format!("overridden: {r}")));
            } else {
                return Err(DomainError::Incompatible {
                    service: config.name.clone(),
                    reasons,
                }
                .into());
            }
        }

        Ok(resolution
            .resolved
            .into_iter()
            .filter(|s| !all.iter().any(|a| a.name.eq_ignore_ascii_case(&s.name)))
            .collect())
    }

    fn plan_points(&self, template: &ServiceTemplate, ctx: &MutationContext<'_>) -> Vec<PlannedPoint> {
        template
            .ordered_points()
            .into_iter()
            .filter(|p| self.engine.condition_holds(p.condition.as_ref(), ctx))
            .map(|p| PlannedPoint {
                target: p.target.clone(),
                kind: p.kind,
                exists: self
                    .filesystem
                    .exists(&MutationEngine::absolute(ctx.project, &p.target)),
                missing_parents: self.engine.missing_dirs(ctx.project, p.target.parent()),
            })
            .collect()
    }

    fn backup<'a>(
        &self,
        project: &Path,
        targets: impl IntoIterator<Item = &'a RelativePath>,
    ) -> GraftResult<Option<PathBuf>> {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%3fZ").to_string();
        let root = project.join(BACKUP_DIR).join(&stamp);
        let mut copied = 0usize;

        for target in targets {
            let from = MutationEngine::absolute(project, target);
            if !self.filesystem.exists(&from) || self.filesystem.is_dir(&from) {
                continue;
            }
            self.filesystem.copy_file(&from, &root.join(target.as_path()))?;
            copied += 1;
        }

        if copied == 0 {
            return Ok(None);
        }
        info!(backup = %root.display(), files = copied, "Backed up files");
        Ok(Some(root))
    }

    fn next_steps(
        &self,
        template: &ServiceTemplate,
        config: &ServiceConfiguration,
        pending: &[ServiceConfiguration],
    ) -> Vec<String> {
        let mut steps = Vec::new();

        for var in &template.env_variables {
            if var.required && !var.is_set_by(&config.config) {
                steps.push(format!("Set {} in your environment", var.name));
            }
        }
        for dep in pending {
            steps.push(format!(
                "Add the '{}' dependency: graft add {} {}",
                dep.name, dep.service_type, dep.provider
            ));
        }
        for step in &template.post_injection_steps {
            match &step.command {
                Some(command) => steps.push(format!("{} (run: {})", step.description, command)),
                None => steps.push(step.description.clone()),
            }
        }
        steps
    }

    /// With a runner, execute commanded steps; failures become warnings.
    /// Returns the steps still left for the user.
    fn run_post_steps(
        &self,
        template: &ServiceTemplate,
        config: &ServiceConfiguration,
        pending: &[ServiceConfiguration],
        project: &Path,
        warnings: &mut Vec<String>,
    ) -> Vec<String> {
        let Some(runner) = &self.runner else {
            let steps = self.next_steps(template, config, pending);
            for step in &steps {
                info!(step = %step, "Next step");
            }
            return steps;
        };

        let mut remaining = self.next_steps(
            &ServiceTemplate {
                post_injection_steps: Vec::new(),
                ..template.clone()
            },
            config,
            pending,
        );

        for step in &template.post_injection_steps {
            let Some(command) = &step.command else {
                remaining.push(step.description.clone());
                continue;
            };
            match runner.run(command, project) {
                Ok(output) if output.success => {
                    info!(command = %command, "Post-injection step completed");
                }
                Ok(output) => {
                    warnings.push(format!(
                        "post-injection step '{}' failed (status {}): {}",
                        step.description,
                        output
                            .status
                            .map_or_else(|| "unknown".to_string(), |s| s.to_string()),
                        output.stderr.trim()
                    ));
                    remaining.push(format!("{} (run: {})", step.description, command));
                }
                Err(e) => {
                    warnings.push(format!("post-injection step '{}': {e}", step.description));
                    remaining.push(format!("{} (run: {})", step.description, command));
                }
            }
        }
        remaining
    }

    // -------------------------------------------------------------------------
    // Remove
    // -------------------------------------------------------------------------

    /// Remove a service by id, or by name when exactly one record has it.
    #[instrument(skip_all, fields(service = %reference, project = %project.display(), dry_run = options.dry_run))]
    pub fn remove_service(
        &self,
        reference: &str,
        project: &Path,
        options: &InjectionOptions,
    ) -> RemovalResult {
        let _lock = match self.lock(project, options) {
            Ok(lock) => lock,
            Err(e) => return RemovalResult::failed(e),
        };

        self.remove_locked(reference, project, options, false)
            .unwrap_or_else(|e| {
                warn!(error = %e, "Removal aborted");
                RemovalResult::failed(e)
            })
    }

    fn remove_locked(
        &self,
        reference: &str,
        project: &Path,
        options: &InjectionOptions,
        for_update: bool,
    ) -> GraftResult<RemovalResult> {
        let mut records = self.metadata.load(project)?;
        let record = find_record(&records, reference)?.clone();

        let mut result = RemovalResult {
            dry_run: options.dry_run,
            service_id: Some(record.id),
            ..RemovalResult::default()
        };

        if !for_update {
            let dependents = self.dependents_of(&record, &records)?;
            if !dependents.is_empty() {
                let reason = format!(
                    "'{}' is required by {}",
                    record.name(),
                    dependents.join(", ")
                );
                if options.overwrite {
                    result.warnings.push(format!("overridden: {reason}"));
                } else {
                    return Err(DomainError::Incompatible {
                        service: record.name().to_string(),
                        reasons: vec![reason],
                    }
                    .into());
                }
            }
        }

        for path in &record.files_created {
            if self
                .filesystem
                .exists(&MutationEngine::absolute(project, path))
            {
                result.files_removed.push(path.clone());
            } else {
                result.files_skipped.push(path.clone());
            }
        }
        for path in record.pre_existing_files() {
            result.files_retained.push(path.clone());
            result.warnings.push(format!(
                "{path} existed before '{}' was injected; review its changes manually",
                record.name()
            ));
        }

        if options.dry_run {
            result.success = true;
            return Ok(result);
        }

        if options.backup_files {
            self.backup(project, result.files_removed.iter())?;
        }

        // Files first, then directories deepest-first so parents empty out.
        let (mut dirs, files): (Vec<RelativePath>, Vec<RelativePath>) = result
            .files_removed
            .iter()
            .cloned()
            .partition(|p| self.filesystem.is_dir(&MutationEngine::absolute(project, p)));

        for path in &files {
            self.filesystem
                .remove_file(&MutationEngine::absolute(project, path))?;
        }

        dirs.sort_by_key(|d| std::cmp::Reverse(d.as_str().matches('/').count()));
        for dir in dirs {
            let removed = self
                .filesystem
                .remove_dir_if_empty(&MutationEngine::absolute(project, &dir))?;
            if !removed {
                result.files_removed.retain(|p| p != &dir);
                result.warnings.push(format!(
                    "{dir} is not empty; left in place"
                ));
                result.files_retained.push(dir);
            }
        }

        records.retain(|r| r.id != record.id);
        self.metadata.save(project, &records)?;

        info!(
            id = %record.id,
            removed = result.files_removed.len(),
            retained = result.files_retained.len(),
            "Service removed"
        );
        result.success = true;
        Ok(result)
    }

    /// Names of injected services that depend on `record`.
    fn dependents_of(
        &self,
        record: &ServiceInjectionMetadata,
        records: &[ServiceInjectionMetadata],
    ) -> GraftResult<Vec<String>> {
        let target = &record.configuration;
        let mut dependents = Vec::new();

        for other in records.iter().filter(|r| r.id != record.id) {
            let mut refs = other.configuration.dependencies.clone();
            if let Some(template) = self.templates.get_template(
                other.configuration.service_type,
                &other.configuration.provider,
            )? {
                refs.extend(template.requires);
            }
            if refs.iter().any(|r| target.matches_reference(r)) {
                dependents.push(other.name().to_string());
            }
        }
        Ok(dependents)
    }

    // -------------------------------------------------------------------------
    // Update
    // -------------------------------------------------------------------------

    /// Remove, then re-inject with `changes` merged into the recorded
    /// configuration, all under one lock. The new configuration is
    /// validated and checked before anything is removed, so a rejected
    /// update leaves the service as it was.
    #[instrument(skip_all, fields(service = %reference, project = %project.display()))]
    pub fn update_service(
        &self,
        reference: &str,
        changes: &BTreeMap<String, Value>,
        project: &Path,
        options: &InjectionOptions,
    ) -> UpdateResult {
        let _lock = match self.lock(project, options) {
            Ok(lock) => lock,
            Err(e) => {
                return UpdateResult {
                    removal: RemovalResult::failed(e),
                    ..UpdateResult::default()
                };
            }
        };

        let record = match self
            .metadata
            .load(project)
            .and_then(|records| find_record(&records, reference).cloned())
        {
            Ok(record) => record,
            Err(e) => {
                return UpdateResult {
                    removal: RemovalResult::failed(e),
                    ..UpdateResult::default()
                };
            }
        };

        let mut config = record.configuration.clone();
        config.merge_config(changes);

        let mut warnings = Vec::new();
        let prepared = match self.prepare(config, project, options, Some(&record), &mut warnings)
        {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!(error = %e, "Update rejected, service left in place");
                return UpdateResult {
                    success: false,
                    removal: RemovalResult::default(),
                    injection: InjectionResult::failed(e, warnings),
                };
            }
        };

        let removal = self
            .remove_locked(&record.id.to_string(), project, options, true)
            .unwrap_or_else(RemovalResult::failed);
        if !removal.success {
            return UpdateResult {
                success: false,
                removal,
                injection: InjectionResult::default(),
            };
        }

        let injection = self
            .apply_prepared(prepared, project, options, &mut warnings)
            .unwrap_or_else(|e| InjectionResult::failed(e, warnings));

        if injection.success {
            info!(id = ?injection.service_id, "Service updated");
        }
        UpdateResult {
            success: injection.success,
            removal,
            injection,
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn list_services(&self, project: &Path) -> GraftResult<Vec<ServiceInjectionMetadata>> {
        self.metadata.load(project)
    }

    /// Check `services` together with everything already injected.
    pub fn validate_compatibility(
        &self,
        services: &[ServiceConfiguration],
        project: &Path,
    ) -> GraftResult<CompatibilityReport> {
        let mut all: Vec<ServiceConfiguration> = self
            .metadata
            .load(project)?
            .into_iter()
            .map(|r| r.configuration)
            .filter(|c| !services.iter().any(|s| s.name.eq_ignore_ascii_case(&c.name)))
            .collect();
        all.extend(services.iter().cloned());
        self.resolver.check_compatibility(&all)
    }

    pub fn get_service_template(
        &self,
        service_type: ServiceType,
        provider: &str,
    ) -> GraftResult<Option<ServiceTemplate>> {
        self.templates.get_template(service_type, provider)
    }

    pub fn list_service_templates(
        &self,
        filter: Option<ServiceType>,
    ) -> GraftResult<Vec<ServiceTemplate>> {
        self.templates.list_templates(filter)
    }

    pub fn suggest_services(
        &self,
        project: &Path,
        preset: Option<ProjectPreset>,
    ) -> GraftResult<Vec<ServiceSuggestion>> {
        let current: Vec<ServiceConfiguration> = self
            .metadata
            .load(project)?
            .into_iter()
            .map(|r| r.configuration)
            .collect();
        self.resolver.suggest_services(&current, preset)
    }
}

fn find_record<'a>(
    records: &'a [ServiceInjectionMetadata],
    reference: &str,
) -> GraftResult<&'a ServiceInjectionMetadata> {
    if let Ok(id) = Uuid::parse_str(reference.trim()) {
        if let Some(record) = records.iter().find(|r| r.id == id) {
            return Ok(record);
        }
    }

    let matches: Vec<&ServiceInjectionMetadata> = records
        .iter()
        .filter(|r| r.name().eq_ignore_ascii_case(reference.trim()))
        .collect();
    match matches.as_slice() {
        [one] => Ok(one),
        [] => Err(ApplicationError::ServiceNotFound {
            reference: reference.to_string(),
        }
        .into()),
        many => Err(GraftError::from(ApplicationError::AmbiguousService {
            name: reference.to_string(),
            ids: many.iter().map(|r| r.id.to_string()).collect(),
        })),
    }
}

/// Required variables plus the ones the configuration supplies.
fn env_vars_added(template: &ServiceTemplate, config: &ServiceConfiguration) -> Vec<String> {
    template
        .env_variables
        .iter()
        .filter(|v| v.required || v.is_set_by(&config.config))
        .map(|v| v.name.clone())
        .collect()
}

fn push_unique(list: &mut Vec<RelativePath>, path: &RelativePath) {
    if !list.contains(path) {
        list.push(path.clone());
    }
}
