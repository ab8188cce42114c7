//! Filesystem-based template loader.
//!
//! Discovers `service.toml` manifests anywhere under a root directory and
//! converts them into domain [`ServiceTemplate`]s.
//!
//! # Directory layout expected
//!
//! ```text
//! templates/
//! ├── payment/
//! │   └── stripe/
//! │       ├── service.toml        ← manifest (required)
//! │       └── fragments/
//! │           └── client.ts       ← referenced by `fragment_file`
//! └── auth/
//!     └── clerk/
//!         └── service.toml
//! ```
//!
//! # `service.toml` format
//!
//! ```toml
//! [service]
//! name        = "stripe"
//! type        = "payment"
//! provider    = "stripe"
//! version     = "1.0.0"
//! description = "Stripe payments"       # optional
//! requires    = ["postgres"]            # optional
//! conflicts   = ["paypal"]              # optional
//!
//! [[injection_points]]
//! target        = "src/lib/stripe.ts"
//! kind          = "file"                # file | directory | config
//! priority      = 10                    # higher runs first
//! strategy      = "replace"             # replace | append | prepend | merge
//!                                       # | structured-merge | ast-modify
//! fragment_file = "fragments/client.ts" # or inline `fragment = "..."`
//! pattern       = "// payments"         # replace only
//! condition     = { op = "equals", key = "mode", value = "live" }
//!
//! [[env_variables]]
//! name     = "STRIPE_SECRET_KEY"
//! required = true
//!
//! [[dependencies]]
//! name    = "stripe"
//! version = "^14.0.0"
//!
//! [[post_injection_steps]]
//! description = "Install the SDK"
//! command     = "npm install stripe"
//!
//! [[config_fields]]
//! key      = "currency"
//! default  = "usd"
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use graft_core::{
    application::{
        ApplicationError,
        ports::{RejectedTemplate, TemplateBatch, TemplateSource},
    },
    domain::{
        Condition, ConfigFieldSpec, DependencySpec, DomainError, EnvVariableSpec, InjectionKind,
        InjectionPoint, Mutation, PostInjectionStep, RelativePath, ServiceTemplate, ServiceType,
        StructuredEdit,
    },
    error::GraftResult,
};

pub const MANIFEST_FILE: &str = "service.toml";

// ── Manifest types ────────────────────────────────────────────────────────────

/// Deserialised representation of a `service.toml` file.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ServiceManifest {
    pub service: ServiceSection,
    #[serde(default)]
    pub injection_points: Vec<PointEntry>,
    #[serde(default)]
    pub env_variables: Vec<EnvVariableSpec>,
    #[serde(default)]
    pub dependencies: Vec<DependencySpec>,
    #[serde(default)]
    pub post_injection_steps: Vec<PostInjectionStep>,
    #[serde(default)]
    pub config_fields: Vec<ConfigFieldSpec>,
}

/// `[service]` section: identity of the template.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ServiceSection {
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub provider: String,
    pub version: String,
    pub description: Option<String>,
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default)]
    pub conflicts: Vec<String>,
}

/// One entry under `[[injection_points]]`.
///
/// Flat on purpose: manifests are hand-written, so the strategy and its
/// payload sit side by side instead of in a nested table.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct PointEntry {
    pub target: String,
    pub kind: Option<String>,
    #[serde(default)]
    pub priority: i32,
    pub description: Option<String>,
    pub strategy: Option<String>,
    pub fragment: Option<String>,
    /// Path relative to the manifest's directory.
    pub fragment_file: Option<String>,
    pub pattern: Option<String>,
    pub condition: Option<Condition>,
    pub edit: Option<StructuredEdit>,
}

// ── Loader ────────────────────────────────────────────────────────────────────

/// Loads [`ServiceTemplate`]s from every `service.toml` under a root.
///
/// A manifest that cannot be parsed or fails validation is reported in
/// [`TemplateBatch::rejected`] with all of its problems; it never prevents
/// other templates from loading.
pub struct TemplateLoader {
    templates_dir: PathBuf,
}

impl TemplateLoader {
    pub fn new(templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            templates_dir: templates_dir.into(),
        }
    }

    pub fn templates_dir(&self) -> &Path {
        &self.templates_dir
    }

    /// Parse and convert one manifest.
    ///
    /// Returns every problem found, not just the first.
    #[instrument(skip(self), fields(manifest = %manifest_path.display()))]
    pub fn load_manifest(&self, manifest_path: &Path) -> Result<ServiceTemplate, Vec<String>> {
        let raw = fs::read_to_string(manifest_path)
            .map_err(|e| vec![format!("failed to read manifest: {e}")])?;
        let manifest: ServiceManifest =
            toml::from_str(&raw).map_err(|e| vec![format!("failed to parse manifest: {e}")])?;

        let base = manifest_path.parent().unwrap_or(Path::new("."));
        convert(manifest, base)
    }
}

impl TemplateSource for TemplateLoader {
    #[instrument(skip(self), fields(dir = %self.templates_dir.display()))]
    fn load(&self) -> GraftResult<TemplateBatch> {
        if !self.templates_dir.is_dir() {
            return Err(ApplicationError::TemplateLoad {
                path: self.templates_dir.clone(),
                reason: "templates directory not found".into(),
            }
            .into());
        }

        let mut batch = TemplateBatch::default();

        for entry in WalkDir::new(&self.templates_dir)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| ApplicationError::TemplateLoad {
                path: self.templates_dir.clone(),
                reason: format!("directory walk error: {e}"),
            })?;

            if !entry.file_type().is_file() || entry.file_name() != MANIFEST_FILE {
                continue;
            }

            let path = entry.path();
            match self.load_manifest(path) {
                Ok(template) => {
                    debug!(template = %template.key(), version = %template.version, "loaded template");
                    batch.templates.push(template);
                }
                Err(errors) => {
                    warn!(
                        manifest = %path.display(),
                        errors = %errors.join("; "),
                        "skipping invalid manifest"
                    );
                    batch.rejected.push(RejectedTemplate {
                        source: path.to_path_buf(),
                        errors,
                    });
                }
            }
        }

        debug!(
            loaded = batch.templates.len(),
            rejected = batch.rejected.len(),
            "finished loading templates"
        );
        Ok(batch)
    }
}

// ── Discovery ─────────────────────────────────────────────────────────────────

/// Environment variable naming an explicit templates directory.
pub const TEMPLATES_DIR_ENV: &str = "GRAFT_TEMPLATES_DIR";

/// Find a templates directory when none was configured.
///
/// Probes, in order: `$GRAFT_TEMPLATES_DIR`, `./templates`,
/// `<executable-dir>/templates` and `../templates`. Returns the first that
/// exists as a directory.
#[instrument]
pub fn discover_templates_dir() -> Option<PathBuf> {
    let found = candidate_paths().into_iter().find(|candidate| {
        let exists = candidate.is_dir();
        debug!(path = %candidate.display(), exists, "checking templates candidate");
        exists
    });
    if found.is_none() {
        warn!(
            "no templates directory found; checked ${TEMPLATES_DIR_ENV}, ./templates, \
             <exe>/templates and ../templates"
        );
    }
    found
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(4);

    if let Ok(dir) = std::env::var(TEMPLATES_DIR_ENV) {
        paths.push(PathBuf::from(dir));
    }
    paths.push(PathBuf::from("templates"));
    if let Some(sibling) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.join("templates")))
    {
        paths.push(sibling);
    }
    paths.push(PathBuf::from("../templates"));

    paths
}

// ── Conversion ────────────────────────────────────────────────────────────────

fn convert(manifest: ServiceManifest, base: &Path) -> Result<ServiceTemplate, Vec<String>> {
    let mut errors = Vec::new();

    let service_type = match manifest.service.service_type.parse::<ServiceType>() {
        Ok(t) => Some(t),
        Err(e) => {
            errors.push(e.to_string());
            None
        }
    };

    let mut points = Vec::with_capacity(manifest.injection_points.len());
    for (index, entry) in manifest.injection_points.into_iter().enumerate() {
        match convert_point(entry, base) {
            Ok(point) => points.push(point),
            Err(e) => errors.push(format!("injection point #{}: {e}", index + 1)),
        }
    }

    let Some(service_type) = service_type else {
        return Err(errors);
    };

    let template = ServiceTemplate {
        name: manifest.service.name,
        service_type,
        provider: manifest.service.provider,
        version: manifest.service.version,
        description: manifest.service.description.unwrap_or_default(),
        injection_points: points,
        env_variables: manifest.env_variables,
        dependencies: manifest.dependencies,
        post_injection_steps: manifest.post_injection_steps,
        requires: manifest.service.requires,
        conflicts: manifest.service.conflicts,
        config_fields: manifest.config_fields,
    };

    // Point-level errors already explain themselves; only add what the
    // template validator finds on top.
    if let Err(DomainError::InvalidTemplate { errors: found, .. }) =
        template.validate()
    {
        errors.extend(found);
    }

    if errors.is_empty() {
        Ok(template)
    } else {
        Err(errors)
    }
}

fn convert_point(entry: PointEntry, base: &Path) -> Result<InjectionPoint, String> {
    let target = RelativePath::try_new(&entry.target).map_err(|e| e.to_string())?;
    let kind = match entry.kind.as_deref() {
        Some(kind) => kind.parse::<InjectionKind>().map_err(|e| e.to_string())?,
        None => InjectionKind::File,
    };

    let fragment = match (entry.fragment, entry.fragment_file) {
        (Some(_), Some(_)) => return Err("use either fragment or fragment_file, not both".into()),
        (Some(inline), None) => Some(inline),
        (None, Some(file)) => {
            let relative = RelativePath::try_new(&file).map_err(|e| e.to_string())?;
            let path = base.join(relative.as_path());
            Some(
                fs::read_to_string(&path)
                    .map_err(|e| format!("failed to read fragment_file '{file}': {e}"))?,
            )
        }
        (None, None) => None,
    };

    let mutation = match kind {
        InjectionKind::Directory => Mutation::Append {
            fragment: String::new(),
        },
        _ => build_mutation(
            entry.strategy.as_deref(),
            fragment,
            entry.pattern,
            entry.edit,
        )?,
    };

    let mut point = InjectionPoint::new(target, mutation)
        .with_kind(kind)
        .with_priority(entry.priority);
    if let Some(condition) = entry.condition {
        point = point.with_condition(condition);
    }
    if let Some(description) = entry.description {
        point = point.with_description(description);
    }
    Ok(point)
}

fn build_mutation(
    strategy: Option<&str>,
    fragment: Option<String>,
    pattern: Option<String>,
    edit: Option<StructuredEdit>,
) -> Result<Mutation, String> {
    let strategy = strategy.ok_or("missing strategy")?;
    let need_fragment = |fragment: Option<String>| {
        fragment.ok_or_else(|| format!("{strategy} needs a fragment"))
    };

    if pattern.is_some() && strategy != "replace" {
        return Err(format!("pattern is only valid with replace, not {strategy}"));
    }
    if edit.is_some() && strategy != "ast-modify" {
        return Err(format!("edit is only valid with ast-modify, not {strategy}"));
    }

    match strategy.to_ascii_lowercase().as_str() {
        "replace" => Ok(Mutation::Replace {
            fragment: fragment.unwrap_or_default(),
            pattern,
        }),
        "append" => Ok(Mutation::Append {
            fragment: need_fragment(fragment)?,
        }),
        "prepend" => Ok(Mutation::Prepend {
            fragment: need_fragment(fragment)?,
        }),
        "merge" => Ok(Mutation::Merge {
            fragment: need_fragment(fragment)?,
        }),
        "structured-merge" | "structured_merge" => Ok(Mutation::StructuredMerge {
            fragment: need_fragment(fragment)?,
        }),
        "ast-modify" | "ast_modify" => Ok(Mutation::AstModify {
            edit: edit.ok_or("ast-modify needs an edit table")?,
        }),
        other => Err(format!(
            "unknown strategy '{other}'; expected replace, append, prepend, merge, \
             structured-merge or ast-modify"
        )),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
