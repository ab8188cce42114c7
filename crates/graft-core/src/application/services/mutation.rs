//! Mutation Engine - applies one injection point to a project tree.
//!
//! Text strategies (`replace`, `append`, `prepend`) work on any file.
//! Structured strategies go through a [`StructuredCodec`] picked by file
//! extension, and `ast-modify` through the [`StructuredEditor`] registered
//! for the target's language.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace};

use crate::{
    application::{
        ApplicationError,
        ports::{Filesystem, StructuredCodec, StructuredEditor},
    },
    domain::{
        Condition, ConditionContext, InjectionKind, InjectionPoint, Mutation, RelativePath,
        RenderContext, StructuredEdit, deep_merge,
    },
    error::{GraftError, GraftResult},
};

/// Inputs shared by every point of one injection.
pub struct MutationContext<'a> {
    pub project: &'a Path,
    pub render: &'a RenderContext,
    pub config: &'a BTreeMap<String, Value>,
    pub environment: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointOutcome {
    /// The point's condition was false; nothing was touched.
    Skipped { target: RelativePath },
    Applied {
        target: RelativePath,
        /// The target did not exist before.
        created: bool,
        /// The target's content (or existence) changed.
        changed: bool,
        /// Missing parent directories created on the way, outermost first.
        dirs_created: Vec<RelativePath>,
    },
}

pub struct MutationEngine {
    filesystem: Arc<dyn Filesystem>,
    codecs: Vec<Box<dyn StructuredCodec>>,
    editors: Vec<Box<dyn StructuredEditor>>,
}

impl MutationEngine {
    pub fn new(filesystem: Arc<dyn Filesystem>) -> Self {
        Self {
            filesystem,
            codecs: Vec::new(),
            editors: Vec::new(),
        }
    }

    pub fn with_codec(mut self, codec: Box<dyn StructuredCodec>) -> Self {
        self.codecs.push(codec);
        self
    }

    pub fn with_editor(mut self, editor: Box<dyn StructuredEditor>) -> Self {
        self.editors.push(editor);
        self
    }

    fn codec_for(&self, path: &RelativePath) -> Option<&dyn StructuredCodec> {
        self.codecs
            .iter()
            .find(|c| c.handles(path))
            .map(|c| c.as_ref())
    }

    fn editor_for(&self, path: &RelativePath) -> Option<&dyn StructuredEditor> {
        self.editors
            .iter()
            .find(|e| e.handles(path))
            .map(|e| e.as_ref())
    }

    pub fn absolute(project: &Path, target: &RelativePath) -> PathBuf {
        project.join(target.as_path())
    }

    pub fn condition_holds(&self, condition: Option<&Condition>, ctx: &MutationContext<'_>) -> bool {
        let Some(condition) = condition else {
            return true;
        };
        let exists = |p: &RelativePath| self.filesystem.exists(&Self::absolute(ctx.project, p));
        condition.evaluate(&ConditionContext::new(ctx.config, ctx.environment, &exists))
    }

    /// Apply one point.
    ///
    /// Writes happen only when the new content differs from the old.
    pub fn apply(
        &self,
        point: &InjectionPoint,
        ctx: &MutationContext<'_>,
    ) -> GraftResult<PointOutcome> {
        let target = point.target.clone();

        if !self.condition_holds(point.condition.as_ref(), ctx) {
            debug!(target = %target, "Condition false, skipping point");
            return Ok(PointOutcome::Skipped { target });
        }

        let path = Self::absolute(ctx.project, &target);

        if point.kind == InjectionKind::Directory {
            let existed = self.filesystem.is_dir(&path);
            let dirs_created = self.missing_dirs(ctx.project, target.parent());
            self.filesystem.create_dir_all(&path)?;
            return Ok(PointOutcome::Applied {
                target,
                created: !existed,
                changed: !existed,
                dirs_created,
            });
        }

        if self.filesystem.is_dir(&path) {
            return Err(ApplicationError::EditFailed {
                path: target.to_string(),
                reason: "target is a directory".into(),
            }
            .into());
        }

        let existed = self.filesystem.exists(&path);
        let current = if existed {
            Some(self.filesystem.read_to_string(&path)?)
        } else {
            None
        };

        let updated = self.mutate(&target, current.as_deref(), &point.mutation, ctx.render)?;

        if current.as_deref() == Some(updated.as_str()) {
            trace!(target = %target, "Content unchanged");
            return Ok(PointOutcome::Applied {
                target,
                created: false,
                changed: false,
                dirs_created: Vec::new(),
            });
        }

        let dirs_created = self.missing_dirs(ctx.project, target.parent());
        if let Some(parent) = path.parent() {
            self.filesystem.create_dir_all(parent)?;
        }
        self.filesystem.write_file(&path, &updated)?;
        debug!(target = %target, strategy = point.mutation.strategy(), created = !existed, "Point applied");

        Ok(PointOutcome::Applied {
            target,
            created: !existed,
            changed: true,
            dirs_created,
        })
    }

    /// `dir` and its ancestors that do not exist yet, outermost first.
    /// Never reaches above the project root.
    pub fn missing_dirs(&self, project: &Path, dir: Option<RelativePath>) -> Vec<RelativePath> {
        let mut missing = Vec::new();
        let mut current = dir;
        while let Some(d) = current {
            if self.filesystem.exists(&Self::absolute(project, &d)) {
                break;
            }
            current = d.parent();
            missing.push(d);
        }
        missing.reverse();
        missing
    }

    /// Compute the new content of a file target without writing it.
    pub fn mutate(
        &self,
        target: &RelativePath,
        current: Option<&str>,
        mutation: &Mutation,
        render: &RenderContext,
    ) -> GraftResult<String> {
        match mutation {
            Mutation::Replace {
                fragment,
                pattern: None,
            } => Ok(render.render(fragment)),
            Mutation::Replace {
                fragment,
                pattern: Some(pattern),
            } => {
                let current = require_existing(target, current, "replace")?;
                let pattern = render.render(pattern);
                if !current.contains(&pattern) {
                    return Err(ApplicationError::PatternNotFound {
                        path: target.to_string(),
                        pattern,
                    }
                    .into());
                }
                Ok(current.replace(&pattern, &render.render(fragment)))
            }
            Mutation::Append { fragment } => Ok(append(current, &render.render(fragment))),
            Mutation::Prepend { fragment } => {
                let current = require_existing(target, current, "prepend")?;
                Ok(prepend(current, &render.render(fragment)))
            }
            Mutation::Merge { fragment } => match self.codec_for(target) {
                Some(codec) => structured_merge(codec, target, current, &render.render(fragment)),
                None => Ok(append(current, &render.render(fragment))),
            },
            Mutation::StructuredMerge { fragment } => {
                let codec = self.codec_for(target).ok_or_else(|| {
                    GraftError::from(ApplicationError::UnsupportedFormat {
                        path: target.to_string(),
                    })
                })?;
                structured_merge(codec, target, current, &render.render(fragment))
            }
            Mutation::AstModify { edit } => {
                let editor = self.editor_for(target).ok_or_else(|| {
                    GraftError::from(ApplicationError::NoEditorForPath {
                        path: target.to_string(),
                    })
                })?;
                editor
                    .apply(current.unwrap_or_default(), &render_edit(edit, render))
                    .map_err(|e| with_path(e, target))
            }
        }
    }
}

fn require_existing<'a>(
    target: &RelativePath,
    current: Option<&'a str>,
    strategy: &'static str,
) -> GraftResult<&'a str> {
    current.ok_or_else(|| {
        ApplicationError::TargetMissing {
            path: target.to_string(),
            strategy,
        }
        .into()
    })
}

fn already_present(current: &str, fragment: &str) -> bool {
    let needle = fragment.trim();
    !needle.is_empty() && current.contains(needle)
}

fn append(current: Option<&str>, fragment: &str) -> String {
    match current {
        None => fragment.to_string(),
        Some(c) if c.is_empty() => fragment.to_string(),
        Some(c) if already_present(c, fragment) => c.to_string(),
        Some(c) if c.ends_with('\n') => format!("{c}{fragment}"),
        Some(c) => format!("{c}\n{fragment}"),
    }
}

fn prepend(current: &str, fragment: &str) -> String {
    if already_present(current, fragment) {
        current.to_string()
    } else if fragment.ends_with('\n') || current.is_empty() {
        format!("{fragment}{current}")
    } else {
        format!("{fragment}\n{current}")
    }
}

fn structured_merge(
    codec: &dyn StructuredCodec,
    target: &RelativePath,
    current: Option<&str>,
    fragment: &str,
) -> GraftResult<String> {
    let mut base = match current {
        Some(text) if !text.trim().is_empty() => {
            codec.parse(text).map_err(|e| with_path(e, target))?
        }
        _ => Value::Object(serde_json::Map::new()),
    };
    let overlay = codec.parse(fragment).map_err(|e| with_path(e, target))?;
    deep_merge(&mut base, overlay);
    codec.render(&base)
}

/// Codecs and editors don't know which file they work on; attach it.
fn with_path(error: GraftError, target: &RelativePath) -> GraftError {
    match error {
        GraftError::Application(ApplicationError::ParseFailed { format, reason, .. }) => {
            ApplicationError::ParseFailed {
                path: target.to_string(),
                format,
                reason,
            }
            .into()
        }
        GraftError::Application(ApplicationError::EditFailed { reason, .. }) => {
            ApplicationError::EditFailed {
                path: target.to_string(),
                reason,
            }
            .into()
        }
        other => other,
    }
}

fn render_edit(edit: &StructuredEdit, ctx: &RenderContext) -> StructuredEdit {
    let r = |s: &String| ctx.render(s);
    match edit {
        StructuredEdit::AddImport {
            module,
            names,
            default,
        } => StructuredEdit::AddImport {
            module: r(module),
            names: names.iter().map(r).collect(),
            default: default.as_ref().map(r),
        },
        StructuredEdit::AddExport { statement } => StructuredEdit::AddExport {
            statement: r(statement),
        },
        StructuredEdit::AddDeclaration { name, kind, source } => StructuredEdit::AddDeclaration {
            name: r(name),
            kind: kind.clone(),
            source: r(source),
        },
        StructuredEdit::ModifyFunction {
            name,
            add_parameter,
            add_statement,
        } => StructuredEdit::ModifyFunction {
            name: r(name),
            add_parameter: add_parameter.as_ref().map(r),
            add_statement: add_statement.as_ref().map(r),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::testing::{JsonTestCodec, MemoryFs};
    use crate::domain::{ServiceConfiguration, ServiceType};

    fn path(p: &str) -> RelativePath {
        RelativePath::try_new(p).unwrap()
    }

    fn engine(fs: &Arc<MemoryFs>) -> MutationEngine {
        MutationEngine::new(fs.clone()).with_codec(Box::new(JsonTestCodec))
    }

    fn run(engine: &MutationEngine, point: &InjectionPoint, env: &str) -> GraftResult<PointOutcome> {
        let config = ServiceConfiguration::new("payments", ServiceType::Payment, "stripe")
            .with_config("mode", "live");
        let render = RenderContext::for_service(&config, env);
        let ctx = MutationContext {
            project: Path::new("/proj"),
            render: &render,
            config: &config.config,
            environment: env,
        };
        engine.apply(point, &ctx)
    }

    #[test]
    fn replace_without_pattern_creates_file_and_parents() {
        let fs = Arc::new(MemoryFs::default());
        let point = InjectionPoint::new(
            path("config/payment.ts"),
            Mutation::Replace {
                fragment: "export const provider = '{{PROVIDER}}';\n".into(),
                pattern: None,
            },
        );

        let outcome = run(&engine(&fs), &point, "development").unwrap();

        assert_eq!(
            outcome,
            PointOutcome::Applied {
                target: path("config/payment.ts"),
                created: true,
                changed: true,
                dirs_created: vec![path("config")],
            }
        );
        assert_eq!(
            fs.read("/proj/config/payment.ts").as_deref(),
            Some("export const provider = 'stripe';\n")
        );
    }

    #[test]
    fn replace_with_pattern_needs_the_pattern() {
        let fs = Arc::new(MemoryFs::default());
        fs.put("/proj/app.ts", "const a = PLACEHOLDER; const b = PLACEHOLDER;");
        let engine = engine(&fs);

        let point = InjectionPoint::new(
            path("app.ts"),
            Mutation::Replace {
                fragment: "{{config.mode}}".into(),
                pattern: Some("PLACEHOLDER".into()),
            },
        );
        run(&engine, &point, "development").unwrap();
        assert_eq!(
            fs.read("/proj/app.ts").as_deref(),
            Some("const a = live; const b = live;")
        );

        let err = run(&engine, &point, "development").unwrap_err();
        assert!(matches!(
            err,
            GraftError::Application(ApplicationError::PatternNotFound { .. })
        ));
    }

    #[test]
    fn append_is_idempotent_and_prepend_requires_target() {
        let fs = Arc::new(MemoryFs::default());
        let engine = engine(&fs);
        let append = InjectionPoint::new(
            path(".env.example"),
            Mutation::Append {
                fragment: "STRIPE_KEY=\n".into(),
            },
        );

        run(&engine, &append, "development").unwrap();
        let second = run(&engine, &append, "development").unwrap();
        assert!(matches!(second, PointOutcome::Applied { changed: false, .. }));
        assert_eq!(fs.read("/proj/.env.example").as_deref(), Some("STRIPE_KEY=\n"));

        let prepend = InjectionPoint::new(
            path("missing.ts"),
            Mutation::Prepend {
                fragment: "// header".into(),
            },
        );
        assert!(matches!(
            run(&engine, &prepend, "development"),
            Err(GraftError::Application(ApplicationError::TargetMissing { .. }))
        ));
    }

    #[test]
    fn structured_merge_deep_merges_json() {
        let fs = Arc::new(MemoryFs::default());
        fs.put(
            "/proj/package.json",
            r#"{"name":"shop","dependencies":{"react":"^18"}}"#,
        );
        let point = InjectionPoint::new(
            path("package.json"),
            Mutation::StructuredMerge {
                fragment: r#"{"dependencies":{"stripe":"^14"}}"#.into(),
            },
        );

        run(&engine(&fs), &point, "development").unwrap();

        let merged: Value = serde_json::from_str(&fs.read("/proj/package.json").unwrap()).unwrap();
        assert_eq!(merged["dependencies"]["react"], "^18");
        assert_eq!(merged["dependencies"]["stripe"], "^14");
        assert_eq!(merged["name"], "shop");
    }

    #[test]
    fn merge_falls_back_to_append_for_unknown_formats() {
        let fs = Arc::new(MemoryFs::default());
        fs.put("/proj/README.md", "# Shop\n");
        let point = InjectionPoint::new(
            path("README.md"),
            Mutation::Merge {
                fragment: "## Payments\n".into(),
            },
        );

        run(&engine(&fs), &point, "development").unwrap();
        assert_eq!(fs.read("/proj/README.md").as_deref(), Some("# Shop\n## Payments\n"));
    }

    #[test]
    fn structured_merge_without_codec_fails() {
        let fs = Arc::new(MemoryFs::default());
        let point = InjectionPoint::new(
            path("settings.yaml"),
            Mutation::StructuredMerge {
                fragment: "a: 1".into(),
            },
        );
        assert!(matches!(
            run(&engine(&fs), &point, "development"),
            Err(GraftError::Application(ApplicationError::UnsupportedFormat { .. }))
        ));
    }

    #[test]
    fn ast_modify_without_editor_fails() {
        let fs = Arc::new(MemoryFs::default());
        let point = InjectionPoint::new(
            path("src/index.ts"),
            Mutation::AstModify {
                edit: StructuredEdit::AddExport {
                    statement: "export * from './payments';".into(),
                },
            },
        );
        assert!(matches!(
            run(&engine(&fs), &point, "development"),
            Err(GraftError::Application(ApplicationError::NoEditorForPath { .. }))
        ));
    }

    #[test]
    fn false_condition_skips_without_side_effects() {
        let fs = Arc::new(MemoryFs::default());
        let point = InjectionPoint::new(
            path("prod-only.ts"),
            Mutation::Append {
                fragment: "x".into(),
            },
        )
        .with_condition(Condition::Environment {
            any_of: vec!["production".into()],
        });

        let outcome = run(&engine(&fs), &point, "development").unwrap();
        assert!(matches!(outcome, PointOutcome::Skipped { .. }));
        assert!(fs.read("/proj/prod-only.ts").is_none());

        run(&engine(&fs), &point, "production").unwrap();
        assert!(fs.read("/proj/prod-only.ts").is_some());
    }

    #[test]
    fn directory_points_only_ensure_the_directory() {
        let fs = Arc::new(MemoryFs::default());
        let point = InjectionPoint::directory(path("src/payments"));

        let first = run(&engine(&fs), &point, "development").unwrap();
        let second = run(&engine(&fs), &point, "development").unwrap();

        assert!(matches!(first, PointOutcome::Applied { created: true, .. }));
        assert!(matches!(second, PointOutcome::Applied { created: false, changed: false, .. }));
        assert!(fs.is_dir(Path::new("/proj/src/payments")));
    }

    #[test]
    fn reports_every_missing_parent_directory() {
        let fs = Arc::new(MemoryFs::default());
        fs.put("/proj/src/app.ts", "");
        let point = InjectionPoint::new(
            path("src/lib/payments/client.ts"),
            Mutation::Append {
                fragment: "// client\n".into(),
            },
        );

        let outcome = run(&engine(&fs), &point, "development").unwrap();

        let PointOutcome::Applied { dirs_created, .. } = outcome else {
            panic!("expected the point to apply");
        };
        assert_eq!(dirs_created, vec![path("src/lib"), path("src/lib/payments")]);
        assert!(fs.is_dir(Path::new("/proj/src/lib/payments")));
    }
}
