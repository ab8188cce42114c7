//! TypeScript / JavaScript editor.
//!
//! Works on the source text with a lexical scan rather than a full parser:
//! imports, top-level declarations and function bodies are located at code
//! level (never inside strings or comments) and edited in place. Every verb is
//! idempotent.
//!
//! # Limitations
//!
//! Without a syntax tree some sources are out of reach:
//!
//! - Regular expression literals are not recognised. A quote or `//` inside
//!   one (`/"|'/`) throws the scan off for the rest of the file.
//! - Template literals are opaque, `${}` included. Code inside an
//!   interpolation is never matched, and a nested backtick inside `${}` ends
//!   the literal early.
//! - JSX text is scanned as code, so an apostrophe in element text opens a
//!   string that never closes.
//! - `add-export` checks for an existing statement against the whole text,
//!   comments and strings included, after collapsing whitespace.
//! - `modify-function` finds `function name` or a `const`/`let`/`var`
//!   binding to an arrow or function expression, written with single
//!   spaces. Class and object methods are not found. The first match wins,
//!   so overloads and shadowed names are not told apart.
//! - Inserted text is not reformatted beyond copying the surrounding
//!   indentation.
//!
//! When an edit cannot be located the verb fails with `EditFailed`, which
//! the engine reports as a warning for that point.

use tracing::debug;

use graft_core::{
    application::{ApplicationError, ports::StructuredEditor},
    domain::RelativePath,
    error::{GraftError, GraftResult},
};

use super::scan::{Scanned, is_ident, normalized, split_top_level};

const EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"];
const DECLARATION_KINDS: &[&str] = &[
    "const",
    "let",
    "var",
    "function",
    "class",
    "interface",
    "type",
    "enum",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptEditor;

impl TypeScriptEditor {
    pub fn new() -> Self {
        Self
    }
}

/// One `import ... from "module";` statement.
#[derive(Debug)]
struct ImportStatement {
    start: usize,
    /// Just past the statement, including a trailing `;`.
    end: usize,
    module: String,
    quote: char,
    semicolon: bool,
    default: Option<String>,
    /// `None` when the statement has no `{ ... }` clause.
    named: Option<Vec<String>>,
    namespace: bool,
}

fn edit_failed(reason: impl Into<String>) -> GraftError {
    ApplicationError::EditFailed {
        path: String::new(),
        reason: reason.into(),
    }
    .into()
}

fn imports(scanned: &Scanned<'_>) -> Vec<ImportStatement> {
    let source = scanned.source;
    let mut found = Vec::new();
    let mut from = 0;

    while let Some(at) = scanned.find_word("import", from) {
        from = at + "import".len();
        // Only statements at the start of a line; skips `import(...)` and
        // `import.meta` too.
        if !source[scanned.line_start(at)..at].trim().is_empty() {
            continue;
        }
        let rest = &source[from..];
        let first = rest.trim_start().chars().next();
        if matches!(first, Some('(') | Some('.')) {
            continue;
        }
        if let Some(statement) = parse_import(scanned, at, from) {
            from = statement.end;
            found.push(statement);
        }
    }
    found
}

fn parse_import(scanned: &Scanned<'_>, start: usize, after_keyword: usize) -> Option<ImportStatement> {
    let source = scanned.source;
    let bytes = source.as_bytes();

    // The module specifier is the first string literal after the keyword.
    let quote_at = (after_keyword..bytes.len())
        .find(|&i| matches!(bytes[i], b'"' | b'\'') && !scanned.is_code(i))?;
    let quote = bytes[quote_at] as char;
    let close = source[quote_at + 1..].find(quote)? + quote_at + 1;
    let module = source[quote_at + 1..close].to_string();

    let clause = source[after_keyword..quote_at].trim();
    let clause = clause.strip_suffix("from").unwrap_or(clause).trim();
    let clause = clause.strip_prefix("type ").unwrap_or(clause).trim();

    let mut end = close + 1;
    let semicolon = bytes.get(end) == Some(&b';');
    if semicolon {
        end += 1;
    }

    let (head, named) = match (clause.find('{'), clause.rfind('}')) {
        (Some(open), Some(close)) if open < close => {
            let names = split_top_level(&clause[open + 1..close])
                .into_iter()
                .map(str::to_string)
                .collect();
            (clause[..open].trim().trim_end_matches(',').trim(), Some(names))
        }
        _ => (clause, None),
    };

    let namespace = head.starts_with('*');
    let default = (!head.is_empty() && !namespace).then(|| head.to_string());

    Some(ImportStatement {
        start,
        end,
        module,
        quote,
        semicolon,
        default,
        named,
        namespace,
    })
}

fn render_import(
    default: Option<&str>,
    named: &[String],
    module: &str,
    quote: char,
    semicolon: bool,
) -> String {
    let mut clause = String::new();
    if let Some(default) = default {
        clause.push_str(default);
    }
    if !named.is_empty() {
        if !clause.is_empty() {
            clause.push_str(", ");
        }
        clause.push_str(&format!("{{ {} }}", named.join(", ")));
    }
    let end = if semicolon { ";" } else { "" };
    if clause.is_empty() {
        format!("import {quote}{module}{quote}{end}")
    } else {
        format!("import {clause} from {quote}{module}{quote}{end}")
    }
}

/// Where new top-level code goes: after the last import, or after leading
/// directives and a shebang.
fn insertion_point(scanned: &Scanned<'_>, imports: &[ImportStatement]) -> usize {
    if let Some(last) = imports.last() {
        return scanned.line_end(last.end.saturating_sub(1));
    }

    let source = scanned.source;
    let mut at = 0;
    for line in source.split_inclusive('\n') {
        let trimmed = line.trim();
        let directive = trimmed.starts_with("#!")
            || trimmed.starts_with("\"use ")
            || trimmed.starts_with("'use ");
        if !directive {
            break;
        }
        at += line.len();
    }
    at
}

/// Local name an import specifier binds: `a as b` binds `b`.
fn bound_name(specifier: &str) -> &str {
    let specifier = specifier.trim().trim_start_matches("type ").trim();
    specifier
        .rsplit_once(" as ")
        .map_or(specifier, |(_, alias)| alias.trim())
}

fn insert_at(source: &str, at: usize, text: &str) -> String {
    let mut out = String::with_capacity(source.len() + text.len() + 1);
    out.push_str(&source[..at]);
    if at > 0 && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(text);
    out.push_str(&source[at..]);
    out
}

fn with_newline(text: &str) -> String {
    let trimmed = text.trim_end();
    format!("{trimmed}\n")
}

/// Parameter name as written in a signature: `opts?: Options = {}` gives `opts`.
fn parameter_name(parameter: &str) -> &str {
    let parameter = parameter.trim().trim_start_matches("...");
    let end = parameter
        .bytes()
        .position(|b| !is_ident(b))
        .unwrap_or(parameter.len());
    &parameter[..end]
}

/// `(` opening the parameter list of function `name`, if it is declared.
fn function_params(scanned: &Scanned<'_>, name: &str) -> Option<usize> {
    let source = scanned.source;

    if let Some(at) = scanned.find_word(&format!("function {name}"), 0) {
        return scanned.find_byte(b'(', at);
    }

    for kind in ["const", "let", "var"] {
        let Some(at) = scanned.find_word(&format!("{kind} {name}"), 0) else {
            continue;
        };
        let eq = scanned.find_byte(b'=', at)?;
        let rest = source[eq + 1..].trim_start();
        let rest = rest.strip_prefix("async").map_or(rest, str::trim_start);
        if rest.starts_with('(') {
            return scanned.find_byte(b'(', eq);
        }
        if rest.starts_with("function") {
            return scanned.find_byte(b'(', eq);
        }
    }
    None
}

impl StructuredEditor for TypeScriptEditor {
    fn language(&self) -> &'static str {
        "typescript"
    }

    fn handles(&self, path: &RelativePath) -> bool {
        path.extension()
            .is_some_and(|ext| EXTENSIONS.contains(&ext.as_str()))
    }

    fn add_import(
        &self,
        source: &str,
        module: &str,
        names: &[String],
        default: Option<String>,
    ) -> GraftResult<String> {
        if module.trim().is_empty() {
            return Err(edit_failed("import module must not be empty"));
        }
        let scanned = Scanned::new(source);
        let statements = imports(&scanned);

        let existing = statements
            .iter()
            .find(|s| s.module == module && !s.namespace);

        if let Some(statement) = existing {
            let mut named = statement.named.clone().unwrap_or_default();
            let mut changed = false;
            for name in names {
                let wanted = bound_name(name);
                if !named.iter().any(|n| bound_name(n) == wanted) {
                    named.push(name.clone());
                    changed = true;
                }
            }
            let mut statement_default = statement.default.clone();
            if statement_default.is_none() && default.is_some() {
                statement_default = default.clone();
                changed = true;
            }
            if !changed {
                return Ok(source.to_string());
            }

            debug!(module, "Extending existing import");
            let rendered = render_import(
                statement_default.as_deref(),
                &named,
                module,
                statement.quote,
                statement.semicolon,
            );
            return Ok(format!(
                "{}{}{}",
                &source[..statement.start],
                rendered,
                &source[statement.end..]
            ));
        }

        // A namespace import of the same module already covering the default.
        if names.is_empty()
            && default.is_none()
            && statements.iter().any(|s| s.module == module)
        {
            return Ok(source.to_string());
        }

        debug!(module, "Adding import");
        let line = render_import(default.as_deref(), names, module, '"', true);
        let at = insertion_point(&scanned, &statements);
        Ok(insert_at(source, at, &format!("{line}\n")))
    }

    fn add_export(&self, source: &str, statement: &str) -> GraftResult<String> {
        let wanted = normalized(statement);
        if wanted.is_empty() {
            return Err(edit_failed("export statement must not be empty"));
        }
        if normalized(source).contains(&wanted) {
            return Ok(source.to_string());
        }

        let mut out = source.to_string();
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&with_newline(statement));
        Ok(out)
    }

    fn add_declaration(
        &self,
        source: &str,
        name: &str,
        kind: Option<String>,
        declaration: &str,
    ) -> GraftResult<String> {
        if name.trim().is_empty() || !name.bytes().all(is_ident) {
            return Err(edit_failed(format!("'{name}' is not a valid identifier")));
        }
        let scanned = Scanned::new(source);

        let kinds: Vec<&str> = match kind.as_deref() {
            Some(kind) => vec![kind],
            None => DECLARATION_KINDS.to_vec(),
        };
        let declared = kinds
            .iter()
            .any(|kind| scanned.find_word(&format!("{kind} {name}"), 0).is_some());
        if declared {
            return Ok(source.to_string());
        }

        let statements = imports(&scanned);
        let at = insertion_point(&scanned, &statements);
        let text = if statements.is_empty() {
            format!("{}\n", with_newline(declaration))
        } else {
            format!("\n{}", with_newline(declaration))
        };
        debug!(name, "Adding declaration");
        Ok(insert_at(source, at, &text))
    }

    fn modify_function(
        &self,
        source: &str,
        name: &str,
        add_parameter: Option<String>,
        add_statement: Option<String>,
    ) -> GraftResult<String> {
        let scanned = Scanned::new(source);
        let open_paren = function_params(&scanned, name)
            .ok_or_else(|| edit_failed(format!("function '{name}' not found")))?;
        let close_paren = scanned
            .matching(open_paren)
            .ok_or_else(|| edit_failed(format!("unbalanced parameters in '{name}'")))?;
        let open_brace = scanned
            .find_byte(b'{', close_paren)
            .ok_or_else(|| edit_failed(format!("function '{name}' has no block body")))?;
        let close_brace = scanned
            .matching(open_brace)
            .ok_or_else(|| edit_failed(format!("unbalanced body in '{name}'")))?;

        let mut out = source.to_string();

        // Later edits first so earlier indices stay valid.
        if let Some(statement) = add_statement.as_deref().map(str::trim) {
            let body = &source[open_brace + 1..close_brace];
            if !statement.is_empty() && !normalized(body).contains(&normalized(statement)) {
                let outer = scanned.indent_at(open_paren);
                let inner = body
                    .lines()
                    .find(|l| !l.trim().is_empty())
                    .map(|l| l[..l.len() - l.trim_start().len()].to_string())
                    .unwrap_or_else(|| format!("{outer}  "));

                if body.trim().is_empty() {
                    out.replace_range(
                        open_brace + 1..close_brace,
                        &format!("\n{inner}{statement}\n{outer}"),
                    );
                } else {
                    let last = open_brace + 1 + body.trim_end().len();
                    out.insert_str(last, &format!("\n{inner}{statement}"));
                }
            }
        }

        if let Some(parameter) = add_parameter.as_deref().map(str::trim) {
            let params = &source[open_paren + 1..close_paren];
            let wanted = parameter_name(parameter);
            let present = split_top_level(params)
                .iter()
                .any(|p| parameter_name(p) == wanted);
            if !parameter.is_empty() && !present {
                let trimmed = params.trim_end();
                if trimmed.trim().is_empty() {
                    out.replace_range(open_paren + 1..close_paren, parameter);
                } else {
                    let at = open_paren + 1 + trimmed.len();
                    let glue = if trimmed.ends_with(',') { " " } else { ", " };
                    out.insert_str(at, &format!("{glue}{parameter}"));
                }
            }
        }

        if out != source {
            debug!(function = name, "Modified function");
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_core::domain::StructuredEdit;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    const APP: &str = r#"import express from "express";
import { json } from 'body-parser';

const app = express();

export function setup(app) {
  app.use(json());
}
"#;

    #[test]
    fn handles_script_extensions() {
        let editor = TypeScriptEditor::new();
        assert!(editor.handles(&RelativePath::try_new("src/app.ts").unwrap()));
        assert!(editor.handles(&RelativePath::try_new("src/App.TSX").unwrap()));
        assert!(!editor.handles(&RelativePath::try_new("package.json").unwrap()));
    }

    #[test]
    fn new_import_goes_after_existing_imports() {
        let out = TypeScriptEditor
            .add_import(APP, "stripe", &[], Some("Stripe".into()))
            .unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[2], r#"import Stripe from "stripe";"#);
        assert_eq!(lines[3], "");
    }

    #[test]
    fn existing_import_is_extended_keeping_quotes() {
        let out = TypeScriptEditor
            .add_import(APP, "body-parser", &names(&["urlencoded", "json"]), None)
            .unwrap();

        assert!(out.contains("import { json, urlencoded } from 'body-parser';"));
        assert_eq!(out.matches("body-parser").count(), 1);
    }

    #[test]
    fn import_is_idempotent() {
        let once = TypeScriptEditor
            .add_import(APP, "@clerk/express", &names(&["clerkMiddleware"]), None)
            .unwrap();
        let twice = TypeScriptEditor
            .add_import(&once, "@clerk/express", &names(&["clerkMiddleware"]), None)
            .unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn import_into_file_without_imports_respects_directives() {
        let src = "\"use client\";\n\nexport const a = 1;\n";
        let out = TypeScriptEditor
            .add_import(src, "react", &names(&["useState"]), None)
            .unwrap();
        assert!(out.starts_with("\"use client\";\nimport { useState } from \"react\";\n"));
    }

    #[test]
    fn imports_inside_comments_are_ignored() {
        let src = "// import { x } from \"stripe\";\nconst a = 1;\n";
        let out = TypeScriptEditor
            .add_import(src, "stripe", &names(&["x"]), None)
            .unwrap();
        assert!(out.starts_with("import { x } from \"stripe\";\n// import"));
    }

    #[test]
    fn export_appended_once() {
        let once = TypeScriptEditor
            .add_export(APP, "export { stripe } from \"./stripe\";")
            .unwrap();
        assert!(once.ends_with("export { stripe } from \"./stripe\";\n"));
        let twice = TypeScriptEditor
            .add_export(&once, "export {  stripe } from \"./stripe\";")
            .unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn declaration_added_after_imports_once() {
        let out = TypeScriptEditor
            .add_declaration(
                APP,
                "stripe",
                Some("const".into()),
                "const stripe = new Stripe(process.env.STRIPE_SECRET_KEY!);",
            )
            .unwrap();
        assert!(out.contains(
            "from 'body-parser';\n\nconst stripe = new Stripe(process.env.STRIPE_SECRET_KEY!);\n"
        ));

        let again = TypeScriptEditor
            .add_declaration(&out, "stripe", None, "const stripe = 1;")
            .unwrap();
        assert_eq!(out, again);
    }

    #[test]
    fn function_gets_parameter_and_statement() {
        let out = TypeScriptEditor
            .modify_function(
                APP,
                "setup",
                Some("auth: Auth".into()),
                Some("app.use(auth.middleware());".into()),
            )
            .unwrap();

        assert!(out.contains("export function setup(app, auth: Auth) {"));
        assert!(out.contains("  app.use(json());\n  app.use(auth.middleware());\n}"));

        let again = TypeScriptEditor
            .modify_function(
                &out,
                "setup",
                Some("auth".into()),
                Some("app.use(auth.middleware());".into()),
            )
            .unwrap();
        assert_eq!(out, again);
    }

    #[test]
    fn arrow_function_with_empty_body() {
        let src = "export const init = async () => {};\n";
        let out = TypeScriptEditor
            .modify_function(src, "init", Some("db".into()), Some("await db.connect();".into()))
            .unwrap();
        assert_eq!(
            out,
            "export const init = async (db) => {\n  await db.connect();\n};\n"
        );
    }

    #[test]
    fn missing_function_is_an_edit_failure() {
        let err = TypeScriptEditor
            .modify_function(APP, "teardown", None, Some("x();".into()))
            .unwrap_err();
        assert!(matches!(
            err,
            GraftError::Application(ApplicationError::EditFailed { ref reason, .. })
                if reason.contains("teardown")
        ));
    }

    #[test]
    fn methods_and_interpolated_code_are_out_of_reach() {
        let method = "class Api {\n  setup(app) {}\n}\n";
        let interpolated = "const s = `${(() => { function setup(app) {} })()}`;\n";

        for src in [method, interpolated] {
            let err = TypeScriptEditor
                .modify_function(src, "setup", None, Some("x();".into()))
                .unwrap_err();
            assert!(matches!(
                err,
                GraftError::Application(ApplicationError::EditFailed { .. })
            ));
        }
    }

    #[test]
    fn apply_dispatches_edits() {
        let out = TypeScriptEditor
            .apply(
                APP,
                &StructuredEdit::AddExport {
                    statement: "export default app;".into(),
                },
            )
            .unwrap();
        assert!(out.ends_with("export default app;\n"));
    }
}
