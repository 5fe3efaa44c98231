//! handc-gen - Backend code generators.
//!
//! Every backend consumes HAND-IR and returns `(artifact_text, notes)`.
//! Each declares its accepted subset; IR outside the subset raises a
//! structured [`BackendError`] with a backend-prefixed code and, where
//! available, the origin reference of the offending node. Output is
//! byte-deterministic: fixed whitespace, no map-iteration ordering, and
//! notes sorted by origin reference.

mod html;
mod python;
mod sql;
mod wat;

#[cfg(test)]
mod edge_cases;

pub use html::gen_html;
pub use python::gen_python;
pub use sql::gen_sql;
pub use wat::gen_wat;

use handc_ir::Ir;
use thiserror::Error;

/// Compilation target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// Host-language executable backend (named `python` on the public
    /// surface).
    Python,
    /// Pure-arithmetic WebAssembly text module.
    Wasm,
    /// Set-based SQL script.
    Sql,
    /// Static HTML form/runner.
    Html,
}

impl Target {
    pub fn parse(name: &str) -> Option<Target> {
        Some(match name {
            "python" => Target::Python,
            "wasm" => Target::Wasm,
            "sql" => Target::Sql,
            "html" => Target::Html,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Python => "python",
            Target::Wasm => "wasm",
            Target::Sql => "sql",
            Target::Html => "html",
        }
    }

    /// Deterministic artifact file name for this target.
    pub fn artifact_name(&self) -> &'static str {
        match self {
            Target::Python => "main.py",
            Target::Wasm => "main.wat",
            Target::Sql => "main.sql",
            Target::Html => "index.html",
        }
    }
}

/// Degradation note attached to a generated artifact.
#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    pub kind: NoteKind,
    pub code: String,
    pub message: String,
    pub origin_ref: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteKind {
    Error,
    Warn,
    Info,
}

/// Sort notes by origin reference, then code, for stable output.
pub fn sort_notes(notes: &mut [Note]) {
    notes.sort_by(|a, b| {
        (a.origin_ref.as_deref(), a.code.as_str()).cmp(&(b.origin_ref.as_deref(), b.code.as_str()))
    });
}

/// A backend refusing IR outside its accepted subset.
#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct BackendError {
    pub code: String,
    pub message: String,
    pub origin_ref: Option<String>,
}

impl BackendError {
    pub fn new(code: &str, message: impl Into<String>, origin_ref: Option<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            origin_ref,
        }
    }
}

/// Generate the artifact for `target`.
pub fn generate(ir: &Ir, target: Target) -> Result<(String, Vec<Note>), BackendError> {
    match target {
        Target::Python => gen_python(ir),
        Target::Wasm => gen_wat(ir),
        Target::Sql => gen_sql(ir),
        Target::Html => gen_html(ir),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_parsing() {
        assert_eq!(Target::parse("python"), Some(Target::Python));
        assert_eq!(Target::parse("wasm"), Some(Target::Wasm));
        assert_eq!(Target::parse("sql"), Some(Target::Sql));
        assert_eq!(Target::parse("html"), Some(Target::Html));
        assert_eq!(Target::parse("rust"), None);
    }

    #[test]
    fn test_artifact_names() {
        assert_eq!(Target::Python.artifact_name(), "main.py");
        assert_eq!(Target::Wasm.artifact_name(), "main.wat");
        assert_eq!(Target::Sql.artifact_name(), "main.sql");
        assert_eq!(Target::Html.artifact_name(), "index.html");
    }

    #[test]
    fn test_notes_sort_by_origin_then_code() {
        let mut notes = vec![
            Note {
                kind: NoteKind::Info,
                code: "SQL-0200".to_string(),
                message: String::new(),
                origin_ref: Some("[AST][🧩][N2].0".to_string()),
            },
            Note {
                kind: NoteKind::Info,
                code: "SQL-0100".to_string(),
                message: String::new(),
                origin_ref: Some("[AST][🧩][N1].0".to_string()),
            },
        ];
        sort_notes(&mut notes);
        assert_eq!(notes[0].code, "SQL-0100");
    }
}
