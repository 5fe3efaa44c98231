//! The build report: the stable machine-readable summary of a run.
//!
//! Written to `<out>/build_report.json` on every invocation, including
//! internal errors. Schema version 0.1.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use handc_gen::Note;
use handc_util::{Diagnostic, Span};

/// Report schema version.
pub const SCHEMA_VERSION: &str = "0.1";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildReport {
    pub schema_version: String,
    /// `"ok"` or `"error"`.
    pub status: String,
    pub input: InputInfo,
    pub artifacts: Artifacts,
    pub capabilities: CapabilitiesReport,
    pub diagnostics: Vec<ReportDiagnostic>,
    pub degradations: Vec<Degradation>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputInfo {
    pub path: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Artifacts {
    pub target: String,
    pub out_dir: String,
    pub outputs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emitted_ir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emitted_ast: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CapabilitiesReport {
    pub supervision_level: u8,
    pub declared: Vec<String>,
    pub required: Vec<String>,
    pub missing: Vec<String>,
    pub approvals_needed: Vec<String>,
}

/// A diagnostic as reported to the outside: codes are plain strings so
/// backend-prefixed codes (`WASM-0100`, ...) fit alongside `HND-*`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportDiagnostic {
    pub code: String,
    pub severity: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_ref: Option<String>,
}

impl From<&Diagnostic> for ReportDiagnostic {
    fn from(diag: &Diagnostic) -> Self {
        Self {
            code: diag.code.as_str().to_string(),
            severity: diag.severity.to_string(),
            message: diag.message.clone(),
            span: Some(diag.span.clone()),
            hint: diag.hint.clone(),
            origin_ref: diag.origin_ref.clone(),
        }
    }
}

/// A degradation note: a construct was declined or specialized because
/// it falls outside a backend's accepted subset.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Degradation {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_ref: Option<String>,
}

impl From<&Note> for Degradation {
    fn from(note: &Note) -> Self {
        Self {
            code: note.code.clone(),
            message: note.message.clone(),
            origin_ref: note.origin_ref.clone(),
        }
    }
}

impl BuildReport {
    /// Serialize and write the report into `out_dir`, creating the
    /// directory if needed.
    pub fn write(&self, out_dir: &Path) -> io::Result<PathBuf> {
        std::fs::create_dir_all(out_dir)?;
        let path = out_dir.join("build_report.json");
        let mut text = serde_json::to_string_pretty(self)
            .expect("build report serialization cannot fail");
        text.push('\n');
        std::fs::write(&path, text)?;
        Ok(path)
    }
}

/// The final outcome of a build: the report plus the process exit code.
#[derive(Clone, Debug)]
pub struct BuildOutcome {
    pub report: BuildReport,
    pub exit_code: i32,
}
