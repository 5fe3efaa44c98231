//! The compilation pipeline.
//!
//! Each stage runs to completion before the next begins and no stage
//! revises an earlier stage's diagnostics. Gating rules: syntax errors
//! stop the pipeline before typechecking, type errors before lowering,
//! a capability violation is fatal, and a backend-subset refusal is
//! reported as both a diagnostic and a degradation (exit code 3).

use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use handc_caps::{enforce_capabilities, EnforceScope};
use handc_gen::{generate, Target};
use handc_ir::{lower_program, Capability, Ir};
use handc_util::{Diagnostic, Severity};

use crate::report::{
    Artifacts, BuildOutcome, BuildReport, CapabilitiesReport, Degradation, InputInfo,
    ReportDiagnostic, SCHEMA_VERSION,
};

/// Options for one compiler invocation.
#[derive(Clone, Debug)]
pub struct CompileOptions {
    pub target: Target,
    pub out_dir: PathBuf,
    pub level: u8,
    pub approvals: BTreeSet<Capability>,
    pub emit_ir: bool,
    pub emit_ast: bool,
}

impl CompileOptions {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            out_dir: PathBuf::from("dist"),
            level: 2,
            approvals: BTreeSet::new(),
            emit_ir: false,
            emit_ast: false,
        }
    }
}

/// Compile `input` according to `options`.
///
/// The build report is always written, even on an internal panic; the
/// returned outcome carries the report and the process exit code.
pub fn build(input: &Path, options: &CompileOptions) -> BuildOutcome {
    let result = std::panic::catch_unwind(AssertUnwindSafe(|| build_inner(input, options)));
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(panic) => {
            let message = panic
                .downcast_ref::<String>()
                .cloned()
                .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
                .unwrap_or_else(|| "unknown internal error".to_string());
            internal_error_outcome(input, options, format!("Internal error: {message}"))
        }
    };
    if let Err(err) = outcome.report.write(&options.out_dir) {
        // The report itself could not be written; nothing more to do
        // than surface it on stderr.
        eprintln!("handc: failed to write build report: {err}");
    }
    outcome
}

struct Builder<'a> {
    input: &'a Path,
    options: &'a CompileOptions,
    diagnostics: Vec<ReportDiagnostic>,
    degradations: Vec<Degradation>,
    outputs: Vec<String>,
    emitted_ir: Option<String>,
    emitted_ast: Option<String>,
    capabilities: CapabilitiesReport,
}

fn build_inner(input: &Path, options: &CompileOptions) -> BuildOutcome {
    let mut builder = Builder {
        input,
        options,
        diagnostics: Vec::new(),
        degradations: Vec::new(),
        outputs: Vec::new(),
        emitted_ir: None,
        emitted_ast: None,
        capabilities: CapabilitiesReport {
            supervision_level: options.level,
            ..CapabilitiesReport::default()
        },
    };
    let exit_code = builder.run();
    builder.finish(exit_code)
}

impl<'a> Builder<'a> {
    fn run(&mut self) -> i32 {
        let file_name = self.input.display().to_string();
        let module_name = self
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "main".to_string());

        let source = match std::fs::read(self.input) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.diagnostics.push(internal_diag(format!(
                    "Cannot read input '{file_name}': {err}"
                )));
                return 4;
            }
        };

        debug!(file = %file_name, "lexing");
        let (tokens, lex_diags) = handc_lex::lex_bytes(&source, &file_name);
        self.push_diags(&lex_diags);

        debug!("parsing");
        let (program, parse_diags) = handc_par::parse(&tokens, &file_name);
        self.push_diags(&parse_diags);
        if has_errors(&lex_diags) || has_errors(&parse_diags) {
            return 2;
        }

        debug!("typechecking");
        let type_diags = handc_sem::typecheck(&program);
        self.push_diags(&type_diags);
        if has_errors(&type_diags) {
            return 2;
        }

        debug!("lowering");
        let ir = lower_program(&program, &module_name);
        self.fill_capabilities(&ir);

        if self.options.emit_ast {
            let path = self.options.out_dir.join("ast.json");
            let mut text = serde_json::to_string_pretty(&program)
                .expect("AST serialization cannot fail");
            text.push('\n');
            if let Err(err) = self.write_file(&path, &text) {
                self.diagnostics.push(internal_diag(err));
                return 4;
            }
            self.emitted_ast = Some("ast.json".to_string());
        }
        if self.options.emit_ir {
            let path = self.options.out_dir.join("ir.json");
            let text = handc_ir::to_canonical_json(&ir);
            if let Err(err) = self.write_file(&path, &text) {
                self.diagnostics.push(internal_diag(err));
                return 4;
            }
            self.emitted_ir = Some("ir.json".to_string());
        }

        debug!(level = self.options.level, "enforcing capabilities");
        if let Err(err) = enforce_capabilities(
            &ir,
            self.options.level,
            &self.options.approvals,
            EnforceScope::Module,
        ) {
            self.diagnostics.push(ReportDiagnostic {
                code: err.diag.code.as_str().to_string(),
                severity: err.diag.severity.to_string(),
                message: err.diag.message.clone(),
                span: None,
                hint: Some(err.diag.remediation.clone()),
                origin_ref: err.diag.origin_ref.clone(),
            });
            return 2;
        }

        debug!(target = self.options.target.as_str(), "generating");
        match generate(&ir, self.options.target) {
            Ok((artifact, notes)) => {
                let name = self.options.target.artifact_name();
                let path = self.options.out_dir.join(name);
                if let Err(err) = self.write_file(&path, &artifact) {
                    self.diagnostics.push(internal_diag(err));
                    return 4;
                }
                info!(artifact = name, "artifact written");
                self.outputs.push(name.to_string());
                let mut notes = notes;
                handc_gen::sort_notes(&mut notes);
                self.degradations
                    .extend(notes.iter().map(Degradation::from));
                0
            }
            Err(err) => {
                // Outside the backend's subset: both a diagnostic and a
                // degradation note.
                self.diagnostics.push(ReportDiagnostic {
                    code: err.code.clone(),
                    severity: Severity::Error.to_string(),
                    message: err.message.clone(),
                    span: None,
                    hint: None,
                    origin_ref: err.origin_ref.clone(),
                });
                self.degradations.push(Degradation {
                    code: err.code,
                    message: err.message,
                    origin_ref: err.origin_ref,
                });
                3
            }
        }
    }

    fn write_file(&self, path: &Path, text: &str) -> Result<(), String> {
        std::fs::create_dir_all(&self.options.out_dir)
            .map_err(|e| format!("Cannot create '{}': {e}", self.options.out_dir.display()))?;
        std::fs::write(path, text).map_err(|e| format!("Cannot write '{}': {e}", path.display()))
    }

    fn push_diags(&mut self, diags: &[Diagnostic]) {
        self.diagnostics
            .extend(diags.iter().map(ReportDiagnostic::from));
    }

    fn fill_capabilities(&mut self, ir: &Ir) {
        let declared: Vec<String> = ir.module.capabilities.clone();
        let required: Vec<String> = ir
            .required_capabilities()
            .iter()
            .map(|c| c.as_str().to_string())
            .collect();
        let missing: Vec<String> = required
            .iter()
            .filter(|c| !declared.contains(c))
            .cloned()
            .collect();
        let approvals_needed: Vec<String> = match handc_caps::policy(self.options.level) {
            Some(policy) => required
                .iter()
                .filter_map(|name| Capability::parse(name))
                .filter(|cap| policy.needs_approval(*cap) && !self.options.approvals.contains(cap))
                .map(|cap| cap.as_str().to_string())
                .collect(),
            None => Vec::new(),
        };
        self.capabilities = CapabilitiesReport {
            supervision_level: self.options.level,
            declared,
            required,
            missing,
            approvals_needed,
        };
    }

    fn finish(self, exit_code: i32) -> BuildOutcome {
        let status = if exit_code == 0 { "ok" } else { "error" };
        let report = BuildReport {
            schema_version: SCHEMA_VERSION.to_string(),
            status: status.to_string(),
            input: InputInfo {
                path: self.input.display().to_string(),
            },
            artifacts: Artifacts {
                target: self.options.target.as_str().to_string(),
                out_dir: self.options.out_dir.display().to_string(),
                outputs: self.outputs,
                emitted_ir: self.emitted_ir,
                emitted_ast: self.emitted_ast,
            },
            capabilities: self.capabilities,
            diagnostics: self.diagnostics,
            degradations: self.degradations,
        };
        BuildOutcome { report, exit_code }
    }
}

fn has_errors(diags: &[Diagnostic]) -> bool {
    diags.iter().any(|d| d.severity != Severity::Warning)
}

fn internal_diag(message: String) -> ReportDiagnostic {
    ReportDiagnostic {
        code: "HND-INT-0001".to_string(),
        severity: "fatal".to_string(),
        message,
        span: None,
        hint: None,
        origin_ref: None,
    }
}

fn internal_error_outcome(
    input: &Path,
    options: &CompileOptions,
    message: String,
) -> BuildOutcome {
    BuildOutcome {
        report: BuildReport {
            schema_version: SCHEMA_VERSION.to_string(),
            status: "error".to_string(),
            input: InputInfo {
                path: input.display().to_string(),
            },
            artifacts: Artifacts {
                target: options.target.as_str().to_string(),
                out_dir: options.out_dir.display().to_string(),
                outputs: vec![],
                emitted_ir: None,
                emitted_ast: None,
            },
            capabilities: CapabilitiesReport {
                supervision_level: options.level,
                ..CapabilitiesReport::default()
            },
            diagnostics: vec![internal_diag(message)],
            degradations: vec![],
        },
        exit_code: 4,
    }
}
