//! Diagnostic module - Error and warning reporting infrastructure.
//!
//! Every diagnostic carries a stable code (e.g. `HND-LEX-0002`), a
//! severity, a human-readable message, a source location and an
//! optional remediation hint. Stages collect diagnostics through a
//! [`Handler`]; errors never stop a stage early (capability
//! enforcement, which is fatal-on-first-violation, uses its own error
//! type instead).
//!
//! # Examples
//!
//! ```
//! use handc_util::{Diagnostic, DiagnosticCode, Handler, Span};
//!
//! let handler = Handler::new();
//! handler.emit(
//!     Diagnostic::error(DiagnosticCode::LEX_TAB, "Tabs are forbidden. Use spaces only.",
//!                       Span::new("main.hand", 1, 3, 4))
//!         .with_hint("Replace tabs with 4 spaces per indent level."),
//! );
//! assert!(handler.has_errors());
//! ```

use std::cell::RefCell;
use std::fmt;

use serde::Serialize;

use crate::Span;

/// Diagnostic severity level.
///
/// `Fatal` is reserved for failures that stop the pipeline immediately
/// (capability violations, internal errors); `Error` diagnostics gate
/// the next stage but let the current stage run to completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::Fatal => write!(f, "fatal"),
        }
    }
}

/// A stable diagnostic code.
///
/// Codes are part of the public surface: tests and downstream tooling
/// match on them, so they never change meaning between releases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DiagnosticCode(pub &'static str);

impl DiagnosticCode {
    // Lexical errors
    pub const LEX_UNEXPECTED_CHAR: DiagnosticCode = DiagnosticCode("HND-LEX-0001");
    pub const LEX_TAB: DiagnosticCode = DiagnosticCode("HND-LEX-0002");
    pub const LEX_INVALID_UNICODE: DiagnosticCode = DiagnosticCode("HND-LEX-0003");
    pub const LEX_NON_ASCII: DiagnosticCode = DiagnosticCode("HND-LEX-0004");

    // Layout errors
    pub const INDENT_NOT_MULTIPLE: DiagnosticCode = DiagnosticCode("HND-INDENT-0001");
    pub const INDENT_JUMP: DiagnosticCode = DiagnosticCode("HND-INDENT-0002");
    pub const INDENT_UNKNOWN_LEVEL: DiagnosticCode = DiagnosticCode("HND-INDENT-0003");

    // Parse errors
    pub const PARSE_UNEXPECTED_TOKEN: DiagnosticCode = DiagnosticCode("HND-PARSE-0001");
    pub const PARSE_EXPECTED_TOKEN: DiagnosticCode = DiagnosticCode("HND-PARSE-0002");

    // Type errors
    pub const TC_UNDEFINED_VAR: DiagnosticCode = DiagnosticCode("HND-TC-0101");
    pub const TC_UNKNOWN_CALLEE: DiagnosticCode = DiagnosticCode("HND-TC-0102");
    pub const TC_OPERAND_MISMATCH: DiagnosticCode = DiagnosticCode("HND-TC-0201");
    pub const TC_CONDITION_NOT_BOOL: DiagnosticCode = DiagnosticCode("HND-TC-0202");
    pub const TC_RETURN_MISMATCH: DiagnosticCode = DiagnosticCode("HND-TC-0203");
    pub const TC_ASSIGN_MISMATCH: DiagnosticCode = DiagnosticCode("HND-TC-0204");
    pub const TC_RETURN_OUTSIDE_FN: DiagnosticCode = DiagnosticCode("HND-TC-0301");

    // Capability errors
    pub const CAP_UNKNOWN: DiagnosticCode = DiagnosticCode("HND-CAP-0001");
    pub const CAP_DENIED: DiagnosticCode = DiagnosticCode("HND-CAP-0101");
    pub const CAP_NEEDS_APPROVAL: DiagnosticCode = DiagnosticCode("HND-CAP-0102");
    pub const CAP_MODULE_MISSING: DiagnosticCode = DiagnosticCode("HND-CAP-0201");
    pub const CAP_FUNCTION_MISSING: DiagnosticCode = DiagnosticCode("HND-CAP-0202");

    // Runtime errors (reference interpreter)
    pub const RT_UNDEFINED_VAR: DiagnosticCode = DiagnosticCode("HND-RT-0001");
    pub const RT_INPUT_EXHAUSTED: DiagnosticCode = DiagnosticCode("HND-RT-0101");
    pub const RT_ARITY_MISMATCH: DiagnosticCode = DiagnosticCode("HND-RT-0102");
    pub const RT_STEP_LIMIT: DiagnosticCode = DiagnosticCode("HND-RT-0201");
    pub const RT_LOOP_LIMIT: DiagnosticCode = DiagnosticCode("HND-RT-0202");
    pub const RT_BAD_OPERAND: DiagnosticCode = DiagnosticCode("HND-RT-0301");
    pub const RT_DIVISION_BY_ZERO: DiagnosticCode = DiagnosticCode("HND-RT-0302");
    pub const RT_VERIFY_FAILED: DiagnosticCode = DiagnosticCode("HND-RT-0401");
    pub const RT_VERIFY_NOT_BOOL: DiagnosticCode = DiagnosticCode("HND-RT-0402");
    pub const RT_RETURN_OUTSIDE_FN: DiagnosticCode = DiagnosticCode("HND-RT-0501");

    // Translation validator
    pub const XLAT_TOKEN_MISMATCH: DiagnosticCode = DiagnosticCode("HND-XLAT-0001");
    pub const XLAT_LENGTH_MISMATCH: DiagnosticCode = DiagnosticCode("HND-XLAT-0002");

    // IR contract
    pub const IR_VERSION_MISMATCH: DiagnosticCode = DiagnosticCode("HND-IR-0001");

    // Internal errors
    pub const INTERNAL: DiagnosticCode = DiagnosticCode("HND-INT-0001");

    /// The raw code string, e.g. `"HND-LEX-0002"`.
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A diagnostic message with code, severity and location.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Diagnostic {
    /// Stable diagnostic code.
    pub code: DiagnosticCode,
    /// Severity level.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// Source location.
    pub span: Span,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Optional origin reference of the offending IR node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_ref: Option<String>,
}

impl Diagnostic {
    /// Create a diagnostic with an explicit severity.
    pub fn new(
        code: DiagnosticCode,
        severity: Severity,
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            span,
            hint: None,
            origin_ref: None,
        }
    }

    /// Create an error diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::new(code, Severity::Error, message, span)
    }

    /// Create a warning diagnostic.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::new(code, Severity::Warning, message, span)
    }

    /// Create a fatal diagnostic.
    pub fn fatal(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::new(code, Severity::Fatal, message, span)
    }

    /// Attach a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Attach the origin reference of the offending IR node.
    pub fn with_origin_ref(mut self, origin_ref: impl Into<String>) -> Self {
        self.origin_ref = Some(origin_ref.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [{}] at {}",
            self.severity, self.message, self.code, self.span
        )
    }
}

/// Handler for collecting diagnostics.
///
/// Uses interior mutability so a stage can hold shared references to
/// its inputs while still reporting. One handler per stage; the driver
/// concatenates them in pipeline order.
#[derive(Default)]
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl Handler {
    /// Create a new, empty handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic.
    pub fn emit(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// True if any error or fatal diagnostic has been recorded.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .borrow()
            .iter()
            .any(|d| d.severity != Severity::Warning)
    }

    /// Number of error and fatal diagnostics.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.severity != Severity::Warning)
            .count()
    }

    /// Number of recorded diagnostics of any severity.
    pub fn len(&self) -> usize {
        self.diagnostics.borrow().len()
    }

    /// True if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.borrow().is_empty()
    }

    /// Clone out all recorded diagnostics in emission order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Drain the handler, leaving it empty.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.diagnostics.borrow_mut())
    }
}
