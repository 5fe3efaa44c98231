//! Capability enforcement over a lowered module.
//!
//! Enforcement is fatal on the first violation: the result either
//! confirms the whole module (and, in function scope, every function)
//! or carries one structured diagnostic with code, remediation and the
//! origin reference of the offending node.

use std::collections::BTreeSet;

use thiserror::Error;

use handc_ir::{Capability, Function, Ir};
use handc_util::{DiagnosticCode, Severity};

use crate::policy::{policy, CapPolicy};

/// Enforcement scope: the whole module, or additionally every function
/// against its own declared capability list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EnforceScope {
    #[default]
    Module,
    Function,
}

/// A structured capability diagnostic.
#[derive(Clone, Debug, PartialEq)]
pub struct CapDiagnostic {
    /// Stage-scoped diagnostic id, e.g. `6🐛1`.
    pub idref: String,
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    pub remediation: String,
    pub origin_ref: Option<String>,
}

/// Fatal capability failure carrying its diagnostic.
#[derive(Debug, Error)]
#[error("{}", .diag.message)]
pub struct CapabilityError {
    pub diag: CapDiagnostic,
}

struct ErrIds {
    n: u32,
}

impl ErrIds {
    fn next(&mut self) -> String {
        self.n += 1;
        format!("6🐛{}", self.n)
    }
}

/// Enforce the capability policy for `level` (1..4) over `ir`.
///
/// The verdict is a pure function of the inputs; the IR is never
/// modified.
pub fn enforce_capabilities(
    ir: &Ir,
    level: u8,
    approvals: &BTreeSet<Capability>,
    scope: EnforceScope,
) -> Result<(), CapabilityError> {
    let mut ids = ErrIds { n: 0 };

    let Some(pol) = policy(level) else {
        return Err(CapabilityError {
            diag: CapDiagnostic {
                idref: ids.next(),
                code: DiagnosticCode::INTERNAL,
                severity: Severity::Fatal,
                message: format!("Supervision level must be 1..4, got {level}."),
                remediation: "Pass a supervision level between 1 and 4.".to_string(),
                origin_ref: None,
            },
        });
    };

    let module_origin = Some(ir.module.origin.node_ref.clone());

    let mut declared: BTreeSet<String> =
        ir.module.capabilities.iter().cloned().collect();
    declared.insert("compute".to_string());

    check_declared_known(&declared, &module_origin, &mut ids)?;

    let required: Vec<Capability> = ir.required_capabilities();
    let required_names: BTreeSet<String> =
        required.iter().map(|c| c.as_str().to_string()).collect();

    let missing: Vec<&String> = required_names.difference(&declared).collect();
    if !missing.is_empty() {
        return Err(fail(
            &mut ids,
            DiagnosticCode::CAP_MODULE_MISSING,
            format!(
                "Missing declared capabilities {missing:?}. Program requires them but \
                 module.capabilities does not permit them."
            ),
            "Add the missing capabilities to module.capabilities (or remove the operations \
             requiring them).",
            module_origin.clone(),
        ));
    }

    for cap in &required {
        check_cap(*cap, &pol, level, approvals, &module_origin, &mut ids)?;
    }

    if scope == EnforceScope::Function {
        for function in &ir.module.functions {
            enforce_function(function, &pol, level, approvals, &mut ids)?;
        }
    }

    Ok(())
}

fn enforce_function(
    function: &Function,
    pol: &CapPolicy,
    level: u8,
    approvals: &BTreeSet<Capability>,
    ids: &mut ErrIds,
) -> Result<(), CapabilityError> {
    let origin = Some(function.origin.node_ref.clone());

    let mut declared: BTreeSet<String> =
        function.capabilities.iter().cloned().collect();
    declared.insert("compute".to_string());

    check_declared_known(&declared, &origin, ids)?;

    let required = function.required_capabilities();
    let required_names: BTreeSet<String> =
        required.iter().map(|c| c.as_str().to_string()).collect();

    let missing: Vec<&String> = required_names.difference(&declared).collect();
    if !missing.is_empty() {
        return Err(fail(
            ids,
            DiagnosticCode::CAP_FUNCTION_MISSING,
            format!(
                "Function '{}' is missing declared capabilities {missing:?}.",
                function.name
            ),
            "Add missing caps to function.capabilities or remove the operations requiring them.",
            origin.clone(),
        ));
    }

    for cap in &required {
        check_cap(*cap, pol, level, approvals, &origin, ids)?;
    }

    Ok(())
}

fn check_declared_known(
    declared: &BTreeSet<String>,
    origin: &Option<String>,
    ids: &mut ErrIds,
) -> Result<(), CapabilityError> {
    for name in declared {
        if Capability::parse(name).is_none() {
            let canon: Vec<&str> = Capability::ALL.iter().map(|c| c.as_str()).collect();
            return Err(fail(
                ids,
                DiagnosticCode::CAP_UNKNOWN,
                format!("Unknown capability '{name}' (no synonyms allowed)."),
                format!("Replace '{name}' with a canonical capability: {canon:?}."),
                origin.clone(),
            ));
        }
    }
    Ok(())
}

fn check_cap(
    cap: Capability,
    pol: &CapPolicy,
    level: u8,
    approvals: &BTreeSet<Capability>,
    origin: &Option<String>,
    ids: &mut ErrIds,
) -> Result<(), CapabilityError> {
    if pol.is_denied(cap) {
        return Err(fail(
            ids,
            DiagnosticCode::CAP_DENIED,
            format!("Capability '{cap}' is denied at supervision level {level}."),
            "Increase supervision level or remove the operation requiring this capability.",
            origin.clone(),
        ));
    }
    if pol.needs_approval(cap) && !approvals.contains(&cap) {
        return Err(fail(
            ids,
            DiagnosticCode::CAP_NEEDS_APPROVAL,
            format!(
                "Capability '{cap}' requires explicit human approval (🔴) at supervision \
                 level {level}."
            ),
            format!("Provide approval for '{cap}', or refactor to avoid requiring it."),
            origin.clone(),
        ));
    }
    Ok(())
}

fn fail(
    ids: &mut ErrIds,
    code: DiagnosticCode,
    message: String,
    remediation: impl Into<String>,
    origin_ref: Option<String>,
) -> CapabilityError {
    CapabilityError {
        diag: CapDiagnostic {
            idref: ids.next(),
            code,
            severity: Severity::Fatal,
            message,
            remediation: remediation.into(),
            origin_ref,
        },
    }
}
