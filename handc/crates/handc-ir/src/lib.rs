//! handc-ir - HAND-IR v0.1, the long-lived artifact of the pipeline.
//!
//! The JSON form of the IR is a public contract (`ir_version` 0.1.0):
//! statements and expressions are discriminated unions with an explicit
//! `kind` tag, every statement carries an origin reference plus its
//! effects and derived capabilities, and the whole document
//! canonicalizes to the same byte sequence on any host.
//!
//! This crate also owns the closed effect and capability universes and
//! the total effect→capability mapping (they are part of the data
//! model), and the AST→IR lowering.

mod canon;
mod effects;
mod ir;
mod lower;

#[cfg(test)]
mod edge_cases;

pub use canon::{from_json, to_canonical_json, IrError};
pub use effects::{canonicalize_caps, Capability, Effect};
pub use ir::{
    Function, Ir, IrExpr, IrParam, IrStmt, Module, Origin, RecordDecl, RecordField, TypeRef,
    IR_VERSION,
};
pub use lower::lower_program;
