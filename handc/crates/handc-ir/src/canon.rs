//! Canonical JSON serialization of the IR.
//!
//! Serialization order is struct declaration order, lists keep their
//! order and capability lists are sorted by the lowering, so the same
//! IR value always canonicalizes to the same bytes on any host.

use thiserror::Error;

use crate::ir::{Ir, IR_VERSION};

/// Errors loading or writing the IR contract.
#[derive(Debug, Error)]
pub enum IrError {
    /// The document declares a different `ir_version`.
    #[error("Unsupported IR version '{found}' (expected '{expected}')")]
    VersionMismatch { found: String, expected: String },

    /// The document is not valid IR JSON.
    #[error("Malformed IR document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Serialize an IR document to its canonical pretty-printed JSON form,
/// terminated by a newline.
pub fn to_canonical_json(ir: &Ir) -> String {
    let mut text = serde_json::to_string_pretty(ir).expect("IR serialization cannot fail");
    text.push('\n');
    text
}

/// Parse an IR document, enforcing the version contract.
pub fn from_json(text: &str) -> Result<Ir, IrError> {
    let ir: Ir = serde_json::from_str(text)?;
    if ir.ir_version != IR_VERSION {
        return Err(IrError::VersionMismatch {
            found: ir.ir_version,
            expected: IR_VERSION.to_string(),
        });
    }
    Ok(ir)
}
