//! handc-interp - The reference interpreter, semantic ground truth.
//!
//! Executes the AST directly (not the IR). A run consumes a finite
//! input queue through `ask`, appends the stringified values of `show`
//! to Ω in strict program order, and finishes with Σ, the top-level
//! frame of the store. Step and loop-iteration counters bound
//! execution deterministically.
//!
//! Backends must preserve observational equivalence with this
//! interpreter (equal Ω and Σ) on their accepted subset.

mod interp;
mod trace;
mod value;

#[cfg(test)]
mod edge_cases;

pub use interp::{run, run_source, Limits, RunError, RunResult, RuntimeError};
pub use trace::TraceEvent;
pub use value::{decode_text_literal, format_g15, Value};
