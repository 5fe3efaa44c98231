//! handc-sem - Flow-sensitive typechecker for HAND.
//!
//! The typechecker walks the AST with a stack of scope frames. Each
//! binding carries its declared type plus a `proven_non_null` flag that
//! verify statements can set; looking a name up returns the refined
//! type, so `Optional[Int]` reads as `Int` inside a guarded region.
//!
//! The checker only produces diagnostics. It never mutates the AST and
//! never aborts; the driver stops the pipeline before lowering when any
//! error-severity diagnostic is present.

mod check;
mod scope;
mod types;

#[cfg(test)]
mod edge_cases;

pub use check::typecheck;
pub use scope::{Binding, ScopeStack};
pub use types::Ty;
