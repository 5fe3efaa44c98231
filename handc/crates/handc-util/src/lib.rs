//! handc-util - Shared infrastructure for the HAND compiler.
//!
//! This crate provides the types every pipeline stage depends on:
//! source spans, diagnostic codes, diagnostics and the [`Handler`]
//! that collects them.
//!
//! Diagnostics are append-only: a stage emits into its own handler and
//! later stages never revise what an earlier stage reported.

pub mod diagnostic;
pub mod span;

pub use diagnostic::{Diagnostic, DiagnosticCode, Handler, Severity};
pub use span::Span;
