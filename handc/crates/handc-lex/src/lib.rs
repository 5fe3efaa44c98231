//! handc-lex - Lexical analysis for HAND.
//!
//! The lexer turns UTF-8 source text into a flat token stream with
//! layout tokens (NEWLINE/INDENT/DEDENT) interleaved, Python-style.
//! It is deterministic by construction: the same bytes produce the
//! same stream on any host, and errors never stop lexing — the caller
//! always gets a full (possibly inconsistent) stream plus diagnostics.
//!
//! Layout rules:
//! - CR, LF and CRLF all normalize to LF before lexing.
//! - Tabs are a hard error anywhere (`HND-LEX-0002`).
//! - Indentation is measured in leading spaces and must move in steps
//!   of exactly four (`HND-INDENT-*` codes otherwise).
//! - Blank lines emit a bare NEWLINE and leave the indent stack alone.
//! - At end of input the stack unwinds into DEDENT tokens, then EOF.

pub mod emoji;
mod lexer;
pub mod token;

#[cfg(test)]
mod edge_cases;

pub use lexer::{lex, lex_bytes};
pub use token::{Token, TokenKind};
