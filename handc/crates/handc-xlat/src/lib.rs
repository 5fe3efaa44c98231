//! handc-xlat - Translation validator.
//!
//! Compares a base source against a translated candidate and permits
//! exactly two classes of edits:
//!
//! 1. Content inside the description block: opened by a column-0 line
//!    whose first token is the `📖` emoji; its body is every following
//!    line indented by at least 4 spaces (or blank), ending at the
//!    first column-0 line or EOF.
//! 2. String literals immediately preceded by the sentinel marker
//!    emoji `🌐`.
//!
//! Description bodies are masked to empty lines on both sides, both
//! texts are lexed, and the value-token streams are walked in
//! lockstep. Any other divergence in token kind or value is a
//! violation with a span inside the illegal edit.

use handc_lex::{lex, Token, TokenKind};
use handc_util::{Diagnostic, DiagnosticCode, Span};

/// Emoji opening a description block.
pub const DESCRIPTION_MARKER: &str = "📖";

/// Sentinel emoji marking a translatable string literal.
pub const SENTINEL_MARKER: &str = "🌐";

/// Validate that `candidate` differs from `base` only in the permitted
/// windows. Returns the violations; an empty list means accepted.
pub fn validate_translation(base: &str, candidate: &str, file: &str) -> Vec<Diagnostic> {
    let base_tokens = kept_tokens(&mask_description_bodies(base), file);
    let cand_tokens = kept_tokens(&mask_description_bodies(candidate), file);

    let mut violations = Vec::new();
    let common = base_tokens.len().min(cand_tokens.len());

    for i in 0..common {
        let b = &base_tokens[i];
        let c = &cand_tokens[i];
        if b.kind != c.kind {
            violations.push(
                Diagnostic::error(
                    DiagnosticCode::XLAT_TOKEN_MISMATCH,
                    format!(
                        "Token kind changed: expected {}, found {}.",
                        b.kind.name(),
                        c.kind.name()
                    ),
                    c.span.clone(),
                )
                .with_hint("Only the description block and 🌐-marked strings may change."),
            );
            continue;
        }
        if b.lexeme != c.lexeme && !is_marked_string(&base_tokens, i) {
            violations.push(
                Diagnostic::error(
                    DiagnosticCode::XLAT_TOKEN_MISMATCH,
                    format!(
                        "Token value changed: expected {:?}, found {:?}.",
                        b.lexeme, c.lexeme
                    ),
                    c.span.clone(),
                )
                .with_hint("Mark the string with 🌐 in the base, or revert the edit."),
            );
        }
    }

    if base_tokens.len() != cand_tokens.len() {
        let span = if cand_tokens.len() > base_tokens.len() {
            cand_tokens[common].span.clone()
        } else {
            cand_tokens
                .last()
                .map(|t| t.span.clone())
                .unwrap_or_else(|| Span::point(file, 1, 1))
        };
        violations.push(
            Diagnostic::error(
                DiagnosticCode::XLAT_LENGTH_MISMATCH,
                format!(
                    "Token count changed: base has {}, candidate has {}.",
                    base_tokens.len(),
                    cand_tokens.len()
                ),
                span,
            )
            .with_hint("Translations may not add or remove tokens."),
        );
    }

    violations
}

/// True when the token at `index` is a STRING immediately preceded by
/// the sentinel emoji in the kept-token stream.
fn is_marked_string(tokens: &[Token], index: usize) -> bool {
    if tokens[index].kind != TokenKind::String || index == 0 {
        return false;
    }
    let prev = &tokens[index - 1];
    prev.kind == TokenKind::Emoji && strip_variation(&prev.lexeme) == SENTINEL_MARKER
}

fn strip_variation(lexeme: &str) -> String {
    lexeme
        .chars()
        .filter(|&c| c != '\u{FE0E}' && c != '\u{FE0F}')
        .collect()
}

/// Lex and keep only value tokens; layout trivia and EOF never
/// participate in the comparison.
fn kept_tokens(text: &str, file: &str) -> Vec<Token> {
    let (tokens, _) = lex(text, file);
    tokens
        .into_iter()
        .filter(|t| !t.is_layout() && t.kind != TokenKind::Eof)
        .collect()
}

/// Blank out every description-block body line, leaving line structure
/// intact so spans in the remainder stay comparable.
fn mask_description_bodies(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let had_trailing_newline = normalized.ends_with('\n');
    let body = normalized.strip_suffix('\n').unwrap_or(&normalized);

    let mut out: Vec<String> = Vec::new();
    let mut in_description = false;
    for line in body.split('\n') {
        let indent = line.len() - line.trim_start_matches(' ').len();
        let is_blank = line.trim().is_empty();

        if in_description {
            if is_blank || indent >= 4 {
                out.push(String::new());
                continue;
            }
            in_description = false;
        }
        if indent == 0 && line.trim_start().starts_with(DESCRIPTION_MARKER) {
            in_description = true;
            out.push(line.to_string());
            continue;
        }
        out.push(line.to_string());
    }

    let mut masked = out.join("\n");
    if had_trailing_newline {
        masked.push('\n');
    }
    masked
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "\
📖 DESCRIPTION:
    This program greets the user.
    It is a demo.
show \"keep\"
show 🌐 \"Hello\"
";

    #[test]
    fn test_identical_sources_accept() {
        assert!(validate_translation(BASE, BASE, "<mem>").is_empty());
    }

    #[test]
    fn test_marked_string_may_change() {
        let candidate = BASE.replace("\"Hello\"", "\"Hola\"");
        assert!(validate_translation(BASE, &candidate, "<mem>").is_empty());
    }

    #[test]
    fn test_description_body_may_change() {
        let candidate = BASE
            .replace("This program greets the user.", "Este programa saluda al usuario.")
            .replace("It is a demo.", "Es una demostración.");
        assert!(validate_translation(BASE, &candidate, "<mem>").is_empty());
    }

    #[test]
    fn test_both_permitted_edits_together_accept() {
        let candidate = BASE
            .replace("\"Hello\"", "\"Hola\"")
            .replace("This program greets the user.", "Saluda.");
        assert!(validate_translation(BASE, &candidate, "<mem>").is_empty());
    }

    #[test]
    fn test_unmarked_string_change_rejected() {
        let candidate = BASE.replace("\"keep\"", "\"guarda\"");
        let violations = validate_translation(BASE, &candidate, "<mem>");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, DiagnosticCode::XLAT_TOKEN_MISMATCH);
        // The span points at the illegal edit.
        assert_eq!(violations[0].span.line, 4);
    }

    #[test]
    fn test_identifier_change_rejected() {
        let base = "x = 1\nshow x\n";
        let candidate = "y = 1\nshow y\n";
        let violations = validate_translation(base, candidate, "<mem>");
        assert_eq!(violations.len(), 2);
        assert!(violations
            .iter()
            .all(|v| v.code == DiagnosticCode::XLAT_TOKEN_MISMATCH));
    }

    #[test]
    fn test_added_statement_rejected() {
        let candidate = format!("{BASE}show 2\n");
        let violations = validate_translation(BASE, &candidate, "<mem>");
        assert!(violations
            .iter()
            .any(|v| v.code == DiagnosticCode::XLAT_LENGTH_MISMATCH));
    }

    #[test]
    fn test_removed_statement_rejected() {
        let base = "show 1\nshow 2\n";
        let candidate = "show 1\n";
        let violations = validate_translation(base, candidate, "<mem>");
        assert!(violations
            .iter()
            .any(|v| v.code == DiagnosticCode::XLAT_LENGTH_MISMATCH));
    }

    #[test]
    fn test_kind_change_rejected() {
        let base = "show 1\n";
        let candidate = "show \"1\"\n";
        let violations = validate_translation(base, candidate, "<mem>");
        assert_eq!(violations[0].code, DiagnosticCode::XLAT_TOKEN_MISMATCH);
    }

    #[test]
    fn test_sentinel_must_be_in_base() {
        // Marking the string only in the candidate does not help: the
        // base stream has no 🌐 before it, and the extra emoji shifts
        // the streams anyway.
        let base = "show \"Hello\"\n";
        let candidate = "show 🌐 \"Hola\"\n";
        assert!(!validate_translation(base, candidate, "<mem>").is_empty());
    }

    #[test]
    fn test_description_block_ends_at_column_zero() {
        let base = "📖 DESCRIPTION:\n    body\nshow \"keep\"\n";
        let candidate = "📖 DESCRIPTION:\n    cuerpo\nshow \"cambiado\"\n";
        let violations = validate_translation(base, candidate, "<mem>");
        // The body edit is fine; the unmarked string is not.
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].span.line, 3);
    }

    #[test]
    fn test_blank_lines_inside_description_stay_in_block() {
        let base = "📖 DESCRIPTION:\n    a\n\n    b\nshow 1\n";
        let candidate = "📖 DESCRIPTION:\n    x\n\n    y\nshow 1\n";
        assert!(validate_translation(base, candidate, "<mem>").is_empty());
    }

    #[test]
    fn test_masking_preserves_line_numbers() {
        let masked = mask_description_bodies("📖 D:\n    body line\nshow 1\n");
        assert_eq!(masked, "📖 D:\n\nshow 1\n");
    }

    #[test]
    fn test_header_itself_must_match() {
        let base = "📖 DESCRIPTION:\n    body\n";
        let candidate = "📖 DESCRIPCION:\n    cuerpo\n";
        let violations = validate_translation(base, candidate, "<mem>");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].span.line, 1);
    }
}
