//! Boundary-behavior tests for the lexer.

use handc_util::DiagnosticCode;

use crate::lexer::{lex, lex_bytes};
use crate::token::TokenKind;

fn codes(src: &str) -> Vec<&'static str> {
    let (_, diags) = lex(src, "<mem>");
    diags.iter().map(|d| d.code.as_str()).collect()
}

#[test]
fn tabs_forbidden() {
    assert!(codes("a\t= 1\n").contains(&"HND-LEX-0002"));
}

#[test]
fn tab_in_indent_forbidden() {
    assert!(codes("if true:\n\tshow 1\n").contains(&"HND-LEX-0002"));
}

#[test]
fn indent_must_be_multiple_of_four() {
    assert!(codes("if true:\n  show 1\n").contains(&"HND-INDENT-0001"));
}

#[test]
fn indent_jump_too_large() {
    assert!(codes("if true:\n        show 1\n").contains(&"HND-INDENT-0002"));
}

#[test]
fn dedent_to_unknown_level() {
    assert!(codes("if true:\n    show 1\n  show 2\n").contains(&"HND-INDENT-0003"));
}

#[test]
fn non_ascii_outside_string_rejected() {
    // A leading accented letter is not a valid identifier start.
    assert!(codes("é = 1\n").contains(&"HND-LEX-0004"));
}

#[test]
fn non_ascii_symbol_rejected() {
    assert!(codes("caf√ = 1\n").contains(&"HND-LEX-0004"));
}

#[test]
fn non_ascii_inside_string_accepted() {
    let (tokens, diags) = lex("show \"café ✓\"\n", "<mem>");
    assert!(diags.is_empty());
    assert_eq!(tokens[1].kind, TokenKind::String);
}

#[test]
fn unterminated_string_is_unexpected_char() {
    let (_, diags) = lex("show \"oops\n", "<mem>");
    assert!(diags
        .iter()
        .any(|d| d.code == DiagnosticCode::LEX_UNEXPECTED_CHAR));
}

#[test]
fn invalid_utf8_reported_as_invalid_unicode() {
    // 0xED 0xA0 0x80 is the UTF-8-style encoding of a surrogate half.
    let bytes = b"a = \xED\xA0\x80\n";
    let (_, diags) = lex_bytes(bytes, "<mem>");
    assert!(diags
        .iter()
        .any(|d| d.code == DiagnosticCode::LEX_INVALID_UNICODE));
}

#[test]
fn errors_do_not_stop_lexing() {
    let (tokens, diags) = lex("a\t=\t1\nshow a\n", "<mem>");
    assert!(!diags.is_empty());
    // The second line still lexes normally.
    assert!(tokens
        .iter()
        .any(|t| t.kind == TokenKind::Keyword && t.lexeme == "show"));
    assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
}

#[test]
fn blank_indented_line_does_not_touch_indent_stack() {
    let (tokens, diags) = lex("if true:\n    show 1\n        \nshow 2\n", "<mem>");
    assert!(diags.is_empty());
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
    // One INDENT, one DEDENT; the whitespace-only line is a bare NEWLINE.
    assert_eq!(
        kinds.iter().filter(|&&k| k == TokenKind::Indent).count(),
        1
    );
    assert_eq!(
        kinds.iter().filter(|&&k| k == TokenKind::Dedent).count(),
        1
    );
}

#[test]
fn lone_dot_is_unexpected() {
    let (_, diags) = lex("a = 1.\n", "<mem>");
    assert!(diags
        .iter()
        .any(|d| d.code == DiagnosticCode::LEX_UNEXPECTED_CHAR));
}

#[test]
fn dedent_line_numbers_at_eof() {
    let (tokens, _) = lex("if true:\n    show 1\n", "<mem>");
    let dedent = tokens
        .iter()
        .find(|t| t.kind == TokenKind::Dedent)
        .unwrap();
    assert_eq!(dedent.span.line, 2);
}
