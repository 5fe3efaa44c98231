//! Boundary-behavior tests for the parser.

use handc_lex::lex;
use handc_util::DiagnosticCode;

use crate::{parse, Item, Program, Stmt};

fn parse_src(src: &str) -> (Program, Vec<handc_util::Diagnostic>) {
    let (tokens, _) = lex(src, "<mem>");
    parse(&tokens, "<mem>")
}

#[test]
fn empty_source_is_empty_program() {
    let (program, diags) = parse_src("");
    assert!(program.items.is_empty());
    assert!(diags.is_empty());
}

#[test]
fn error_records_span_and_continues() {
    // The stray '*' is reported; the next line still parses.
    let (program, diags) = parse_src("* 1\nshow 2\n");
    assert!(!diags.is_empty());
    assert_eq!(diags[0].code, DiagnosticCode::PARSE_UNEXPECTED_TOKEN);
    assert_eq!(diags[0].span.line, 1);
    assert!(program
        .items
        .iter()
        .any(|i| matches!(i, Item::Stmt(Stmt::Show(_)))));
}

#[test]
fn missing_colon_after_if_is_reported() {
    let (_, diags) = parse_src("if true\n    show 1\n");
    assert!(diags
        .iter()
        .any(|d| d.code == DiagnosticCode::PARSE_EXPECTED_TOKEN));
}

#[test]
fn missing_close_paren_is_reported() {
    let (_, diags) = parse_src("show (1 + 2\n");
    assert!(diags
        .iter()
        .any(|d| d.code == DiagnosticCode::PARSE_EXPECTED_TOKEN));
}

#[test]
fn best_effort_ast_survives_bad_region() {
    let (program, diags) = parse_src("a = 1\n? ?\nb = 2\n");
    assert!(!diags.is_empty());
    let assigns = program
        .items
        .iter()
        .filter(|i| matches!(i, Item::Stmt(Stmt::Assign(_))))
        .count();
    assert_eq!(assigns, 2);
}

#[test]
fn assign_missing_value_is_reported() {
    let (_, diags) = parse_src("a =\n");
    assert!(!diags.is_empty());
}

#[test]
fn nested_blocks_parse() {
    let (program, diags) =
        parse_src("if true:\n    while a < 2:\n        a = a + 1\n    show a\n");
    assert!(diags.is_empty(), "{diags:?}");
    match &program.items[0] {
        Item::Stmt(Stmt::If(s)) => {
            assert_eq!(s.then_body.len(), 2);
            assert!(matches!(s.then_body[0], Stmt::While(_)));
        }
        other => panic!("expected if, got {other:?}"),
    }
}

#[test]
fn section_then_toplevel_statement() {
    let (program, diags) = parse_src("🎬 PROGRAMA \"X\":\nshow 1\n");
    assert!(diags.is_empty(), "{diags:?}");
    assert_eq!(program.items.len(), 2);
    assert!(matches!(program.items[0], Item::Section(_)));
    assert!(matches!(program.items[1], Item::Stmt(Stmt::Show(_))));
}

#[test]
fn section_without_colon() {
    let (program, diags) = parse_src("🎬 PROGRAMA\n");
    assert!(diags.is_empty(), "{diags:?}");
    match &program.items[0] {
        Item::Section(s) => {
            assert!(!s.has_colon);
            assert!(s.body.is_none());
        }
        other => panic!("expected section, got {other:?}"),
    }
}

#[test]
fn log_keyword_is_reserved_but_unused() {
    let (_, diags) = parse_src("log 1\n");
    assert!(diags
        .iter()
        .any(|d| d.code == DiagnosticCode::PARSE_UNEXPECTED_TOKEN));
}

#[test]
fn func_def_with_marker_variation_selector() {
    let (program, diags) = parse_src("🛠️ f():\n    return\n");
    assert!(diags.is_empty(), "{diags:?}");
    assert!(matches!(
        &program.items[0],
        Item::Stmt(Stmt::FuncDef(f)) if f.name == "f"
    ));
}

#[test]
fn return_inside_function_with_value() {
    let (program, diags) = parse_src("🔧 f():\n    return 1 + 2\n");
    assert!(diags.is_empty(), "{diags:?}");
    match &program.items[0] {
        Item::Stmt(Stmt::FuncDef(f)) => {
            assert!(matches!(&f.body[0], Stmt::Return(r) if r.value.is_some()));
        }
        other => panic!("expected function, got {other:?}"),
    }
}
