//! Boundary-behavior tests for the typechecker.

use handc_lex::lex;
use handc_par::parse;
use handc_util::Severity;

use crate::check::typecheck;

fn error_codes(src: &str) -> Vec<&'static str> {
    let (tokens, ldiags) = lex(src, "<mem>");
    assert!(ldiags.is_empty(), "lex diags: {ldiags:?}");
    let (program, pdiags) = parse(&tokens, "<mem>");
    assert!(pdiags.is_empty(), "parse diags: {pdiags:?}");
    typecheck(&program)
        .iter()
        .filter(|d| d.severity != Severity::Warning)
        .map(|d| d.code.as_str())
        .collect()
}

#[test]
fn refinement_survives_into_later_statements() {
    // The guarded region extends to the end of the enclosing scope.
    let src = "x: Int? = null\nverify x != null\ny = x + 1\nshow y + x\n";
    assert!(error_codes(src).is_empty());
}

#[test]
fn refinement_inside_if_does_not_leak_out() {
    let src = "x: Int? = null\nif true:\n    verify x != null\nshow x + 1\n";
    assert_eq!(error_codes(src), vec!["HND-TC-0201"]);
}

#[test]
fn refinement_in_both_branches_survives_merge() {
    let src = "x: Int? = 1\nif true:\n    verify x != null\nelse:\n    verify x != null\nshow x + 1\n";
    assert!(error_codes(src).is_empty());
}

#[test]
fn while_discards_refinements_on_exit() {
    let src = "x: Int? = 1\ni: Int = 0\nwhile i < 1:\n    verify x != null\n    i = i + 1\nshow x + 1\n";
    assert_eq!(error_codes(src), vec!["HND-TC-0201"]);
}

#[test]
fn null_reversed_refinement_pattern() {
    let src = "x: Int? = 1\nverify null != x\nshow x + 1\n";
    assert!(error_codes(src).is_empty());
}

#[test]
fn equality_with_null_is_always_allowed() {
    let src = "x: Int? = null\nif x == null:\n    show \"none\"\n";
    assert!(error_codes(src).is_empty());
}

#[test]
fn shadowing_in_function_body() {
    let src = "x: Int = 1\n🔧 f(x: Text) -> Text:\n    return x\nshow x + 1\n";
    assert!(error_codes(src).is_empty());
}

#[test]
fn section_body_checks_in_global_scope() {
    let src = "▶️ INICIAR:\n    x: Int = 1\nshow x\n";
    assert!(error_codes(src).is_empty());
}

#[test]
fn verify_non_bool_expression_is_type_level_noop() {
    // Runtime will fail, but the typechecker treats it as a no-op.
    let src = "x: Int = 1\nverify x + 1\n";
    assert!(error_codes(src).is_empty());
}

#[test]
fn any_flows_everywhere() {
    let src = "x = mystery()\ny: Int = x\nshow y + x\n";
    assert!(error_codes(src).is_empty());
}
