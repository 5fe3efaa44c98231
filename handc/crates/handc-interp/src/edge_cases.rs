//! Boundary-behavior tests for the interpreter.

use handc_util::DiagnosticCode;

use crate::interp::{run, Limits, RunError, RuntimeError};
use crate::run_source;

fn run_err(src: &str, inputs: &[&str]) -> RuntimeError {
    let inputs: Vec<String> = inputs.iter().map(|s| s.to_string()).collect();
    match run_source(src, &inputs) {
        Err(RunError::Runtime(e)) => e,
        other => panic!("expected runtime error, got {other:?}"),
    }
}

#[test]
fn step_limit_bounds_infinite_loops() {
    let err = run_err("i: Int = 0\nwhile i < 1:\n    x = 1\n", &[]);
    // The loop body never changes i; the step counter fires first.
    assert_eq!(err.code, DiagnosticCode::RT_STEP_LIMIT);
}

#[test]
fn loop_limit_fires_when_steps_are_cheap() {
    let (tokens, _) = handc_lex::lex("i: Int = 0\nwhile i < 1:\n    x = 1\n", "<mem>");
    let (program, _) = handc_par::parse(&tokens, "<mem>");
    let limits = Limits {
        max_steps: u64::MAX,
        max_loop_iterations: 10,
    };
    let err = run(&program, &[], limits).unwrap_err();
    assert_eq!(err.code, DiagnosticCode::RT_LOOP_LIMIT);
}

#[test]
fn non_bool_condition_fails() {
    let err = run_err("if 1:\n    show 1\n", &[]);
    assert_eq!(err.code, DiagnosticCode::RT_BAD_OPERAND);
    let err = run_err("while 1:\n    show 1\n", &[]);
    assert_eq!(err.code, DiagnosticCode::RT_BAD_OPERAND);
}

#[test]
fn bad_operands_fail() {
    let err = run_err("show \"a\" + 1\n", &[]);
    assert_eq!(err.code, DiagnosticCode::RT_BAD_OPERAND);
    let err = run_err("show \"a\" < \"b\"\n", &[]);
    assert_eq!(err.code, DiagnosticCode::RT_BAD_OPERAND);
    let err = run_err("show -\"a\"\n", &[]);
    assert_eq!(err.code, DiagnosticCode::RT_BAD_OPERAND);
}

#[test]
fn modulo_by_zero_fails() {
    let err = run_err("show 1 % 0\n", &[]);
    assert_eq!(err.code, DiagnosticCode::RT_DIVISION_BY_ZERO);
}

#[test]
fn invalid_source_is_not_a_runtime_error() {
    let result = run_source("show \t 1\n", &[]);
    assert!(matches!(result, Err(RunError::Invalid(_))));
}

#[test]
fn section_bodies_execute_in_order() {
    let result = run_source("▶️ INICIAR:\n    show 1\nshow 2\n", &[]).unwrap();
    assert_eq!(result.outputs, vec!["1", "2"]);
}

#[test]
fn sigma_is_the_global_frame_only() {
    let src = "x = 1\n🔧 f():\n    y = 2\n    return y\nz = f()\n";
    let result = run_source(src, &[]).unwrap();
    assert!(result.globals.contains_key("x"));
    assert!(result.globals.contains_key("z"));
    // The function-local binding never leaks into Σ.
    assert!(!result.globals.contains_key("y"));
}

#[test]
fn inputs_consumed_at_most_one_per_ask() {
    let src = "a: Text = ask(\"p\")\nshow a\n";
    let result = run_source(src, &["one".to_string(), "two".to_string()]).unwrap();
    assert_eq!(result.outputs, vec!["one"]);
}

#[test]
fn big_integer_arithmetic_is_exact() {
    let src = "x = 1000000000000000000000000000000\nshow x + 1\n";
    let result = run_source(src, &[]).unwrap();
    assert_eq!(result.outputs, vec!["1000000000000000000000000000001"]);
}
