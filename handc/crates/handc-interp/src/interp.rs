//! The interpreter proper.

use std::collections::VecDeque;

use indexmap::IndexMap;
use num_bigint::BigInt;
use num_traits::Zero;
use rustc_hash::FxHashMap;
use thiserror::Error;

use handc_par::{BinOp, CallExpr, Expr, FuncDef, Item, LitKind, Program, Stmt, UnOp};
use handc_util::{Diagnostic, DiagnosticCode};

use crate::trace::{Trace, TraceEvent};
use crate::value::{decode_text_literal, Value};

/// Execution limits. Both counters are deterministic timeouts.
#[derive(Clone, Copy, Debug)]
pub struct Limits {
    /// Total statement/expression steps per run.
    pub max_steps: u64,
    /// Iterations per single loop.
    pub max_loop_iterations: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_steps: 200_000,
            max_loop_iterations: 1_000_000,
        }
    }
}

/// Result of a successful run: Ω, Σ and the trace.
#[derive(Clone, Debug)]
pub struct RunResult {
    /// Ω: ordered stringified `show` outputs.
    pub outputs: Vec<String>,
    /// Σ: the top-level frame after termination.
    pub globals: IndexMap<String, Value>,
    pub trace: Vec<TraceEvent>,
}

/// A fatal runtime failure with its structured code and the trace up
/// to and including the error event.
#[derive(Debug, Error)]
#[error("{message} [{code}]")]
pub struct RuntimeError {
    pub code: DiagnosticCode,
    pub message: String,
    pub trace: Vec<TraceEvent>,
}

/// Errors from the `run_source` convenience entry point.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("source has {} diagnostic(s)", .0.len())]
    Invalid(Vec<Diagnostic>),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Lex, parse and run a source text with the default limits.
pub fn run_source(source: &str, inputs: &[String]) -> Result<RunResult, RunError> {
    let (tokens, lex_diags) = handc_lex::lex(source, "<input>");
    if !lex_diags.is_empty() {
        return Err(RunError::Invalid(lex_diags));
    }
    let (program, parse_diags) = handc_par::parse(&tokens, "<input>");
    if !parse_diags.is_empty() {
        return Err(RunError::Invalid(parse_diags));
    }
    run(&program, inputs, Limits::default()).map_err(RunError::from)
}

/// Run a parsed program against an input queue.
pub fn run(program: &Program, inputs: &[String], limits: Limits) -> Result<RunResult, RuntimeError> {
    let mut interp = Interp::new(program, inputs, limits);
    match interp.run_program(program) {
        Ok(()) => Ok(RunResult {
            outputs: interp.outputs,
            globals: interp.frames.into_iter().next().unwrap_or_default(),
            trace: interp.trace.into_events(),
        }),
        Err(Failure::Error { code, message }) => {
            interp.trace.record("error", format!("{code} {message}"));
            Err(RuntimeError {
                code,
                message,
                trace: interp.trace.into_events(),
            })
        }
    }
}

/// Internal failure carrier; converted to `RuntimeError` at the run
/// boundary where the trace is sealed.
enum Failure {
    Error {
        code: DiagnosticCode,
        message: String,
    },
}

fn fail<T>(code: DiagnosticCode, message: impl Into<String>) -> Result<T, Failure> {
    Err(Failure::Error {
        code,
        message: message.into(),
    })
}

/// Result of executing one statement.
enum Flow {
    Normal,
    Return(Value),
}

struct Interp<'a> {
    frames: Vec<IndexMap<String, Value>>,
    functions: FxHashMap<&'a str, &'a FuncDef>,
    inputs: VecDeque<String>,
    outputs: Vec<String>,
    trace: Trace,
    limits: Limits,
    steps: u64,
}

impl<'a> Interp<'a> {
    fn new(program: &'a Program, inputs: &[String], limits: Limits) -> Self {
        let mut functions = FxHashMap::default();
        let mut register = |stmts: &'a [Stmt]| {
            for stmt in stmts {
                if let Stmt::FuncDef(f) = stmt {
                    functions.insert(f.name.as_str(), f);
                }
            }
        };
        for item in &program.items {
            match item {
                Item::Stmt(stmt) => register(std::slice::from_ref(stmt)),
                Item::Section(section) => {
                    if let Some(body) = &section.body {
                        register(body);
                    }
                }
            }
        }
        Self {
            frames: vec![IndexMap::new()],
            functions,
            inputs: inputs.iter().cloned().collect(),
            outputs: Vec::new(),
            trace: Trace::default(),
            limits,
            steps: 0,
        }
    }

    fn step(&mut self) -> Result<(), Failure> {
        self.steps += 1;
        if self.steps > self.limits.max_steps {
            return fail(
                DiagnosticCode::RT_STEP_LIMIT,
                format!("Execution exceeded the step limit of {}.", self.limits.max_steps),
            );
        }
        Ok(())
    }

    fn run_program(&mut self, program: &'a Program) -> Result<(), Failure> {
        for item in &program.items {
            match item {
                Item::Stmt(stmt) => {
                    if let Flow::Return(_) = self.exec_stmt(stmt)? {
                        return fail(
                            DiagnosticCode::RT_RETURN_OUTSIDE_FN,
                            "return outside of a function.",
                        );
                    }
                }
                Item::Section(section) => {
                    if let Some(body) = &section.body {
                        for stmt in body {
                            if let Flow::Return(_) = self.exec_stmt(stmt)? {
                                return fail(
                                    DiagnosticCode::RT_RETURN_OUTSIDE_FN,
                                    "return outside of a function.",
                                );
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Store
    // ------------------------------------------------------------------

    /// Assign to the nearest existing binding, or declare in the
    /// innermost frame.
    fn set(&mut self, name: &str, value: Value) {
        for frame in self.frames.iter_mut().rev() {
            if let Some(slot) = frame.get_mut(name) {
                *slot = value;
                return;
            }
        }
        self.frames
            .last_mut()
            .expect("store always has a frame")
            .insert(name.to_string(), value);
    }

    fn get(&self, name: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|f| f.get(name))
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn exec_stmt(&mut self, stmt: &'a Stmt) -> Result<Flow, Failure> {
        self.step()?;
        match stmt {
            Stmt::FuncDef(f) => {
                // Definitions were collected up front; executing one is
                // a no-op.
                self.trace.record("stmt.enter", format!("funcdef {}", f.name));
                Ok(Flow::Normal)
            }
            Stmt::Assign(s) => {
                self.trace.record("stmt.enter", "assign");
                let value = self.eval_expr(&s.value)?;
                self.trace.record("assign", s.name.clone());
                self.set(&s.name, value);
                Ok(Flow::Normal)
            }
            Stmt::Show(s) => {
                self.trace.record("stmt.enter", "show");
                let value = self.eval_expr(&s.value)?;
                let rendered = value.render();
                self.trace.record("io.show", rendered.clone());
                self.outputs.push(rendered);
                Ok(Flow::Normal)
            }
            Stmt::Verify(s) => {
                self.trace.record("stmt.enter", "verify");
                let value = self.eval_expr(&s.expr)?;
                match value {
                    Value::Bool(true) => {
                        self.trace.record("verify", "ok");
                        Ok(Flow::Normal)
                    }
                    Value::Bool(false) => fail(
                        DiagnosticCode::RT_VERIFY_FAILED,
                        "VERIFY failed: condition evaluated to false.",
                    ),
                    other => fail(
                        DiagnosticCode::RT_VERIFY_NOT_BOOL,
                        format!("VERIFY requires a Bool, found {}.", other.type_name()),
                    ),
                }
            }
            Stmt::Return(s) => {
                self.trace.record("stmt.enter", "return");
                let value = match &s.value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Null,
                };
                self.trace.record("return", value.render());
                Ok(Flow::Return(value))
            }
            Stmt::If(s) => {
                self.trace.record("stmt.enter", "if");
                let cond = self.eval_expr(&s.cond)?;
                let Value::Bool(taken) = cond else {
                    return fail(
                        DiagnosticCode::RT_BAD_OPERAND,
                        format!("if condition must be Bool, found {}.", cond.type_name()),
                    );
                };
                let body = if taken {
                    self.trace.record("branch", "then");
                    Some(&s.then_body)
                } else {
                    self.trace.record("branch", "else");
                    s.else_body.as_ref()
                };
                if let Some(body) = body {
                    self.frames.push(IndexMap::new());
                    let flow = self.exec_block(body);
                    self.frames.pop();
                    let flow = flow?;
                    if let Flow::Return(v) = flow {
                        return Ok(Flow::Return(v));
                    }
                }
                self.trace.record("stmt.exit", "if");
                Ok(Flow::Normal)
            }
            Stmt::While(s) => {
                self.trace.record("stmt.enter", "while");
                let mut iterations: u64 = 0;
                loop {
                    let cond = self.eval_expr(&s.cond)?;
                    let Value::Bool(go) = cond else {
                        return fail(
                            DiagnosticCode::RT_BAD_OPERAND,
                            format!("while condition must be Bool, found {}.", cond.type_name()),
                        );
                    };
                    if !go {
                        break;
                    }
                    iterations += 1;
                    if iterations > self.limits.max_loop_iterations {
                        return fail(
                            DiagnosticCode::RT_LOOP_LIMIT,
                            format!(
                                "Loop exceeded the iteration limit of {}.",
                                self.limits.max_loop_iterations
                            ),
                        );
                    }
                    self.trace.record("branch", "loop");
                    self.frames.push(IndexMap::new());
                    let flow = self.exec_block(&s.body);
                    self.frames.pop();
                    if let Flow::Return(v) = flow? {
                        return Ok(Flow::Return(v));
                    }
                }
                self.trace.record("stmt.exit", "while");
                Ok(Flow::Normal)
            }
            Stmt::Expr(s) => {
                self.trace.record("stmt.enter", "expr");
                self.eval_expr(&s.expr)?;
                Ok(Flow::Normal)
            }
        }
    }

    fn exec_block(&mut self, body: &'a [Stmt]) -> Result<Flow, Failure> {
        for stmt in body {
            if let Flow::Return(v) = self.exec_stmt(stmt)? {
                return Ok(Flow::Return(v));
            }
        }
        Ok(Flow::Normal)
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn eval_expr(&mut self, expr: &'a Expr) -> Result<Value, Failure> {
        self.step()?;
        match expr {
            Expr::Literal(lit) => {
                self.trace.record("expr", "lit");
                Ok(match lit.kind {
                    LitKind::Int => Value::Int(
                        lit.lexeme
                            .parse::<BigInt>()
                            .expect("lexer guarantees digits"),
                    ),
                    LitKind::Float => Value::Float(
                        lit.lexeme.parse::<f64>().expect("lexer guarantees a float"),
                    ),
                    LitKind::Bool => Value::Bool(lit.lexeme == "true"),
                    LitKind::Text => Value::Text(decode_text_literal(&lit.lexeme)),
                    LitKind::Null => Value::Null,
                })
            }
            Expr::Var(var) => {
                self.trace.record("expr", "var");
                match self.get(&var.name) {
                    Some(value) => Ok(value.clone()),
                    None => fail(
                        DiagnosticCode::RT_UNDEFINED_VAR,
                        format!("Undefined variable '{}'.", var.name),
                    ),
                }
            }
            Expr::Unary(unary) => {
                self.trace.record("expr", "unary");
                let value = self.eval_expr(&unary.expr)?;
                match (unary.op, value) {
                    (UnOp::Neg, Value::Int(n)) => Ok(Value::Int(-n)),
                    (UnOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
                    (UnOp::Neg, other) => fail(
                        DiagnosticCode::RT_BAD_OPERAND,
                        format!("Unary '-' requires a number, found {}.", other.type_name()),
                    ),
                }
            }
            Expr::Binary(binary) => {
                self.trace.record("expr", "binary");
                let left = self.eval_expr(&binary.left)?;
                let right = self.eval_expr(&binary.right)?;
                self.eval_binary(binary.op, left, right)
            }
            Expr::Call(call) => {
                self.trace.record("expr", "call");
                self.eval_call(call)
            }
            Expr::Paren(paren) => self.eval_expr(&paren.expr),
        }
    }

    fn eval_binary(&mut self, op: BinOp, left: Value, right: Value) -> Result<Value, Failure> {
        match op {
            BinOp::Eq => Ok(Value::Bool(left.eq_value(&right))),
            BinOp::Ne => Ok(Value::Bool(!left.eq_value(&right))),
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
                    return fail(
                        DiagnosticCode::RT_BAD_OPERAND,
                        format!(
                            "Comparison requires numbers, found {} and {}.",
                            left.type_name(),
                            right.type_name()
                        ),
                    );
                };
                // Pure-Int comparisons stay exact.
                if let (Value::Int(x), Value::Int(y)) = (&left, &right) {
                    return Ok(Value::Bool(match op {
                        BinOp::Lt => x < y,
                        BinOp::Le => x <= y,
                        BinOp::Gt => x > y,
                        _ => x >= y,
                    }));
                }
                Ok(Value::Bool(match op {
                    BinOp::Lt => a < b,
                    BinOp::Le => a <= b,
                    BinOp::Gt => a > b,
                    _ => a >= b,
                }))
            }
            BinOp::Add => match (&left, &right) {
                (Value::Text(a), Value::Text(b)) => {
                    Ok(Value::Text(format!("{a}{b}")))
                }
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a + b)),
                _ => self.float_arith(op, &left, &right),
            },
            BinOp::Sub | BinOp::Mul => match (&left, &right) {
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(if op == BinOp::Sub {
                    a - b
                } else {
                    a * b
                })),
                _ => self.float_arith(op, &left, &right),
            },
            BinOp::Div => {
                let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
                    return self.bad_arith(op, &left, &right);
                };
                if b == 0.0 {
                    return fail(DiagnosticCode::RT_DIVISION_BY_ZERO, "Division by zero.");
                }
                // Division always yields Float.
                Ok(Value::Float(a / b))
            }
            BinOp::Mod => match (&left, &right) {
                (Value::Int(a), Value::Int(b)) => {
                    if b.is_zero() {
                        return fail(DiagnosticCode::RT_DIVISION_BY_ZERO, "Modulo by zero.");
                    }
                    Ok(Value::Int(floored_mod_int(a, b)))
                }
                _ => {
                    let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
                        return self.bad_arith(op, &left, &right);
                    };
                    if b == 0.0 {
                        return fail(DiagnosticCode::RT_DIVISION_BY_ZERO, "Modulo by zero.");
                    }
                    Ok(Value::Float(a - b * (a / b).floor()))
                }
            },
        }
    }

    fn float_arith(&mut self, op: BinOp, left: &Value, right: &Value) -> Result<Value, Failure> {
        let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
            return self.bad_arith(op, left, right);
        };
        Ok(Value::Float(match op {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            _ => unreachable!("only widening arithmetic reaches here"),
        }))
    }

    fn bad_arith(&mut self, op: BinOp, left: &Value, right: &Value) -> Result<Value, Failure> {
        fail(
            DiagnosticCode::RT_BAD_OPERAND,
            format!(
                "Operator '{}' cannot combine {} and {}.",
                op.as_str(),
                left.type_name(),
                right.type_name()
            ),
        )
    }

    fn eval_call(&mut self, call: &'a CallExpr) -> Result<Value, Failure> {
        match call.callee.as_str() {
            "ask" => {
                // The prompt is evaluated but not displayed.
                for arg in &call.args {
                    self.eval_expr(arg)?;
                }
                match self.inputs.pop_front() {
                    Some(input) => {
                        self.trace.record("io.ask", input.clone());
                        Ok(Value::Text(input))
                    }
                    None => fail(
                        DiagnosticCode::RT_INPUT_EXHAUSTED,
                        "ask() requested input but no more mocked inputs were provided.",
                    ),
                }
            }
            "len" => {
                let mut values = Vec::new();
                for arg in &call.args {
                    values.push(self.eval_expr(arg)?);
                }
                match values.as_slice() {
                    [Value::Text(s)] => Ok(Value::Int(BigInt::from(s.chars().count()))),
                    [other] => fail(
                        DiagnosticCode::RT_BAD_OPERAND,
                        format!("len() takes Text, found {}.", other.type_name()),
                    ),
                    _ => fail(
                        DiagnosticCode::RT_ARITY_MISMATCH,
                        format!("len() expects 1 argument, found {}.", values.len()),
                    ),
                }
            }
            // Result constructors are transparent at runtime in v0.1.
            "ok" | "err" => match call.args.as_slice() {
                [arg] => self.eval_expr(arg),
                args => fail(
                    DiagnosticCode::RT_ARITY_MISMATCH,
                    format!("{}() expects 1 argument, found {}.", call.callee, args.len()),
                ),
            },
            name => {
                let Some(function) = self.functions.get(name).copied() else {
                    return fail(
                        DiagnosticCode::RT_UNDEFINED_VAR,
                        format!("Undefined function '{name}'."),
                    );
                };
                if function.params.len() != call.args.len() {
                    return fail(
                        DiagnosticCode::RT_ARITY_MISMATCH,
                        format!(
                            "Function '{name}' expects {} argument(s), found {}.",
                            function.params.len(),
                            call.args.len()
                        ),
                    );
                }
                let mut args = Vec::with_capacity(call.args.len());
                for arg in &call.args {
                    args.push(self.eval_expr(arg)?);
                }
                self.trace.record("call", name.to_string());
                self.frames.push(IndexMap::new());
                for (param, value) in function.params.iter().zip(args) {
                    self.frames
                        .last_mut()
                        .expect("frame just pushed")
                        .insert(param.name.clone(), value);
                }
                let flow = self.exec_block(&function.body);
                self.frames.pop();
                match flow? {
                    Flow::Return(value) => Ok(value),
                    Flow::Normal => Ok(Value::Null),
                }
            }
        }
    }
}


/// Python-style floored modulo: the result takes the divisor's sign.
fn floored_mod_int(a: &BigInt, b: &BigInt) -> BigInt {
    let r = a % b;
    if !r.is_zero() && (r.sign() != b.sign()) {
        r + b
    } else {
        r
    }
}
