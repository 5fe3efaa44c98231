//! Host-language (Python) backend.
//!
//! Emits a self-contained program exposing `__hand_main(inputs) ->
//! outputs`. The generated runtime mirrors the reference interpreter's
//! observable behavior: the same `%.15g` stringification, strict-type
//! equality through a `_eq` helper, floored modulo and float division.
//! Run as a script with a JSON inputs argument it prints
//! `{"outputs": [...], "sigma": {...}}` for the equivalence oracle.

use handc_interp::decode_text_literal;
use handc_ir::{Function, Ir, IrExpr, IrStmt, IR_VERSION};

use crate::{BackendError, Note};

/// Generate the executable Python artifact.
pub fn gen_python(ir: &Ir) -> Result<(String, Vec<Note>), BackendError> {
    if ir.ir_version != IR_VERSION {
        return Err(BackendError::new(
            "PY-0001",
            format!("Unsupported IR version '{}'.", ir.ir_version),
            None,
        ));
    }

    let mut out: Vec<String> = Vec::new();
    emit_preamble(&mut out);

    out.push("# --- User functions ---".to_string());
    for function in &ir.module.functions {
        emit_function(&mut out, function)?;
    }

    out.push("# --- Top-level ---".to_string());
    out.push("def __hand_run(inputs: List[str]):".to_string());
    out.push("    store = Store(frames=[{}])".to_string());
    out.push("    rt = Runtime(inputs=list(inputs), outputs=[])".to_string());
    for stmt in &ir.module.toplevel {
        emit_stmt(&mut out, stmt, 4)?;
    }
    out.push("    sigma = {k: rt._repr(v) for k, v in store.frames[0].items()}".to_string());
    out.push("    return rt.outputs, sigma".to_string());
    out.push(String::new());
    out.push("def __hand_main(inputs: List[str]) -> List[str]:".to_string());
    out.push("    outputs, _sigma = __hand_run(inputs)".to_string());
    out.push("    return outputs".to_string());
    out.push(String::new());
    out.push("def __hand_run_and_print_json(inputs: List[str]) -> None:".to_string());
    out.push("    import json".to_string());
    out.push("    outputs, sigma = __hand_run(inputs)".to_string());
    out.push(
        "    print(json.dumps({'outputs': outputs, 'sigma': sigma}, ensure_ascii=False))"
            .to_string(),
    );
    out.push(String::new());
    out.push("if __name__ == '__main__':".to_string());
    out.push("    import json, sys".to_string());
    out.push("    inputs = []".to_string());
    out.push("    if len(sys.argv) > 1:".to_string());
    out.push("        inputs = json.loads(sys.argv[1])".to_string());
    out.push("    __hand_run_and_print_json(inputs)".to_string());
    out.push(String::new());

    Ok((out.join("\n"), Vec::new()))
}

fn emit_preamble(out: &mut Vec<String>) {
    for line in [
        "from __future__ import annotations",
        "from dataclasses import dataclass",
        "from typing import Any, Dict, List",
        "",
        "# --- Runtime (matches the reference interpreter's repr rules) ---",
        "@dataclass",
        "class Store:",
        "    frames: List[Dict[str, Any]]",
        "    def get(self, name: str) -> Any:",
        "        for fr in reversed(self.frames):",
        "            if name in fr:",
        "                return fr[name]",
        "        raise RuntimeError(f\"HND-RT-0001 Undefined variable '{name}'.\")",
        "    def set(self, name: str, value: Any) -> None:",
        "        for fr in reversed(self.frames):",
        "            if name in fr:",
        "                fr[name] = value",
        "                return",
        "        self.frames[-1][name] = value",
        "    def declare(self, name: str, value: Any) -> None:",
        "        self.frames[-1][name] = value",
        "    def push(self) -> None:",
        "        self.frames.append({})",
        "    def pop(self) -> None:",
        "        self.frames.pop()",
        "",
        "@dataclass",
        "class Runtime:",
        "    inputs: List[str]",
        "    outputs: List[str]",
        "    ip: int = 0",
        "    def _repr(self, v: Any) -> str:",
        "        if v is None:",
        "            return 'null'",
        "        if isinstance(v, bool):",
        "            return 'true' if v else 'false'",
        "        if isinstance(v, float):",
        "            return format(v, '.15g')",
        "        if isinstance(v, (int, str)):",
        "            return str(v)",
        "        return str(v)",
        "    def show(self, v: Any) -> None:",
        "        self.outputs.append(self._repr(v))",
        "    def ask(self, prompt: Any) -> str:",
        "        if self.ip >= len(self.inputs):",
        "            raise RuntimeError('HND-RT-0101 ask() requested input but no more mocked inputs were provided.')",
        "        v = self.inputs[self.ip]",
        "        self.ip += 1",
        "        return v",
        "",
        "class _ReturnSignal(Exception):",
        "    def __init__(self, value: Any):",
        "        self.value = value",
        "",
        "def _truthy(v: Any) -> bool:",
        "    return bool(v)",
        "",
        "def _eq(a: Any, b: Any) -> bool:",
        "    if a is None or b is None:",
        "        return a is None and b is None",
        "    if isinstance(a, bool) or isinstance(b, bool):",
        "        return isinstance(a, bool) and isinstance(b, bool) and a == b",
        "    if isinstance(a, (int, float)) and isinstance(b, (int, float)):",
        "        if isinstance(a, float) != isinstance(b, float):",
        "            return False",
        "        return a == b",
        "    if type(a) is not type(b):",
        "        return False",
        "    return a == b",
        "",
        "def _verify(v: Any) -> None:",
        "    if not isinstance(v, bool):",
        "        raise RuntimeError('HND-RT-0402 VERIFY requires a Bool.')",
        "    if not v:",
        "        raise RuntimeError('HND-RT-0401 VERIFY failed.')",
        "",
    ] {
        out.push(line.to_string());
    }
}

fn emit_function(out: &mut Vec<String>, function: &Function) -> Result<(), BackendError> {
    let params: Vec<&str> = function.params.iter().map(|p| p.name.as_str()).collect();
    let sep = if params.is_empty() { "" } else { ", " };
    out.push(format!(
        "def {}(store: Store, rt: Runtime{sep}{}):",
        function.name,
        params.join(", ")
    ));
    out.push("    store.push()".to_string());
    for param in &params {
        out.push(format!("    store.declare({}, {param})", py_str(param)));
    }
    out.push("    try:".to_string());
    if function.body.is_empty() {
        out.push("        pass".to_string());
    } else {
        for stmt in &function.body {
            emit_stmt(out, stmt, 8)?;
        }
    }
    out.push("        return None".to_string());
    out.push("    except _ReturnSignal as r:".to_string());
    out.push("        return r.value".to_string());
    out.push("    finally:".to_string());
    out.push("        store.pop()".to_string());
    out.push(String::new());
    Ok(())
}

fn emit_stmt(out: &mut Vec<String>, stmt: &IrStmt, indent: usize) -> Result<(), BackendError> {
    let pad = " ".repeat(indent);
    let origin = stmt.origin().node_ref.clone();
    let oc = |line: String| format!("{line}  # {origin}");

    match stmt {
        IrStmt::Assign { name, value, .. } => {
            out.push(oc(format!(
                "{pad}store.set({}, {})",
                py_str(name),
                emit_expr(value)?
            )));
        }
        IrStmt::Expr { value, .. } => {
            out.push(oc(format!("{pad}{}", emit_expr(value)?)));
        }
        IrStmt::Show { value, .. } => {
            out.push(oc(format!("{pad}rt.show({})", emit_expr(value)?)));
        }
        IrStmt::Verify { value, .. } => {
            out.push(oc(format!("{pad}_verify({})", emit_expr(value)?)));
        }
        IrStmt::Return { value, .. } => match value {
            Some(value) => {
                out.push(oc(format!("{pad}raise _ReturnSignal({})", emit_expr(value)?)))
            }
            None => out.push(oc(format!("{pad}raise _ReturnSignal(None)"))),
        },
        IrStmt::If {
            cond, then, else_, ..
        } => {
            out.push(oc(format!("{pad}if _truthy({}):", emit_expr(cond)?)));
            emit_framed_block(out, then, indent, &oc)?;
            if !else_.is_empty() {
                out.push(oc(format!("{pad}else:")));
                emit_framed_block(out, else_, indent, &oc)?;
            }
        }
        IrStmt::While { cond, body, .. } => {
            out.push(oc(format!("{pad}while _truthy({}):", emit_expr(cond)?)));
            if body.is_empty() {
                out.push(oc(format!("{pad}    break")));
            } else {
                emit_framed_block(out, body, indent, &oc)?;
            }
        }
    }
    Ok(())
}

/// Emit a block body inside its own store frame, matching the
/// reference interpreter's scoping for if/while bodies. The frame pops
/// even when a return signal unwinds through it.
fn emit_framed_block(
    out: &mut Vec<String>,
    body: &[IrStmt],
    indent: usize,
    oc: &dyn Fn(String) -> String,
) -> Result<(), BackendError> {
    let pad = " ".repeat(indent);
    if body.is_empty() {
        out.push(oc(format!("{pad}    pass")));
        return Ok(());
    }
    out.push(oc(format!("{pad}    store.push()")));
    out.push(oc(format!("{pad}    try:")));
    for stmt in body {
        emit_stmt(out, stmt, indent + 8)?;
    }
    out.push(oc(format!("{pad}    finally:")));
    out.push(oc(format!("{pad}        store.pop()")));
    Ok(())
}

fn emit_expr(expr: &IrExpr) -> Result<String, BackendError> {
    match expr {
        IrExpr::Lit { value, ty } => Ok(emit_literal(value, ty.as_ref().map(|t| t.kind.as_str()))),
        IrExpr::Var { name } => Ok(format!("store.get({})", py_str(name))),
        IrExpr::Unary { op, expr } => {
            let inner = emit_expr(expr)?;
            match op.as_str() {
                "-" => Ok(format!("(-({inner}))")),
                other => Err(BackendError::new(
                    "PY-0400",
                    format!("Unsupported unary op: {other}"),
                    None,
                )),
            }
        }
        IrExpr::Binary { op, left, right } => {
            let l = emit_expr(left)?;
            let r = emit_expr(right)?;
            match op.as_str() {
                "==" => Ok(format!("_eq({l}, {r})")),
                "!=" => Ok(format!("(not _eq({l}, {r}))")),
                "<" | ">" | "<=" | ">=" | "+" | "-" | "*" | "/" | "%" => {
                    Ok(format!("({l} {op} {r})"))
                }
                other => Err(BackendError::new(
                    "PY-0401",
                    format!("Unsupported binary op: {other}"),
                    None,
                )),
            }
        }
        IrExpr::Call { callee, args } => {
            let rendered: Vec<String> =
                args.iter().map(emit_expr).collect::<Result<_, _>>()?;
            match callee.as_str() {
                "ask" => Ok(format!(
                    "rt.ask({})",
                    rendered.first().cloned().unwrap_or_else(|| "''".to_string())
                )),
                "show" => Ok(format!(
                    "(rt.show({}), None)[1]",
                    rendered.first().cloned().unwrap_or_else(|| "None".to_string())
                )),
                "len" => Ok(format!(
                    "len({})",
                    rendered.first().cloned().unwrap_or_default()
                )),
                // Result constructors are transparent at runtime.
                "ok" | "err" => Ok(rendered.first().cloned().unwrap_or_else(|| "None".to_string())),
                name => {
                    let sep = if rendered.is_empty() { "" } else { ", " };
                    Ok(format!("{name}(store, rt{sep}{})", rendered.join(", ")))
                }
            }
        }
    }
}

fn emit_literal(value: &serde_json::Value, kind: Option<&str>) -> String {
    match kind {
        Some("Text") => {
            let raw = value.as_str().unwrap_or_default();
            py_str(&decode_text_literal(raw))
        }
        Some("Bool") => match value {
            serde_json::Value::Bool(true) => "True".to_string(),
            serde_json::Value::Bool(false) => "False".to_string(),
            serde_json::Value::String(s) if s.trim().eq_ignore_ascii_case("true") => {
                "True".to_string()
            }
            _ => "False".to_string(),
        },
        Some("Null") => "None".to_string(),
        _ => match value {
            serde_json::Value::Null => "None".to_string(),
            serde_json::Value::Bool(true) => "True".to_string(),
            serde_json::Value::Bool(false) => "False".to_string(),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    i.to_string()
                } else {
                    // Float repr: Rust's shortest round-trip form is a
                    // valid Python literal.
                    format!("{:?}", n.as_f64().unwrap_or(0.0))
                }
            }
            // Big integers lower to digit strings.
            serde_json::Value::String(s) => s.clone(),
            other => format!("{other}"),
        },
    }
}

/// A deterministic Python string literal (double quotes, non-ASCII
/// kept raw).
fn py_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
