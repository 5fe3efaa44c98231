//! WebAssembly text backend (pure subset).
//!
//! Accepts only functions over Int/Bool (both i32), arithmetic and
//! comparison, if/while, and calls to module-defined functions. Any
//! effect beyond `compute`, any IO statement and any non-i32 type is
//! refused with a `WASM-0…` code.

use handc_ir::{Effect, Ir, IrExpr, IrStmt, TypeRef, IR_VERSION};

use crate::{BackendError, Note};

/// Generate the WAT artifact for the pure subset.
pub fn gen_wat(ir: &Ir) -> Result<(String, Vec<Note>), BackendError> {
    if ir.ir_version != IR_VERSION {
        return Err(BackendError::new(
            "WASM-0001",
            format!("Unsupported IR version '{}'.", ir.ir_version),
            None,
        ));
    }
    require_pure_subset(ir)?;

    let fn_names: Vec<&str> = ir.module.functions.iter().map(|f| f.name.as_str()).collect();

    let mut lines: Vec<String> = Vec::new();
    lines.push("(module".to_string());
    lines.push("  (memory (export \"memory\") 1) ;; reserved (unused in pure subset)".to_string());
    lines.push(String::new());

    for function in &ir.module.functions {
        for param in &function.params {
            ensure_i32(param.ty.as_ref(), Some(param.origin.node_ref.clone()))?;
        }
        ensure_i32(
            function.ret_type.as_ref(),
            Some(function.origin.node_ref.clone()),
        )?;

        let params: Vec<&str> = function.params.iter().map(|p| p.name.as_str()).collect();
        let mut ctx = FnCtx::new(&params);
        scan_locals(&function.body, &mut ctx);

        let mut header = format!("  (func ${} ", function.name);
        header.push_str(
            &params
                .iter()
                .map(|p| format!("(param ${p} i32)"))
                .collect::<Vec<_>>()
                .join(" "),
        );
        if !params.is_empty() {
            header.push(' ');
        }
        header.push_str("(result i32)");
        lines.push(header);

        for local in &ctx.locals {
            lines.push(format!("    (local {local} i32)"));
        }

        if function.body.is_empty() {
            lines.push("    i32.const 0".to_string());
            lines.push("    return".to_string());
        } else {
            for stmt in &function.body {
                for inst in emit_stmt(&mut ctx, stmt, &fn_names)? {
                    lines.push(format!("    {inst}"));
                }
            }
            lines.push("    i32.const 0".to_string());
            lines.push("    return".to_string());
        }
        lines.push("  )".to_string());
        lines.push(format!(
            "  (export \"{0}\" (func ${0}))",
            function.name
        ));
        lines.push(String::new());
    }

    lines.push(")".to_string());
    Ok((lines.join("\n") + "\n", Vec::new()))
}

fn require_pure_subset(ir: &Ir) -> Result<(), BackendError> {
    if let Some(first) = ir.module.toplevel.first() {
        return Err(BackendError::new(
            "WASM-0100",
            "WASM v0.1 supports only functions (no top-level statements).",
            Some(first.origin().node_ref.clone()),
        ));
    }
    for function in &ir.module.functions {
        check_stmts_pure(&function.body)?;
    }
    Ok(())
}

fn check_stmts_pure(stmts: &[IrStmt]) -> Result<(), BackendError> {
    for stmt in stmts {
        for effect in stmt.effects() {
            if !matches!(effect, Effect::ContractVerify | Effect::ControlReturn) {
                return Err(BackendError::new(
                    "WASM-0200",
                    format!("WASM v0.1 forbids effect '{effect}' (pure subset)."),
                    Some(stmt.origin().node_ref.clone()),
                ));
            }
        }
        if matches!(stmt, IrStmt::Show { .. } | IrStmt::Verify { .. }) {
            return Err(BackendError::new(
                "WASM-0201",
                "WASM v0.1 forbids IO/VERIFY in pure subset (no host bindings in this backend).",
                Some(stmt.origin().node_ref.clone()),
            ));
        }
        match stmt {
            IrStmt::If { then, else_, .. } => {
                check_stmts_pure(then)?;
                check_stmts_pure(else_)?;
            }
            IrStmt::While { body, .. } => check_stmts_pure(body)?,
            _ => {}
        }
    }
    Ok(())
}

fn ensure_i32(ty: Option<&TypeRef>, origin: Option<String>) -> Result<(), BackendError> {
    match ty.map(|t| t.kind.as_str()) {
        None | Some("Int") | Some("Bool") => Ok(()),
        Some(other) => Err(BackendError::new(
            "WASM-0300",
            format!("WASM v0.1 supports only Int/Bool (i32). Got type: {other}"),
            origin,
        )),
    }
}

struct FnCtx {
    locals: Vec<String>,
    known: Vec<String>,
}

impl FnCtx {
    fn new(params: &[&str]) -> Self {
        Self {
            locals: Vec::new(),
            known: params.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn ensure_local(&mut self, name: &str) -> String {
        if !self.known.iter().any(|k| k == name) {
            self.known.push(name.to_string());
            self.locals.push(format!("${name}"));
        }
        format!("${name}")
    }
}

/// Pre-declare a local for every assigned name, blocks included.
fn scan_locals(stmts: &[IrStmt], ctx: &mut FnCtx) {
    for stmt in stmts {
        match stmt {
            IrStmt::Assign { name, .. } => {
                ctx.ensure_local(name);
            }
            IrStmt::If { then, else_, .. } => {
                scan_locals(then, ctx);
                scan_locals(else_, ctx);
            }
            IrStmt::While { body, .. } => scan_locals(body, ctx),
            _ => {}
        }
    }
}

fn emit_stmt(
    ctx: &mut FnCtx,
    stmt: &IrStmt,
    fn_names: &[&str],
) -> Result<Vec<String>, BackendError> {
    let mut out = Vec::new();
    match stmt {
        IrStmt::Assign { name, value, .. } => {
            let sym = ctx.ensure_local(name);
            out.extend(emit_expr(ctx, value, fn_names)?);
            out.push(format!("local.set {sym}"));
        }
        IrStmt::Expr { value, .. } => {
            out.extend(emit_expr(ctx, value, fn_names)?);
            out.push("drop".to_string());
        }
        IrStmt::Return { value, .. } => {
            match value {
                Some(value) => out.extend(emit_expr(ctx, value, fn_names)?),
                None => out.push("i32.const 0".to_string()),
            }
            out.push("return".to_string());
        }
        IrStmt::If {
            cond, then, else_, ..
        } => {
            out.extend(emit_expr(ctx, cond, fn_names)?);
            out.push("if".to_string());
            for s in then {
                for inst in emit_stmt(ctx, s, fn_names)? {
                    out.push(format!("  {inst}"));
                }
            }
            if !else_.is_empty() {
                out.push("else".to_string());
                for s in else_ {
                    for inst in emit_stmt(ctx, s, fn_names)? {
                        out.push(format!("  {inst}"));
                    }
                }
            }
            out.push("end".to_string());
        }
        IrStmt::While { cond, body, .. } => {
            out.push("block $exit".to_string());
            out.push("  loop $loop".to_string());
            for inst in emit_expr(ctx, cond, fn_names)? {
                out.push(format!("    {inst}"));
            }
            out.push("    i32.eqz".to_string());
            out.push("    br_if $exit".to_string());
            for s in body {
                for inst in emit_stmt(ctx, s, fn_names)? {
                    out.push(format!("    {inst}"));
                }
            }
            out.push("    br $loop".to_string());
            out.push("  end".to_string());
            out.push("end".to_string());
        }
        other => {
            return Err(BackendError::new(
                "WASM-0600",
                format!("Unsupported statement kind: {}", other.kind()),
                Some(other.origin().node_ref.clone()),
            ));
        }
    }
    Ok(out)
}

fn emit_expr(
    ctx: &mut FnCtx,
    expr: &IrExpr,
    fn_names: &[&str],
) -> Result<Vec<String>, BackendError> {
    let mut out = Vec::new();
    match expr {
        IrExpr::Lit { value, ty } => {
            ensure_i32(ty.as_ref(), None)?;
            let n = literal_i32(value)?;
            out.push(format!("i32.const {n}"));
        }
        IrExpr::Var { name } => {
            let sym = ctx.ensure_local(name);
            out.push(format!("local.get {sym}"));
        }
        IrExpr::Unary { op, expr } => match op.as_str() {
            "-" => {
                out.push("i32.const 0".to_string());
                out.extend(emit_expr(ctx, expr, fn_names)?);
                out.push("i32.sub".to_string());
            }
            other => {
                return Err(BackendError::new(
                    "WASM-0400",
                    format!("Unsupported unary op: {other}"),
                    None,
                ));
            }
        },
        IrExpr::Binary { op, left, right } => {
            out.extend(emit_expr(ctx, left, fn_names)?);
            out.extend(emit_expr(ctx, right, fn_names)?);
            let inst = match op.as_str() {
                "+" => "i32.add",
                "-" => "i32.sub",
                "*" => "i32.mul",
                "/" => "i32.div_s",
                "%" => "i32.rem_s",
                "==" => "i32.eq",
                "!=" => "i32.ne",
                "<" => "i32.lt_s",
                "<=" => "i32.le_s",
                ">" => "i32.gt_s",
                ">=" => "i32.ge_s",
                other => {
                    return Err(BackendError::new(
                        "WASM-0401",
                        format!("Unsupported binary op: {other}"),
                        None,
                    ));
                }
            };
            out.push(inst.to_string());
        }
        IrExpr::Call { callee, args } => {
            if !fn_names.contains(&callee.as_str()) {
                return Err(BackendError::new(
                    "WASM-0500",
                    format!("Unsupported call target: {callee}"),
                    None,
                ));
            }
            for arg in args {
                out.extend(emit_expr(ctx, arg, fn_names)?);
            }
            out.push(format!("call ${callee}"));
        }
    }
    Ok(out)
}

fn literal_i32(value: &serde_json::Value) -> Result<i64, BackendError> {
    match value {
        serde_json::Value::Bool(true) => Ok(1),
        serde_json::Value::Bool(false) => Ok(0),
        serde_json::Value::Number(n) => n.as_i64().ok_or_else(|| {
            BackendError::new(
                "WASM-0302",
                format!("Literal does not fit i32: {n}"),
                None,
            )
        }),
        serde_json::Value::String(s) => {
            let t = s.trim().to_ascii_lowercase();
            match t.as_str() {
                "true" => Ok(1),
                "false" => Ok(0),
                _ => t.parse::<i64>().map_err(|_| {
                    BackendError::new(
                        "WASM-0302",
                        format!("Literal does not fit i32: {s}"),
                        None,
                    )
                }),
            }
        }
        serde_json::Value::Null => Err(BackendError::new(
            "WASM-0301",
            "Null literal not supported.",
            None,
        )),
        other => Err(BackendError::new(
            "WASM-0302",
            format!("Unsupported literal: {other}"),
            None,
        )),
    }
}
