//! Canonical formatter for HAND programs.
//!
//! Pretty-prints an AST back to source with 4-space indentation. The
//! output is canonical: function markers normalize to `🔧`, verify
//! statements to `🔍`, and label words are gone. Reparsing formatted
//! output yields a structurally identical AST (round-trip stability).

use crate::ast::{Expr, Item, Program, Section, Stmt, TypeExpr};

const IND: &str = "    ";

/// Format a whole program. Always ends with a newline.
pub fn format_program(program: &Program) -> String {
    let mut out = String::new();
    for item in &program.items {
        match item {
            Item::Section(section) => fmt_section(&mut out, section, 0),
            Item::Stmt(stmt) => fmt_stmt(&mut out, stmt, 0),
        }
    }
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

fn pad(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str(IND);
    }
}

fn fmt_section(out: &mut String, section: &Section, level: usize) {
    pad(out, level);
    let header = format!("{} {}", section.emoji, section.header);
    out.push_str(header.trim_end());
    if section.has_colon {
        out.push(':');
    }
    out.push('\n');
    if let Some(body) = &section.body {
        for stmt in body {
            fmt_stmt(out, stmt, level + 1);
        }
    }
}

fn fmt_stmt(out: &mut String, stmt: &Stmt, level: usize) {
    pad(out, level);
    match stmt {
        Stmt::FuncDef(f) => {
            out.push_str("🔧 ");
            out.push_str(&f.name);
            out.push('(');
            for (i, p) in f.params.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&p.name);
                if let Some(ty) = &p.ty {
                    out.push_str(": ");
                    out.push_str(&fmt_type(ty));
                }
            }
            out.push(')');
            if let Some(ret) = &f.return_type {
                out.push_str(" -> ");
                out.push_str(&fmt_type(ret));
            }
            out.push_str(":\n");
            for s in &f.body {
                fmt_stmt(out, s, level + 1);
            }
        }
        Stmt::If(s) => {
            out.push_str("if ");
            out.push_str(&fmt_expr(&s.cond));
            out.push_str(":\n");
            for st in &s.then_body {
                fmt_stmt(out, st, level + 1);
            }
            if let Some(else_body) = &s.else_body {
                pad(out, level);
                out.push_str("else:\n");
                for st in else_body {
                    fmt_stmt(out, st, level + 1);
                }
            }
        }
        Stmt::While(s) => {
            out.push_str("while ");
            out.push_str(&fmt_expr(&s.cond));
            out.push_str(":\n");
            for st in &s.body {
                fmt_stmt(out, st, level + 1);
            }
        }
        Stmt::Return(s) => {
            out.push_str("return");
            if let Some(value) = &s.value {
                out.push(' ');
                out.push_str(&fmt_expr(value));
            }
            out.push('\n');
        }
        Stmt::Show(s) => {
            out.push_str("show ");
            out.push_str(&fmt_expr(&s.value));
            out.push('\n');
        }
        Stmt::Verify(s) => {
            out.push_str("🔍 ");
            out.push_str(&fmt_expr(&s.expr));
            out.push('\n');
        }
        Stmt::Assign(s) => {
            out.push_str(&s.name);
            if let Some(ty) = &s.declared_type {
                out.push_str(": ");
                out.push_str(&fmt_type(ty));
            }
            out.push_str(" = ");
            out.push_str(&fmt_expr(&s.value));
            out.push('\n');
        }
        Stmt::Expr(s) => {
            out.push_str(&fmt_expr(&s.expr));
            out.push('\n');
        }
    }
}

fn fmt_type(ty: &TypeExpr) -> String {
    match ty {
        TypeExpr::Name(n) => n.name.clone(),
        TypeExpr::Optional(opt) => format!("{}?", fmt_type(&opt.inner)),
        TypeExpr::App(app) => {
            let args: Vec<String> = app.args.iter().map(fmt_type).collect();
            format!("{}[{}]", app.base.name, args.join(", "))
        }
    }
}

fn fmt_expr(expr: &Expr) -> String {
    match expr {
        Expr::Literal(l) => l.lexeme.clone(),
        Expr::Var(v) => v.name.clone(),
        Expr::Unary(u) => format!("{}{}", u.op.as_str(), fmt_expr(&u.expr)),
        Expr::Binary(b) => format!(
            "{} {} {}",
            fmt_expr(&b.left),
            b.op.as_str(),
            fmt_expr(&b.right)
        ),
        Expr::Call(c) => {
            let args: Vec<String> = c.args.iter().map(fmt_expr).collect();
            format!("{}({})", c.callee, args.join(", "))
        }
        Expr::Paren(p) => format!("({})", fmt_expr(&p.expr)),
    }
}
