//! AST → IR lowering.
//!
//! A deterministic pre-order traversal assigns every constructed node
//! a monotonically increasing identifier (`N1`, `N2`, ...), scoped to
//! one lowering call. Section bodies flatten into the module's
//! top-level statement list in source order; function definitions move
//! to the module's function list.

use handc_par::{Expr, FuncDef, Item, LitKind, Program, Stmt, TypeExpr};

use crate::effects::Effect;
use crate::ir::{
    Function, Ir, IrExpr, IrParam, IrStmt, Module, Origin, TypeRef, IR_VERSION,
};

/// Canonical role markers for origin references.
mod marker {
    pub const MODULE: &str = "📦";
    pub const ASSIGN: &str = "📝";
    pub const EXPR: &str = "🧩";
    pub const SHOW: &str = "📤";
    pub const VERIFY: &str = "🔍";
    pub const IF: &str = "🧭";
    pub const WHILE: &str = "🔁";
    pub const RETURN: &str = "↩️";
    pub const FUNCTION: &str = "🛠";
    pub const PARAM: &str = "🏷️";
}

/// Lower a parsed program into HAND-IR v0.1.
///
/// The module's declared capabilities default to the derived required
/// set, so a source-only build is always self-consistent; callers may
/// overwrite them before enforcement.
pub fn lower_program(program: &Program, module_name: &str) -> Ir {
    let mut lowerer = Lowerer { next_id: 0 };

    let module_origin = Origin::synthesized(format!("[Lowering][{}][N0].0", marker::MODULE));
    let mut functions = Vec::new();
    let mut toplevel = Vec::new();

    for item in &program.items {
        match item {
            Item::Section(section) => {
                if let Some(body) = &section.body {
                    for stmt in body {
                        lowerer.lower_into(stmt, &mut functions, &mut toplevel);
                    }
                }
            }
            Item::Stmt(stmt) => lowerer.lower_into(stmt, &mut functions, &mut toplevel),
        }
    }

    let mut ir = Ir {
        ir_version: IR_VERSION.to_string(),
        origin: module_origin.clone(),
        module: Module {
            name: module_name.to_string(),
            semver: "0.1.0".to_string(),
            functions,
            toplevel,
            types: Vec::new(),
            capabilities: Vec::new(),
            origin: module_origin,
        },
    };
    ir.module.capabilities = ir
        .required_capabilities()
        .iter()
        .map(|c| c.as_str().to_string())
        .collect();
    ir
}

struct Lowerer {
    next_id: u32,
}

impl Lowerer {
    fn origin(&mut self, emoji: &str) -> Origin {
        self.next_id += 1;
        Origin::user(format!("[AST][{emoji}][N{}].0", self.next_id))
    }

    fn lower_into(
        &mut self,
        stmt: &Stmt,
        functions: &mut Vec<Function>,
        toplevel: &mut Vec<IrStmt>,
    ) {
        match stmt {
            Stmt::FuncDef(f) => functions.push(self.lower_function(f)),
            other => toplevel.push(self.lower_stmt(other)),
        }
    }

    fn lower_function(&mut self, f: &FuncDef) -> Function {
        let origin = self.origin(marker::FUNCTION);
        let params = f
            .params
            .iter()
            .map(|p| IrParam {
                name: p.name.clone(),
                ty: p.ty.as_ref().map(lower_type),
                origin: self.origin(marker::PARAM),
            })
            .collect();
        let body: Vec<IrStmt> = f.body.iter().map(|s| self.lower_stmt(s)).collect();

        let mut effects: Vec<Effect> = Vec::new();
        collect_effects(&body, &mut effects);
        effects.sort();
        effects.dedup();

        let mut function = Function {
            name: f.name.clone(),
            params,
            ret_type: f.return_type.as_ref().map(lower_type),
            body,
            effects,
            capabilities: Vec::new(),
            origin,
        };
        function.capabilities = function
            .required_capabilities()
            .iter()
            .map(|c| c.as_str().to_string())
            .collect();
        function
    }

    fn lower_stmt(&mut self, stmt: &Stmt) -> IrStmt {
        match stmt {
            Stmt::Assign(s) => {
                let origin = self.origin(marker::ASSIGN);
                IrStmt::Assign {
                    name: s.name.clone(),
                    ty: s.declared_type.as_ref().map(lower_type),
                    value: lower_expr(&s.value),
                    origin,
                    effects: vec![],
                    capabilities: vec![],
                }
            }
            Stmt::Expr(s) => {
                let origin = self.origin(marker::EXPR);
                IrStmt::Expr {
                    value: lower_expr(&s.expr),
                    origin,
                    effects: vec![],
                    capabilities: vec![],
                }
            }
            Stmt::Show(s) => {
                let origin = self.origin(marker::SHOW);
                IrStmt::Show {
                    value: lower_expr(&s.value),
                    origin,
                    effects: vec![Effect::IoShow],
                    capabilities: vec!["io.write".to_string()],
                }
            }
            Stmt::Verify(s) => {
                let origin = self.origin(marker::VERIFY);
                IrStmt::Verify {
                    value: lower_expr(&s.expr),
                    origin,
                    effects: vec![Effect::ContractVerify],
                    capabilities: vec!["compute".to_string()],
                }
            }
            Stmt::Return(s) => {
                let origin = self.origin(marker::RETURN);
                IrStmt::Return {
                    value: s.value.as_ref().map(lower_expr),
                    origin,
                    effects: vec![Effect::ControlReturn],
                    capabilities: vec!["compute".to_string()],
                }
            }
            Stmt::If(s) => {
                let origin = self.origin(marker::IF);
                IrStmt::If {
                    cond: lower_expr(&s.cond),
                    then: s.then_body.iter().map(|st| self.lower_stmt(st)).collect(),
                    else_: s
                        .else_body
                        .as_ref()
                        .map(|body| body.iter().map(|st| self.lower_stmt(st)).collect())
                        .unwrap_or_default(),
                    origin,
                    effects: vec![],
                    capabilities: vec![],
                }
            }
            Stmt::While(s) => {
                let origin = self.origin(marker::WHILE);
                IrStmt::While {
                    cond: lower_expr(&s.cond),
                    body: s.body.iter().map(|st| self.lower_stmt(st)).collect(),
                    origin,
                    effects: vec![],
                    capabilities: vec![],
                }
            }
            Stmt::FuncDef(_) => {
                unreachable!("function definitions are routed to the module function list")
            }
        }
    }
}

fn collect_effects(stmts: &[IrStmt], out: &mut Vec<Effect>) {
    for stmt in stmts {
        out.extend_from_slice(stmt.effects());
        match stmt {
            IrStmt::If { then, else_, .. } => {
                collect_effects(then, out);
                collect_effects(else_, out);
            }
            IrStmt::While { body, .. } => collect_effects(body, out),
            _ => {}
        }
    }
}

fn lower_expr(expr: &Expr) -> IrExpr {
    match expr {
        Expr::Literal(lit) => {
            let (value, kind) = match lit.kind {
                LitKind::Int => (int_value(&lit.lexeme), "Int"),
                LitKind::Float => (
                    serde_json::Number::from_f64(lit.lexeme.parse().unwrap_or(0.0))
                        .map(serde_json::Value::Number)
                        .unwrap_or(serde_json::Value::Null),
                    "Float",
                ),
                LitKind::Bool => (serde_json::Value::Bool(lit.lexeme == "true"), "Bool"),
                LitKind::Text => (serde_json::Value::String(lit.lexeme.clone()), "Text"),
                LitKind::Null => (serde_json::Value::Null, "Null"),
            };
            IrExpr::Lit {
                value,
                ty: Some(TypeRef::simple(kind)),
            }
        }
        Expr::Var(v) => IrExpr::var(&v.name),
        Expr::Unary(u) => IrExpr::Unary {
            op: u.op.as_str().to_string(),
            expr: Box::new(lower_expr(&u.expr)),
        },
        Expr::Binary(b) => IrExpr::Binary {
            op: b.op.as_str().to_string(),
            left: Box::new(lower_expr(&b.left)),
            right: Box::new(lower_expr(&b.right)),
        },
        Expr::Call(c) => IrExpr::Call {
            callee: c.callee.clone(),
            args: c.args.iter().map(lower_expr).collect(),
        },
        // Grouping is purely syntactic; the IR keeps the tree shape.
        Expr::Paren(p) => lower_expr(&p.expr),
    }
}

/// Integer literals keep full precision: values beyond i64 lower to
/// their decimal digit string.
fn int_value(lexeme: &str) -> serde_json::Value {
    match lexeme.parse::<i64>() {
        Ok(n) => serde_json::Value::Number(n.into()),
        Err(_) => serde_json::Value::String(lexeme.to_string()),
    }
}

const KNOWN_GENERICS: &[&str] = &["List", "Map", "Optional", "Result"];

fn lower_type(ty: &TypeExpr) -> TypeRef {
    match ty {
        TypeExpr::Name(name) => match name.name.as_str() {
            "Int" | "Float" | "Bool" | "Text" | "Null" | "Any" | "Never" => {
                TypeRef::simple(&name.name)
            }
            generic if KNOWN_GENERICS.contains(&generic) => TypeRef::simple(generic),
            other => TypeRef::record(other),
        },
        TypeExpr::Optional(opt) => TypeRef::optional(lower_type(&opt.inner)),
        TypeExpr::App(app) => {
            let args: Vec<TypeRef> = app.args.iter().map(lower_type).collect();
            if KNOWN_GENERICS.contains(&app.base.name.as_str()) {
                TypeRef {
                    kind: app.base.name.clone(),
                    name: None,
                    args,
                }
            } else {
                TypeRef {
                    kind: "Record".to_string(),
                    name: Some(app.base.name.clone()),
                    args,
                }
            }
        }
    }
}
