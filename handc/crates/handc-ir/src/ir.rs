//! The HAND-IR v0.1 data model.
//!
//! Shapes mirror the public JSON contract one to one. Statement and
//! expression enums are internally tagged with `kind`; type references
//! use `{kind, name?, args}`. Capabilities are carried as raw strings
//! so that a malformed declaration survives deserialization long
//! enough for the enforcer to reject it with a proper diagnostic.

use serde::{Deserialize, Serialize};

use crate::effects::{Capability, Effect};

/// The only IR version this toolchain reads or writes.
pub const IR_VERSION: &str = "0.1.0";

/// Stable provenance of an IR node.
///
/// The reference format is `[Stage][Emoji][N<id>].<sub>`: stage `AST`
/// for user-authored nodes, `Lowering` for synthesized ones; the emoji
/// is the canonical marker for the node's role.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Origin {
    /// Authoring actor: 👤 (user), ⭐ (assistant) or 🤖 (toolchain).
    pub actor: String,
    /// Stable node reference, e.g. `[AST][📝][N3].0`.
    #[serde(rename = "ref")]
    pub node_ref: String,
}

impl Origin {
    pub fn user(node_ref: impl Into<String>) -> Self {
        Self {
            actor: "👤".to_string(),
            node_ref: node_ref.into(),
        }
    }

    pub fn synthesized(node_ref: impl Into<String>) -> Self {
        Self {
            actor: "🤖".to_string(),
            node_ref: node_ref.into(),
        }
    }
}

/// A complete IR document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ir {
    pub ir_version: String,
    pub origin: Origin,
    pub module: Module,
}

/// A module: ordered functions, ordered top-level statements, record
/// type declarations and a sorted capability list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub semver: String,
    pub functions: Vec<Function>,
    pub toplevel: Vec<IrStmt>,
    #[serde(default)]
    pub types: Vec<RecordDecl>,
    pub capabilities: Vec<String>,
    pub origin: Origin,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub params: Vec<IrParam>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ret_type: Option<TypeRef>,
    pub body: Vec<IrStmt>,
    pub effects: Vec<Effect>,
    pub capabilities: Vec<String>,
    pub origin: Origin,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IrParam {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<TypeRef>,
    pub origin: Origin,
}

/// A record type declaration (`module.types` entry).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordDecl {
    pub name: String,
    pub fields: Vec<RecordField>,
    pub origin: Origin,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

/// IR type encoding: `{kind, name?, args}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypeRef {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub args: Vec<TypeRef>,
}

impl TypeRef {
    pub fn simple(kind: &str) -> TypeRef {
        TypeRef {
            kind: kind.to_string(),
            name: None,
            args: Vec::new(),
        }
    }

    pub fn record(name: &str) -> TypeRef {
        TypeRef {
            kind: "Record".to_string(),
            name: Some(name.to_string()),
            args: Vec::new(),
        }
    }

    pub fn optional(inner: TypeRef) -> TypeRef {
        TypeRef {
            kind: "Optional".to_string(),
            name: None,
            args: vec![inner],
        }
    }
}

/// IR statement, tagged with `kind`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum IrStmt {
    Assign {
        name: String,
        #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
        ty: Option<TypeRef>,
        value: IrExpr,
        origin: Origin,
        effects: Vec<Effect>,
        capabilities: Vec<String>,
    },
    Expr {
        value: IrExpr,
        origin: Origin,
        effects: Vec<Effect>,
        capabilities: Vec<String>,
    },
    Show {
        value: IrExpr,
        origin: Origin,
        effects: Vec<Effect>,
        capabilities: Vec<String>,
    },
    Verify {
        value: IrExpr,
        origin: Origin,
        effects: Vec<Effect>,
        capabilities: Vec<String>,
    },
    Return {
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<IrExpr>,
        origin: Origin,
        effects: Vec<Effect>,
        capabilities: Vec<String>,
    },
    If {
        cond: IrExpr,
        then: Vec<IrStmt>,
        #[serde(rename = "else", default)]
        else_: Vec<IrStmt>,
        origin: Origin,
        effects: Vec<Effect>,
        capabilities: Vec<String>,
    },
    While {
        cond: IrExpr,
        body: Vec<IrStmt>,
        origin: Origin,
        effects: Vec<Effect>,
        capabilities: Vec<String>,
    },
}

impl IrStmt {
    pub fn origin(&self) -> &Origin {
        match self {
            IrStmt::Assign { origin, .. }
            | IrStmt::Expr { origin, .. }
            | IrStmt::Show { origin, .. }
            | IrStmt::Verify { origin, .. }
            | IrStmt::Return { origin, .. }
            | IrStmt::If { origin, .. }
            | IrStmt::While { origin, .. } => origin,
        }
    }

    pub fn effects(&self) -> &[Effect] {
        match self {
            IrStmt::Assign { effects, .. }
            | IrStmt::Expr { effects, .. }
            | IrStmt::Show { effects, .. }
            | IrStmt::Verify { effects, .. }
            | IrStmt::Return { effects, .. }
            | IrStmt::If { effects, .. }
            | IrStmt::While { effects, .. } => effects,
        }
    }

    /// Kind tag as it appears in the JSON form.
    pub fn kind(&self) -> &'static str {
        match self {
            IrStmt::Assign { .. } => "assign",
            IrStmt::Expr { .. } => "expr",
            IrStmt::Show { .. } => "show",
            IrStmt::Verify { .. } => "verify",
            IrStmt::Return { .. } => "return",
            IrStmt::If { .. } => "if",
            IrStmt::While { .. } => "while",
        }
    }
}

/// IR expression, tagged with `kind`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum IrExpr {
    Lit {
        value: serde_json::Value,
        #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
        ty: Option<TypeRef>,
    },
    Var {
        name: String,
    },
    Unary {
        op: String,
        expr: Box<IrExpr>,
    },
    Binary {
        op: String,
        left: Box<IrExpr>,
        right: Box<IrExpr>,
    },
    Call {
        callee: String,
        args: Vec<IrExpr>,
    },
}

impl IrExpr {
    pub fn lit(value: serde_json::Value, ty: Option<TypeRef>) -> IrExpr {
        IrExpr::Lit { value, ty }
    }

    pub fn var(name: &str) -> IrExpr {
        IrExpr::Var {
            name: name.to_string(),
        }
    }
}

// ----------------------------------------------------------------------
// Required-capability walks (shared by the lowering and the enforcer)
// ----------------------------------------------------------------------

fn walk_expr_caps(expr: &IrExpr, out: &mut Vec<Capability>) {
    match expr {
        IrExpr::Call { callee, args } => {
            // An ask call anywhere requires io.read, even when the
            // statement carrying it has no io effect of its own.
            if callee == "ask" {
                out.push(Capability::IoRead);
            }
            for arg in args {
                walk_expr_caps(arg, out);
            }
        }
        IrExpr::Unary { expr, .. } => walk_expr_caps(expr, out),
        IrExpr::Binary { left, right, .. } => {
            walk_expr_caps(left, out);
            walk_expr_caps(right, out);
        }
        IrExpr::Lit { .. } | IrExpr::Var { .. } => {}
    }
}

fn walk_stmt_caps(stmt: &IrStmt, out: &mut Vec<Capability>) {
    for effect in stmt.effects() {
        out.push(effect.capability());
    }
    match stmt {
        IrStmt::Assign { value, .. }
        | IrStmt::Expr { value, .. }
        | IrStmt::Show { value, .. }
        | IrStmt::Verify { value, .. } => walk_expr_caps(value, out),
        IrStmt::Return { value, .. } => {
            if let Some(value) = value {
                walk_expr_caps(value, out);
            }
        }
        IrStmt::If {
            cond, then, else_, ..
        } => {
            walk_expr_caps(cond, out);
            for s in then {
                walk_stmt_caps(s, out);
            }
            for s in else_ {
                walk_stmt_caps(s, out);
            }
        }
        IrStmt::While { cond, body, .. } => {
            walk_expr_caps(cond, out);
            for s in body {
                walk_stmt_caps(s, out);
            }
        }
    }
}

fn finish(mut caps: Vec<Capability>) -> Vec<Capability> {
    caps.push(Capability::Compute);
    caps.sort();
    caps.dedup();
    caps
}

impl Function {
    /// Capabilities this function requires, derived from its effects
    /// and every `ask` call in its body. Always includes `compute`.
    pub fn required_capabilities(&self) -> Vec<Capability> {
        let mut caps = Vec::new();
        for effect in &self.effects {
            caps.push(effect.capability());
        }
        for stmt in &self.body {
            walk_stmt_caps(stmt, &mut caps);
        }
        finish(caps)
    }
}

impl Ir {
    /// Capabilities the whole module requires. Always includes
    /// `compute`.
    pub fn required_capabilities(&self) -> Vec<Capability> {
        let mut caps = Vec::new();
        for stmt in &self.module.toplevel {
            walk_stmt_caps(stmt, &mut caps);
        }
        for function in &self.module.functions {
            for cap in function.required_capabilities() {
                caps.push(cap);
            }
        }
        finish(caps)
    }
}
