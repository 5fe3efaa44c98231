//! AST node definitions for HAND.
//!
//! Two top-level item kinds: sections (emoji-marked headers with an
//! optional indented body) and statements. Function markers and label
//! words (`🔧 FUNCIÓN add(...)`) are normalized away at parse time; the
//! AST keeps only the function name, so formatting is canonical.

use handc_util::Span;
use serde::Serialize;

/// A parsed source file.
#[derive(Clone, Debug, Serialize)]
pub struct Program {
    pub items: Vec<Item>,
}

/// Top-level item.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "item")]
pub enum Item {
    Section(Section),
    Stmt(Stmt),
}

/// An emoji-marked section header with an optional indented body.
#[derive(Clone, Debug, Serialize)]
pub struct Section {
    /// The marker emoji, e.g. `🎬`.
    pub emoji: String,
    /// Header text after the emoji, token lexemes joined with spaces.
    pub header: String,
    /// Whether the header line ended in a colon.
    pub has_colon: bool,
    /// Indented body, if any.
    pub body: Option<Vec<Stmt>>,
    pub span: Span,
}

/// Statement.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "stmt")]
pub enum Stmt {
    FuncDef(FuncDef),
    If(IfStmt),
    While(WhileStmt),
    Return(ReturnStmt),
    Show(ShowStmt),
    Verify(VerifyStmt),
    Assign(AssignStmt),
    Expr(ExprStmt),
}

impl Stmt {
    pub fn span(&self) -> &Span {
        match self {
            Stmt::FuncDef(s) => &s.span,
            Stmt::If(s) => &s.span,
            Stmt::While(s) => &s.span,
            Stmt::Return(s) => &s.span,
            Stmt::Show(s) => &s.span,
            Stmt::Verify(s) => &s.span,
            Stmt::Assign(s) => &s.span,
            Stmt::Expr(s) => &s.span,
        }
    }
}

/// Function definition (`🔧 name(params) -> T:` plus body).
#[derive(Clone, Debug, Serialize)]
pub struct FuncDef {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<TypeExpr>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// Function parameter with optional declared type.
#[derive(Clone, Debug, Serialize)]
pub struct Param {
    pub name: String,
    pub ty: Option<TypeExpr>,
    pub span: Span,
}

#[derive(Clone, Debug, Serialize)]
pub struct IfStmt {
    pub cond: Expr,
    pub then_body: Vec<Stmt>,
    pub else_body: Option<Vec<Stmt>>,
    pub span: Span,
}

#[derive(Clone, Debug, Serialize)]
pub struct WhileStmt {
    pub cond: Expr,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Clone, Debug, Serialize)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}

#[derive(Clone, Debug, Serialize)]
pub struct ShowStmt {
    pub value: Expr,
    pub span: Span,
}

#[derive(Clone, Debug, Serialize)]
pub struct VerifyStmt {
    pub expr: Expr,
    pub span: Span,
}

/// Assignment with optional declared type (`x: Int = 1`).
#[derive(Clone, Debug, Serialize)]
pub struct AssignStmt {
    pub name: String,
    pub declared_type: Option<TypeExpr>,
    pub value: Expr,
    pub span: Span,
}

#[derive(Clone, Debug, Serialize)]
pub struct ExprStmt {
    pub expr: Expr,
    pub span: Span,
}

/// Expression.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "expr")]
pub enum Expr {
    Literal(Literal),
    Var(Var),
    Unary(Box<UnaryExpr>),
    Binary(Box<BinaryExpr>),
    Call(CallExpr),
    Paren(Box<ParenExpr>),
}

impl Expr {
    pub fn span(&self) -> &Span {
        match self {
            Expr::Literal(e) => &e.span,
            Expr::Var(e) => &e.span,
            Expr::Unary(e) => &e.span,
            Expr::Binary(e) => &e.span,
            Expr::Call(e) => &e.span,
            Expr::Paren(e) => &e.span,
        }
    }
}

/// Literal kinds of HAND Core v0.1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum LitKind {
    Int,
    Float,
    Bool,
    Text,
    Null,
}

/// A literal. The lexeme is the source token text; Text literals keep
/// their surrounding quotes.
#[derive(Clone, Debug, Serialize)]
pub struct Literal {
    pub kind: LitKind,
    pub lexeme: String,
    pub span: Span,
}

/// Variable reference.
#[derive(Clone, Debug, Serialize)]
pub struct Var {
    pub name: String,
    pub span: Span,
}

/// Unary operator (only negation in v0.1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum UnOp {
    Neg,
}

impl UnOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnOp::Neg => "-",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct UnaryExpr {
    pub op: UnOp,
    pub expr: Expr,
    pub span: Span,
}

/// Binary operators, grouped by precedence tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum BinOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
        }
    }

    pub fn from_str(op: &str) -> Option<BinOp> {
        Some(match op {
            "==" => BinOp::Eq,
            "!=" => BinOp::Ne,
            "<" => BinOp::Lt,
            "<=" => BinOp::Le,
            ">" => BinOp::Gt,
            ">=" => BinOp::Ge,
            "+" => BinOp::Add,
            "-" => BinOp::Sub,
            "*" => BinOp::Mul,
            "/" => BinOp::Div,
            "%" => BinOp::Mod,
            _ => return None,
        })
    }

    /// True for `==` and `!=`.
    pub fn is_equality(&self) -> bool {
        matches!(self, BinOp::Eq | BinOp::Ne)
    }

    /// True for the ordering comparisons.
    pub fn is_comparison(&self) -> bool {
        matches!(self, BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge)
    }

    /// True for the arithmetic operators.
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod
        )
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct BinaryExpr {
    pub op: BinOp,
    pub left: Expr,
    pub right: Expr,
    pub span: Span,
}

/// Call with a named callee and ordered arguments.
#[derive(Clone, Debug, Serialize)]
pub struct CallExpr {
    pub callee: String,
    pub args: Vec<Expr>,
    pub span: Span,
}

#[derive(Clone, Debug, Serialize)]
pub struct ParenExpr {
    pub expr: Expr,
    pub span: Span,
}

/// Type expression.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type")]
pub enum TypeExpr {
    /// Primitive or nominal name, e.g. `Int` or `User`.
    Name(TypeName),
    /// Generic application, e.g. `List[Int]` or `Map[Text, Int]`.
    App(TypeApp),
    /// Optional suffix, e.g. `Int?`.
    Optional(Box<TypeOptional>),
}

#[derive(Clone, Debug, Serialize)]
pub struct TypeName {
    pub name: String,
    pub span: Span,
}

#[derive(Clone, Debug, Serialize)]
pub struct TypeApp {
    pub base: TypeName,
    pub args: Vec<TypeExpr>,
    pub span: Span,
}

#[derive(Clone, Debug, Serialize)]
pub struct TypeOptional {
    pub inner: TypeExpr,
    pub span: Span,
}

impl TypeExpr {
    pub fn span(&self) -> &Span {
        match self {
            TypeExpr::Name(t) => &t.span,
            TypeExpr::App(t) => &t.span,
            TypeExpr::Optional(t) => &t.span,
        }
    }
}
