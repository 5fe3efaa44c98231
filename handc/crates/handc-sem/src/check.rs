//! The typechecker walk.

use handc_par::{
    AssignStmt, BinOp, CallExpr, Expr, FuncDef, IfStmt, Item, LitKind, Program, ReturnStmt, Stmt,
    VerifyStmt, WhileStmt,
};
use handc_util::{Diagnostic, DiagnosticCode, Handler, Span};
use rustc_hash::FxHashMap;

use crate::scope::ScopeStack;
use crate::types::Ty;

/// Typecheck a program, returning diagnostics only.
pub fn typecheck(program: &Program) -> Vec<Diagnostic> {
    let handler = Handler::new();
    let mut checker = Checker::new(&handler);
    checker.collect_functions(program);
    checker.check_program(program);
    handler.take()
}

#[derive(Clone)]
struct FnSig {
    params: Vec<Ty>,
    ret: Ty,
}

struct Checker<'a> {
    scopes: ScopeStack,
    functions: FxHashMap<String, FnSig>,
    handler: &'a Handler,
    /// Declared return type of the function being checked, if any.
    current_ret: Option<Ty>,
}

impl<'a> Checker<'a> {
    fn new(handler: &'a Handler) -> Self {
        Self {
            scopes: ScopeStack::new(),
            functions: FxHashMap::default(),
            handler,
            current_ret: None,
        }
    }

    fn error(&self, code: DiagnosticCode, message: String, span: &Span) {
        self.handler
            .emit(Diagnostic::error(code, message, span.clone()));
    }

    fn warning(&self, code: DiagnosticCode, message: String, span: &Span) {
        self.handler
            .emit(Diagnostic::warning(code, message, span.clone()));
    }

    /// Pre-pass: register every function signature so calls resolve
    /// regardless of definition order.
    fn collect_functions(&mut self, program: &Program) {
        let mut register = |stmts: &[Stmt]| {
            for stmt in stmts {
                if let Stmt::FuncDef(f) = stmt {
                    self.functions.insert(f.name.clone(), signature(f));
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
    }

    fn check_program(&mut self, program: &Program) {
        for item in &program.items {
            match item {
                Item::Stmt(stmt) => self.check_stmt(stmt),
                Item::Section(section) => {
                    if let Some(body) = &section.body {
                        for stmt in body {
                            self.check_stmt(stmt);
                        }
                    }
                }
            }
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::FuncDef(f) => self.check_func_def(f),
            Stmt::If(s) => self.check_if(s),
            Stmt::While(s) => self.check_while(s),
            Stmt::Return(s) => self.check_return(s),
            Stmt::Show(s) => {
                self.check_expr(&s.value);
            }
            Stmt::Verify(s) => self.check_verify(s),
            Stmt::Assign(s) => self.check_assign(s),
            Stmt::Expr(s) => {
                self.check_expr(&s.expr);
            }
        }
    }

    fn check_func_def(&mut self, f: &FuncDef) {
        let sig = self
            .functions
            .get(&f.name)
            .cloned()
            .unwrap_or_else(|| signature(f));
        self.scopes.push();
        for (param, ty) in f.params.iter().zip(sig.params.iter()) {
            self.scopes.declare(&param.name, ty.clone());
        }
        let saved_ret = self.current_ret.replace(sig.ret);
        for stmt in &f.body {
            self.check_stmt(stmt);
        }
        self.current_ret = saved_ret;
        self.scopes.pop();
    }

    fn check_if(&mut self, s: &IfStmt) {
        let cond_ty = self.check_expr(&s.cond);
        self.require_bool(&cond_ty, s.cond.span());

        let mut then_env = self.scopes.clone();
        std::mem::swap(&mut self.scopes, &mut then_env);
        for stmt in &s.then_body {
            self.check_stmt(stmt);
        }
        std::mem::swap(&mut self.scopes, &mut then_env);
        let then_scopes = then_env;

        let mut else_scopes = self.scopes.clone();
        if let Some(else_body) = &s.else_body {
            std::mem::swap(&mut self.scopes, &mut else_scopes);
            for stmt in else_body {
                self.check_stmt(stmt);
            }
            std::mem::swap(&mut self.scopes, &mut else_scopes);
        }

        self.scopes = ScopeStack::merge_branches(&then_scopes, &else_scopes);
    }

    fn check_while(&mut self, s: &WhileStmt) {
        let cond_ty = self.check_expr(&s.cond);
        self.require_bool(&cond_ty, s.cond.span());

        // Body runs zero or more times: check it in a clone and discard
        // every binding and refinement it makes.
        let snapshot = self.scopes.clone();
        self.scopes.push();
        for stmt in &s.body {
            self.check_stmt(stmt);
        }
        self.scopes = snapshot;
    }

    fn check_return(&mut self, s: &ReturnStmt) {
        let Some(ret_ty) = self.current_ret.clone() else {
            self.error(
                DiagnosticCode::TC_RETURN_OUTSIDE_FN,
                "return outside of a function.".to_string(),
                &s.span,
            );
            if let Some(value) = &s.value {
                self.check_expr(value);
            }
            return;
        };
        match &s.value {
            Some(value) => {
                let value_ty = self.check_expr(value);
                if !value_ty.assignable_to(&ret_ty) {
                    self.error(
                        DiagnosticCode::TC_RETURN_MISMATCH,
                        format!("Cannot return {value_ty} from a function returning {ret_ty}."),
                        value.span(),
                    );
                }
            }
            None => {
                if !matches!(ret_ty, Ty::Null | Ty::Optional(_) | Ty::Any) {
                    self.error(
                        DiagnosticCode::TC_RETURN_MISMATCH,
                        format!(
                            "return without a value requires a Null or optional return type, \
                             found {ret_ty}."
                        ),
                        &s.span,
                    );
                }
            }
        }
    }

    fn check_verify(&mut self, s: &VerifyStmt) {
        self.check_expr(&s.expr);
        // Refinement patterns: `v != null` (either side) or a bare
        // optional `v`. Anything else is a type-level no-op.
        if let Some(name) = non_null_refinement_target(&s.expr) {
            self.scopes.refine_non_null(name);
        }
    }

    fn check_assign(&mut self, s: &AssignStmt) {
        let value_ty = self.check_expr(&s.value);
        let declared = s.declared_type.as_ref().map(Ty::from_type_expr);

        match declared {
            Some(ty) => {
                if !value_ty.assignable_to(&ty) {
                    self.error(
                        DiagnosticCode::TC_ASSIGN_MISMATCH,
                        format!("Cannot assign {value_ty} to '{}' of type {ty}.", s.name),
                        s.value.span(),
                    );
                }
                self.scopes.declare(&s.name, ty);
            }
            None => match self.scopes.get(&s.name).map(|b| b.ty.clone()) {
                Some(existing) => {
                    if !value_ty.assignable_to(&existing) {
                        self.error(
                            DiagnosticCode::TC_ASSIGN_MISMATCH,
                            format!(
                                "Cannot assign {value_ty} to '{}' of type {existing}.",
                                s.name
                            ),
                            s.value.span(),
                        );
                    }
                    // Reassignment invalidates any earlier refinement.
                    if let Some(binding) = self.scopes.get_mut(&s.name) {
                        binding.proven_non_null = false;
                    }
                }
                None => self.scopes.declare(&s.name, value_ty),
            },
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn check_expr(&mut self, expr: &Expr) -> Ty {
        match expr {
            Expr::Literal(lit) => match lit.kind {
                LitKind::Int => Ty::Int,
                LitKind::Float => Ty::Float,
                LitKind::Bool => Ty::Bool,
                LitKind::Text => Ty::Text,
                LitKind::Null => Ty::Null,
            },
            Expr::Var(var) => match self.scopes.lookup(&var.name) {
                Some(ty) => ty,
                None => {
                    self.error(
                        DiagnosticCode::TC_UNDEFINED_VAR,
                        format!("Undefined variable '{}'.", var.name),
                        &var.span,
                    );
                    Ty::Any
                }
            },
            Expr::Unary(unary) => {
                let ty = self.check_expr(&unary.expr);
                if ty.is_numeric() || ty == Ty::Any {
                    ty
                } else {
                    self.error(
                        DiagnosticCode::TC_OPERAND_MISMATCH,
                        format!("Unary '-' requires a numeric operand, found {ty}."),
                        unary.expr.span(),
                    );
                    Ty::Any
                }
            }
            Expr::Binary(binary) => {
                let left = self.check_expr(&binary.left);
                let right = self.check_expr(&binary.right);
                self.check_binary(binary.op, &left, &right, &binary.span)
            }
            Expr::Call(call) => self.check_call(call),
            Expr::Paren(paren) => self.check_expr(&paren.expr),
        }
    }

    fn check_binary(&self, op: BinOp, left: &Ty, right: &Ty, span: &Span) -> Ty {
        if op.is_equality() {
            // Equality accepts any pair, including null comparisons.
            return Ty::Bool;
        }
        if op.is_comparison() {
            let ok = |t: &Ty| t.is_numeric() || *t == Ty::Any;
            if !ok(left) || !ok(right) {
                self.error(
                    DiagnosticCode::TC_OPERAND_MISMATCH,
                    format!("Comparison requires numeric operands, found {left} and {right}."),
                    span,
                );
            }
            return Ty::Bool;
        }
        // Arithmetic.
        if op == BinOp::Add && *left == Ty::Text && *right == Ty::Text {
            return Ty::Text;
        }
        let numeric =
            |t: &Ty| t.is_numeric() || *t == Ty::Any;
        if !numeric(left) || !numeric(right) {
            self.error(
                DiagnosticCode::TC_OPERAND_MISMATCH,
                format!(
                    "Operator '{}' requires numeric operands (or Text + Text), found {left} and {right}.",
                    op.as_str()
                ),
                span,
            );
            return Ty::Any;
        }
        if op == BinOp::Div {
            return Ty::Float;
        }
        if *left == Ty::Any || *right == Ty::Any {
            return Ty::Any;
        }
        if *left == Ty::Float || *right == Ty::Float {
            Ty::Float
        } else {
            Ty::Int
        }
    }

    fn check_call(&mut self, call: &CallExpr) -> Ty {
        let arg_tys: Vec<Ty> = call.args.iter().map(|a| self.check_expr(a)).collect();
        match call.callee.as_str() {
            "ask" => {
                if let Some(first) = arg_tys.first() {
                    if *first != Ty::Text && *first != Ty::Any {
                        self.error(
                            DiagnosticCode::TC_OPERAND_MISMATCH,
                            format!("ask() takes a Text prompt, found {first}."),
                            &call.span,
                        );
                    }
                }
                Ty::Text
            }
            "len" => {
                if let Some(first) = arg_tys.first() {
                    let ok = matches!(first, Ty::Text | Ty::List(_) | Ty::Map(_, _) | Ty::Any);
                    if !ok {
                        self.error(
                            DiagnosticCode::TC_OPERAND_MISMATCH,
                            format!("len() takes Text, a List or a Map, found {first}."),
                            &call.span,
                        );
                    }
                }
                Ty::Int
            }
            "ok" => {
                let inner = arg_tys.first().cloned().unwrap_or(Ty::Null);
                Ty::Result(Box::new(inner), Box::new(Ty::Any))
            }
            "err" => {
                let inner = arg_tys.first().cloned().unwrap_or(Ty::Null);
                Ty::Result(Box::new(Ty::Any), Box::new(inner))
            }
            name => match self.functions.get(name).cloned() {
                Some(sig) => {
                    if sig.params.len() != arg_tys.len() {
                        self.error(
                            DiagnosticCode::TC_OPERAND_MISMATCH,
                            format!(
                                "Function '{name}' expects {} argument(s), found {}.",
                                sig.params.len(),
                                arg_tys.len()
                            ),
                            &call.span,
                        );
                    } else {
                        for (i, (arg, param)) in arg_tys.iter().zip(sig.params.iter()).enumerate()
                        {
                            if !arg.assignable_to(param) {
                                self.error(
                                    DiagnosticCode::TC_OPERAND_MISMATCH,
                                    format!(
                                        "Argument {} of '{name}' expects {param}, found {arg}.",
                                        i + 1
                                    ),
                                    call.args[i].span(),
                                );
                            }
                        }
                    }
                    sig.ret
                }
                None => {
                    self.warning(
                        DiagnosticCode::TC_UNKNOWN_CALLEE,
                        format!("Unknown callee '{name}' in HAND Core v0.1."),
                        &call.span,
                    );
                    Ty::Any
                }
            },
        }
    }

    fn require_bool(&self, ty: &Ty, span: &Span) {
        if *ty != Ty::Bool && *ty != Ty::Any {
            self.error(
                DiagnosticCode::TC_CONDITION_NOT_BOOL,
                format!("Condition must be Bool, found {ty}."),
                span,
            );
        }
    }
}

fn signature(f: &FuncDef) -> FnSig {
    FnSig {
        params: f
            .params
            .iter()
            .map(|p| p.ty.as_ref().map(Ty::from_type_expr).unwrap_or(Ty::Any))
            .collect(),
        ret: f
            .return_type
            .as_ref()
            .map(Ty::from_type_expr)
            .unwrap_or(Ty::Any),
    }
}

/// Match the refinement patterns `v != null`, `null != v` and bare `v`.
fn non_null_refinement_target(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::Binary(b) if b.op == BinOp::Ne => match (&b.left, &b.right) {
            (Expr::Var(v), Expr::Literal(l)) if l.kind == LitKind::Null => Some(&v.name),
            (Expr::Literal(l), Expr::Var(v)) if l.kind == LitKind::Null => Some(&v.name),
            _ => None,
        },
        Expr::Var(v) => Some(&v.name),
        Expr::Paren(p) => non_null_refinement_target(&p.expr),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handc_lex::lex;
    use handc_par::parse;

    fn check_src(src: &str) -> Vec<Diagnostic> {
        let (tokens, ldiags) = lex(src, "<mem>");
        assert!(ldiags.is_empty(), "lex diags: {ldiags:?}");
        let (program, pdiags) = parse(&tokens, "<mem>");
        assert!(pdiags.is_empty(), "parse diags: {pdiags:?}");
        typecheck(&program)
    }

    fn error_codes(src: &str) -> Vec<&'static str> {
        check_src(src)
            .iter()
            .filter(|d| d.severity != handc_util::Severity::Warning)
            .map(|d| d.code.as_str())
            .collect()
    }

    #[test]
    fn test_simple_program_is_clean() {
        assert!(error_codes("x: Int = 1\nshow x\n").is_empty());
    }

    #[test]
    fn test_undefined_variable() {
        assert_eq!(error_codes("show y\n"), vec!["HND-TC-0101"]);
    }

    #[test]
    fn test_optional_refinement_via_verify() {
        let src = "x: Int? = null\nverify x != null\nshow x + 1\n";
        assert!(error_codes(src).is_empty(), "{:?}", check_src(src));
    }

    #[test]
    fn test_optional_without_refinement_rejected() {
        let src = "x: Int? = null\nshow x + 1\n";
        assert_eq!(error_codes(src), vec!["HND-TC-0201"]);
    }

    #[test]
    fn test_bare_optional_verify_refines() {
        let src = "x: Int? = 1\nverify x\nshow x + 1\n";
        assert!(error_codes(src).is_empty());
    }

    #[test]
    fn test_reassignment_resets_refinement() {
        let src = "x: Int? = 1\nverify x != null\nx = null\nshow x + 1\n";
        assert_eq!(error_codes(src), vec!["HND-TC-0201"]);
    }

    #[test]
    fn test_null_into_non_optional_rejected() {
        assert_eq!(error_codes("x: Int = null\n"), vec!["HND-TC-0204"]);
    }

    #[test]
    fn test_null_into_optional_accepted() {
        assert!(error_codes("x: Int? = null\n").is_empty());
    }

    #[test]
    fn test_condition_must_be_bool() {
        assert_eq!(error_codes("if 1:\n    show 1\n"), vec!["HND-TC-0202"]);
    }

    #[test]
    fn test_division_yields_float() {
        // Float result assigned into Int must fail.
        assert_eq!(error_codes("x: Int = 4 / 2\n"), vec!["HND-TC-0204"]);
        assert!(error_codes("x: Float = 4 / 2\n").is_empty());
    }

    #[test]
    fn test_text_concatenation() {
        assert!(error_codes("x: Text = \"a\" + \"b\"\n").is_empty());
        assert_eq!(error_codes("x = \"a\" - \"b\"\n"), vec!["HND-TC-0201"]);
    }

    #[test]
    fn test_text_plus_int_rejected() {
        assert_eq!(error_codes("x = \"a\" + 1\n"), vec!["HND-TC-0201"]);
    }

    #[test]
    fn test_equality_accepts_mixed_types() {
        assert!(error_codes("x = 1 == \"a\"\nshow x\n").is_empty());
        assert!(error_codes("a = null\nb = a == null\n").is_empty());
    }

    #[test]
    fn test_comparison_requires_numeric() {
        assert_eq!(error_codes("x = \"a\" < \"b\"\n"), vec!["HND-TC-0201"]);
    }

    #[test]
    fn test_branch_local_names_are_dropped_after_merge() {
        // y exists only in the else branch, so it does not survive the
        // merge and the later use is undefined.
        let src = "x = 1\nif true:\n    x = 1\nelse:\n    y = 2\nshow y\n";
        assert_eq!(error_codes(src), vec!["HND-TC-0101"]);
    }

    #[test]
    fn test_while_discards_body_bindings() {
        let src = "i: Int = 0\nwhile i < 2:\n    t = 1\nshow t\n";
        assert_eq!(error_codes(src), vec!["HND-TC-0101"]);
    }

    #[test]
    fn test_while_counts_clean() {
        assert!(error_codes("i: Int = 0\nwhile i < 2:\n    i = i + 1\n").is_empty());
    }

    #[test]
    fn test_return_outside_function() {
        assert_eq!(error_codes("return 1\n"), vec!["HND-TC-0301"]);
    }

    #[test]
    fn test_return_type_checked() {
        let src = "🔧 f() -> Int:\n    return \"a\"\n";
        assert_eq!(error_codes(src), vec!["HND-TC-0203"]);
    }

    #[test]
    fn test_bare_return_requires_optional_or_null() {
        let bad = "🔧 f() -> Int:\n    return\n";
        assert_eq!(error_codes(bad), vec!["HND-TC-0203"]);
        let ok_null = "🔧 f() -> Null:\n    return\n";
        assert!(error_codes(ok_null).is_empty());
        let ok_opt = "🔧 f() -> Int?:\n    return\n";
        assert!(error_codes(ok_opt).is_empty());
    }

    #[test]
    fn test_function_call_arity() {
        let src = "🔧 add(a: Int, b: Int) -> Int:\n    return a + b\nshow add(1)\n";
        assert_eq!(error_codes(src), vec!["HND-TC-0201"]);
    }

    #[test]
    fn test_function_call_argument_types() {
        let src = "🔧 add(a: Int, b: Int) -> Int:\n    return a + b\nshow add(1, \"x\")\n";
        assert_eq!(error_codes(src), vec!["HND-TC-0201"]);
    }

    #[test]
    fn test_call_before_definition_resolves() {
        let src = "show add(1, 2)\n🔧 add(a: Int, b: Int) -> Int:\n    return a + b\n";
        assert!(error_codes(src).is_empty());
    }

    #[test]
    fn test_unknown_callee_is_warning_only() {
        let diags = check_src("x = mystery()\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::TC_UNKNOWN_CALLEE);
        assert_eq!(diags[0].severity, handc_util::Severity::Warning);
    }

    #[test]
    fn test_ask_returns_text() {
        assert!(error_codes("x: Text = ask(\"p\")\n").is_empty());
        assert_eq!(error_codes("x: Int = ask(\"p\")\n"), vec!["HND-TC-0204"]);
    }

    #[test]
    fn test_unary_minus_requires_numeric() {
        assert_eq!(error_codes("x = -\"a\"\n"), vec!["HND-TC-0201"]);
        assert!(error_codes("x = -5\nshow x\n").is_empty());
    }
}
