//! Expression parsing with binding powers.
//!
//! Precedence, lowest to highest: equality (`==`, `!=`), comparison
//! (`<`, `<=`, `>`, `>=`), additive (`+`, `-`), multiplicative
//! (`*`, `/`, `%`), unary `-`, primary. All binary operators are
//! left-associative, so the right binding power is one above the left.

use handc_lex::TokenKind;

use crate::ast::{
    BinOp, BinaryExpr, CallExpr, Expr, LitKind, Literal, ParenExpr, UnOp, UnaryExpr, Var,
};
use crate::Parser;

/// Binding power levels. Higher numbers bind tighter.
pub(crate) mod bp {
    /// Start of an expression.
    pub const MIN: u8 = 0;
    /// Equality: `==`, `!=`.
    pub const EQUALITY: u8 = 2;
    /// Comparison: `<`, `<=`, `>`, `>=`.
    pub const COMPARISON: u8 = 4;
    /// Additive: `+`, `-`.
    pub const ADDITIVE: u8 = 6;
    /// Multiplicative: `*`, `/`, `%`.
    pub const MULTIPLICATIVE: u8 = 8;
    /// Prefix operators.
    pub const UNARY: u8 = 10;
}

fn infix_binding_power(op: BinOp) -> (u8, u8) {
    let lbp = if op.is_equality() {
        bp::EQUALITY
    } else if op.is_comparison() {
        bp::COMPARISON
    } else if matches!(op, BinOp::Add | BinOp::Sub) {
        bp::ADDITIVE
    } else {
        bp::MULTIPLICATIVE
    };
    (lbp, lbp + 1)
}

impl<'a> Parser<'a> {
    /// Parse a complete expression.
    pub(crate) fn parse_expr(&mut self) -> Option<Expr> {
        self.parse_expr_bp(bp::MIN)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Option<Expr> {
        let mut lhs = self.parse_prefix()?;
        loop {
            let op = match self.kind() {
                TokenKind::Op => match BinOp::from_str(&self.current().lexeme) {
                    Some(op) => op,
                    None => break,
                },
                _ => break,
            };
            let (lbp, rbp) = infix_binding_power(op);
            if lbp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_expr_bp(rbp)?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary(Box::new(BinaryExpr {
                op,
                left: lhs,
                right: rhs,
                span,
            }));
        }
        Some(lhs)
    }

    fn parse_prefix(&mut self) -> Option<Expr> {
        if self.kind() == TokenKind::Op && self.current().lexeme == "-" {
            let start = self.bump().span;
            let operand = self.parse_expr_bp(bp::UNARY)?;
            let span = start.merge(operand.span());
            return Some(Expr::Unary(Box::new(UnaryExpr {
                op: UnOp::Neg,
                expr: operand,
                span,
            })));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        match self.kind() {
            TokenKind::Number => {
                let token = self.bump();
                let kind = if token.lexeme.contains('.') {
                    LitKind::Float
                } else {
                    LitKind::Int
                };
                Some(Expr::Literal(Literal {
                    kind,
                    lexeme: token.lexeme,
                    span: token.span,
                }))
            }
            TokenKind::String => {
                let token = self.bump();
                Some(Expr::Literal(Literal {
                    kind: LitKind::Text,
                    lexeme: token.lexeme,
                    span: token.span,
                }))
            }
            TokenKind::Keyword => match self.current().lexeme.as_str() {
                "true" | "false" => {
                    let token = self.bump();
                    Some(Expr::Literal(Literal {
                        kind: LitKind::Bool,
                        lexeme: token.lexeme,
                        span: token.span,
                    }))
                }
                "null" => {
                    let token = self.bump();
                    Some(Expr::Literal(Literal {
                        kind: LitKind::Null,
                        lexeme: token.lexeme,
                        span: token.span,
                    }))
                }
                "ask" => {
                    let token = self.bump();
                    self.parse_call(token.lexeme, token.span)
                }
                _ => {
                    self.error_and_advance("in expression");
                    None
                }
            },
            TokenKind::Ident => {
                let token = self.bump();
                if self.check(TokenKind::LParen) {
                    self.parse_call(token.lexeme, token.span)
                } else {
                    Some(Expr::Var(Var {
                        name: token.lexeme,
                        span: token.span,
                    }))
                }
            }
            // An emoji in expression position becomes a Text literal
            // whose lexeme is the emoji, quoted.
            TokenKind::Emoji => {
                let token = self.bump();
                Some(Expr::Literal(Literal {
                    kind: LitKind::Text,
                    lexeme: format!("\"{}\"", token.lexeme),
                    span: token.span,
                }))
            }
            TokenKind::LParen => {
                let start = self.bump().span;
                let inner = self.parse_expr()?;
                let end = self.span_here();
                self.expect(TokenKind::RParen, "')' to close parenthesized expression");
                Some(Expr::Paren(Box::new(ParenExpr {
                    expr: inner,
                    span: start.merge(&end),
                })))
            }
            _ => {
                self.error_and_advance("in expression");
                None
            }
        }
    }

    fn parse_call(&mut self, callee: String, start: handc_util::Span) -> Option<Expr> {
        self.expect(TokenKind::LParen, "'(' to open argument list")?;
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        let end = self.span_here();
        self.expect(TokenKind::RParen, "')' to close argument list");
        Some(Expr::Call(CallExpr {
            callee,
            args,
            span: start.merge(&end),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse, Item, Program, Stmt};
    use handc_lex::lex;

    fn parse_expr_source(src: &str) -> Expr {
        let (tokens, ldiags) = lex(src, "<mem>");
        assert!(ldiags.is_empty());
        let (program, diags) = parse(&tokens, "<mem>");
        assert!(diags.is_empty(), "parse diags: {diags:?}");
        expr_of(program)
    }

    fn expr_of(program: Program) -> Expr {
        match program.items.into_iter().next().unwrap() {
            Item::Stmt(Stmt::Expr(e)) => e.expr,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    fn assert_binary(expr: &Expr, op: BinOp) -> (&Expr, &Expr) {
        match expr {
            Expr::Binary(b) => {
                assert_eq!(b.op, op, "expected operator {op:?}");
                (&b.left, &b.right)
            }
            other => panic!("expected binary expression, got {other:?}"),
        }
    }

    #[test]
    fn test_mul_binds_tighter_than_add() {
        // a + b * c parses as a + (b * c)
        let expr = parse_expr_source("a + b * c\n");
        let (left, right) = assert_binary(&expr, BinOp::Add);
        assert!(matches!(left, Expr::Var(v) if v.name == "a"));
        assert_binary(right, BinOp::Mul);
    }

    #[test]
    fn test_left_associativity() {
        // a - b - c parses as (a - b) - c
        let expr = parse_expr_source("a - b - c\n");
        let (left, right) = assert_binary(&expr, BinOp::Sub);
        assert_binary(left, BinOp::Sub);
        assert!(matches!(right, Expr::Var(v) if v.name == "c"));
    }

    #[test]
    fn test_comparison_binds_tighter_than_equality() {
        // a == b < c parses as a == (b < c)
        let expr = parse_expr_source("a == b < c\n");
        let (_, right) = assert_binary(&expr, BinOp::Eq);
        assert_binary(right, BinOp::Lt);
    }

    #[test]
    fn test_unary_minus_binds_tighter_than_mul() {
        // -a * b parses as (-a) * b
        let expr = parse_expr_source("-a * b\n");
        let (left, _) = assert_binary(&expr, BinOp::Mul);
        assert!(matches!(left, Expr::Unary(u) if u.op == UnOp::Neg));
    }

    #[test]
    fn test_parens_override_precedence() {
        let expr = parse_expr_source("(a + b) * c\n");
        let (left, _) = assert_binary(&expr, BinOp::Mul);
        assert!(matches!(left, Expr::Paren(_)));
    }

    #[test]
    fn test_modulo_chain() {
        let expr = parse_expr_source("1 + 2 % 3\n");
        let (_, right) = assert_binary(&expr, BinOp::Add);
        assert_binary(right, BinOp::Mod);
    }

    #[test]
    fn test_call_with_nested_expr() {
        let expr = parse_expr_source("f(a + 1, g(b))\n");
        match expr {
            Expr::Call(c) => {
                assert_eq!(c.callee, "f");
                assert_eq!(c.args.len(), 2);
                assert!(matches!(&c.args[1], Expr::Call(inner) if inner.callee == "g"));
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn test_null_equality_parses() {
        let expr = parse_expr_source("x != null\n");
        let (_, right) = assert_binary(&expr, BinOp::Ne);
        assert!(matches!(right, Expr::Literal(l) if l.kind == LitKind::Null));
    }
}
