//! Type-expression parsing.
//!
//! TypeExpr <- (TYPENAME | IDENT) ('[' TypeExpr (',' TypeExpr)* ']')? '?'*
//!
//! Type names may be keywords (`Int`, `List`, ...) or plain identifiers
//! (nominal record names). The optional suffix `?` may stack, each
//! layer wrapping the type in another Optional.

use handc_lex::TokenKind;

use crate::ast::{TypeApp, TypeExpr, TypeName, TypeOptional};
use crate::Parser;

impl<'a> Parser<'a> {
    /// Parse a type expression; on malformed input records a diagnostic
    /// and returns `None`.
    pub(crate) fn parse_type_expr(&mut self) -> Option<TypeExpr> {
        let base = match self.kind() {
            TokenKind::Keyword | TokenKind::Ident => {
                let token = self.bump();
                TypeName {
                    name: token.lexeme,
                    span: token.span,
                }
            }
            _ => {
                self.error_and_advance("in type expression");
                return None;
            }
        };

        let mut ty = if self.check(TokenKind::LBrack) {
            self.advance();
            let mut args = Vec::new();
            if !self.check(TokenKind::RBrack) {
                loop {
                    args.push(self.parse_type_expr()?);
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
            }
            let end = self.span_here();
            self.expect(TokenKind::RBrack, "']' to close type arguments");
            let span = base.span.merge(&end);
            TypeExpr::App(TypeApp { base, args, span })
        } else {
            TypeExpr::Name(base)
        };

        while self.check(TokenKind::QMark) {
            let q = self.bump();
            let span = ty.span().merge(&q.span);
            ty = TypeExpr::Optional(Box::new(TypeOptional { inner: ty, span }));
        }

        Some(ty)
    }
}
