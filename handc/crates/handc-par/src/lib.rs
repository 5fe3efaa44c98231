//! handc-par - Layout-sensitive recursive-descent parser for HAND.
//!
//! The parser consumes the lexer's token stream (including the layout
//! tokens) and produces a best-effort AST plus diagnostics. It never
//! aborts: every parse error records the offending token's span and
//! advances by exactly one token, so a broken region costs at most its
//! own tokens.
//!
//! Grammar (layout-sensitive, PEG-flavored):
//!
//! ```text
//! Program   <- (Section | Stmt NEWLINE)* EOF
//! Section   <- EMOJI HeaderToks (':' NEWLINE INDENT Block DEDENT)? NEWLINE
//! Stmt      <- FuncDef | If | While | Return | Show | Verify | Assign | ExprStmt
//! FuncDef   <- ('🔧'|'🛠') IDENT? IDENT '(' ParamList? ')' ('->' TypeExpr)? ':' NL Block
//! If        <- 'if' Expr ':' NL Block ('else' ':' NL Block)?
//! While     <- 'while' Expr ':' NL Block
//! Verify    <- ('🔍' | 'verify') Expr
//! Assign    <- IDENT (':' TypeExpr)? '=' Expr
//! ```
//!
//! Function marker emojis accept an optional label word between the
//! marker and the function name (`🔧 FUNCIÓN add(...)`); the label is
//! dropped, which keeps the formatter canonical.

pub mod ast;
mod expr;
pub mod format;
mod types;

#[cfg(test)]
mod edge_cases;

pub use ast::*;
pub use format::format_program;

use handc_lex::{Token, TokenKind};
use handc_util::{Diagnostic, DiagnosticCode, Handler, Span};

/// Emoji markers introducing a function definition.
const FUNC_MARKERS: &[&str] = &["🔧", "🛠"];

/// Emoji marker introducing a verify statement.
const VERIFY_MARKER: &str = "🔍";

/// Parse a token stream into a program plus diagnostics.
pub fn parse(tokens: &[Token], file: &str) -> (Program, Vec<Diagnostic>) {
    // The lexer always terminates its stream with EOF; a synthetic one
    // keeps the parser total for callers that bypass it.
    let eof = [Token::new(TokenKind::Eof, "", Span::point(file, 1, 1))];
    let tokens = if tokens.is_empty() { &eof[..] } else { tokens };
    let handler = Handler::new();
    let program = Parser::new(tokens, &handler).parse_program();
    (program, handler.take())
}

/// Strip emoji variation selectors so `🛠` and `🛠️` compare equal.
fn base_emoji(lexeme: &str) -> String {
    lexeme
        .chars()
        .filter(|&c| c != handc_lex::emoji::VS15 && c != handc_lex::emoji::VS16)
        .collect()
}

pub(crate) struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    handler: &'a Handler,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], handler: &'a Handler) -> Self {
        Self {
            tokens,
            pos: 0,
            handler,
        }
    }

    // ------------------------------------------------------------------
    // Token stream helpers
    // ------------------------------------------------------------------

    pub(crate) fn current(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .unwrap_or_else(|| self.tokens.last().expect("token stream ends in EOF"))
    }

    pub(crate) fn kind(&self) -> TokenKind {
        self.current().kind
    }

    fn peek_kind(&self, offset: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| t.kind)
    }

    pub(crate) fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    pub(crate) fn bump(&mut self) -> Token {
        let token = self.current().clone();
        self.advance();
        token
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    fn check_keyword(&self, word: &str) -> bool {
        self.kind() == TokenKind::Keyword && self.current().lexeme == word
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a token of `kind` or record `HND-PARSE-0002` and leave
    /// the cursor in place.
    pub(crate) fn expect(&mut self, kind: TokenKind, what: &str) -> Option<Token> {
        if self.check(kind) {
            Some(self.bump())
        } else {
            let token = self.current();
            self.handler.emit(Diagnostic::error(
                DiagnosticCode::PARSE_EXPECTED_TOKEN,
                format!("Expected {what}, found {}.", describe(token)),
                token.span.clone(),
            ));
            None
        }
    }

    /// Record `HND-PARSE-0001` at the current token and skip it.
    pub(crate) fn error_and_advance(&mut self, context: &str) {
        let token = self.current();
        self.handler.emit(Diagnostic::error(
            DiagnosticCode::PARSE_UNEXPECTED_TOKEN,
            format!("Unexpected {} {context}.", describe(token)),
            token.span.clone(),
        ));
        self.advance();
    }

    fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    pub(crate) fn span_here(&self) -> Span {
        self.current().span.clone()
    }

    // ------------------------------------------------------------------
    // Program structure
    // ------------------------------------------------------------------

    fn parse_program(&mut self) -> Program {
        let mut items = Vec::new();
        loop {
            self.skip_newlines();
            match self.kind() {
                TokenKind::Eof => break,
                // Stray layout tokens can survive lexer error recovery.
                TokenKind::Indent | TokenKind::Dedent => {
                    self.error_and_advance("at top level");
                }
                TokenKind::Emoji => {
                    let base = base_emoji(&self.current().lexeme);
                    if FUNC_MARKERS.contains(&base.as_str()) || base == VERIFY_MARKER {
                        if let Some(stmt) = self.parse_stmt() {
                            items.push(Item::Stmt(stmt));
                        }
                    } else {
                        items.push(Item::Section(self.parse_section()));
                    }
                }
                _ => {
                    if let Some(stmt) = self.parse_stmt() {
                        items.push(Item::Stmt(stmt));
                    }
                }
            }
        }
        Program { items }
    }

    fn parse_section(&mut self) -> Section {
        let emoji_tok = self.bump();
        let start = emoji_tok.span.clone();
        let mut header_parts: Vec<String> = Vec::new();
        while !matches!(
            self.kind(),
            TokenKind::Colon | TokenKind::Newline | TokenKind::Eof
        ) {
            header_parts.push(self.bump().lexeme);
        }
        let has_colon = self.eat(TokenKind::Colon);
        if !self.check(TokenKind::Eof) {
            self.expect(TokenKind::Newline, "end of section header");
        }
        self.skip_newlines_before_indent();
        let body = if self.check(TokenKind::Indent) {
            Some(self.parse_block())
        } else {
            None
        };
        Section {
            emoji: emoji_tok.lexeme,
            header: header_parts.join(" "),
            has_colon,
            body,
            span: start,
        }
    }

    /// Skip blank lines, but only when an indented block follows them.
    fn skip_newlines_before_indent(&mut self) {
        let mut ahead = 0;
        while self.peek_kind(ahead) == Some(TokenKind::Newline) {
            ahead += 1;
        }
        if self.peek_kind(ahead) == Some(TokenKind::Indent) {
            for _ in 0..ahead {
                self.advance();
            }
        }
    }

    /// Parse an indented block: INDENT (Stmt NEWLINE)* DEDENT.
    /// Blank lines between the header and the block are tolerated.
    fn parse_block(&mut self) -> Vec<Stmt> {
        let mut body = Vec::new();
        self.skip_newlines_before_indent();
        if !self.eat(TokenKind::Indent) {
            self.handler.emit(Diagnostic::error(
                DiagnosticCode::PARSE_EXPECTED_TOKEN,
                "Expected an indented block.".to_string(),
                self.span_here(),
            ));
            return body;
        }
        loop {
            self.skip_newlines();
            match self.kind() {
                TokenKind::Dedent => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => break,
                _ => {
                    if let Some(stmt) = self.parse_stmt() {
                        body.push(stmt);
                    }
                }
            }
        }
        body
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn parse_stmt(&mut self) -> Option<Stmt> {
        match self.kind() {
            TokenKind::Keyword => match self.current().lexeme.as_str() {
                "if" => self.parse_if().map(Stmt::If),
                "while" => self.parse_while().map(Stmt::While),
                "return" => Some(Stmt::Return(self.parse_return())),
                "show" => self.parse_show().map(Stmt::Show),
                _ => self.parse_expr_stmt(),
            },
            TokenKind::Emoji => {
                let base = base_emoji(&self.current().lexeme);
                if FUNC_MARKERS.contains(&base.as_str()) {
                    self.parse_func_def().map(Stmt::FuncDef)
                } else if base == VERIFY_MARKER {
                    self.parse_verify().map(Stmt::Verify)
                } else {
                    self.parse_expr_stmt()
                }
            }
            TokenKind::Ident => {
                let next = self.peek_kind(1);
                if self.current().lexeme == "verify"
                    && !matches!(next, Some(TokenKind::Eq) | Some(TokenKind::Colon))
                {
                    self.parse_verify().map(Stmt::Verify)
                } else if matches!(next, Some(TokenKind::Eq) | Some(TokenKind::Colon)) {
                    self.parse_assign().map(Stmt::Assign)
                } else {
                    self.parse_expr_stmt()
                }
            }
            _ => self.parse_expr_stmt(),
        }
    }

    fn parse_if(&mut self) -> Option<IfStmt> {
        let start = self.bump().span;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::Colon, "':' after if condition");
        self.expect(TokenKind::Newline, "newline after ':'");
        let then_body = self.parse_block();
        let else_body = if self.check_keyword("else") {
            self.advance();
            self.expect(TokenKind::Colon, "':' after else");
            self.expect(TokenKind::Newline, "newline after ':'");
            Some(self.parse_block())
        } else {
            None
        };
        Some(IfStmt {
            cond,
            then_body,
            else_body,
            span: start,
        })
    }

    fn parse_while(&mut self) -> Option<WhileStmt> {
        let start = self.bump().span;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::Colon, "':' after while condition");
        self.expect(TokenKind::Newline, "newline after ':'");
        let body = self.parse_block();
        Some(WhileStmt {
            cond,
            body,
            span: start,
        })
    }

    fn parse_return(&mut self) -> ReturnStmt {
        let start = self.bump().span;
        let value = if matches!(
            self.kind(),
            TokenKind::Newline | TokenKind::Dedent | TokenKind::Eof
        ) {
            None
        } else {
            self.parse_expr()
        };
        ReturnStmt { value, span: start }
    }

    fn parse_show(&mut self) -> Option<ShowStmt> {
        let start = self.bump().span;
        let value = self.parse_expr()?;
        Some(ShowStmt { value, span: start })
    }

    fn parse_verify(&mut self) -> Option<VerifyStmt> {
        let start = self.bump().span;
        let expr = self.parse_expr()?;
        Some(VerifyStmt { expr, span: start })
    }

    fn parse_assign(&mut self) -> Option<AssignStmt> {
        let name_tok = self.bump();
        let declared_type = if self.eat(TokenKind::Colon) {
            self.parse_type_expr()
        } else {
            None
        };
        self.expect(TokenKind::Eq, "'=' in assignment")?;
        let value = self.parse_expr()?;
        Some(AssignStmt {
            name: name_tok.lexeme,
            declared_type,
            value,
            span: name_tok.span,
        })
    }

    fn parse_expr_stmt(&mut self) -> Option<Stmt> {
        let start = self.span_here();
        let expr = self.parse_expr()?;
        Some(Stmt::Expr(ExprStmt { expr, span: start }))
    }

    fn parse_func_def(&mut self) -> Option<FuncDef> {
        let marker = self.bump();
        let start = marker.span;
        let first = self.expect(TokenKind::Ident, "function name")?;
        // An optional label word may precede the real name.
        let name = if self.check(TokenKind::Ident) {
            self.bump().lexeme
        } else {
            first.lexeme
        };
        self.expect(TokenKind::LParen, "'(' after function name")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let Some(pname) = self.expect(TokenKind::Ident, "parameter name") else {
                    break;
                };
                let ty = if self.eat(TokenKind::Colon) {
                    self.parse_type_expr()
                } else {
                    None
                };
                params.push(Param {
                    name: pname.lexeme,
                    ty,
                    span: pname.span,
                });
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')' after parameters");
        let return_type = if self.kind() == TokenKind::Op && self.current().lexeme == "->" {
            self.advance();
            self.parse_type_expr()
        } else {
            None
        };
        self.expect(TokenKind::Colon, "':' after function signature");
        self.expect(TokenKind::Newline, "newline after ':'");
        let body = self.parse_block();
        Some(FuncDef {
            name,
            params,
            return_type,
            body,
            span: start,
        })
    }
}

/// Short human description of a token for error messages.
fn describe(token: &Token) -> String {
    match token.kind {
        TokenKind::Newline => "end of line".to_string(),
        TokenKind::Indent => "indent".to_string(),
        TokenKind::Dedent => "dedent".to_string(),
        TokenKind::Eof => "end of file".to_string(),
        _ => format!("'{}'", token.lexeme),
    }
}
