//! The HAND layout lexer.
//!
//! Works line by line: each physical line contributes its value tokens
//! followed by a NEWLINE; indentation changes emit INDENT/DEDENT before
//! the line's first value token. Columns count characters within the
//! line, 1-based, with exclusive end columns.

use handc_util::{Diagnostic, DiagnosticCode, Handler, Span};

use crate::emoji;
use crate::token::{is_keyword, Token, TokenKind};

/// Two-character operators, matched before the one-character set.
const TWO_CHAR_OPS: &[&str] = &["==", "!=", ">=", "<=", "->"];

/// One-character operators.
const ONE_CHAR_OPS: &[char] = &['<', '>', '+', '-', '*', '/', '%'];

/// Lex UTF-8 source text into a token stream plus diagnostics.
///
/// Errors are recorded but never stop the lexer: the returned stream is
/// always complete up to EOF, with the offending characters skipped.
pub fn lex(source: &str, file: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    let handler = Handler::new();
    let tokens = Lexer::new(source, file, &handler).run();
    (tokens, handler.take())
}

/// Lex raw bytes, reporting invalid UTF-8 (including surrogate
/// encodings) as `HND-LEX-0003` and continuing with a lossy decode.
pub fn lex_bytes(source: &[u8], file: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    match std::str::from_utf8(source) {
        Ok(text) => lex(text, file),
        Err(err) => {
            let handler = Handler::new();
            handler.emit(
                Diagnostic::error(
                    DiagnosticCode::LEX_INVALID_UNICODE,
                    format!(
                        "Invalid UTF-8 in source (byte offset {}).",
                        err.valid_up_to()
                    ),
                    Span::point(file, 1, 1),
                )
                .with_hint("Ensure the file is valid UTF-8 text."),
            );
            let text = String::from_utf8_lossy(source).into_owned();
            let tokens = Lexer::new(&text, file, &handler).run();
            (tokens, handler.take())
        }
    }
}

struct Lexer<'a> {
    lines: Vec<Vec<char>>,
    file: &'a str,
    handler: &'a Handler,
    tokens: Vec<Token>,
    indent_stack: Vec<usize>,
}

impl<'a> Lexer<'a> {
    fn new(source: &str, file: &'a str, handler: &'a Handler) -> Self {
        let text = source.replace("\r\n", "\n").replace('\r', "\n");
        // A trailing newline must not produce a spurious empty last line.
        let body = text.strip_suffix('\n').unwrap_or(&text);
        let lines = body.split('\n').map(|l| l.chars().collect()).collect();
        Self {
            lines,
            file,
            handler,
            tokens: Vec::new(),
            indent_stack: vec![0],
        }
    }

    fn run(mut self) -> Vec<Token> {
        for li in 0..self.lines.len() {
            self.lex_line(li);
        }
        let last_line = self.lines.len() as u32;
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.push(TokenKind::Dedent, "", last_line, 1, 1);
        }
        self.push(TokenKind::Eof, "", last_line + 1, 1, 1);
        self.tokens
    }

    fn push(&mut self, kind: TokenKind, lexeme: &str, line: u32, col: u32, end_col: u32) {
        self.tokens.push(Token::new(
            kind,
            lexeme,
            Span::new(self.file, line, col, end_col),
        ));
    }

    fn error(&self, code: DiagnosticCode, line: u32, col: u32, message: String, hint: &str) {
        self.handler.emit(
            Diagnostic::error(code, message, Span::point(self.file, line, col)).with_hint(hint),
        );
    }

    fn lex_line(&mut self, index: usize) {
        let line: Vec<char> = self.lines[index].clone();
        let li = (index + 1) as u32;

        if let Some(pos) = line.iter().position(|&c| c == '\t') {
            self.error(
                DiagnosticCode::LEX_TAB,
                li,
                pos as u32 + 1,
                "Tabs are forbidden. Use spaces only.".to_string(),
                "Replace tabs with 4 spaces per indent level.",
            );
        }

        if line.iter().all(|c| c.is_whitespace()) {
            self.push(TokenKind::Newline, "\n", li, 1, 1);
            return;
        }

        let indent = line.iter().take_while(|&&c| c == ' ').count();
        self.handle_indent(li, indent);

        let mut i = indent;
        let mut col = (indent + 1) as u32;

        while i < line.len() {
            let ch = line[i];

            if ch == ' ' {
                i += 1;
                col += 1;
                continue;
            }

            if emoji::is_emoji_start(ch) {
                let mut j = i + 1;
                while j < line.len() && !line[j].is_ascii() && emoji::is_emoji_continue(line[j]) {
                    j += 1;
                }
                let lexeme: String = line[i..j].iter().collect();
                let width = (j - i) as u32;
                self.push(TokenKind::Emoji, &lexeme, li, col, col + width);
                col += width;
                i = j;
                continue;
            }

            if ch == '"' {
                if let Some(end) = scan_string(&line, i) {
                    let lexeme: String = line[i..end].iter().collect();
                    let width = (end - i) as u32;
                    self.push(TokenKind::String, &lexeme, li, col, col + width);
                    i = end;
                    col = (i + 1) as u32;
                    continue;
                }
                // Unterminated string: fall through as an unexpected
                // character so lexing continues on this line.
            }

            if emoji::is_ascii_ident_start(ch) {
                let mut j = i + 1;
                while j < line.len() && emoji::is_ident_continue(line[j]) {
                    j += 1;
                }
                let lexeme: String = line[i..j].iter().collect();
                let kind = if is_keyword(&lexeme) {
                    TokenKind::Keyword
                } else {
                    TokenKind::Ident
                };
                let width = (j - i) as u32;
                self.push(kind, &lexeme, li, col, col + width);
                i = j;
                col = (i + 1) as u32;
                continue;
            }

            if ch.is_ascii_digit() {
                let end = scan_number(&line, i);
                let lexeme: String = line[i..end].iter().collect();
                let width = (end - i) as u32;
                self.push(TokenKind::Number, &lexeme, li, col, col + width);
                i = end;
                col = (i + 1) as u32;
                continue;
            }

            if i + 1 < line.len() {
                let pair: String = line[i..i + 2].iter().collect();
                if TWO_CHAR_OPS.contains(&pair.as_str()) {
                    self.push(TokenKind::Op, &pair, li, col, col + 2);
                    i += 2;
                    col += 2;
                    continue;
                }
            }

            if ONE_CHAR_OPS.contains(&ch) {
                self.push(TokenKind::Op, &ch.to_string(), li, col, col + 1);
                i += 1;
                col += 1;
                continue;
            }

            if let Some(kind) = punct_kind(ch) {
                self.push(kind, &ch.to_string(), li, col, col + 1);
                i += 1;
                col += 1;
                continue;
            }

            if !ch.is_ascii() {
                self.error(
                    DiagnosticCode::LEX_NON_ASCII,
                    li,
                    col,
                    format!("Non-ASCII character '{ch}' is not allowed here in HAND Core v0.1."),
                    "Move it into a string literal, use an identifier, or replace it.",
                );
                i += 1;
                col += 1;
                continue;
            }

            self.error(
                DiagnosticCode::LEX_UNEXPECTED_CHAR,
                li,
                col,
                format!("Unexpected character '{ch}'."),
                "Remove or replace the character.",
            );
            i += 1;
            col += 1;
        }

        let end = (line.len() + 1) as u32;
        self.push(TokenKind::Newline, "\n", li, end, end);
    }

    fn handle_indent(&mut self, li: u32, indent: usize) {
        if indent % 4 != 0 {
            self.error(
                DiagnosticCode::INDENT_NOT_MULTIPLE,
                li,
                1,
                "Indentation must be a multiple of 4 spaces.".to_string(),
                "Use 4 spaces per indent level.",
            );
        }

        let current = *self.indent_stack.last().unwrap_or(&0);
        if indent > current {
            if indent - current != 4 {
                self.error(
                    DiagnosticCode::INDENT_JUMP,
                    li,
                    1,
                    format!("Indentation jump too large: {current} -> {indent}."),
                    "Increase indentation by exactly 4 spaces.",
                );
            }
            self.indent_stack.push(indent);
            self.push(TokenKind::Indent, "", li, 1, 1);
        } else if indent < current {
            while self
                .indent_stack
                .last()
                .is_some_and(|&top| indent < top)
            {
                self.indent_stack.pop();
                self.push(TokenKind::Dedent, "", li, 1, 1);
            }
            if self.indent_stack.last() != Some(&indent) {
                self.error(
                    DiagnosticCode::INDENT_UNKNOWN_LEVEL,
                    li,
                    1,
                    format!("Dedent does not match any previous indentation level: got {indent}."),
                    "Match a previous indentation level (multiples of 4).",
                );
            }
        }
    }
}

/// Scan a double-quoted string starting at `start`. Returns the index
/// one past the closing quote, or `None` if the string does not close
/// on this line.
fn scan_string(line: &[char], start: usize) -> Option<usize> {
    debug_assert_eq!(line[start], '"');
    let mut j = start + 1;
    while j < line.len() {
        match line[j] {
            '\\' if j + 1 < line.len() => j += 2,
            '\\' => return None,
            '"' => return Some(j + 1),
            _ => j += 1,
        }
    }
    None
}

/// Scan a number starting at `start`: digits with at most one decimal
/// point, and only when the point is followed by another digit.
fn scan_number(line: &[char], start: usize) -> usize {
    let mut j = start;
    while j < line.len() && line[j].is_ascii_digit() {
        j += 1;
    }
    if j < line.len() && line[j] == '.' && j + 1 < line.len() && line[j + 1].is_ascii_digit() {
        j += 1;
        while j < line.len() && line[j].is_ascii_digit() {
            j += 1;
        }
    }
    j
}

fn punct_kind(ch: char) -> Option<TokenKind> {
    match ch {
        ':' => Some(TokenKind::Colon),
        ',' => Some(TokenKind::Comma),
        '(' => Some(TokenKind::LParen),
        ')' => Some(TokenKind::RParen),
        '[' => Some(TokenKind::LBrack),
        ']' => Some(TokenKind::RBrack),
        '?' => Some(TokenKind::QMark),
        '=' => Some(TokenKind::Eq),
        _ => None,
    }
}
