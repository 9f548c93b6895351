//! Hand-written scanner for selection expressions.
//!
//! Rules are tried in a fixed order at each position and always consume the
//! longest match, so `existsx` is a property and `<=` is never `<` then `=`.
//! Every character ends up in a token or in skipped whitespace; anything
//! unrecognised becomes a one-character `Invalid` token and scanning goes on.

use tracing::{debug, trace};

use crate::selector::token::{Position, Token, TokenKind};

#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    position: Position,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            position: Position::default(),
            finished: false,
        }
    }

    /// Current cursor position (after the last consumed character).
    pub fn position(&self) -> Position {
        self.position
    }

    /// Scans the next token. Once the input is exhausted this keeps returning `End`.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        let start = self.position;

        let Some(c) = self.peek() else {
            return Token::new(TokenKind::End, start);
        };

        let kind = if c.is_ascii_alphabetic() {
            self.identifier()
        } else if c.is_ascii_digit() || (c == '-' && self.peek_nth(1).is_some_and(|d| d.is_ascii_digit())) {
            self.integer()
        } else if c == '"' {
            self.string()
        } else {
            self.operator(c)
        };

        match &kind {
            TokenKind::Invalid(ch) => debug!(
                target: "floodgate::selector",
                position = %start,
                invalid = ?ch,
                "Unrecognised character"
            ),
            TokenKind::Overflow(text) => debug!(
                target: "floodgate::selector",
                position = %start,
                text = %text,
                "Integer literal out of range"
            ),
            other => trace!(target: "floodgate::selector", position = %start, token = %other),
        }

        Token::new(kind, start)
    }

    // ───────────────────────────────────────────────────────────
    // Rules
    // ───────────────────────────────────────────────────────────

    fn identifier(&mut self) -> TokenKind {
        let text = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
        match text {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "exists" => TokenKind::Exists(text.to_owned()),
            _ => TokenKind::Property(text.to_owned()),
        }
    }

    fn integer(&mut self) -> TokenKind {
        let begin = self.position.offset;
        if self.peek() == Some('-') {
            self.bump();
        }
        self.take_while(|c| c.is_ascii_digit());
        let text = &self.input[begin..self.position.offset];
        match text.parse::<i64>() {
            Ok(value) => TokenKind::Integer(value),
            Err(_) => TokenKind::Overflow(text.to_owned()),
        }
    }

    fn string(&mut self) -> TokenKind {
        // Find the closing quote first; a backslash shields the next character.
        let body_start = self.position.offset + 1;
        let body = &self.input[body_start..];
        let mut chars = body.char_indices();
        let mut close = None;
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    chars.next();
                }
                '"' => {
                    close = Some(body_start + i);
                    break;
                }
                _ => {}
            }
        }

        let Some(close) = close else {
            // Unterminated: only the quote itself is rejected.
            self.bump();
            return TokenKind::Invalid('"');
        };

        let value = self.input[body_start..close].to_owned();
        while self.position.offset <= close {
            self.bump();
        }
        TokenKind::StringLit(value)
    }

    fn operator(&mut self, c: char) -> TokenKind {
        self.bump();
        match c {
            '(' => TokenKind::LPar,
            ')' => TokenKind::RPar,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Times,
            '/' => TokenKind::Divides,
            '%' => TokenKind::Modulus,
            '~' => TokenKind::Not,
            '|' if self.eat('|') => TokenKind::Or,
            '&' if self.eat('&') => TokenKind::And,
            '=' if self.eat('=') => TokenKind::Eq,
            '!' if self.eat('=') => TokenKind::Ne,
            '!' => TokenKind::Not,
            '<' if self.eat('=') => TokenKind::Le,
            '<' => TokenKind::Lt,
            '>' if self.eat('=') => TokenKind::Ge,
            '>' => TokenKind::Gt,
            other => TokenKind::Invalid(other),
        }
    }

    // ───────────────────────────────────────────────────────────
    // Cursor
    // ───────────────────────────────────────────────────────────

    fn rest(&self) -> &'a str {
        &self.input[self.position.offset..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position.offset += c.len_utf8();
        if c == '\n' {
            self.position.line += 1;
            self.position.column = 1;
        } else {
            self.position.column += 1;
        }
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn take_while<P: Fn(char) -> bool>(&mut self, pred: P) -> &'a str {
        let begin = self.position.offset;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &self.input[begin..self.position.offset]
    }

    fn skip_whitespace(&mut self) {
        self.take_while(|c| matches!(c, ' ' | '\t' | '\n'));
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    /// Yields every token including a final `End`, then `None`.
    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::End {
            self.finished = true;
        }
        Some(token)
    }
}

/// Scans the whole input; the last token is always `End`.
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).collect()
}
