//! Pull-based lexer over schema source.
//!
//! Whitespace and line comments (`#` or `--` to end of line) are skipped.
//! The stream ends with exactly one `Eof` token; after an error nothing more
//! is produced.
use crate::error::LexError;
use crate::token::{Token, TokenKind};

#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    src: &'a str,
    offset: usize,
    line: u32,
    col: u32,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, offset: 0, line: 1, col: 1, done: false }
    }

    /// Rewind to the first token of the source.
    pub fn restart(&mut self) {
        *self = Self::new(self.src);
    }

    fn peek(&self) -> Option<char> {
        self.src[self.offset..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.src[self.offset..].chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => { self.bump(); }
                Some('#') => self.skip_line(),
                Some('-') if self.peek_second() == Some('-') => self.skip_line(),
                _ => return,
            }
        }
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' { return }
            self.bump();
        }
    }

    fn scan(&mut self) -> Result<Token, LexError> {
        self.skip_trivia();
        let (line, col, start) = (self.line, self.col, self.offset);
        let token = |kind, text: &str| Token { kind, text: text.to_string(), line, col };

        let Some(c) = self.bump() else {
            return Ok(token(TokenKind::Eof, ""));
        };
        if let Some(kind) = TokenKind::from_punct(c) {
            return Ok(token(kind, &self.src[start..self.offset]));
        }
        if c.is_ascii_alphabetic() || c == '_' {
            while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
                self.bump();
            }
            let text = &self.src[start..self.offset];
            let kind = if text == "module" { TokenKind::Module } else { TokenKind::Ident };
            return Ok(token(kind, text));
        }
        Err(LexError { line, col, ch: c })
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.scan();
        match &item {
            Ok(tok) if tok.kind == TokenKind::Eof => self.done = true,
            Err(_) => self.done = true,
            Ok(_) => {}
        }
        Some(item)
    }
}

/// Lex the whole source eagerly; the last token is always `Eof`.
pub fn tokenize(src: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(src).collect()
}
