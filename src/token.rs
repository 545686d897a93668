//! Tokens produced by the schema lexer.
use std::fmt;

use crate::error::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Ident,
    /// the `module` keyword
    Module,
    LBrace,
    RBrace,
    LParen,
    RParen,
    Pipe,
    Comma,
    Question,
    Star,
    LBracket,
    RBracket,
    Equals,
    Eof,
}

impl TokenKind {
    pub fn from_punct(c: char) -> Option<Self> {
        let kind = match c {
            '{' => Self::LBrace,
            '}' => Self::RBrace,
            '(' => Self::LParen,
            ')' => Self::RParen,
            '|' => Self::Pipe,
            ',' => Self::Comma,
            '?' => Self::Question,
            '*' => Self::Star,
            '[' => Self::LBracket,
            ']' => Self::RBracket,
            '=' => Self::Equals,
            _ => return None,
        };
        Some(kind)
    }

    /// Human-readable spelling for diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Ident => "identifier",
            Self::Module => "`module`",
            Self::LBrace => "`{`",
            Self::RBrace => "`}`",
            Self::LParen => "`(`",
            Self::RParen => "`)`",
            Self::Pipe => "`|`",
            Self::Comma => "`,`",
            Self::Question => "`?`",
            Self::Star => "`*`",
            Self::LBracket => "`[`",
            Self::RBracket => "`]`",
            Self::Equals => "`=`",
            Self::Eof => "end of input",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: u32,
    pub col: u32,
}

impl Token {
    pub fn position(&self) -> Position { Position::new(self.line, self.col) }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Ident => write!(f, "identifier `{}`", self.text),
            kind => f.write_str(kind.describe()),
        }
    }
}
