//! Error model shared by the lexer, parser and resolver.
//!
//! Everything is fail-fast: the first problem found is the one reported.
use std::fmt;

/// 1-based source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: u32,
    pub col: u32,
}

impl Position {
    pub fn new(line: u32, col: u32) -> Self { Self { line, col } }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// An unrecognized character in schema source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{line}:{col}: unexpected character {ch:?}")]
pub struct LexError {
    pub line: u32,
    pub col: u32,
    pub ch: char,
}

impl LexError {
    pub fn position(&self) -> Position { Position::new(self.line, self.col) }
}

/// A grammar violation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{position}: {message}")]
pub struct SyntaxError {
    pub message: String,
    pub position: Position,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, position: Position) -> Self {
        Self { message: message.into(), position }
    }
}

/// A resolution conflict found after a successful parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SemanticError {
    pub message: String,
    /// Fully-qualified names (or type names) involved in the conflict.
    pub conflicting_names: Vec<String>,
}

impl SemanticError {
    pub fn new<I, S>(message: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            message: message.into(),
            conflicting_names: names.into_iter().map(Into::into).collect(),
        }
    }
}

/// Rejected direct construction of an AST node.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AstError {
    #[error("`{0}` is not a valid identifier")]
    InvalidIdentifier(String),
    #[error("`{head}` takes {expected} type argument(s), got {found}")]
    Arity { head: String, expected: usize, found: usize },
}

/// Everything `parse` and `load_schema` can fail with.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read schema source: {0}")]
    Io(#[from] std::io::Error),
    #[error("lex error at {0}")]
    Lex(#[from] LexError),
    #[error("syntax error at {0}")]
    Syntax(#[from] SyntaxError),
    #[error("schema error: {0}")]
    Semantic(#[from] SemanticError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
