//! Error types shared across the crate.
//!
//! Interpreter-level problems (bad quoting, unresolved placeholders, missing
//! labels, unknown verbs) are never errors: they are recovered in place and
//! reported as diagnostics.  Only the operations below return `Err`.

use std::path::PathBuf;

use thiserror::Error;

/// What went wrong while parsing a JSON document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonErrorKind {
    UnexpectedEnd,
    UnexpectedChar,
    InvalidNumber,
    InvalidEscape,
    ControlCharacter,
    TrailingCharacters,
    TooDeep,
}

impl std::fmt::Display for JsonErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JsonErrorKind::UnexpectedEnd => "unexpected end of input",
            JsonErrorKind::UnexpectedChar => "unexpected character",
            JsonErrorKind::InvalidNumber => "invalid number",
            JsonErrorKind::InvalidEscape => "invalid escape sequence",
            JsonErrorKind::ControlCharacter => "control character in string",
            JsonErrorKind::TrailingCharacters => "trailing characters after document",
            JsonErrorKind::TooDeep => "nesting too deep",
        };
        f.write_str(s)
    }
}

/// A JSON syntax error at a byte offset into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind} at offset {offset}")]
pub struct JsonError {
    pub offset: usize,
    pub kind: JsonErrorKind,
}

impl JsonError {
    pub(crate) fn new(offset: usize, kind: JsonErrorKind) -> Self {
        Self { offset, kind }
    }
}

/// Failure to obtain a script's source lines.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no such script: {0}")]
    NotFound(String),
    #[error("no script loader installed")]
    NoLoader,
}

/// A non-fatal error encountered while loading a config file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}
