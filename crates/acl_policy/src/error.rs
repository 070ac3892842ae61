//! Error types for lexing and parsing.

use thiserror::Error;

/// Errors produced while lexing or parsing source files.
#[derive(Debug, Error)]
pub enum Error {
    /// Input contained a character no token class accepts.
    #[error("lex error at line {line}, column {column}: {reason}")]
    Lex {
        /// 1-based source line.
        line: usize,
        /// 1-based source column.
        column: usize,
        /// What the lexer saw.
        reason: String,
    },

    /// Token stream did not match the grammar.
    #[error("parse error at line {line}: {reason}")]
    Parse {
        /// 1-based source line.
        line: usize,
        /// What the parser expected and found.
        reason: String,
    },

    /// An `expire` clause carried a token that is not a calendar date.
    #[error("invalid expire date `{value}` at line {line}")]
    InvalidDate {
        /// 1-based source line.
        line: usize,
        /// The offending token text.
        value: String,
    },

    /// A rule option appeared more than once.
    #[error("duplicate `{option}` option at line {line}")]
    DuplicateOption {
        /// 1-based source line.
        line: usize,
        /// The repeated option keyword.
        option: String,
    },
}

/// Result type alias for parsing operations.
pub type Result<T> = std::result::Result<T, Error>;
