//! Error types for lexing and tree construction.
//!
//! Malformed user input never produces an error: the lexer and parser recover
//! locally. The errors here signal misuse of the API or a broken internal
//! invariant.

use thiserror::Error;

use crate::ast::Operator;

/// Errors raised by [`Lexer::read`](crate::Lexer::read).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// `read` was called before any input was supplied.
    #[error("lexer read before any input was supplied")]
    Uninitialized,

    /// A quoted phrase has no closing quote (strict mode only).
    #[error("unterminated phrase starting at byte {position}")]
    UnterminatedPhrase {
        /// Byte offset of the opening quote in the original input.
        position: usize,
    },
}

/// A composite node was built with fewer than two children.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operator} node needs at least 2 children, got {children}")]
pub struct ArityError {
    /// The operator of the rejected node.
    pub operator: Operator,
    /// Number of children supplied.
    pub children: usize,
}
