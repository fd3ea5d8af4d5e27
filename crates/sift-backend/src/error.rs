//! Error types for query compilation.

use thiserror::Error;

/// Errors raised while compiling a query tree.
#[derive(Debug, Error)]
pub enum CompileError {
    /// A clause names a field the field map does not know.
    #[error("unknown field: {field}")]
    UnknownField {
        /// The field as written in the equation.
        field: String,
    },

    /// The term dictionary could not expand a wildcard.
    #[error("cannot expand wildcard {pattern:?}")]
    Expansion {
        /// The wildcard mask.
        pattern: String,
        /// Underlying dictionary error.
        #[source]
        source: DictionaryError,
    },
}

/// Errors raised by a [`TermDictionary`](crate::TermDictionary).
#[derive(Debug, Error)]
pub enum DictionaryError {
    /// The mask is not a valid pattern.
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] globset::Error),

    /// The backend failed to answer.
    #[error("dictionary lookup failed: {0}")]
    Lookup(String),
}
