//! Search equation parsing for sift.
//!
//! Turns a free-text search equation into a tree of query nodes:
//!
//! - **Terms**: `rust`, juxtaposed terms are alternatives
//! - **Required / excluded**: `+rust -deprecated`
//! - **Operators**: `AND`/`ET`, `OR`/`OU`, `NOT`/`SAUF`/`BUT`
//! - **Proximity**: `a NEAR b`, `a ADJ b`
//! - **Phrases**: `"error handling"`
//! - **Wildcards**: `dev*`, `te?t`, and `*` for everything
//! - **Fields**: `title:guide`, `status=publish`
//! - **Grouping**: `(a b) AND c`
//!
//! Input is case- and accent-folded. Malformed equations never fail: the
//! parser drops or reinterprets what it cannot use.
//!
//! # Example
//!
//! ```
//! use sift_query::{Operator, optimize, parse};
//!
//! let tree = optimize(parse("title:\"hello world\" AND status:publish -archived"));
//! assert_eq!(tree.operator(), Operator::Not);
//! assert_eq!(tree.children()[1].to_query_string(), "archived");
//! ```

#![warn(missing_docs)]

mod ast;
mod error;
mod lexer;
mod normalize;
mod optimize;
mod parser;

pub use ast::{Node, NodeKind, Operator};
pub use error::{ArityError, LexError};
pub use lexer::{Lexer, LexerOptions, Token, TokenKind, dump_tokens, token_name, tokenize};
pub use optimize::optimize;
pub use parser::{ParserOptions, QueryParser, parse};
