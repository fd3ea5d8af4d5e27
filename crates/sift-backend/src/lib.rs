//! Backend query compilation for sift.
//!
//! Lowers the query trees produced by `sift-query` into the operator tree of
//! a Xapian-style search engine:
//!
//! - field names resolve to one or more index prefixes through a [`FieldMap`]
//! - positional operators are compiled once per prefix and OR'd
//! - wildcards expand through a [`TermDictionary`], or pass through as
//!   backend wildcards when none is given
//!
//! The result renders as the engine's query description or as an
//! Elasticsearch-like JSON query.
//!
//! # Example
//!
//! ```
//! use sift_backend::{CompilerOptions, FieldMap, QueryCompiler};
//! use sift_query::{optimize, parse};
//!
//! let fields = FieldMap::new().with("title", ["title:"]);
//! let compiler = QueryCompiler::new(fields, CompilerOptions::default());
//! let query = compiler.compile(&optimize(parse("title:rust -draft"))).unwrap();
//! assert_eq!(query.to_string(), "Query((title:rust AND_NOT draft))");
//! ```

#![warn(missing_docs)]

mod compile;
mod dictionary;
mod error;
mod fields;
mod query;

pub use compile::{CompilerOptions, QueryCompiler, UnknownFieldPolicy};
pub use dictionary::{MemoryDictionary, TermDictionary};
pub use error::{CompileError, DictionaryError};
pub use fields::FieldMap;
pub use query::{BackendOp, BackendQuery};
