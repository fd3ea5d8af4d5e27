//! Backend query model.
//!
//! [`BackendQuery`] mirrors the operator tree of a Xapian-style engine. It
//! renders two ways: [`Display`](std::fmt::Display) gives the engine's own
//! description format, and [`BackendQuery::to_dsl`] gives an
//! Elasticsearch-like JSON query.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value, json};

/// Field name used in the DSL for the whole-document prefix.
const ALL_FIELDS: &str = "_all";

/// Backend combinators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BackendOp {
    /// All subqueries match.
    And,
    /// Any subquery matches.
    Or,
    /// The first subquery matches and none of the others.
    AndNot,
    /// The first subquery matches; the others add to the score.
    AndMaybe,
    /// Subqueries within a window, any order.
    Near,
    /// Subqueries within a window, in order.
    Phrase,
}

impl BackendOp {
    /// Returns the operator name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::AndNot => "AND_NOT",
            Self::AndMaybe => "AND_MAYBE",
            Self::Near => "NEAR",
            Self::Phrase => "PHRASE",
        }
    }

    /// Whether the operator carries a window.
    pub fn is_positional(self) -> bool {
        matches!(self, Self::Near | Self::Phrase)
    }
}

impl fmt::Display for BackendOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A query ready for the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendQuery {
    /// Every document.
    MatchAll,
    /// No document.
    MatchNothing,
    /// An indexed term.
    Term {
        /// Field prefix (`""` for the whole document).
        prefix: String,
        /// Term text.
        text: String,
    },
    /// A pattern the backend expands itself.
    Wildcard {
        /// Field prefix.
        prefix: String,
        /// `*`/`?` mask.
        pattern: String,
    },
    /// A combinator over subqueries.
    Op {
        /// The combinator.
        op: BackendOp,
        /// Operands, at least two.
        subqueries: Vec<BackendQuery>,
        /// Positional window: the span of positions the operands may occupy.
        /// Zero for non-positional operators.
        window: u32,
    },
}

impl BackendQuery {
    /// Creates a term query.
    pub fn term(prefix: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Term {
            prefix: prefix.into(),
            text: text.into(),
        }
    }

    /// Creates a backend-side wildcard.
    pub fn wildcard(prefix: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Wildcard {
            prefix: prefix.into(),
            pattern: pattern.into(),
        }
    }

    /// Combines subqueries, collapsing the degenerate cases.
    ///
    /// Zero subqueries give `None` and one is returned unchanged.
    pub fn combine(op: BackendOp, mut subqueries: Vec<Self>, window: u32) -> Option<Self> {
        match subqueries.len() {
            0 => None,
            1 => subqueries.pop(),
            _ => Some(Self::Op {
                op,
                subqueries,
                window,
            }),
        }
    }

    /// Renders the query as Elasticsearch-like query DSL.
    ///
    /// Prefixes become field names with the trailing `:` removed; the
    /// whole-document prefix becomes `_all`. Proximity `slop` is the window
    /// minus the number of operands.
    pub fn to_dsl(&self) -> Value {
        match self {
            Self::MatchAll => json!({ "match_all": {} }),
            Self::MatchNothing => json!({ "match_none": {} }),
            Self::Term { prefix, text } => json!({ "term": { dsl_field(prefix): text } }),
            Self::Wildcard { prefix, pattern } => {
                json!({ "wildcard": { dsl_field(prefix): pattern } })
            }
            Self::Op {
                op,
                subqueries,
                window,
            } => match op {
                BackendOp::And => bool_query(&[("must", subqueries.as_slice())]),
                BackendOp::Or => {
                    let mut query = bool_query(&[("should", subqueries.as_slice())]);
                    query["bool"]["minimum_should_match"] = json!(1);
                    query
                }
                BackendOp::AndNot => {
                    let (first, rest) = split_first(subqueries);
                    bool_query(&[("must", first), ("must_not", rest)])
                }
                BackendOp::AndMaybe => {
                    let (first, rest) = split_first(subqueries);
                    bool_query(&[("must", first), ("should", rest)])
                }
                BackendOp::Phrase => {
                    let slop = slop(*window, subqueries.len());
                    match phrase_terms(subqueries) {
                        Some((prefix, words)) => json!({
                            "match_phrase": {
                                dsl_field(prefix): { "query": words.join(" "), "slop": slop }
                            }
                        }),
                        None => span_near(subqueries, slop, true),
                    }
                }
                BackendOp::Near => span_near(subqueries, slop(*window, subqueries.len()), false),
            },
        }
    }

    /// Renders the query as a span clause for use inside `span_near`.
    fn to_span(&self) -> Value {
        match self {
            Self::Term { prefix, text } => json!({ "span_term": { dsl_field(prefix): text } }),
            Self::Wildcard { prefix, pattern } => json!({
                "span_multi": { "match": { "wildcard": { dsl_field(prefix): pattern } } }
            }),
            Self::Op {
                op: BackendOp::Or,
                subqueries,
                ..
            } => json!({
                "span_or": { "clauses": subqueries.iter().map(Self::to_span).collect::<Vec<_>>() }
            }),
            Self::Op {
                op: op @ (BackendOp::Near | BackendOp::Phrase),
                subqueries,
                window,
            } => span_near(
                subqueries,
                slop(*window, subqueries.len()),
                *op == BackendOp::Phrase,
            ),
            other => other.to_dsl(),
        }
    }

    /// Writes the engine description of the query, without the outer wrapper.
    fn describe(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MatchAll => f.write_str("<alldocuments>"),
            Self::MatchNothing => Ok(()),
            Self::Term { prefix, text } => write!(f, "{prefix}{text}"),
            Self::Wildcard { prefix, pattern } => write!(f, "WILDCARD {prefix}{pattern}"),
            Self::Op {
                op,
                subqueries,
                window,
            } => {
                let separator = if op.is_positional() {
                    format!(" {op} {window} ")
                } else {
                    format!(" {op} ")
                };
                f.write_str("(")?;
                for (index, subquery) in subqueries.iter().enumerate() {
                    if index > 0 {
                        f.write_str(&separator)?;
                    }
                    subquery.describe(f)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl fmt::Display for BackendQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Query(")?;
        self.describe(f)?;
        f.write_str(")")
    }
}

/// DSL field name for a prefix.
fn dsl_field(prefix: &str) -> String {
    match prefix.strip_suffix(':').unwrap_or(prefix) {
        "" => ALL_FIELDS.to_string(),
        field => field.to_string(),
    }
}

/// Builds a `bool` query from occurrence clauses, skipping empty ones.
fn bool_query(clauses: &[(&str, &[BackendQuery])]) -> Value {
    let mut body = Map::new();
    for (occur, queries) in clauses {
        if !queries.is_empty() {
            let rendered: Vec<Value> = queries.iter().map(BackendQuery::to_dsl).collect();
            body.insert((*occur).to_string(), Value::Array(rendered));
        }
    }
    json!({ "bool": body })
}

/// Splits off the first subquery.
fn split_first(subqueries: &[BackendQuery]) -> (&[BackendQuery], &[BackendQuery]) {
    subqueries.split_at(subqueries.len().min(1))
}

/// Number of extra positions a window allows over `operands`.
fn slop(window: u32, operands: usize) -> u32 {
    window.saturating_sub(u32::try_from(operands).unwrap_or(u32::MAX))
}

/// Returns the common prefix and words when every operand is a term on the
/// same prefix.
fn phrase_terms(subqueries: &[BackendQuery]) -> Option<(&str, Vec<&str>)> {
    let mut prefix = None;
    let mut words = Vec::with_capacity(subqueries.len());
    for subquery in subqueries {
        let BackendQuery::Term { prefix: p, text } = subquery else {
            return None;
        };
        if prefix.is_some_and(|seen| seen != p.as_str()) {
            return None;
        }
        prefix = Some(p.as_str());
        words.push(text.as_str());
    }
    prefix.map(|prefix| (prefix, words))
}

/// Builds a `span_near` query.
fn span_near(subqueries: &[BackendQuery], slop: u32, in_order: bool) -> Value {
    let clauses: Vec<Value> = subqueries.iter().map(BackendQuery::to_span).collect();
    json!({ "span_near": { "clauses": clauses, "slop": slop, "in_order": in_order } })
}
