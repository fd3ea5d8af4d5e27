//! Query tree.
//!
//! A parsed equation is a strict tree of [`Node`]s. Composite nodes always
//! carry at least two children; the only way to build one is through the
//! checked constructors on [`Node`], so every tree in circulation satisfies
//! that invariant.

use std::fmt;

use serde::Serialize;

use crate::{error::ArityError, lexer};

/// The logical operator of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    /// A literal term.
    Term,
    /// A `*`/`?` pattern.
    Wildcard,
    /// Matches every document.
    MatchAll,
    /// Matches no document.
    MatchNothing,
    /// All children must match.
    And,
    /// At least one child must match.
    Or,
    /// The first child must match and none of the others.
    Not,
    /// The first child must match; the others only add to the score.
    AndMaybe,
    /// Children within a window, any order.
    Near,
    /// Children within a window, in order.
    Phrase,
}

impl Operator {
    /// Returns the upper-case operator name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Term => "TERM",
            Self::Wildcard => "WILDCARD",
            Self::MatchAll => "MATCH_ALL",
            Self::MatchNothing => "MATCH_NOTHING",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
            Self::AndMaybe => "AND_MAYBE",
            Self::Near => "NEAR",
            Self::Phrase => "PHRASE",
        }
    }

    /// Whether nodes of this operator have children.
    pub fn is_composite(self) -> bool {
        !matches!(
            self,
            Self::Term | Self::Wildcard | Self::MatchAll | Self::MatchNothing
        )
    }

    /// Whether this operator matches on term positions.
    pub fn is_positional(self) -> bool {
        matches!(self, Self::Near | Self::Phrase)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The operator-specific payload of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// A single word.
    Term {
        /// The normalized word.
        text: String,
    },
    /// A pattern containing `*` or `?`.
    Wildcard {
        /// The pattern.
        mask: String,
    },
    /// Every document.
    MatchAll,
    /// No document.
    MatchNothing,
    /// Conjunction.
    And {
        /// Operands.
        children: Vec<Node>,
    },
    /// Disjunction.
    Or {
        /// Operands.
        children: Vec<Node>,
    },
    /// First child minus the union of the others.
    Not {
        /// Positive clause followed by excluded clauses.
        children: Vec<Node>,
    },
    /// Required first child, optional score-boosting others.
    AndMaybe {
        /// Required clause followed by optional clauses.
        children: Vec<Node>,
    },
    /// Unordered proximity.
    Near {
        /// Operands.
        children: Vec<Node>,
        /// Maximum number of intervening words.
        gap: u32,
    },
    /// Ordered proximity.
    Phrase {
        /// Operands, in order.
        children: Vec<Node>,
        /// Maximum number of intervening words.
        gap: u32,
    },
}

/// A query tree node with its optional field scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    /// Operator and operands.
    #[serde(flatten)]
    kind: NodeKind,
    /// Field the clause is restricted to (`None` = inherited / all fields).
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

impl Node {
    /// Wraps a leaf or already-validated payload.
    fn leaf(kind: NodeKind) -> Self {
        Self { kind, field: None }
    }

    /// Creates a term.
    pub fn term(text: impl Into<String>) -> Self {
        Self::leaf(NodeKind::Term { text: text.into() })
    }

    /// Creates a wildcard pattern.
    pub fn wildcard(mask: impl Into<String>) -> Self {
        Self::leaf(NodeKind::Wildcard { mask: mask.into() })
    }

    /// Creates a match-everything leaf.
    pub fn match_all() -> Self {
        Self::leaf(NodeKind::MatchAll)
    }

    /// Creates a match-nothing leaf.
    pub fn match_nothing() -> Self {
        Self::leaf(NodeKind::MatchNothing)
    }

    /// Builds a composite node, checking the arity invariant.
    ///
    /// `gap` is used only by positional operators and ignored otherwise.
    /// Passing a leaf operator is always an arity violation.
    pub fn composite(
        operator: Operator,
        children: Vec<Self>,
        gap: u32,
    ) -> Result<Self, ArityError> {
        let count = children.len();
        if count < 2 {
            return Err(ArityError {
                operator,
                children: count,
            });
        }
        let kind = match operator {
            Operator::And => NodeKind::And { children },
            Operator::Or => NodeKind::Or { children },
            Operator::Not => NodeKind::Not { children },
            Operator::AndMaybe => NodeKind::AndMaybe { children },
            Operator::Near => NodeKind::Near { children, gap },
            Operator::Phrase => NodeKind::Phrase { children, gap },
            Operator::Term | Operator::Wildcard | Operator::MatchAll | Operator::MatchNothing => {
                return Err(ArityError {
                    operator,
                    children: count,
                });
            }
        };
        Ok(Self::leaf(kind))
    }

    /// Creates an AND node.
    pub fn and(children: Vec<Self>) -> Result<Self, ArityError> {
        Self::composite(Operator::And, children, 0)
    }

    /// Creates an OR node.
    pub fn or(children: Vec<Self>) -> Result<Self, ArityError> {
        Self::composite(Operator::Or, children, 0)
    }

    /// Creates a NOT node: `children[0]` minus the rest.
    pub fn not(children: Vec<Self>) -> Result<Self, ArityError> {
        Self::composite(Operator::Not, children, 0)
    }

    /// Creates an AND_MAYBE node: `children[0]` required, the rest optional.
    pub fn and_maybe(children: Vec<Self>) -> Result<Self, ArityError> {
        Self::composite(Operator::AndMaybe, children, 0)
    }

    /// Creates an ordered proximity node.
    pub fn phrase(children: Vec<Self>, gap: u32) -> Result<Self, ArityError> {
        Self::composite(Operator::Phrase, children, gap)
    }

    /// Creates an unordered proximity node.
    pub fn near(children: Vec<Self>, gap: u32) -> Result<Self, ArityError> {
        Self::composite(Operator::Near, children, gap)
    }

    /// Combines operands, collapsing the degenerate cases.
    ///
    /// Zero operands give `None`, one operand is returned unchanged, and two
    /// or more are wrapped in a single node of `operator`. Never violates the
    /// arity invariant.
    pub fn combine(operator: Operator, mut children: Vec<Self>, gap: u32) -> Option<Self> {
        match children.len() {
            0 => None,
            1 => children.pop(),
            _ => Self::composite(operator, children, gap).ok(),
        }
    }

    /// Sets the field scope, builder style.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Replaces the field scope.
    pub fn set_field(&mut self, field: Option<String>) {
        self.field = field;
    }

    /// Returns the field scope, if any.
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns the operator payload.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Returns the operator of this node.
    pub fn operator(&self) -> Operator {
        match self.kind {
            NodeKind::Term { .. } => Operator::Term,
            NodeKind::Wildcard { .. } => Operator::Wildcard,
            NodeKind::MatchAll => Operator::MatchAll,
            NodeKind::MatchNothing => Operator::MatchNothing,
            NodeKind::And { .. } => Operator::And,
            NodeKind::Or { .. } => Operator::Or,
            NodeKind::Not { .. } => Operator::Not,
            NodeKind::AndMaybe { .. } => Operator::AndMaybe,
            NodeKind::Near { .. } => Operator::Near,
            NodeKind::Phrase { .. } => Operator::Phrase,
        }
    }

    /// Returns the children; empty for leaves.
    pub fn children(&self) -> &[Self] {
        match &self.kind {
            NodeKind::And { children }
            | NodeKind::Or { children }
            | NodeKind::Not { children }
            | NodeKind::AndMaybe { children }
            | NodeKind::Near { children, .. }
            | NodeKind::Phrase { children, .. } => children,
            NodeKind::Term { .. }
            | NodeKind::Wildcard { .. }
            | NodeKind::MatchAll
            | NodeKind::MatchNothing => &[],
        }
    }

    /// Mutable access to the children of a composite node.
    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<Self>> {
        match &mut self.kind {
            NodeKind::And { children }
            | NodeKind::Or { children }
            | NodeKind::Not { children }
            | NodeKind::AndMaybe { children }
            | NodeKind::Near { children, .. }
            | NodeKind::Phrase { children, .. } => Some(children),
            NodeKind::Term { .. }
            | NodeKind::Wildcard { .. }
            | NodeKind::MatchAll
            | NodeKind::MatchNothing => None,
        }
    }

    /// Returns the proximity gap of a positional node.
    pub fn gap(&self) -> Option<u32> {
        match self.kind {
            NodeKind::Near { gap, .. } | NodeKind::Phrase { gap, .. } => Some(gap),
            _ => None,
        }
    }

    /// Whether this node is the match-nothing leaf.
    pub fn is_match_nothing(&self) -> bool {
        matches!(self.kind, NodeKind::MatchNothing)
    }

    /// Number of levels in the tree (a leaf has depth 1).
    pub fn depth(&self) -> usize {
        1 + self.children().iter().map(Self::depth).max().unwrap_or(0)
    }

    /// Number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        if self.operator().is_composite() {
            self.children().iter().map(Self::leaf_count).sum()
        } else {
            1
        }
    }

    /// Formats the node as an indented tree.
    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let prefix = "  ".repeat(indent);
        let scope = self
            .field
            .as_ref()
            .map(|field| format!(" [{field}]"))
            .unwrap_or_default();
        match &self.kind {
            NodeKind::Term { text } => writeln!(f, "{prefix}Term({text:?}){scope}"),
            NodeKind::Wildcard { mask } => writeln!(f, "{prefix}Wildcard({mask:?}){scope}"),
            NodeKind::MatchAll => writeln!(f, "{prefix}MatchAll{scope}"),
            NodeKind::MatchNothing => writeln!(f, "{prefix}MatchNothing{scope}"),
            NodeKind::Near { children, gap } | NodeKind::Phrase { children, gap } => {
                let name = if self.operator() == Operator::Near {
                    "Near"
                } else {
                    "Phrase"
                };
                writeln!(f, "{prefix}{name}(gap={gap}){scope}")?;
                for child in children {
                    child.fmt_tree(f, indent + 1)?;
                }
                Ok(())
            }
            NodeKind::And { children }
            | NodeKind::Or { children }
            | NodeKind::Not { children }
            | NodeKind::AndMaybe { children } => {
                let name = match self.operator() {
                    Operator::And => "And",
                    Operator::Or => "Or",
                    Operator::Not => "Not",
                    _ => "AndMaybe",
                };
                writeln!(f, "{prefix}{name}{scope}")?;
                for child in children {
                    child.fmt_tree(f, indent + 1)?;
                }
                Ok(())
            }
        }
    }

    /// Renders the node back into equation syntax.
    ///
    /// The output re-parses to an equivalent tree, except that proximity gaps
    /// are not encoded: phrases with a zero gap are quoted, other positional
    /// nodes use `ADJ`/`NEAR` and take the parser's configured windows.
    /// Terms spelled like an operator keyword are quoted.
    pub fn to_query_string(&self) -> String {
        let body = match &self.kind {
            NodeKind::Term { text } if lexer::is_keyword_text(text) => format!("\"{text}\""),
            NodeKind::Term { text } => text.clone(),
            NodeKind::Wildcard { mask } => mask.clone(),
            NodeKind::MatchAll => "*".to_string(),
            NodeKind::MatchNothing => "()".to_string(),
            NodeKind::And { children } => join_group(children, " AND "),
            NodeKind::Or { children } => join_group(children, " OR "),
            NodeKind::Not { children } => join_group(children, " NOT "),
            NodeKind::AndMaybe { children } => {
                let optional: Vec<String> =
                    children[1..].iter().map(Self::to_query_string).collect();
                format!(
                    "(+({}) {})",
                    children[0].to_query_string(),
                    optional.join(" ")
                )
            }
            NodeKind::Phrase { children, gap } if *gap == 0 && all_plain_leaves(children) => {
                let words: Vec<&str> = children.iter().filter_map(leaf_text).collect();
                format!("\"{}\"", words.join(" "))
            }
            NodeKind::Phrase { children, .. } => join_group(children, " ADJ "),
            NodeKind::Near { children, .. } => join_group(children, " NEAR "),
        };
        match &self.field {
            Some(field) => format!("{field}:{body}"),
            None => body,
        }
    }
}

/// Joins rendered children with an infix operator inside parentheses.
fn join_group(children: &[Node], op: &str) -> String {
    let parts: Vec<String> = children.iter().map(Node::to_query_string).collect();
    format!("({})", parts.join(op))
}

/// The raw word of a term or wildcard.
fn leaf_text(node: &Node) -> Option<&str> {
    match &node.kind {
        NodeKind::Term { text } => Some(text),
        NodeKind::Wildcard { mask } => Some(mask),
        _ => None,
    }
}

/// Whether every child is an unscoped term or wildcard.
fn all_plain_leaves(children: &[Node]) -> bool {
    children.iter().all(|child| {
        child.field.is_none() && matches!(child.operator(), Operator::Term | Operator::Wildcard)
    })
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Node {
        Node::term(s)
    }

    #[test]
    fn composite_rejects_single_child() {
        let err = Node::and(vec![t("a")]).unwrap_err();
        assert_eq!(err.operator, Operator::And);
        assert_eq!(err.children, 1);
    }

    #[test]
    fn composite_rejects_empty() {
        assert!(Node::phrase(vec![], 0).is_err());
        assert!(Node::near(vec![], 5).is_err());
    }

    #[test]
    fn composite_rejects_leaf_operator() {
        let err = Node::composite(Operator::Term, vec![t("a"), t("b")], 0).unwrap_err();
        assert_eq!(err.operator, Operator::Term);
    }

    #[test]
    fn combine_collapses_single() {
        assert_eq!(Node::combine(Operator::Or, vec![t("x")], 0), Some(t("x")));
        assert_eq!(Node::combine(Operator::Or, vec![], 0), None);
    }

    #[test]
    fn combine_wraps_many() {
        let node = Node::combine(Operator::Near, vec![t("a"), t("b")], 5).unwrap();
        assert_eq!(node.operator(), Operator::Near);
        assert_eq!(node.gap(), Some(5));
        assert_eq!(node.children().len(), 2);
    }

    #[test]
    fn field_is_not_inherited() {
        let node = Node::or(vec![t("a"), t("b")]).unwrap().with_field("title");
        assert_eq!(node.field(), Some("title"));
        assert!(node.children().iter().all(|c| c.field().is_none()));
    }

    #[test]
    fn depth_and_leaf_count() {
        let inner = Node::and(vec![t("b"), t("c")]).unwrap();
        let node = Node::or(vec![t("a"), inner]).unwrap();
        assert_eq!(node.depth(), 3);
        assert_eq!(node.leaf_count(), 3);
        assert_eq!(t("a").depth(), 1);
    }

    #[test]
    fn display_tree() {
        let node = Node::phrase(vec![t("hello"), t("world")], 0)
            .unwrap()
            .with_field("title");
        let rendered = node.to_string();
        assert_eq!(
            rendered,
            "Phrase(gap=0) [title]\n  Term(\"hello\")\n  Term(\"world\")\n"
        );
    }

    #[test]
    fn query_string_rendering() {
        let node = Node::not(vec![
            Node::or(vec![t("a"), t("b")]).unwrap(),
            t("c").with_field("status"),
        ])
        .unwrap();
        assert_eq!(node.to_query_string(), "((a OR b) NOT status:c)");

        let phrase = Node::phrase(vec![t("hello"), t("world")], 0)
            .unwrap()
            .with_field("title");
        assert_eq!(phrase.to_query_string(), "title:\"hello world\"");

        let near = Node::near(vec![t("a"), t("b")], 5).unwrap();
        assert_eq!(near.to_query_string(), "(a NEAR b)");
    }

    #[test]
    fn keyword_terms_are_quoted() {
        let node = Node::or(vec![t("rock"), t("and")]).unwrap();
        assert_eq!(node.to_query_string(), "(rock OR \"and\")");

        let phrase = Node::phrase(vec![t("salt"), t("and"), t("pepper")], 0).unwrap();
        assert_eq!(phrase.to_query_string(), "\"salt and pepper\"");
    }

    #[test]
    fn serializes_with_type_tag() {
        let node = t("rust").with_field("title");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "term", "text": "rust", "field": "title"})
        );
    }
}
