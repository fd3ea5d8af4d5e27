//! Query compiler.
//!
//! Lowers a [`Node`] tree into a [`BackendQuery`], resolving field names to
//! backend prefixes along the way.

use std::slice;

use serde::{Deserialize, Serialize};
use sift_query::{Node, NodeKind, Operator};
use tracing::debug;

use crate::{
    dictionary::TermDictionary,
    error::CompileError,
    fields::FieldMap,
    query::{BackendOp, BackendQuery},
};

/// Term text no indexed document can contain.
///
/// Indexed text is lowercased, so an upper-case term never matches.
const IMPOSSIBLE_TERM: &str = "MATCHNOTHING";

/// What to do with a clause scoped to a field missing from the field map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownFieldPolicy {
    /// Fail compilation with [`CompileError::UnknownField`].
    #[default]
    Error,
    /// Drop the clause as if it had not been written.
    Ignore,
    /// Replace the clause with match-nothing.
    MatchNothing,
    /// Compile the clause as if it carried no field.
    Unscoped,
}

impl UnknownFieldPolicy {
    /// Returns the configuration spelling of the policy.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Ignore => "ignore",
            Self::MatchNothing => "match-nothing",
            Self::Unscoped => "unscoped",
        }
    }
}

/// Compiler configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Prefixes searched by clauses with no field in scope.
    pub default_prefixes: Vec<String>,
    /// Handling of unmapped fields.
    pub unknown_field: UnknownFieldPolicy,
    /// Most terms a wildcard expands to, per prefix.
    pub max_expansions: usize,
    /// Whether the backend has a match-nothing primitive.
    pub native_match_nothing: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            default_prefixes: vec![String::new()],
            unknown_field: UnknownFieldPolicy::default(),
            max_expansions: 100,
            native_match_nothing: true,
        }
    }
}

/// How a node's field resolved.
#[derive(Clone, Copy)]
enum Scope<'a> {
    /// Search these prefixes.
    Prefixes(&'a [String]),
    /// Leave the clause out.
    Dropped,
    /// The clause matches nothing.
    Nothing,
}

/// Compiles query trees into backend queries.
pub struct QueryCompiler<'d> {
    /// Field name to prefix mapping.
    fields: FieldMap,
    /// Behaviour switches.
    options: CompilerOptions,
    /// Source of wildcard expansions; `None` leaves wildcards to the backend.
    dictionary: Option<&'d dyn TermDictionary>,
}

impl<'d> QueryCompiler<'d> {
    /// Creates a compiler with no term dictionary.
    pub fn new(fields: FieldMap, options: CompilerOptions) -> Self {
        Self {
            fields,
            options,
            dictionary: None,
        }
    }

    /// Expands wildcards against `dictionary` instead of passing them through.
    pub fn with_dictionary(mut self, dictionary: &'d dyn TermDictionary) -> Self {
        self.dictionary = Some(dictionary);
        self
    }

    /// Returns the field map.
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Returns the compiler options.
    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Compiles a tree into a backend query.
    ///
    /// A tree that compiles to nothing (every clause dropped) yields
    /// match-nothing.
    pub fn compile(&self, node: &Node) -> Result<BackendQuery, CompileError> {
        let query = self.compile_node(node, &self.options.default_prefixes)?;
        Ok(query.unwrap_or_else(|| self.match_nothing()))
    }

    /// Compiles one node with `inherited` as the prefixes in scope.
    ///
    /// Returns `None` when the clause is dropped.
    fn compile_node(
        &self,
        node: &Node,
        inherited: &[String],
    ) -> Result<Option<BackendQuery>, CompileError> {
        let scope = self.resolve(node.field(), inherited)?;
        self.compile_in_scope(node, scope)
    }

    /// Compiles one node whose field has already been resolved to `scope`.
    fn compile_in_scope(
        &self,
        node: &Node,
        scope: Scope<'_>,
    ) -> Result<Option<BackendQuery>, CompileError> {
        match scope {
            Scope::Prefixes(prefixes) => self.compile_scoped(node, prefixes),
            Scope::Dropped => Ok(None),
            Scope::Nothing => Ok(Some(self.match_nothing())),
        }
    }

    /// Compiles one node against `prefixes`, ignoring its own field.
    fn compile_scoped(
        &self,
        node: &Node,
        prefixes: &[String],
    ) -> Result<Option<BackendQuery>, CompileError> {
        match node.kind() {
            NodeKind::Term { text } => Ok(Some(
                self.fan_out(prefixes, |prefix| BackendQuery::term(prefix, text)),
            )),
            NodeKind::Wildcard { mask } => self.compile_wildcard(mask, prefixes).map(Some),
            NodeKind::MatchAll => Ok(Some(BackendQuery::MatchAll)),
            NodeKind::MatchNothing => Ok(Some(self.match_nothing())),
            NodeKind::And { children } => self.compile_all(BackendOp::And, children, prefixes),
            NodeKind::Or { children } => self.compile_all(BackendOp::Or, children, prefixes),
            NodeKind::Not { children } => self.compile_not(children, prefixes),
            NodeKind::AndMaybe { children } => self.compile_and_maybe(children, prefixes),
            NodeKind::Near { children, gap } | NodeKind::Phrase { children, gap } => {
                let op = if node.operator() == Operator::Near {
                    BackendOp::Near
                } else {
                    BackendOp::Phrase
                };
                self.compile_positional(op, children, *gap, prefixes)
            }
        }
    }

    /// Resolves the prefixes a node searches.
    fn resolve<'a>(
        &'a self,
        field: Option<&str>,
        inherited: &'a [String],
    ) -> Result<Scope<'a>, CompileError> {
        let Some(field) = field else {
            return Ok(Scope::Prefixes(inherited));
        };
        if let Some(prefixes) = self.fields.prefixes(field) {
            return Ok(Scope::Prefixes(prefixes));
        }
        debug!(field, policy = self.options.unknown_field.as_str(), "unknown field");
        match self.options.unknown_field {
            UnknownFieldPolicy::Error => Err(CompileError::UnknownField {
                field: field.to_string(),
            }),
            UnknownFieldPolicy::Ignore => Ok(Scope::Dropped),
            UnknownFieldPolicy::MatchNothing => Ok(Scope::Nothing),
            UnknownFieldPolicy::Unscoped => Ok(Scope::Prefixes(inherited)),
        }
    }

    /// Builds one leaf per prefix and ORs them.
    fn fan_out(&self, prefixes: &[String], leaf: impl Fn(&str) -> BackendQuery) -> BackendQuery {
        let leaves = prefixes.iter().map(|prefix| leaf(prefix.as_str())).collect();
        BackendQuery::combine(BackendOp::Or, leaves, 0).unwrap_or_else(|| self.match_nothing())
    }

    /// Compiles a wildcard, expanding it when a dictionary is available.
    fn compile_wildcard(
        &self,
        mask: &str,
        prefixes: &[String],
    ) -> Result<BackendQuery, CompileError> {
        let Some(dictionary) = self.dictionary else {
            return Ok(self.fan_out(prefixes, |prefix| BackendQuery::wildcard(prefix, mask)));
        };

        let limit = self.options.max_expansions;
        let mut leaves = Vec::new();
        for prefix in prefixes {
            let mut terms = dictionary
                .expand(prefix, mask, limit.saturating_add(1))
                .map_err(|source| CompileError::Expansion {
                    pattern: mask.to_string(),
                    source,
                })?;
            if terms.len() > limit {
                debug!(mask, prefix = prefix.as_str(), limit, "wildcard expansion truncated");
                terms.truncate(limit);
            }
            leaves.extend(terms.into_iter().map(|text| BackendQuery::term(prefix, text)));
        }
        if leaves.is_empty() {
            debug!(mask, "wildcard matched no indexed term");
        }
        Ok(BackendQuery::combine(BackendOp::Or, leaves, 0).unwrap_or_else(|| self.match_nothing()))
    }

    /// Compiles every child and combines the survivors with `op`.
    fn compile_all(
        &self,
        op: BackendOp,
        children: &[Node],
        prefixes: &[String],
    ) -> Result<Option<BackendQuery>, CompileError> {
        let mut subqueries = Vec::with_capacity(children.len());
        for child in children {
            subqueries.extend(self.compile_node(child, prefixes)?);
        }
        Ok(BackendQuery::combine(op, subqueries, 0))
    }

    /// Compiles a NOT node.
    ///
    /// If the positive side is dropped, the exclusions apply to every
    /// document.
    fn compile_not(
        &self,
        children: &[Node],
        prefixes: &[String],
    ) -> Result<Option<BackendQuery>, CompileError> {
        let Some((first, rest)) = children.split_first() else {
            return Ok(None);
        };
        let positive = self.compile_node(first, prefixes)?;

        let mut negative = Vec::with_capacity(rest.len());
        for child in rest {
            negative.extend(self.compile_node(child, prefixes)?);
        }
        if negative.is_empty() {
            return Ok(positive);
        }

        let mut subqueries = Vec::with_capacity(negative.len() + 1);
        subqueries.push(positive.unwrap_or(BackendQuery::MatchAll));
        subqueries.extend(negative);
        Ok(BackendQuery::combine(BackendOp::AndNot, subqueries, 0))
    }

    /// Compiles an AND_MAYBE node.
    ///
    /// If the required side is dropped, the optional clauses are OR'd.
    fn compile_and_maybe(
        &self,
        children: &[Node],
        prefixes: &[String],
    ) -> Result<Option<BackendQuery>, CompileError> {
        let Some((first, rest)) = children.split_first() else {
            return Ok(None);
        };
        let required = self.compile_node(first, prefixes)?;
        let optional = self.compile_all(BackendOp::Or, rest, prefixes)?;
        Ok(match (required, optional) {
            (Some(required), Some(optional)) => {
                BackendQuery::combine(BackendOp::AndMaybe, vec![required, optional], 0)
            }
            (required, optional) => required.or(optional),
        })
    }

    /// Compiles a positional node once per prefix and ORs the results.
    ///
    /// All operands of one positional query share a prefix; prefixes are
    /// never mixed across operands. Operands scoped to different fields
    /// cannot be split that way and form a single positional query.
    fn compile_positional(
        &self,
        op: BackendOp,
        children: &[Node],
        gap: u32,
        prefixes: &[String],
    ) -> Result<Option<BackendQuery>, CompileError> {
        let mut scopes = Vec::with_capacity(children.len());
        for child in children {
            scopes.push(self.resolve(child.field(), prefixes)?);
        }

        let Some(shared) = shared_prefixes(&scopes) else {
            debug!("positional operands share no prefix list");
            let mut subqueries = Vec::with_capacity(children.len());
            for (child, scope) in children.iter().zip(&scopes) {
                subqueries.extend(self.compile_in_scope(child, *scope)?);
            }
            let window = window(gap, subqueries.len());
            return Ok(BackendQuery::combine(op, subqueries, window));
        };

        if shared.is_empty() {
            return Ok(Some(self.match_nothing()));
        }
        let mut per_prefix = Vec::with_capacity(shared.len());
        for prefix in shared {
            let mut subqueries = Vec::with_capacity(children.len());
            for (child, scope) in children.iter().zip(&scopes) {
                let scope = match scope {
                    Scope::Prefixes(_) => Scope::Prefixes(slice::from_ref(prefix)),
                    other => *other,
                };
                subqueries.extend(self.compile_in_scope(child, scope)?);
            }
            let window = window(gap, subqueries.len());
            per_prefix.extend(BackendQuery::combine(op, subqueries, window));
        }
        Ok(BackendQuery::combine(BackendOp::Or, per_prefix, 0))
    }

    /// The backend's match-nothing query.
    fn match_nothing(&self) -> BackendQuery {
        if self.options.native_match_nothing {
            return BackendQuery::MatchNothing;
        }
        let term = BackendQuery::term("", IMPOSSIBLE_TERM);
        BackendQuery::Op {
            op: BackendOp::AndNot,
            subqueries: vec![term.clone(), term],
            window: 0,
        }
    }
}

/// The prefix list every searchable operand agrees on.
///
/// `None` when operands search different prefixes or none searches any.
fn shared_prefixes<'a>(scopes: &[Scope<'a>]) -> Option<&'a [String]> {
    let mut lists = scopes.iter().filter_map(|scope| match scope {
        Scope::Prefixes(prefixes) => Some(*prefixes),
        Scope::Dropped | Scope::Nothing => None,
    });
    let first = lists.next()?;
    lists.all(|list| list == first).then_some(first)
}

/// Positional window spanning `operands` terms with up to `gap` extra
/// positions.
fn window(gap: u32, operands: usize) -> u32 {
    gap.saturating_add(u32::try_from(operands).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use sift_query::{optimize, parse};

    use super::*;

    fn fields() -> FieldMap {
        FieldMap::new()
            .with("title", ["title:"])
            .with("status", ["status:"])
            .with("words", ["title:", "abstract:"])
    }

    fn compile(equation: &str) -> BackendQuery {
        QueryCompiler::new(fields(), CompilerOptions::default())
            .compile(&optimize(parse(equation)))
            .unwrap()
    }

    fn compile_with(
        equation: &str,
        policy: UnknownFieldPolicy,
    ) -> Result<BackendQuery, CompileError> {
        let options = CompilerOptions {
            unknown_field: policy,
            ..CompilerOptions::default()
        };
        QueryCompiler::new(fields(), options).compile(&optimize(parse(equation)))
    }

    #[test]
    fn unscoped_term_uses_default_prefix() {
        assert_eq!(compile("rust"), BackendQuery::term("", "rust"));
    }

    #[test]
    fn scoped_term_uses_field_prefix() {
        assert_eq!(compile("title:rust"), BackendQuery::term("title:", "rust"));
    }

    #[test]
    fn synonym_field_ors_leaves() {
        assert_eq!(
            compile("words:rust").to_string(),
            "Query((title:rust OR abstract:rust))"
        );
    }

    #[test]
    fn phrase_on_synonym_field_is_compiled_per_prefix() {
        assert_eq!(
            compile("words:\"a b\"").to_string(),
            "Query(((title:a PHRASE 2 title:b) OR (abstract:a PHRASE 2 abstract:b)))"
        );
    }

    #[test]
    fn operands_on_same_synonym_field_are_compiled_per_prefix() {
        assert_eq!(
            compile("words:a ADJ words:b").to_string(),
            "Query(((title:a PHRASE 3 title:b) OR (abstract:a PHRASE 3 abstract:b)))"
        );
        assert_eq!(
            compile("words:x NEAR words:y").to_string(),
            "Query(((title:x NEAR 7 title:y) OR (abstract:x NEAR 7 abstract:y)))"
        );
    }

    #[test]
    fn operands_on_different_fields_form_one_positional_query() {
        assert_eq!(
            compile("title:a ADJ status:b").to_string(),
            "Query((title:a PHRASE 3 status:b))"
        );
    }

    #[test]
    fn group_field_scopes_its_leaves() {
        assert_eq!(
            compile("title:(a OR b) c").to_string(),
            "Query(((title:a OR title:b) OR c))"
        );
    }

    #[test]
    fn operator_table() {
        assert_eq!(compile("a AND b").to_string(), "Query((a AND b))");
        assert_eq!(compile("a -b").to_string(), "Query((a AND_NOT b))");
        assert_eq!(compile("+a b").to_string(), "Query((a AND_MAYBE b))");
        assert_eq!(compile("a NEAR b").to_string(), "Query((a NEAR 7 b))");
        assert_eq!(compile("a ADJ b").to_string(), "Query((a PHRASE 3 b))");
    }

    #[test]
    fn hate_only_excludes_from_everything() {
        assert_eq!(compile("-a").to_string(), "Query((<alldocuments> AND_NOT a))");
    }

    #[test]
    fn empty_equation_matches_nothing() {
        assert_eq!(compile(""), BackendQuery::MatchNothing);
    }

    #[test]
    fn match_nothing_fallback() {
        let options = CompilerOptions {
            native_match_nothing: false,
            ..CompilerOptions::default()
        };
        let query = QueryCompiler::new(fields(), options)
            .compile(&parse(""))
            .unwrap();
        assert_eq!(
            query.to_string(),
            "Query((MATCHNOTHING AND_NOT MATCHNOTHING))"
        );
    }

    #[test]
    fn unknown_field_is_an_error_by_default() {
        let err = compile_with("colour:red", UnknownFieldPolicy::Error).unwrap_err();
        assert!(matches!(err, CompileError::UnknownField { field } if field == "colour"));
    }

    #[test]
    fn unknown_field_ignored() {
        let query = compile_with("colour:red rust", UnknownFieldPolicy::Ignore).unwrap();
        assert_eq!(query, BackendQuery::term("", "rust"));

        let only = compile_with("colour:red", UnknownFieldPolicy::Ignore).unwrap();
        assert_eq!(only, BackendQuery::MatchNothing);
    }

    #[test]
    fn ignored_positive_side_excludes_from_everything() {
        let query = compile_with("colour:red -rust", UnknownFieldPolicy::Ignore).unwrap();
        assert_eq!(query.to_string(), "Query((<alldocuments> AND_NOT rust))");
    }

    #[test]
    fn unknown_field_match_nothing() {
        let query = compile_with("colour:red", UnknownFieldPolicy::MatchNothing).unwrap();
        assert_eq!(query, BackendQuery::MatchNothing);
    }

    #[test]
    fn unknown_field_unscoped() {
        let query =
            compile_with("title:(colour:red OR x)", UnknownFieldPolicy::Unscoped).unwrap();
        assert_eq!(query.to_string(), "Query((title:red OR title:x))");
    }

    #[test]
    fn wildcard_passes_through_without_dictionary() {
        assert_eq!(compile("dev*").to_string(), "Query(WILDCARD dev*)");
    }

    #[test]
    fn match_all_leaf() {
        assert_eq!(compile("*"), BackendQuery::MatchAll);
    }
}
