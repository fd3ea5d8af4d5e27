//! Equation to backend query, end to end.

#![allow(clippy::tests_outside_test_module)]

use serde_json::json;
use sift_backend::{
    BackendOp, BackendQuery, CompileError, CompilerOptions, DictionaryError, FieldMap,
    MemoryDictionary, QueryCompiler, TermDictionary,
};
use sift_query::{QueryParser, optimize, parse};

/// Field map shared by the tests.
fn fields() -> FieldMap {
    FieldMap::new()
        .with("title", ["title:"])
        .with("abstract", ["abstract:"])
        .with("status", ["status:"])
        .with("words", ["title:", "abstract:"])
}

/// A small index.
fn dictionary() -> MemoryDictionary {
    [
        "develop",
        "developer",
        "devops",
        "title:devices",
        "title:development",
        "abstract:devops",
    ]
    .into_iter()
    .collect()
}

/// Parses, flattens and compiles with default options.
fn compile(equation: &str) -> BackendQuery {
    QueryCompiler::new(fields(), CompilerOptions::default())
        .compile(&optimize(parse(equation)))
        .unwrap()
}

#[test]
fn full_example() {
    let query = compile("title:\"hello world\" AND status:publish -archived");
    assert_eq!(
        query.to_string(),
        "Query((((title:hello PHRASE 2 title:world) AND status:publish) AND_NOT archived))"
    );
}

#[test]
fn phrase_on_synonym_field_has_no_cross_product() {
    let query = compile("words:\"a b c\"");
    let BackendQuery::Op {
        op: BackendOp::Or,
        subqueries,
        ..
    } = &query
    else {
        panic!("expected OR, got {query}");
    };
    assert_eq!(subqueries.len(), 2);
    for (subquery, prefix) in subqueries.iter().zip(["title:", "abstract:"]) {
        let BackendQuery::Op {
            op: BackendOp::Phrase,
            subqueries: terms,
            window,
        } = subquery
        else {
            panic!("expected PHRASE, got {subquery}");
        };
        assert_eq!(*window, 3);
        assert!(terms.iter().all(
            |term| matches!(term, BackendQuery::Term { prefix: p, .. } if p == prefix)
        ));
    }
}

#[test]
fn root_default_field_scopes_everything() {
    let tree = QueryParser::default().parse_optimized("rust OR golang", Some("words"));
    let query = QueryCompiler::new(fields(), CompilerOptions::default())
        .compile(&tree)
        .unwrap();
    assert_eq!(
        query.to_string(),
        "Query(((title:rust OR abstract:rust) OR (title:golang OR abstract:golang)))"
    );
}

#[test]
fn custom_default_prefixes() {
    let options = CompilerOptions {
        default_prefixes: vec!["title:".into(), "abstract:".into()],
        ..CompilerOptions::default()
    };
    let query = QueryCompiler::new(fields(), options)
        .compile(&parse("rust"))
        .unwrap();
    assert_eq!(query.to_string(), "Query((title:rust OR abstract:rust))");
}

#[test]
fn wildcards_expand_against_dictionary() {
    let dict = dictionary();
    let compiler = QueryCompiler::new(fields(), CompilerOptions::default()).with_dictionary(&dict);

    let query = compiler.compile(&parse("dev*")).unwrap();
    assert_eq!(query.to_string(), "Query((develop OR developer OR devops))");

    let scoped = compiler.compile(&parse("words:dev*")).unwrap();
    assert_eq!(
        scoped.to_string(),
        "Query((title:devices OR title:development OR abstract:devops))"
    );
}

#[test]
fn wildcard_expansion_is_capped() {
    let dict = dictionary();
    let options = CompilerOptions {
        max_expansions: 2,
        ..CompilerOptions::default()
    };
    let compiler = QueryCompiler::new(fields(), options).with_dictionary(&dict);
    let query = compiler.compile(&parse("dev*")).unwrap();
    assert_eq!(query.to_string(), "Query((develop OR developer))");
}

#[test]
fn wildcard_without_matches_is_match_nothing() {
    let dict = dictionary();
    let compiler = QueryCompiler::new(fields(), CompilerOptions::default()).with_dictionary(&dict);
    assert_eq!(
        compiler.compile(&parse("zzz*")).unwrap(),
        BackendQuery::MatchNothing
    );
}

/// A dictionary whose backend is unreachable.
struct Offline;

impl TermDictionary for Offline {
    fn expand(&self, _: &str, _: &str, _: usize) -> Result<Vec<String>, DictionaryError> {
        Err(DictionaryError::Lookup("connection refused".into()))
    }
}

#[test]
fn dictionary_failure_is_reported() {
    let compiler = QueryCompiler::new(fields(), CompilerOptions::default()).with_dictionary(&Offline);
    let err = compiler.compile(&parse("dev*")).unwrap_err();
    assert!(matches!(err, CompileError::Expansion { ref pattern, .. } if pattern == "dev*"));
}

#[test]
fn dsl_rendering() {
    let query = compile("title:\"hello world\" -status:archived");
    assert_eq!(
        query.to_dsl(),
        json!({
            "bool": {
                "must": [
                    { "match_phrase": { "title": { "query": "hello world", "slop": 0 } } }
                ],
                "must_not": [
                    { "term": { "status": "archived" } }
                ]
            }
        })
    );
}

#[test]
fn dsl_and_maybe() {
    let query = compile("+rust async");
    assert_eq!(
        query.to_dsl(),
        json!({
            "bool": {
                "must": [{ "term": { "_all": "rust" } }],
                "should": [{ "term": { "_all": "async" } }]
            }
        })
    );
}
