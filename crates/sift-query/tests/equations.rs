//! End-to-end equation handling through the public API.

#![allow(clippy::tests_outside_test_module)]

use sift_query::{Node, Operator, ParserOptions, QueryParser, optimize, parse};

/// Parses and flattens an equation.
fn parse_opt(input: &str) -> Node {
    optimize(parse(input))
}

#[test]
fn realistic_equation() {
    let tree = parse_opt("title:(rust OR golang) +async -deprecated \"error handling\"");
    assert_eq!(tree.operator(), Operator::Not);

    let positive = &tree.children()[0];
    assert_eq!(positive.operator(), Operator::AndMaybe);
    assert_eq!(positive.children()[0], Node::term("async"));

    let optional = &positive.children()[1];
    assert_eq!(optional.operator(), Operator::Or);
    assert_eq!(optional.children()[0].field(), Some("title"));
    assert_eq!(optional.children()[1].operator(), Operator::Phrase);

    assert_eq!(tree.children()[1], Node::term("deprecated"));
}

#[test]
fn french_keywords_and_accents() {
    let tree = parse_opt("Élève ET (école OU lycée) SAUF privé");
    assert_eq!(
        tree.to_query_string(),
        "(eleve AND ((ecole OR lycee) NOT prive))"
    );
}

#[test]
fn query_string_reparses_to_same_tree() {
    for input in [
        "a b c",
        "a AND b OR c",
        "+a -b",
        "+a +b c",
        "title:\"hello world\" AND status:publish -archived",
        "(a OR b) NOT (c AND d)",
        "x* -(draft OR wip)",
        "rock AND",
    ] {
        let tree = parse_opt(input);
        let rendered = tree.to_query_string();
        assert_eq!(parse_opt(&rendered), tree, "{input} -> {rendered}");
    }
}

#[test]
fn serializes_tree_as_json() {
    let tree = parse_opt("title:\"hello world\" -draft");
    let json = serde_json::to_value(&tree).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "type": "not",
            "children": [
                {
                    "type": "phrase",
                    "field": "title",
                    "gap": 0,
                    "children": [
                        {"type": "term", "text": "hello"},
                        {"type": "term", "text": "world"}
                    ]
                },
                {"type": "term", "text": "draft"}
            ]
        })
    );
}

#[test]
fn configured_parser_with_default_field() {
    let parser = QueryParser::new(ParserOptions {
        phrase_gap: 2,
        ..ParserOptions::default()
    });
    let tree = parser.parse_optimized("\"quick fox\"", Some("body"));
    assert_eq!(tree.operator(), Operator::Phrase);
    assert_eq!(tree.gap(), Some(2));
    assert_eq!(tree.field(), Some("body"));
}

#[test]
fn display_renders_indented_tree() {
    let tree = parse_opt("a OR status:b");
    assert_eq!(
        tree.to_string(),
        "Or\n  Term(\"a\")\n  Term(\"b\") [status]\n"
    );
}

#[test]
fn garbage_yields_match_nothing() {
    for input in ["", "()", ")(", "+ -", "\"\"", "[ ]", ":::"] {
        assert!(parse(input).is_match_nothing(), "{input:?}");
    }
}
