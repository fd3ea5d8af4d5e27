//! CLI integration tests for sift commands.
//!
//! These focus on exit codes and the stable parts of each command's output.

#![allow(clippy::tests_outside_test_module)]

use std::{fs, path::Path};

use assert_cmd::Command;
use predicates::prelude::*;

/// Field map used by most tests.
const PROJECT_CONFIG: &str = r#"
root = true

[fields]
title = "title:"
status = "status:"
words = ["title:", "abstract:"]
"#;

/// Helper to create a temp directory for tests.
fn temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}

/// Helper to get a sift command.
fn sift() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("sift").unwrap()
}

/// Runs `sift` in `dir` with HOME isolated to it.
fn sift_in(dir: &Path) -> Command {
    let mut cmd = sift();
    cmd.env("HOME", dir).env_remove("RUST_LOG").current_dir(dir);
    cmd
}

/// Creates a temp directory holding the project config.
fn project() -> tempfile::TempDir {
    let dir = temp_dir();
    fs::write(dir.path().join(".sift.toml"), PROJECT_CONFIG).unwrap();
    dir
}

mod init {
    use super::*;

    #[test]
    fn creates_config_file() {
        let dir = temp_dir();
        let work = dir.path().join("work");
        fs::create_dir(&work).unwrap();

        sift()
            .env("HOME", dir.path())
            .current_dir(&work)
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("Created"));

        let contents = fs::read_to_string(work.join(".sift.toml")).unwrap();
        assert!(contents.contains("# [fields]"));
    }

    #[test]
    fn fails_if_config_exists() {
        let dir = temp_dir();
        fs::write(dir.path().join(".sift.toml"), "existing").unwrap();

        sift_in(dir.path())
            .args(["init", "--global"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));
    }

    #[test]
    fn force_overwrites_broken_config() {
        let dir = temp_dir();
        let path = dir.path().join(".sift.toml");
        fs::write(&path, "[broken").unwrap();

        sift_in(dir.path())
            .args(["init", "--force"])
            .assert()
            .success();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with('#'));
    }

    #[test]
    fn global_writes_to_home() {
        let home = temp_dir();
        let work = temp_dir();

        sift()
            .env("HOME", home.path())
            .current_dir(work.path())
            .args(["init", "--global"])
            .assert()
            .success();

        assert!(home.path().join(".sift.toml").exists());
        assert!(!work.path().join(".sift.toml").exists());
    }
}

mod tokens {
    use super::*;

    #[test]
    fn prints_token_table() {
        let dir = project();
        sift_in(dir.path())
            .args(["tokens", "title:rust AND -draft"])
            .assert()
            .success()
            .stdout(predicate::str::contains("FIELD_NAME"))
            .stdout(predicate::str::contains("HATE"))
            .stdout(predicate::str::contains("END"));
    }

    #[test]
    fn json_output() {
        let dir = project();
        let output = sift_in(dir.path())
            .args(["tokens", "--json", "a AND b"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let tokens: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let kinds: Vec<&str> = tokens
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["kind"].as_str().unwrap())
            .collect();
        assert_eq!(kinds, vec!["TERM", "AND", "TERM", "END"]);
    }

    #[test]
    fn strict_rejects_unterminated_quote() {
        let dir = project();
        sift_in(dir.path())
            .args(["tokens", "--strict", "ab \"hello"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unterminated phrase"));
    }

    #[test]
    fn reads_equation_from_stdin() {
        let dir = project();
        sift_in(dir.path())
            .args(["tokens", "--json"])
            .write_stdin("hello\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("\"hello\""));
    }
}

mod parse {
    use super::*;

    #[test]
    fn prints_tree_and_stats() {
        let dir = project();
        sift_in(dir.path())
            .args(["parse", "a OR status:b"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Term(\"b\") [status]"))
            .stdout(predicate::str::contains("Query:  (a OR status:b)"))
            .stdout(predicate::str::contains("Leaves: 2"));
    }

    #[test]
    fn json_output() {
        let dir = project();
        let output = sift_in(dir.path())
            .args(["parse", "--json", "title:\"hello world\" -draft"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let tree: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(tree["type"], "not");
        assert_eq!(tree["children"][0]["type"], "phrase");
        assert_eq!(tree["children"][0]["field"], "title");
    }

    #[test]
    fn no_optimize_keeps_nesting() {
        let dir = project();
        sift_in(dir.path())
            .args(["parse", "--no-optimize", "a OR (b OR c)"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Depth:  3"));
        sift_in(dir.path())
            .args(["parse", "a OR (b OR c)"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Depth:  2"));
    }

    #[test]
    fn field_flag_scopes_root() {
        let dir = project();
        sift_in(dir.path())
            .args(["parse", "--field", "words", "\"red fox\""])
            .assert()
            .success()
            .stdout(predicate::str::contains("Phrase(gap=0) [words]"));
    }

    #[test]
    fn configured_strict_quotes_fail() {
        let dir = temp_dir();
        fs::write(
            dir.path().join(".sift.toml"),
            "root = true\n[parser]\nstrict_quotes = true\n",
        )
        .unwrap();
        sift_in(dir.path())
            .args(["parse", "\"open"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("error:"));
    }
}

mod compile {
    use super::*;

    #[test]
    fn compiles_with_field_map() {
        let dir = project();
        sift_in(dir.path())
            .args(["compile", "title:\"hello world\" AND status:publish -archived"])
            .assert()
            .success()
            .stdout(predicate::str::diff(
                "Query((((title:hello PHRASE 2 title:world) AND status:publish) AND_NOT archived))\n",
            ));
    }

    #[test]
    fn unknown_field_fails() {
        let dir = project();
        sift_in(dir.path())
            .args(["compile", "colour:red"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unknown field: colour"));
    }

    #[test]
    fn unknown_field_policy_from_config() {
        let dir = temp_dir();
        fs::write(
            dir.path().join(".sift.toml"),
            "root = true\n[compiler]\nunknown_field = \"ignore\"\n",
        )
        .unwrap();
        sift_in(dir.path())
            .args(["compile", "rust colour:red"])
            .assert()
            .success()
            .stdout(predicate::str::diff("Query(rust)\n"));
    }

    #[test]
    fn expands_wildcards_from_terms_file() {
        let dir = project();
        let terms = dir.path().join("terms.txt");
        fs::write(&terms, "develop\ndeveloper\n\ntitle:devices\nother\n").unwrap();

        sift_in(dir.path())
            .args(["compile", "--terms"])
            .arg(&terms)
            .arg("dev*")
            .assert()
            .success()
            .stdout(predicate::str::diff("Query((develop OR developer))\n"));
    }

    #[test]
    fn dsl_output() {
        let dir = project();
        let output = sift_in(dir.path())
            .args(["compile", "--dsl", "title:rust"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let dsl: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(dsl, serde_json::json!({ "term": { "title": "rust" } }));
    }
}

mod config {
    use super::*;

    #[test]
    fn shows_effective_settings() {
        let dir = project();
        sift_in(dir.path())
            .arg("config")
            .assert()
            .success()
            .stdout(predicate::str::contains("[parser]"))
            .stdout(predicate::str::contains("near_window = 5"))
            .stdout(predicate::str::contains("[fields]"));
    }

    #[test]
    fn broken_config_fails() {
        let dir = temp_dir();
        fs::write(dir.path().join(".sift.toml"), "[parser\n").unwrap();
        sift_in(dir.path())
            .arg("config")
            .assert()
            .failure()
            .stderr(predicate::str::contains("failed to load configuration"));
    }
}

mod check {
    use super::*;

    #[test]
    fn no_config_is_ok() {
        let dir = temp_dir();
        sift_in(dir.path())
            .arg("check")
            .assert()
            .success()
            .stdout(predicate::str::contains("No configuration files found"));
    }

    #[test]
    fn clean_config_passes() {
        let dir = project();
        sift_in(dir.path())
            .arg("check")
            .assert()
            .success()
            .stdout(predicate::str::contains("No issues found"))
            .stdout(predicate::str::contains("abstract:"));
    }

    #[test]
    fn warnings_fail_with_hints() {
        let dir = temp_dir();
        fs::write(
            dir.path().join(".sift.toml"),
            "root = true\n[parser]\ndefault_field = \"body\"\n[fields]\ntitle = \"S\"\n",
        )
        .unwrap();
        sift_in(dir.path())
            .arg("check")
            .assert()
            .failure()
            .stdout(predicate::str::contains("default field 'body'"))
            .stdout(predicate::str::contains("Hints:"));
    }
}
