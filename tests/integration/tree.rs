//! Integration tests for `devstack tree`.

use predicates::prelude::*;

use crate::common::{TestProject, devstack, run_ok};

#[test]
fn test_tree_shows_dependencies() {
    let project = TestProject::sample().unwrap();

    let stdout = run_ok(&project, &["tree", "api"]);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "api");
    assert!(lines.contains(&"├── db"));
    assert!(lines.contains(&"└── cache"));
}

#[test]
fn test_tree_leaf_service() {
    let project = TestProject::sample().unwrap();

    devstack(&project)
        .args(["tree", "db"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(no dependencies)"));
}

#[test]
fn test_tree_inverted_lists_dependents() {
    let project = TestProject::sample().unwrap();

    devstack(&project)
        .args(["tree", "db", "--invert"])
        .assert()
        .success()
        .stdout(predicate::str::contains("api"))
        .stdout(predicate::str::contains("worker"))
        .stdout(predicate::str::contains("cache").not());
}

#[test]
fn test_tree_json() {
    let project = TestProject::sample().unwrap();

    let stdout = run_ok(&project, &["tree", "api", "--format", "json"]);
    let tree: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(tree["name"], "api");
    assert_eq!(tree["dependencies"].as_array().unwrap().len(), 2);
}

#[test]
fn test_tree_survives_cycles() {
    let project = TestProject::new().unwrap();
    project
        .write_manifest(
            r#"
[services.a]
source = "a.yaml"
depends-on = ["b"]

[services.b]
source = "b.yaml"
depends-on = ["a"]
"#,
        )
        .unwrap();

    // The repeated name is shown once more as a leaf, then expansion stops
    let stdout = run_ok(&project, &["tree", "a"]);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["a", "└── b", "    └── a"]);
}
