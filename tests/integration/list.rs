//! Integration tests for `devstack list`.

use predicates::prelude::*;

use crate::common::{TestProject, devstack, run_ok};

#[test]
fn test_list_shows_all_services() {
    let project = TestProject::sample().unwrap();

    devstack(&project)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("api"))
        .stdout(predicate::str::contains("worker"))
        .stdout(predicate::str::contains("[backend]"))
        .stdout(predicate::str::contains("→ cache, db").or(predicate::str::contains("→ db, cache")));
}

#[test]
fn test_list_json_marks_dependencies_enabled() {
    let project = TestProject::sample().unwrap();
    run_ok(&project, &["enable", "api"]);

    let stdout = run_ok(&project, &["list", "--format", "json"]);
    let rows: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 4);

    let enabled = |name: &str| {
        rows.iter().find(|r| r["name"] == name).map(|r| r["enabled"] == true).unwrap()
    };
    assert!(enabled("api"));
    assert!(enabled("db"));
    assert!(enabled("cache"));
    assert!(!enabled("worker"));
}

#[test]
fn test_list_enabled_only() {
    let project = TestProject::sample().unwrap();
    run_ok(&project, &["enable", "worker"]);

    devstack(&project)
        .args(["list", "--enabled"])
        .assert()
        .success()
        .stdout(predicate::str::contains("worker"))
        .stdout(predicate::str::contains("db"))
        .stdout(predicate::str::contains("api").not());
}

#[test]
fn test_list_rejects_unknown_format() {
    let project = TestProject::sample().unwrap();

    devstack(&project)
        .args(["list", "--format", "xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid format 'xml'"));
}
