//! Error reporting from the CLI.

use predicates::prelude::*;

use crate::common::{TestProject, devstack, run_ok};

#[test]
fn test_missing_manifest() {
    let project = TestProject::new().unwrap();

    devstack(&project)
        .arg("list")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("devstack.toml not found"));
}

#[test]
fn test_explicit_manifest_path() {
    let project = TestProject::sample().unwrap();
    let elsewhere = TestProject::new().unwrap();

    devstack(&elsewhere)
        .arg("--manifest-path")
        .arg(project.manifest_path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("worker"));
}

#[test]
fn test_manifest_found_from_subdirectory() {
    let project = TestProject::sample().unwrap();

    devstack(&project)
        .current_dir(project.path().join("services/modules/backend"))
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("api"));
}

#[test]
fn test_unknown_builder_is_reported() {
    let project = TestProject::new().unwrap();
    project
        .write_manifest("[services.api]\nsource = \"api.yaml\"\nbuilder = \"rust\"\n")
        .unwrap();

    devstack(&project)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Builder 'rust'"));
}

#[test]
fn test_tree_unknown_service() {
    let project = TestProject::sample().unwrap();

    devstack(&project)
        .args(["tree", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Service 'ghost' not found"));
}

#[test]
fn test_malformed_fragment_entry() {
    let project = TestProject::sample().unwrap();
    project.write_file("services/cache.docker-compose.yaml", "services:\n  cache: redis\n").unwrap();
    run_ok(&project, &["enable", "cache"]);

    devstack(&project)
        .arg("generate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed configuration for 'cache'"));
}

#[test]
fn test_invalid_yaml_fragment() {
    let project = TestProject::sample().unwrap();
    project.write_file("services/db.docker-compose.yaml", "services: [unclosed\n").unwrap();
    run_ok(&project, &["enable", "db"]);

    devstack(&project)
        .arg("generate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration fragment"));
}
