//! Integration tests for the selection commands.

use predicates::prelude::*;

use crate::common::{FileAssert, TestProject, devstack, run_ok};

#[test]
fn test_enable_persists_state() {
    let project = TestProject::sample().unwrap();

    devstack(&project)
        .args(["enable", "api"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Enabled service api"));

    let state = project.path().join(".devstack/state.toml");
    FileAssert::exists(&state);
    FileAssert::contains(&state, "api");
}

#[test]
fn test_enable_twice_is_a_no_op() {
    let project = TestProject::sample().unwrap();
    run_ok(&project, &["enable", "api"]);

    devstack(&project)
        .args(["enable", "api"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to do"));
}

#[test]
fn test_enable_unknown_service_fails() {
    let project = TestProject::sample().unwrap();

    devstack(&project)
        .args(["enable", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Service 'ghost' not found"))
        .stderr(predicate::str::contains("devstack list"));

    FileAssert::not_exists(project.path().join(".devstack/state.toml"));
}

#[test]
fn test_enable_module_selects_members() {
    let project = TestProject::sample().unwrap();
    run_ok(&project, &["enable", "--module", "backend"]);

    let stdout = run_ok(&project, &["list", "--enabled"]);
    for name in ["api", "worker", "db", "cache"] {
        assert!(stdout.contains(name), "{name} missing from:\n{stdout}");
    }

    run_ok(&project, &["disable", "--module", "backend"]);
    devstack(&project)
        .args(["list", "--enabled"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No services found"));
}

#[test]
fn test_exclude_and_include() {
    let project = TestProject::sample().unwrap();
    run_ok(&project, &["enable", "api"]);
    run_ok(&project, &["exclude", "cache"]);

    devstack(&project)
        .args(["list", "--enabled"])
        .assert()
        .success()
        .stdout(predicate::str::contains("db"))
        .stdout(predicate::str::contains("cache").not());

    run_ok(&project, &["include", "cache"]);
    devstack(&project)
        .args(["list", "--enabled"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cache"));
}

#[test]
fn test_state_dir_from_project_settings() {
    let project = TestProject::sample().unwrap();
    let manifest = format!("[settings]\nstate-dir = \"var/devstack\"\n{}", devstack_cli::test_utils::SAMPLE_MANIFEST);
    project.write_manifest(&manifest).unwrap();

    run_ok(&project, &["enable", "db"]);
    FileAssert::exists(project.path().join("var/devstack/state.toml"));
}
