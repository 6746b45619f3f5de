//! Integration tests for `devstack generate`.

use predicates::prelude::*;

use crate::common::{FileAssert, TestProject, devstack, run_ok};

#[test]
fn test_generate_writes_selection() {
    let project = TestProject::sample().unwrap();
    run_ok(&project, &["enable", "api"]);

    devstack(&project)
        .arg("generate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated 3 services"));

    let local = project.path().join("local");
    FileAssert::exists(local.join("api/docker-compose.yaml"));
    FileAssert::exists(local.join("db/docker-compose.yaml"));
    FileAssert::exists(local.join("cache/docker-compose.yaml"));
    FileAssert::not_exists(local.join("worker/docker-compose.yaml"));

    let aggregate = local.join("docker-compose.yaml");
    FileAssert::contains(&aggregate, "api/docker-compose.yaml");
    FileAssert::contains(&aggregate, "cache/docker-compose.yaml");
    FileAssert::not_contains(&aggregate, "worker");
}

#[test]
fn test_generated_service_file_is_rewritten() {
    let project = TestProject::sample().unwrap();
    run_ok(&project, &["enable", "api"]);
    run_ok(&project, &["generate"]);

    let api = project.path().join("local/api/docker-compose.yaml");
    FileAssert::contains(
        &api,
        "# Generated by devstack from services/modules/backend/api.docker-compose.yaml",
    );
    FileAssert::contains(&api, "context: ../../builders");
    FileAssert::contains(&api, "NODE_VERSION");
    FileAssert::contains(&api, "command: npm run dev");
    FileAssert::contains(&api, "working_dir: /app");
    FileAssert::contains(&api, "image: example/api");
    FileAssert::contains(&api, "../../services/modules/backend/api.env");
    FileAssert::contains(&api, "services/modules/backend/src:/app/src");
    FileAssert::contains(&api, "depends_on");
    FileAssert::contains(&api, "backend: {}");
}

#[test]
fn test_generate_dry_run_writes_nothing() {
    let project = TestProject::sample().unwrap();
    run_ok(&project, &["enable", "db"]);

    devstack(&project)
        .args(["generate", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("image: postgres:16"))
        .stdout(predicate::str::contains("Dry run"));

    FileAssert::not_exists(project.path().join("local"));
}

#[test]
fn test_generate_output_dir_override() {
    let project = TestProject::sample().unwrap();
    run_ok(&project, &["enable", "cache"]);
    run_ok(&project, &["generate", "--output-dir", "out"]);

    FileAssert::exists(project.path().join("out/cache/docker-compose.yaml"));
    FileAssert::not_exists(project.path().join("local"));
}

#[test]
fn test_generate_output_dir_from_env() {
    let project = TestProject::sample().unwrap();
    run_ok(&project, &["enable", "cache"]);

    devstack(&project)
        .arg("generate")
        .env("DEVSTACK_OUTPUT_DIR", "from-env")
        .assert()
        .success();

    FileAssert::exists(project.path().join("from-env/cache/docker-compose.yaml"));
}

#[test]
fn test_generate_with_nothing_enabled() {
    let project = TestProject::sample().unwrap();

    devstack(&project)
        .arg("generate")
        .assert()
        .success()
        .stdout(predicate::str::contains("No services enabled"));
}

#[test]
fn test_generate_warns_on_cycle() {
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
    project.write_file("a.yaml", "services:\n  a:\n    image: a\n").unwrap();
    project.write_file("b.yaml", "services:\n  b:\n    image: b\n").unwrap();
    run_ok(&project, &["enable", "a"]);

    devstack(&project)
        .arg("generate")
        .assert()
        .success()
        .stderr(predicate::str::contains("circular dependency"));

    FileAssert::exists(project.path().join("local/b/docker-compose.yaml"));
}

#[test]
fn test_generate_with_relative_manifest_path() {
    let project = TestProject::sample().unwrap();
    run_ok(&project, &["enable", "api"]);
    run_ok(&project, &["--manifest-path", "devstack.toml", "generate", "-o", "out"]);

    let api = project.path().join("out/api/docker-compose.yaml");
    FileAssert::contains(&api, "context: ../../builders");
    FileAssert::contains(&api, "- ../../services/modules/backend/api.env");
    FileAssert::not_contains(&api, project.path().to_str().unwrap());
}

#[test]
fn test_excluded_dependency_left_out_of_depends_on() {
    let project = TestProject::sample().unwrap();
    run_ok(&project, &["enable", "api"]);
    run_ok(&project, &["exclude", "db"]);
    run_ok(&project, &["generate"]);

    let local = project.path().join("local");
    FileAssert::not_exists(local.join("db/docker-compose.yaml"));
    FileAssert::not_contains(local.join("docker-compose.yaml"), "db/");

    let api = local.join("api/docker-compose.yaml");
    FileAssert::contains(&api, "depends_on:\n    - cache");
    FileAssert::not_contains(&api, "- db");
}
