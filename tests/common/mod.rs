//! Shared helpers for devstack integration tests

// Not every helper is used by every test module
#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::Path;

pub use devstack_cli::test_utils::TestProject;

/// `devstack` run inside `project`, isolated from the user's global config.
pub fn devstack(project: &TestProject) -> Command {
    let mut cmd = Command::cargo_bin("devstack").unwrap();
    cmd.current_dir(project.path())
        .env("DEVSTACK_CONFIG", project.path().join(".no-global-config.toml"))
        .env("NO_COLOR", "1")
        .env_remove("DEVSTACK_OUTPUT_DIR")
        .env_remove("RUST_LOG");
    cmd
}

/// Run `devstack <args>` and require success.
pub fn run_ok(project: &TestProject, args: &[&str]) -> String {
    let output = devstack(project).args(args).assert().success().get_output().stdout.clone();
    String::from_utf8_lossy(&output).into_owned()
}

/// File assertion helpers
pub struct FileAssert;

impl FileAssert {
    pub fn exists(path: impl AsRef<Path>) {
        let path = path.as_ref();
        assert!(path.exists(), "Expected file to exist: {}", path.display());
    }

    pub fn not_exists(path: impl AsRef<Path>) {
        let path = path.as_ref();
        assert!(!path.exists(), "Expected file to not exist: {}", path.display());
    }

    pub fn contains(path: impl AsRef<Path>, expected: &str) {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("Failed to read file {}: {}", path.display(), e));
        assert!(
            content.contains(expected),
            "Expected file {} to contain '{}'\nActual content: {}",
            path.display(),
            expected,
            content
        );
    }

    pub fn not_contains(path: impl AsRef<Path>, unexpected: &str) {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("Failed to read file {}: {}", path.display(), e));
        assert!(
            !content.contains(unexpected),
            "Expected file {} not to contain '{}'\nActual content: {}",
            path.display(),
            unexpected,
            content
        );
    }
}
