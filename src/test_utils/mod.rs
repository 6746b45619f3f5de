//! Test utilities for devstack
//!
//! [`TestProject`] lays out a throwaway project on disk: a `devstack.toml`
//! plus compose fragments, inside a [`TempDir`] that is removed on drop.
//!
//! ```rust,no_run
//! use devstack_cli::test_utils::TestProject;
//!
//! let project = TestProject::sample().unwrap();
//! assert!(project.path().join("devstack.toml").exists());
//! ```

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::utils::fs::MANIFEST_FILE;

static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests, once per process.
///
/// Uses `level` if given, otherwise `RUST_LOG`. With neither, logging stays off.
///
/// ```bash
/// RUST_LOG=devstack_cli=trace cargo test assembly
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Manifest used by [`TestProject::sample`].
pub const SAMPLE_MANIFEST: &str = r#"
[builders.node]
source = "builders/node.docker-compose.yaml"

[services.api]
source = "services/modules/backend/api.docker-compose.yaml"
builder = "node"
depends-on = ["db", "cache"]
module = "backend"

[services.worker]
source = "services/modules/backend/worker.docker-compose.yaml"
depends-on = ["db"]
module = "backend"

[services.db]
source = "services/db.docker-compose.yaml"

[services.cache]
source = "services/cache.docker-compose.yaml"
"#;

/// A project directory with a manifest and compose fragments.
pub struct TestProject {
    _temp_dir: TempDir,
    root: PathBuf,
}

impl TestProject {
    /// An empty project directory with no manifest.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().join("project");
        fs::create_dir_all(&root)?;
        Ok(Self {
            _temp_dir: temp_dir,
            root,
        })
    }

    /// Four services (`api` on a node builder, `worker`, `db`, `cache`) with fragments.
    pub fn sample() -> Result<Self> {
        let project = Self::new()?;
        project.write_manifest(SAMPLE_MANIFEST)?;
        project.write_file(
            "builders/node.docker-compose.yaml",
            "services:\n  node:\n    build:\n      context: .\n      args:\n        NODE_VERSION: '20'\n    command: npm run dev\n    working_dir: /app\n",
        )?;
        project.write_file(
            "services/modules/backend/api.docker-compose.yaml",
            "services:\n  api:\n    image: example/api\n    env_file: api.env\n    volumes:\n      - ./src:/app/src\n    ports:\n      - '8080:8080'\nnetworks:\n  backend: {}\n",
        )?;
        project.write_file(
            "services/modules/backend/worker.docker-compose.yaml",
            "services:\n  worker:\n    image: example/worker\n",
        )?;
        project.write_file(
            "services/db.docker-compose.yaml",
            "services:\n  db:\n    image: postgres:16\n    environment:\n      POSTGRES_PASSWORD: dev\n",
        )?;
        project.write_file(
            "services/cache.docker-compose.yaml",
            "services:\n  cache:\n    image: redis:7\n",
        )?;
        Ok(project)
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn write_manifest(&self, content: &str) -> Result<()> {
        self.write_file(MANIFEST_FILE, content)
    }

    /// Write `content` at `relative`, creating parent directories.
    pub fn write_file(&self, relative: &str, content: &str) -> Result<()> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn read_file(&self, relative: &str) -> Result<String> {
        let path = self.root.join(relative);
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
    }
}
