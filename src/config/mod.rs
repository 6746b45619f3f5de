//! Configuration layering for devstack.
//!
//! Three sources decide where generated files and state go, highest
//! precedence first:
//!
//! 1. `DEVSTACK_OUTPUT_DIR` environment variable (output directory only)
//! 2. `[settings]` in the project's `devstack.toml`
//! 3. the global config, `~/.config/devstack/config.toml`
//!
//! Anything still unset falls back to `local/` for output and `.devstack/`
//! for state. Relative directories are resolved against the project root.
//!
//! # Modules
//!
//! - `global` - user-wide defaults ([`GlobalConfig`])

mod global;

pub use global::{CONFIG_PATH_ENV, GlobalConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the output directory.
pub const OUTPUT_DIR_ENV: &str = "DEVSTACK_OUTPUT_DIR";

/// Output directory used when nothing else sets one.
pub const DEFAULT_OUTPUT_DIR: &str = "local";

/// State directory used when nothing else sets one.
pub const DEFAULT_STATE_DIR: &str = ".devstack";

/// The `[settings]` table of `devstack.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
}

/// Final, absolute locations used by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSettings {
    pub output_dir: PathBuf,
    pub state_dir: PathBuf,
}

impl ResolvedSettings {
    /// Layer the sources; `env_output_dir` is the value of [`OUTPUT_DIR_ENV`], if any.
    pub fn resolve(
        project_root: &Path,
        global: &GlobalConfig,
        project: &ProjectSettings,
        env_output_dir: Option<PathBuf>,
    ) -> Self {
        let output_dir = env_output_dir
            .or_else(|| project.output_dir.clone())
            .or_else(|| global.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        let state_dir = project
            .state_dir
            .clone()
            .or_else(|| global.state_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR));

        Self {
            output_dir: project_root.join(output_dir),
            state_dir: project_root.join(state_dir),
        }
    }

    /// [`resolve`](Self::resolve) with the override read from the process environment.
    pub fn from_env(project_root: &Path, global: &GlobalConfig, project: &ProjectSettings) -> Self {
        let env_output_dir =
            std::env::var_os(OUTPUT_DIR_ENV).filter(|v| !v.is_empty()).map(PathBuf::from);
        Self::resolve(project_root, global, project, env_output_dir)
    }
}
