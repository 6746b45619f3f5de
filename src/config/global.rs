//! User-wide defaults shared by every devstack project.
//!
//! Stored at `~/.config/devstack/config.toml` (or the file named by
//! `DEVSTACK_CONFIG`). Every field is optional; a missing file is the same
//! as an empty one.
//!
//! ```toml
//! output-dir = "local"
//! state-dir = ".devstack"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::core::DevstackError;

/// Environment variable naming an alternative global config file.
pub const CONFIG_PATH_ENV: &str = "DEVSTACK_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GlobalConfig {
    /// Default output directory for generated compose files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// Default directory for the persisted selection state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
}

impl GlobalConfig {
    /// Load from `DEVSTACK_CONFIG` if set, otherwise from the default path.
    pub async fn load() -> Result<Self> {
        let path = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => PathBuf::from(path),
            None => Self::default_path()?,
        };
        Self::load_with_optional(Some(path)).await
    }

    /// Load from `path`, or the default path; a missing file yields defaults.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };
        if path.exists() {
            Self::load_from(&path).await
        } else {
            tracing::debug!("No global config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read global config from {}", path.display()))?;

        let config = toml::from_str(&content).map_err(|e| DevstackError::ConfigError {
            message: format!("Failed to parse global config from {}: {e}", path.display()),
        })?;
        Ok(config)
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize global config")?;

        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write global config to {}", path.display()))
    }

    /// `~/.config/devstack/config.toml`, using the platform config dir on Windows.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::config_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine config directory"))?
                .join("devstack")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".config")
                .join("devstack")
        };

        Ok(config_dir.join("config.toml"))
    }
}
