//! Shared plumbing for command implementations.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::config::{GlobalConfig, ResolvedSettings};
use crate::core::DevstackError;
use crate::inventory::Inventory;
use crate::state::StateManager;
use crate::utils::fs::find_project_root;

/// Use `explicit_path` if given, otherwise search upward from the current directory.
pub fn find_manifest_with_optional(explicit_path: Option<PathBuf>) -> Result<PathBuf> {
    match explicit_path {
        Some(path) => {
            if path.exists() {
                Ok(path)
            } else {
                Err(DevstackError::ManifestNotFound.into())
            }
        }
        None => {
            let current = std::env::current_dir()
                .context("Cannot determine current working directory")?;
            let root = find_project_root(&current)?;
            Ok(root.join(crate::utils::fs::MANIFEST_FILE))
        }
    }
}

/// Everything a command needs about the current project.
#[derive(Debug)]
pub struct CommandContext {
    pub inventory: Inventory,
    pub settings: ResolvedSettings,
}

impl CommandContext {
    pub async fn load(manifest_path: Option<PathBuf>) -> Result<Self> {
        let manifest_path = find_manifest_with_optional(manifest_path)?;
        let inventory = Inventory::load(&manifest_path).with_context(|| {
            format!("Failed to load project from {}", manifest_path.display())
        })?;

        let global = GlobalConfig::load().await?;
        let settings =
            ResolvedSettings::from_env(inventory.root(), &global, &inventory.manifest().settings);

        Ok(Self {
            inventory,
            settings,
        })
    }

    pub fn load_state(&self) -> Result<StateManager> {
        StateManager::load(&self.settings.state_dir)
    }
}
