//! Persisted service selection.
//!
//! `devstack enable`, `disable`, `exclude` and `include` edit a small TOML
//! file in the state directory:
//!
//! ```toml
//! enabled-services = ["api"]
//! enabled-modules = ["backend"]
//! excluded-services = ["cache"]
//! ```
//!
//! The *roots* of a generation are the enabled services plus every member of
//! an enabled module. The generated set is the dependency closure of the
//! roots with excluded services removed, so excluding a shared dependency
//! (for example a database run outside docker) drops it everywhere.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::inventory::Inventory;
use crate::resolver::DependencyResolver;
use crate::utils::fs::{read_toml_file, write_toml_file};

/// File name of the state inside the state directory.
pub const STATE_FILE: &str = "state.toml";

/// What the user has switched on and off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SelectionState {
    #[serde(default)]
    pub enabled_services: BTreeSet<String>,
    #[serde(default)]
    pub enabled_modules: BTreeSet<String>,
    #[serde(default)]
    pub excluded_services: BTreeSet<String>,
}

impl SelectionState {
    /// Enabled services followed by members of enabled modules, each once.
    #[must_use]
    pub fn roots(&self, inventory: &Inventory) -> Vec<String> {
        let mut roots: Vec<String> = self.enabled_services.iter().cloned().collect();
        for module in &self.enabled_modules {
            let members = inventory.module_services(module);
            if members.is_empty() {
                tracing::warn!("Enabled module '{module}' has no services");
            }
            for member in members {
                if !roots.contains(&member) {
                    roots.push(member);
                }
            }
        }
        roots
    }

    /// The dependency closure of [`roots`](Self::roots) minus excluded services.
    #[must_use]
    pub fn selected_services(&self, inventory: &Inventory) -> Vec<String> {
        let roots = self.roots(inventory);
        let resolver = DependencyResolver::new(inventory.services());
        let mut selected = resolver.full_dependency_list_including_transitive(&roots);
        selected.retain(|name| !self.excluded_services.contains(name));
        selected
    }
}

/// Loads, edits and saves the [`SelectionState`] of one project.
#[derive(Debug, Clone)]
pub struct StateManager {
    path: PathBuf,
    state: SelectionState,
}

impl StateManager {
    /// Load `state.toml` from `state_dir`; a missing file is an empty selection.
    pub fn load(state_dir: &Path) -> Result<Self> {
        let path = state_dir.join(STATE_FILE);
        let state = if path.exists() {
            read_toml_file(&path)?
        } else {
            tracing::debug!("No state file at {}, starting empty", path.display());
            SelectionState::default()
        };
        Ok(Self {
            path,
            state,
        })
    }

    pub fn save(&self) -> Result<()> {
        write_toml_file(&self.path, &self.state)?;
        tracing::debug!("Saved selection state to {}", self.path.display());
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Returns the names that were not already enabled.
    pub fn enable_services<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<String> {
        insert_all(&mut self.state.enabled_services, names)
    }

    /// Returns the names that were enabled.
    pub fn disable_services<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<String> {
        remove_all(&mut self.state.enabled_services, names)
    }

    pub fn enable_modules<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<String> {
        insert_all(&mut self.state.enabled_modules, names)
    }

    pub fn disable_modules<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<String> {
        remove_all(&mut self.state.enabled_modules, names)
    }

    pub fn exclude_services<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<String> {
        insert_all(&mut self.state.excluded_services, names)
    }

    /// Undo [`exclude_services`](Self::exclude_services).
    pub fn include_services<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<String> {
        remove_all(&mut self.state.excluded_services, names)
    }
}

fn insert_all<S: AsRef<str>>(set: &mut BTreeSet<String>, names: &[S]) -> Vec<String> {
    names
        .iter()
        .map(|name| name.as_ref())
        .filter(|name| set.insert((*name).to_string()))
        .map(str::to_string)
        .collect()
}

fn remove_all<S: AsRef<str>>(set: &mut BTreeSet<String>, names: &[S]) -> Vec<String> {
    names.iter().map(|name| name.as_ref()).filter(|name| set.remove(*name)).map(str::to_string).collect()
}
