//! `devstack enable | disable | exclude | include`: edit the persisted selection.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use super::common::CommandContext;
use crate::inventory::Inventory;
use crate::state::StateManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Enable,
    Disable,
    Exclude,
    Include,
}

impl Action {
    fn verb(self) -> &'static str {
        match self {
            Self::Enable => "Enabled",
            Self::Disable => "Disabled",
            Self::Exclude => "Excluded",
            Self::Include => "Included",
        }
    }
}

/// Arguments shared by `enable` and `disable`.
#[derive(Args, Debug)]
pub struct ToggleArgs {
    /// Service names, or module names with --module
    #[arg(required = true)]
    names: Vec<String>,

    /// Treat the names as modules
    #[arg(short = 'm', long)]
    module: bool,
}

/// Arguments shared by `exclude` and `include`.
#[derive(Args, Debug)]
pub struct ExcludeArgs {
    /// Service names
    #[arg(required = true)]
    names: Vec<String>,
}

#[derive(Args, Debug)]
pub struct EnableCommand {
    #[command(flatten)]
    args: ToggleArgs,
}

#[derive(Args, Debug)]
pub struct DisableCommand {
    #[command(flatten)]
    args: ToggleArgs,
}

#[derive(Args, Debug)]
pub struct ExcludeCommand {
    #[command(flatten)]
    args: ExcludeArgs,
}

#[derive(Args, Debug)]
pub struct IncludeCommand {
    #[command(flatten)]
    args: ExcludeArgs,
}

impl EnableCommand {
    pub async fn execute_with_manifest_path(self, manifest_path: Option<PathBuf>) -> Result<()> {
        run(manifest_path, Action::Enable, &self.args.names, self.args.module).await
    }
}

impl DisableCommand {
    pub async fn execute_with_manifest_path(self, manifest_path: Option<PathBuf>) -> Result<()> {
        run(manifest_path, Action::Disable, &self.args.names, self.args.module).await
    }
}

impl ExcludeCommand {
    pub async fn execute_with_manifest_path(self, manifest_path: Option<PathBuf>) -> Result<()> {
        run(manifest_path, Action::Exclude, &self.args.names, false).await
    }
}

impl IncludeCommand {
    pub async fn execute_with_manifest_path(self, manifest_path: Option<PathBuf>) -> Result<()> {
        run(manifest_path, Action::Include, &self.args.names, false).await
    }
}

async fn run(
    manifest_path: Option<PathBuf>,
    action: Action,
    names: &[String],
    modules: bool,
) -> Result<()> {
    let ctx = CommandContext::load(manifest_path).await?;
    let mut state = ctx.load_state()?;

    let changed = apply(&ctx.inventory, &mut state, action, names, modules)?;
    state.save()?;

    let kind = if modules { "module" } else { "service" };
    if changed.is_empty() {
        println!("{}", "Nothing to do: selection unchanged".bright_black());
    } else {
        for name in &changed {
            println!("{} {kind} {}", action.verb().green(), name.bold());
        }
    }
    Ok(())
}

/// Validate `names` against the inventory, then apply `action`.
///
/// Returns the names whose state actually changed. Disabling and including
/// accept names that are no longer defined so stale entries can be removed.
fn apply(
    inventory: &Inventory,
    state: &mut StateManager,
    action: Action,
    names: &[String],
    modules: bool,
) -> Result<Vec<String>> {
    let adding = matches!(action, Action::Enable | Action::Exclude);
    if adding {
        if modules {
            let known = inventory.modules();
            if let Some(unknown) = names.iter().find(|n| !known.contains_key(n.as_str())) {
                return Err(anyhow::anyhow!("Module '{unknown}' is not defined in devstack.toml"));
            }
        } else {
            for name in names {
                inventory.service(name)?;
            }
        }
    }

    let changed = match (action, modules) {
        (Action::Enable, false) => state.enable_services(names),
        (Action::Enable, true) => state.enable_modules(names),
        (Action::Disable, false) => state.disable_services(names),
        (Action::Disable, true) => state.disable_modules(names),
        (Action::Exclude, _) => state.exclude_services(names),
        (Action::Include, _) => state.include_services(names),
    };
    Ok(changed)
}
