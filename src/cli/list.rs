//! `devstack list`: show the services defined in the manifest.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

use super::common::CommandContext;
use crate::core::Service;
use crate::state::SelectionState;

#[derive(Args, Debug)]
pub struct ListCommand {
    /// Only show services that would be generated
    #[arg(long)]
    enabled: bool,

    /// Output format (table, json)
    #[arg(short = 'f', long, default_value = "table")]
    format: String,
}

/// One row of output.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ServiceRow {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub builder: Option<String>,
    pub depends_on: Vec<String>,
    pub enabled: bool,
    pub excluded: bool,
}

impl ListCommand {
    pub async fn execute_with_manifest_path(self, manifest_path: Option<PathBuf>) -> Result<()> {
        self.validate_arguments()?;

        let ctx = CommandContext::load(manifest_path).await?;
        let state = ctx.load_state()?;
        let rows = rows(ctx.inventory.services(), state.state(), &ctx.inventory, self.enabled);

        match self.format.as_str() {
            "json" => println!("{}", serde_json::to_string_pretty(&rows)?),
            _ => print_table(&rows),
        }
        Ok(())
    }

    fn validate_arguments(&self) -> Result<()> {
        match self.format.as_str() {
            "table" | "json" => Ok(()),
            other => Err(anyhow::anyhow!("Invalid format '{other}'. Valid formats are: table, json")),
        }
    }
}

/// Build the rows; with `only_enabled`, keep services in the generated set.
pub fn rows(
    services: &[Service],
    state: &SelectionState,
    inventory: &crate::inventory::Inventory,
    only_enabled: bool,
) -> Vec<ServiceRow> {
    let selected = state.selected_services(inventory);

    services
        .iter()
        .map(|service| ServiceRow {
            name: service.name.clone(),
            module: service.module.clone(),
            builder: service.builder.clone(),
            depends_on: service.depends_on.clone(),
            enabled: selected.contains(&service.name),
            excluded: state.excluded_services.contains(&service.name),
        })
        .filter(|row| !only_enabled || row.enabled)
        .collect()
}

fn print_table(rows: &[ServiceRow]) {
    if rows.is_empty() {
        println!("No services found.");
        return;
    }

    let width = rows.iter().map(|r| r.name.len()).max().unwrap_or(0);
    for row in rows {
        let marker = if row.enabled {
            "●".green()
        } else if row.excluded {
            "✗".red()
        } else {
            "○".bright_black()
        };
        let module = row.module.as_deref().map(|m| format!("[{m}]")).unwrap_or_default();
        let deps = if row.depends_on.is_empty() {
            String::new()
        } else {
            format!("→ {}", row.depends_on.join(", "))
        };
        println!(
            "{marker} {:width$}  {}  {}",
            row.name.bold(),
            module.cyan(),
            deps.bright_black()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{Inventory, Manifest, ServiceEntry};
    use std::collections::BTreeSet;

    fn inventory() -> Inventory {
        let mut manifest = Manifest::default();
        for (name, deps) in [("api", vec!["db"]), ("db", vec![]), ("web", vec!["api"])] {
            manifest.services.insert(
                name.to_string(),
                ServiceEntry {
                    source: PathBuf::from(format!("{name}.yaml")),
                    builder: None,
                    depends_on: deps.into_iter().map(str::to_string).collect(),
                    module: None,
                    description: None,
                },
            );
        }
        Inventory::from_manifest(PathBuf::from("/project"), manifest)
    }

    #[test]
    fn test_rows_mark_closure_as_enabled() {
        let inventory = inventory();
        let state = SelectionState {
            enabled_services: ["api".to_string()].into(),
            ..SelectionState::default()
        };

        let all = rows(inventory.services(), &state, &inventory, false);
        assert_eq!(all.len(), 3);
        assert!(all.iter().find(|r| r.name == "db").unwrap().enabled);
        assert!(!all.iter().find(|r| r.name == "web").unwrap().enabled);

        let enabled = rows(inventory.services(), &state, &inventory, true);
        let names: Vec<_> = enabled.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["api", "db"]);
    }

    #[test]
    fn test_excluded_flag() {
        let inventory = inventory();
        let state = SelectionState {
            enabled_services: ["api".to_string()].into(),
            excluded_services: ["db".to_string()].into(),
            enabled_modules: BTreeSet::new(),
        };

        let all = rows(inventory.services(), &state, &inventory, false);
        let db = all.iter().find(|r| r.name == "db").unwrap();
        assert!(db.excluded);
        assert!(!db.enabled);
    }

    #[test]
    fn test_json_shape() {
        let row = ServiceRow {
            name: "api".into(),
            module: None,
            builder: Some("node".into()),
            depends_on: vec!["db".into()],
            enabled: true,
            excluded: false,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["builder"], "node");
        assert!(json.get("module").is_none());
    }
}
