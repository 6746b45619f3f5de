//! `devstack tree`: show a service's dependency tree.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use super::common::CommandContext;
use crate::resolver::{DependencyGraph, DependencyNode, build_tree};

#[derive(Args, Debug)]
pub struct TreeCommand {
    /// Service to start from
    service: String,

    /// Maximum depth to display
    #[arg(short = 'd', long)]
    depth: Option<usize>,

    /// Output format (tree, json)
    #[arg(short = 'f', long, default_value = "tree")]
    format: String,

    /// Show what depends on the service instead of what it depends on
    #[arg(short = 'i', long)]
    invert: bool,
}

impl TreeCommand {
    pub async fn execute_with_manifest_path(self, manifest_path: Option<PathBuf>) -> Result<()> {
        self.validate_arguments()?;

        let ctx = CommandContext::load(manifest_path).await?;
        let services = ctx.inventory.services();
        ctx.inventory.service(&self.service)?;

        let tree = if self.invert {
            DependencyGraph::from_services(services).inverted_tree(&self.service)
        } else {
            build_tree(&self.service, services)
        };

        match self.format.as_str() {
            "json" => println!("{}", serde_json::to_string_pretty(&tree)?),
            _ => self.output_tree(&tree),
        }
        Ok(())
    }

    fn validate_arguments(&self) -> Result<()> {
        match self.format.as_str() {
            "tree" | "json" => {}
            other => {
                return Err(anyhow::anyhow!(
                    "Invalid format '{other}'. Valid formats are: tree, json"
                ));
            }
        }

        if let Some(depth) = self.depth
            && depth == 0
        {
            return Err(anyhow::anyhow!("Depth must be at least 1"));
        }

        Ok(())
    }

    fn output_tree(&self, tree: &DependencyNode) {
        let rendered = tree.to_tree_string(self.depth);
        let mut lines = rendered.lines();
        if let Some(root) = lines.next() {
            println!("{}", root.cyan().bold());
        }
        for line in lines {
            println!("{line}");
        }
        if tree.is_leaf() {
            let note = if self.invert { "(no dependents)" } else { "(no dependencies)" };
            println!("{}", note.bright_black());
        }
    }
}
