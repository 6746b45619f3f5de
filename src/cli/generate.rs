//! `devstack generate`: write compose files for the current selection.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use super::common::CommandContext;
use crate::generator::{GenerateOptions, GenerationReport, Generator};

#[derive(Args, Debug)]
pub struct GenerateCommand {
    /// Write into this directory instead of the configured output directory
    #[arg(short = 'o', long)]
    output_dir: Option<PathBuf>,

    /// Print the files that would be written without touching the disk
    #[arg(long)]
    dry_run: bool,
}

impl GenerateCommand {
    pub async fn execute_with_manifest_path(self, manifest_path: Option<PathBuf>) -> Result<()> {
        let ctx = CommandContext::load(manifest_path).await?;
        let state = ctx.load_state()?;

        let selection = state.state().selected_services(&ctx.inventory);
        if selection.is_empty() {
            println!(
                "{}",
                "No services enabled. Use `devstack enable <service>` first.".yellow()
            );
            return Ok(());
        }

        let output_dir = match self.output_dir {
            Some(dir) if dir.is_relative() => std::env::current_dir()?.join(dir),
            Some(dir) => dir,
            None => ctx.settings.output_dir.clone(),
        };

        let generator = Generator::new(&ctx.inventory, output_dir);
        let report = generator
            .generate(
                &selection,
                GenerateOptions {
                    dry_run: self.dry_run,
                },
            )
            .await?;

        print_report(&report);
        Ok(())
    }
}

fn print_report(report: &GenerationReport) {
    if let Some(cycle) = &report.cycle {
        eprintln!("{} circular dependency: {cycle}", "warning:".yellow().bold());
    }
    for name in &report.missing {
        eprintln!("{} '{name}' is selected but not defined", "warning:".yellow().bold());
    }

    if report.dry_run {
        for file in &report.files {
            println!("{}", format!("--- {}", file.path.display()).cyan());
            print!("{}", file.content);
        }
        println!("{}", "Dry run: no files written".bright_black());
        return;
    }

    for file in &report.files {
        println!("{} {}", "Wrote".green(), file.path.display());
    }
    let count = report.services().count();
    println!(
        "{} {count} service{}",
        "✓ Generated".green().bold(),
        if count == 1 { "" } else { "s" }
    );
}
