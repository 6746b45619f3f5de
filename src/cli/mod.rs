//! Command-line interface for devstack.
//!
//! Each subcommand lives in its own module with its own argument struct and
//! an `execute_with_manifest_path` entry point:
//!
//! - `list` - services in the manifest and whether they are generated
//! - `tree` - a service's dependency tree, or its dependents with `--invert`
//! - `enable` / `disable` - add or remove services or modules from the selection
//! - `exclude` / `include` - keep a service out of the generated set
//! - `generate` - write the compose files for the selection
//!
//! # Example
//!
//! ```bash
//! devstack enable api
//! devstack tree api
//! devstack generate
//! docker compose -f local/docker-compose.yaml up
//! ```

mod common;
mod generate;
mod list;
mod select;
mod tree;


use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Runtime configuration derived from the global flags.
///
/// Kept separate from [`Cli`] so tests can check flag handling without
/// installing a subscriber.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Default filter directive for the log subscriber.
    ///
    /// `None` means warnings and errors only. `RUST_LOG` always wins when set.
    pub log_level: Option<String>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the global tracing subscriber, writing to stderr.
    ///
    /// Does nothing if a subscriber is already installed.
    pub fn init_logging(&self) {
        let default = self.log_level.as_deref().unwrap_or("warn");
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .try_init();
    }
}

/// Modular local development environments.
#[derive(Parser, Debug)]
#[command(
    name = "devstack",
    about = "Resolve service dependencies and assemble docker-compose files",
    version,
    long_about = "devstack reads devstack.toml, resolves the services you enable together \
                  with everything they depend on, and writes one docker-compose file per \
                  service plus an aggregate file that includes them all."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to devstack.toml; searched for upward from the current directory by default
    #[arg(long, global = true)]
    manifest_path: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List services defined in devstack.toml
    List(list::ListCommand),

    /// Show the dependency tree of a service
    Tree(tree::TreeCommand),

    /// Add services (or modules) to the selection
    Enable(select::EnableCommand),

    /// Remove services (or modules) from the selection
    Disable(select::DisableCommand),

    /// Keep services out of the generated set even when something depends on them
    Exclude(select::ExcludeCommand),

    /// Undo `exclude`
    Include(select::IncludeCommand),

    /// Write docker-compose files for the selected services
    Generate(generate::GenerateCommand),
}

impl Cli {
    /// Build the config from the flags, set up logging, then run the command.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        config.init_logging();
        self.execute_with_config(config).await
    }

    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("info".to_string())
        };

        CliConfig {
            log_level,
        }
    }

    /// Run the command without touching logging setup.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        tracing::debug!("Running with {config:?}");

        match self.command {
            Commands::List(cmd) => cmd.execute_with_manifest_path(self.manifest_path).await,
            Commands::Tree(cmd) => cmd.execute_with_manifest_path(self.manifest_path).await,
            Commands::Enable(cmd) => cmd.execute_with_manifest_path(self.manifest_path).await,
            Commands::Disable(cmd) => cmd.execute_with_manifest_path(self.manifest_path).await,
            Commands::Exclude(cmd) => cmd.execute_with_manifest_path(self.manifest_path).await,
            Commands::Include(cmd) => cmd.execute_with_manifest_path(self.manifest_path).await,
            Commands::Generate(cmd) => cmd.execute_with_manifest_path(self.manifest_path).await,
        }
    }
}
