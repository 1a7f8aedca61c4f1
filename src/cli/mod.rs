use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::metadata::LevelFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)] // Read from `Cargo.toml`
pub struct Cli {
    /// Harness config file. Falls back to `BOUNCER_FIXTURES_CONFIG`, then to the defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Prints the path of the bouncer under test
    Locate,
    /// Manages the local kind cluster
    #[command(subcommand)]
    Kind(KindCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum KindCommand {
    /// Creates the cluster, or reuses it if it exists, and leaves it running
    Up,
    /// Deletes the cluster
    Down,
}

impl Cli {
    /// Parses command line arguments
    pub fn init_fixtures_cli() -> Self {
        Self::parse()
    }

    pub fn config_path(&self) -> Option<&PathBuf> {
        self.config.as_ref()
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}
