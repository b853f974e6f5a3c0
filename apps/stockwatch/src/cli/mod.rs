//! # stockwatch CLI Module
//!
//! Command-line interface for stockwatch.
//!
//! ## Available Commands
//!
//! - `run` - Interactive shell with the low-stock monitor (default)
//! - `report` - Print catalog totals and per-category counts
//! - `low` - Print entries below the alert threshold
//! - `suppliers` - Print all suppliers

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stockwatch::{AppError, Config};

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// stockwatch - inventory catalog with low-stock alerts
#[derive(Parser, Debug)]
#[command(name = "stockwatch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML config file [default: ./stockwatch.toml if present]
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the catalog and supplier files
    #[arg(short = 'D', long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Seconds between low-stock scans
    #[arg(short, long, global = true)]
    pub interval: Option<u64>,

    /// Alert threshold: entries with fewer units are low on stock
    #[arg(short, long, global = true)]
    pub threshold: Option<i64>,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (one-shot commands only)
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if this invocation starts the interactive shell.
    pub fn is_interactive(&self) -> bool {
        matches!(self.command, None | Some(Commands::Run))
    }

    /// Load the config file and apply command-line overrides.
    pub fn resolve_config(&self) -> Result<Config, AppError> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(dir) = &self.data_dir {
            config.storage.data_dir.clone_from(dir);
        }
        if let Some(secs) = self.interval {
            config.monitor.poll_interval_secs = secs;
        }
        if let Some(threshold) = self.threshold {
            config.monitor.threshold = threshold;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Interactive shell with the background low-stock monitor
    Run,

    /// Catalog totals and per-category counts
    Report,

    /// Entries below the alert threshold
    Low,

    /// All registered suppliers
    Suppliers,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), AppError> {
    let config = cli.resolve_config()?;
    let json = cli.json;

    match cli.command {
        None | Some(Commands::Run) => cmd_run(&config).await,
        Some(Commands::Report) => cmd_report(&config, json),
        Some(Commands::Low) => cmd_low(&config, json),
        Some(Commands::Suppliers) => cmd_suppliers(&config, json),
    }
}
