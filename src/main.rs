//! Binary entry point for stockpile.
//!
//! This binary provides the CLI for exporting, importing and wiping an
//! inventory store.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use stockpile::config::StockpileConfig;
use stockpile::observability::{self, LogSettings};

/// Stockpile - export, import and wipe an inventory store.
#[derive(Parser)]
#[command(name = "stockpile")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Export the whole store to an archive.
    Export {
        /// Output file (default: stockpile-export-<timestamp>.zip).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fail instead of dropping an item's image when it cannot be resolved.
        #[arg(long)]
        strict_images: bool,
    },

    /// Replace the store's contents with an archive.
    Import {
        /// Archive to import.
        archive: PathBuf,

        /// Confirm that all existing rows will be deleted first.
        #[arg(long)]
        force: bool,
    },

    /// Delete every row from every collection.
    Destroy {
        /// Confirm the wipe.
        #[arg(long)]
        force: bool,
    },

    /// Delete a single location, category or owner.
    Delete {
        /// Entity kind: location, category or owner.
        kind: String,

        /// Row id.
        id: i64,
    },

    /// Validate an archive and show its manifest without touching the store.
    Inspect {
        /// Archive to inspect.
        archive: PathBuf,
    },

    /// Create the SQLite database file and apply the schema.
    InitDb,

    /// Show row counts per collection.
    Status,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match StockpileConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init(LogSettings::from_config(&config.logging, cli.verbose)) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli.command, &config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Runs a command; `Ok(false)` means it completed but reported failure.
fn run_command(command: Commands, config: &StockpileConfig) -> anyhow::Result<bool> {
    match command {
        Commands::Export {
            output,
            strict_images,
        } => commands::cmd_export(config, output, strict_images),
        Commands::Import { archive, force } => commands::cmd_import(config, &archive, force),
        Commands::Destroy { force } => commands::cmd_destroy(config, force),
        Commands::Delete { kind, id } => commands::cmd_delete(config, &kind, id),
        Commands::Inspect { archive } => commands::cmd_inspect(&archive),
        Commands::InitDb => commands::cmd_init_db(config),
        Commands::Status => commands::cmd_status(config),
    }
}
