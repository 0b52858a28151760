//! Livecheck CLI: preprocess and inspect liveness capture sessions.
//!
//! Usage:
//!   livecheck preprocess <SESSION>   Turn a session into model tensors
//!   livecheck inspect <SESSION>      Show session statistics
//!   livecheck batch <DIR>            Preprocess every session in a directory
//!   livecheck config                 Show the effective configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use livecheck_common::config::{config_file_path, AppConfig};

mod commands;

#[derive(Parser)]
#[command(
    name = "livecheck",
    about = "Temporal preprocessing for face liveness checks",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the standard location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Preprocess a session into model tensors
    Preprocess {
        /// Path to the session JSON
        session: PathBuf,

        /// Output file for the tensors (defaults to <SESSION>.tensors.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show session statistics
    Inspect {
        /// Path to the session JSON
        session: PathBuf,
    },

    /// Preprocess every *.json session in a directory
    Batch {
        /// Directory of session files
        dir: PathBuf,

        /// Sessions processed concurrently
        #[arg(short, long, default_value = "4")]
        jobs: usize,
    },

    /// Print the effective configuration
    Config {
        /// Save it to the standard location
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => Ok(AppConfig::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {e}", path.display()))?),
        None => {
            let path = config_file_path();
            if path.exists() {
                AppConfig::load_from(&path).map_err(|e| (path, e))
            } else {
                Ok(AppConfig::default())
            }
        }
    };

    // Initialize logging
    let mut logging = loaded
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    livecheck_common::logging::init_logging(&logging);

    let config = loaded.unwrap_or_else(|(path, e)| {
        tracing::warn!("Failed to load config at {:?}: {}", path, e);
        AppConfig::default()
    });

    match cli.command {
        Commands::Preprocess { session, output } => {
            commands::preprocess::run(&config, session, output)
        }
        Commands::Inspect { session } => commands::inspect::run(&config, session),
        Commands::Batch { dir, jobs } => commands::batch::run(&config, dir, jobs).await,
        Commands::Config { write } => commands::config::run(&config, write),
    }
}
