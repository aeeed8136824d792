//! Tally - Live attendance board for a single event
//!
//! Usage:
//!   tally init [dir]                  - Write a starter tally.json
//!   tally board [--ticks N]           - Seed, subscribe and show the live board
//!   tally demo                        - Run a scripted session end to end
//!
//! Every command accepts `--config <file>`; `RUST_LOG` overrides the
//! configured log level.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use shared::TallyConfig;
use tally_app::commands::{BoardCommand, DemoCommand, InitCommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Tally - Live attendance board for a single event")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter configuration
    Init(InitCommand),
    /// Show the live board
    Board(BoardCommand),
    /// Run a scripted session against the in-memory gateway
    Demo(DemoCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => TallyConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => TallyConfig::default(),
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    match cli.command {
        Commands::Init(cmd) => cmd.run().map(|_| ()),
        Commands::Board(cmd) => cmd.run(&config).await,
        Commands::Demo(cmd) => cmd.run(&config).await,
    }
}
