//! SLBwx CLI - Command-line interface for ShiningLore BWX models

pub mod commands;
pub mod progress;

use clap::Parser;
use commands::Commands;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "slbwx")]
#[command(about = "SLBwx: ShiningLore BNX/PNX model tools", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Run the SLBwx CLI
pub fn run_cli() -> anyhow::Result<()> {
    // Setup logging, `RUST_LOG=slbwx=debug` for decoder detail
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    cli.command.execute()?;

    Ok(())
}
