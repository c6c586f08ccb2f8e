//! histsteer CLI.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod config;
mod error;
mod pipeline;
mod resolve;
mod store;

#[derive(Parser)]
#[command(name = "histsteer")]
#[command(about = "Configuration-driven per-region histogram production")]
#[command(version)]
struct Cli {
    /// The configuration file defining the job
    #[arg(short, long)]
    config: PathBuf,

    /// Process at most this many rows per region
    #[arg(long)]
    max_events: Option<usize>,

    /// Skip this many rows of each chained dataset
    #[arg(long, default_value = "0")]
    first_event: usize,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Thread-count hint for the engine; overrides global.num_threads
    #[arg(long)]
    num_threads: Option<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).with_target(false).init();

    let cfg = config::RunConfig::load(&cli.config)?;
    let opts = pipeline::RunOptions {
        first_event: cli.first_event,
        max_events: cli.max_events,
        num_threads: cli.num_threads,
    };
    pipeline::run(&cfg, &opts)?;
    Ok(())
}
