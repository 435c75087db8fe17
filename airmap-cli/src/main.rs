//! Binary crate for the `airmap` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration and the map session loop
//! - Plain-text rendering of the sidebar, popups and charts

use clap::Parser;
use std::env;
use tracing_subscriber::EnvFilter;

mod cli;
mod pages;
mod render;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cmd = cli::Cli::parse();
    cmd.run().await
}

fn init_tracing() {
    // Use RUST_LOG if available, otherwise fall back to AIRMAP_LOG_LEVEL
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = env::var("AIRMAP_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string());
        EnvFilter::new(level)
    });

    // Logs go to stderr so rendered reports on stdout stay clean.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
