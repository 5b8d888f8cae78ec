//! sccreg - register systems and products with SUSE Customer Center and
//! configure zypper on the registered hosts.

mod cli;
mod commands;
mod config;
mod provision;
mod retry;
mod scc;
mod session;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Controlled by RUST_LOG; logs go to stderr so `sccreg script` output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    cli.command.execute().await
}
