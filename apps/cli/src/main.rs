//! BidFlow CLI: tender decomposition and weighted response drafting.
//!
//! Reads tender PDFs into a Vault, runs the analyst/auditor pipeline, then
//! the response architect, and exports the submission pack.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    // A missing .env is fine; the key may already be in the environment.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
