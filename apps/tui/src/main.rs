//! BidFlow TUI: interactive terminal interface for tender responses.
//!
//! Tabs walk through the two phases: synchronize the tender pack into the
//! Vault, decompose it, draft weighted responses, and export the pack.
//! Built with `ratatui` + `crossterm`; logs go to `~/.bidflow/bidflow-tui.log`.

mod app;
mod screens;
mod widgets;

use std::sync::Mutex;

use bidflow_core::Workbench;
use bidflow_shared::{BidFlowError, config_dir, load_config};
use color_eyre::eyre::Result;

/// Log file name under the config directory.
const LOG_FILE_NAME: &str = "bidflow-tui.log";

fn main() -> Result<()> {
    color_eyre::install()?;
    // A missing .env is fine; the key may already be in the environment.
    let _ = dotenvy::dotenv();
    init_file_logging()?;

    let config = load_config().map_err(explain)?;
    let bench = Workbench::from_config(config).map_err(explain)?;
    app::run(bench)
}

/// The terminal belongs to the UI, so tracing output goes to a file.
fn init_file_logging() -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt};

    let dir = config_dir().map_err(explain)?;
    std::fs::create_dir_all(&dir).map_err(|e| explain(BidFlowError::io(&dir, e)))?;
    let path = dir.join(LOG_FILE_NAME);
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| explain(BidFlowError::io(&path, e)))?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bidflow=info"));
    fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

/// Attach the user-facing explanation to a library error.
fn explain(err: BidFlowError) -> color_eyre::Report {
    let hint = err.user_message();
    color_eyre::Report::new(err).wrap_err(hint)
}
