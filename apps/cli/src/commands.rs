//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use bidflow_core::{ProgressReporter, Session, Workbench};
use bidflow_core::profile::load_profile;
use bidflow_ingest::load_uploads;
use bidflow_shared::{AppConfig, BidFlowError, PipelineResult, init_config, load_config};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// BidFlow: decompose tender packs and draft weighted responses.
#[derive(Parser)]
#[command(
    name = "bidflow",
    version,
    about = "Decompose tender packs, audit compliance gates, and draft weighted bid responses.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Phase 1: decompose the tender pack and audit compliance gates.
    Decompose {
        /// Tender PDF (repeat for every document of the pack).
        #[arg(long = "pdf", required = true)]
        pdfs: Vec<PathBuf>,

        /// Also write the decomposition to this file.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Phases 1 and 2: decompose, draft weighted responses, and export them.
    Respond {
        /// Tender PDF (repeat for every document of the pack).
        #[arg(long = "pdf", required = true)]
        pdfs: Vec<PathBuf>,

        /// Directory for the exported submission (defaults to the current directory).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show the business profile the agents will use.
    Profile,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "bidflow=info",
        1 => "bidflow=debug",
        _ => "bidflow=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Decompose { pdfs, out } => cmd_decompose(&pdfs, out.as_deref()).await,
        Command::Respond { pdfs, out } => cmd_respond(&pdfs, out.as_deref()).await,
        Command::Profile => cmd_profile().await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

/// Attach the user-facing explanation to a library error.
fn explain(err: BidFlowError) -> color_eyre::Report {
    let hint = err.user_message();
    color_eyre::Report::new(err).wrap_err(hint)
}

/// Load config, wire the workbench, and ingest the PDFs into a new session.
fn open_session(pdfs: &[PathBuf]) -> Result<(Workbench, Session)> {
    let config = load_config().map_err(explain)?;
    let bench = Workbench::from_config(config).map_err(explain)?;

    let uploads = load_uploads(pdfs).map_err(explain)?;
    let mut session = Session::new();
    let change = bench.sync_vault(&mut session, &uploads).map_err(explain)?;
    info!(session = %session.id(), ?change, "session opened");

    if let Some(vault) = session.vault() {
        eprintln!("  Vault synchronized with {} documents.", vault.documents().len());
    }
    if bench.profile().is_fallback() {
        eprintln!("  No business profile file found; using the built-in description.");
    }
    Ok((bench, session))
}

async fn cmd_decompose(pdfs: &[PathBuf], out: Option<&Path>) -> Result<()> {
    let (bench, mut session) = open_session(pdfs)?;

    let reporter = CliProgress::new();
    let result = bench.run_decomposition(&mut session, &reporter).await;
    reporter.finish();
    let decomposition = result.map_err(explain)?;

    println!("{}", decomposition.raw);

    if let Some(path) = out {
        std::fs::write(path, &decomposition.raw)
            .wrap_err_with(|| format!("failed to write {}", path.display()))?;
        eprintln!("  Decomposition written to {}", path.display());
    }
    Ok(())
}

async fn cmd_respond(pdfs: &[PathBuf], out: Option<&Path>) -> Result<()> {
    let (bench, mut session) = open_session(pdfs)?;

    let reporter = CliProgress::new();
    let decomposed = bench.run_decomposition(&mut session, &reporter).await.map(|_| ());
    let result = match decomposed {
        Ok(()) => bench.run_responses(&mut session, &reporter).await.cloned(),
        Err(e) => Err(e),
    };
    reporter.finish();
    let responses: PipelineResult = result.map_err(explain)?;

    println!("{}", responses.raw);

    if !responses.missing_ids.is_empty() {
        warn!(missing = ?responses.missing_ids, "some questions have no response");
        eprintln!("  Not addressed: {}", responses.missing_ids.join(", "));
    }

    let dir = match out {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().wrap_err("cannot determine working directory")?,
    };
    let path = bench.export(&session, &dir).map_err(explain)?;

    eprintln!();
    eprintln!("  Submission pack exported!");
    eprintln!("  Model: {}", responses.model);
    eprintln!("  File:  {}", path.display());
    eprintln!();
    Ok(())
}

async fn cmd_profile() -> Result<()> {
    let config = load_config().map_err(explain)?;
    let profile = load_profile(Path::new(&config.profile.path)).map_err(explain)?;
    if profile.is_fallback() {
        eprintln!("  (built-in description; {} not found)", config.profile.path);
    }
    println!("{}", profile.text);
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config().map_err(explain)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config().map_err(explain)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .expect("valid progress template")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn task_started(&self, title: &str, current: usize, total: usize) {
        self.spinner.set_message(format!("[{current}/{total}] {title}"));
    }

    fn task_finished(&self, title: &str, chars: usize) {
        self.spinner.println(format!("  ✓ {title} ({chars} chars)"));
    }
}
