//! UR-Watch main entry point
//!
//! This is the command-line interface for the UR room-availability watcher.
//! Each invocation performs at most one monitoring run; scheduling is left to
//! cron or a CI timer.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use ur_watch::config::{load_config, Config};
use ur_watch::monitor::{run_once, MonitoringWindow};
use ur_watch::storage::open_store;
use ur_watch::PersistedState;

/// UR-Watch: notify about room availability changes on a UR property
///
/// Fetches the property's room listing, compares it with the rooms seen on
/// the previous run and sends a message only when something changed.
#[derive(Parser, Debug)]
#[command(name = "ur-watch")]
#[command(version)]
#[command(about = "A room-availability watcher for UR rental listings", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Run even outside the configured monitoring window
    #[arg(long)]
    ignore_window: bool,

    /// Fetch and reconcile, but neither notify nor save state
    #[arg(long, conflicts_with = "show_state")]
    dry_run: bool,

    /// Print the last saved snapshot and exit
    #[arg(long, conflicts_with = "dry_run")]
    show_state: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = load_config(&cli.config)
        .with_context(|| format!("invalid configuration {}", cli.config.display()))?;

    if cli.show_state {
        return handle_show_state(&config);
    }

    if !cli.ignore_window {
        let window = MonitoringWindow::from_config(&config.window)?;
        if !window.contains_now() {
            tracing::info!(
                "Outside monitoring window {}-{} (UTC{:+}); skipping run",
                config.window.start,
                config.window.end,
                config.window.utc_offset_hours
            );
            return Ok(());
        }
    }

    handle_run(&config, cli.dry_run).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ur_watch=info,warn"),
            1 => EnvFilter::new("ur_watch=debug,info"),
            2 => EnvFilter::new("ur_watch=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --show-state mode: prints the saved snapshot
fn handle_show_state(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config)?;
    println!("State: {}\n", store.describe());

    match store.load()? {
        PersistedState::Uninitialized => println!("(no saved state; next run initializes)"),
        PersistedState::Initialized(snapshot) => {
            println!("Rooms ({}):", snapshot.len());
            for room in &snapshot {
                println!("  {}  {}", room.id, room);
            }
        }
    }

    Ok(())
}

/// Handles the main monitoring run
async fn handle_run(config: &Config, dry_run: bool) -> anyhow::Result<()> {
    if dry_run {
        tracing::info!("Dry run: messages are printed, state is not saved");
    }

    let report = run_once(config, dry_run).await.map_err(|e| {
        tracing::error!("Run failed: {}", e);
        e
    })?;

    if dry_run {
        match &report.message {
            Some(message) => println!("{}", message),
            None => println!("(no changes)"),
        }
    }

    Ok(())
}
