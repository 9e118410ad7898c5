//! Rainfall Monitor - Command Line Entry Point
//!
//! Runs one rainfall check per invocation (meant to be scheduled by cron,
//! a systemd timer or a cloud scheduler), or serves the same check over
//! HTTP for schedulers that prefer a webhook.
//!
//! Usage:
//!   rainmon                      # Same as `rainmon check`
//!   rainmon check --dry-run      # Evaluate and log, send and persist nothing
//!   rainmon status               # Show the snooze state for the location
//!   rainmon clear                # Drop the snooze so the next run evaluates
//!   rainmon serve --port 8080    # HTTP endpoint (/check, /status, /health)
//!   rainmon init-db              # Create the snooze table in PostgreSQL
//!
//! Environment:
//!   RAINMON_CONFIG - path to rainmon.toml (default: ./rainmon.toml)
//!   DATABASE_URL   - PostgreSQL connection string for shared snooze state
//!   RUST_LOG       - log filter (default: info)

use chrono::Utc;
use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use tracing::info;

use rainmon_service::check::{status_report, CheckRun};
use rainmon_service::config::MonitorConfig;
use rainmon_service::db;
use rainmon_service::endpoint;
use rainmon_service::ingest::OpenMeteoSource;
use rainmon_service::notify::build_notifier;
use rainmon_service::snooze::{open_store, SnoozeController};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Rainfall alert monitor with tiered snoozing.
#[derive(Parser, Debug)]
#[command(name = "rainmon", version, about)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, env = "RAINMON_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one check and print the result as JSON.
    Check {
        /// Log notifications instead of sending them; no snooze state is read or written.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the current snooze status as JSON.
    Status,
    /// Remove any snooze for the configured location.
    Clear,
    /// Serve checks over HTTP.
    Serve {
        #[arg(long, env = "RAINMON_PORT", default_value_t = 8080)]
        port: u16,
    },
    /// Apply the snooze table schema to DATABASE_URL.
    InitDb,
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = MonitorConfig::load(cli.config.as_deref())?;
    info!(location = %config.location.name, key = %config.location_key(), "configuration loaded");

    match cli.command.unwrap_or(Command::Check { dry_run: false }) {
        Command::Check { dry_run } => run_check(&config, dry_run),
        Command::Status => run_status(&config),
        Command::Clear => run_clear(&config),
        Command::Serve { port } => Ok(endpoint::start_endpoint_server(port, config)?),
        Command::InitDb => run_init_db(&config),
    }
}

fn run_check(config: &MonitorConfig, dry_run: bool) -> Result<(), Box<dyn Error>> {
    let weather = OpenMeteoSource::new(&config.weather)?;
    let notifier = build_notifier(&config.notify, dry_run)?;
    let mut store = if dry_run { None } else { open_store(config) };

    let mut run = CheckRun::new(config, &weather, notifier.as_ref());
    if let Some(store) = store.as_mut() {
        run = run.with_store(&mut **store);
    }
    let result = run.run(Utc::now());

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn run_status(config: &MonitorConfig) -> Result<(), Box<dyn Error>> {
    let Some(mut store) = open_store(config) else {
        println!("No snooze store configured (set DATABASE_URL or [snooze].state_file).");
        return Ok(());
    };
    let report = status_report(config, &mut *store, Utc::now());
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_clear(config: &MonitorConfig) -> Result<(), Box<dyn Error>> {
    let Some(mut store) = open_store(config) else {
        println!("No snooze store configured, nothing to clear.");
        return Ok(());
    };
    let key = config.location_key();
    SnoozeController::new(&mut *store, key.clone()).clear()?;
    println!("✓ Cleared snooze for {} ({})", config.location.name, key);
    Ok(())
}

fn run_init_db(config: &MonitorConfig) -> Result<(), Box<dyn Error>> {
    let mut client = db::connect_configured(config.snooze.database_url.as_deref())?;
    db::apply_schema(&mut client)?;
    db::verify_schema(&mut client, db::SNOOZE_SCHEMA)?;
    println!("✓ Schema '{}' ready", db::SNOOZE_SCHEMA);
    Ok(())
}
