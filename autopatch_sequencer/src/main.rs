//! # Autopatch Sequencer Binary
//!
//! Drives one rig through Capture → Hunt → Seal → BreakIn → WholeCell.
//! Operator answers are read from stdin (`yes`, `no`, `pin`, `lock`,
//! `cancel`).
//!
//! # Usage
//!
//! ```bash
//! # Simulated rig with the shipped config
//! autopatch --config config/autopatch.toml --simulate
//!
//! # Replay a recorded script, no console, stop after 500 cycles
//! autopatch --script runs/cell_07.toml --no-console --max-ticks 500
//!
//! # Verbose JSON logs plus a snapshot trace
//! autopatch -s -v --json --snapshots trace.jsonl
//! ```

use autopatch_common::config::{ConfigLoader, LogLevel};
use autopatch_rig::RigRegistry;
use autopatch_sequencer::clock::MonotonicClock;
use autopatch_sequencer::config::{AutopatchConfig, load_config};
use autopatch_sequencer::controller::{Controller, RunOutcome};
use autopatch_sequencer::event::Event;
use autopatch_sequencer::operator::spawn_console;
use autopatch_sequencer::telemetry::JsonLinesSink;
use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Autopatch - automated whole-cell patching sequencer
#[derive(Parser, Debug)]
#[command(name = "autopatch")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Phase sequencer for automated whole-cell patch clamp")]
#[command(long_about = None)]
struct Args {
    /// Path to autopatch.toml. Built-in defaults are used when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Rig driver to load (overrides [rig] driver)
    #[arg(short, long)]
    driver: Option<String>,

    /// Force the simulation driver
    #[arg(short = 's', long, conflicts_with_all = ["driver", "script"])]
    simulate: bool,

    /// Replay readings from a script file with the scripted driver
    #[arg(long, value_name = "FILE", conflicts_with = "driver")]
    script: Option<PathBuf>,

    /// Controller cycle budget [ms]
    #[arg(long, value_name = "MS")]
    tick_ms: Option<u64>,

    /// Stop after this many cycles
    #[arg(long, value_name = "N")]
    max_ticks: Option<u64>,

    /// Write one JSON snapshot per cycle to this file
    #[arg(long, value_name = "FILE")]
    snapshots: Option<PathBuf>,

    /// Do not read operator commands from stdin
    #[arg(long)]
    no_console: bool,

    /// List registered rig drivers and exit
    #[arg(long)]
    list_drivers: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    match run() {
        Ok(outcome) => info!("Autopatch finished: {outcome:?}"),
        Err(e) => {
            error!("FATAL: {e}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<RunOutcome, Box<dyn Error>> {
    let args = Args::parse();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            setup_tracing(&args, LogLevel::default());
            return Err(e);
        }
    };
    setup_tracing(&args, config.shared.log_level);

    info!(
        "{} v{} starting (driver '{}')",
        config.shared.service_name,
        env!("CARGO_PKG_VERSION"),
        config.rig.driver
    );

    let registry = RigRegistry::with_builtin();
    if args.list_drivers {
        for name in registry.list() {
            println!("{name}");
        }
        return Ok(RunOutcome::Halted);
    }

    let mut rig = registry.create(&config.rig.driver)?;
    rig.init(&config.rig)?;

    let mut controller = Controller::new(&config, rig, Box::new(MonotonicClock::new()));
    if let Some(path) = &args.snapshots {
        info!("Writing snapshots to {}", path.display());
        controller = controller.with_sink(Box::new(JsonLinesSink::create(path)?));
    }

    let cancel = controller.cancel_handle();
    let sender = controller.sender();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        cancel.store(true, Ordering::SeqCst);
        sender.send(Event::Cancel);
    })?;

    if args.no_console {
        info!("Operator console disabled");
    } else {
        spawn_console(controller.sender())?;
    }

    let outcome = controller.run()?;
    if outcome == RunOutcome::TickLimitReached {
        warn!("Run stopped by tick limit in {}", controller.phase_kind());
    }
    Ok(outcome)
}

/// Load the config file (or defaults) and apply command-line overrides.
fn build_config(args: &Args) -> Result<AutopatchConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => AutopatchConfig::from_toml_str("")?,
    };

    if args.simulate {
        config.rig.driver = "simulation".to_string();
    } else if let Some(path) = &args.script {
        config.rig.driver = "scripted".to_string();
        let section = config
            .rig
            .driver_config
            .entry("scripted".to_string())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        match section.as_table_mut() {
            Some(table) => {
                table.insert(
                    "path".to_string(),
                    toml::Value::String(path.display().to_string()),
                );
            }
            None => return Err("[rig.driver_config.scripted] must be a table".into()),
        }
    } else if let Some(driver) = &args.driver {
        config.rig.driver = driver.clone();
    }

    if let Some(ms) = args.tick_ms {
        config.controller.tick_interval_ms = ms;
    }
    if args.max_ticks.is_some() {
        config.controller.max_ticks = args.max_ticks;
    }

    config.validate()?;
    Ok(config)
}

/// Setup tracing subscriber; `-v` wins over the configured level.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_directive(args.verbose, configured)));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Default `EnvFilter` directive when `RUST_LOG` is unset.
fn log_directive(verbose: bool, configured: LogLevel) -> &'static str {
    if verbose {
        LogLevel::Debug.as_directive()
    } else {
        configured.as_directive()
    }
}
