//! # Wavelink Binary
//!
//! Runs either end of a parameter exchange described by a TOML file.
//!
//! # Usage
//!
//! ```bash
//! # Create the segment and publish controls
//! wavelink --config config/wavelink.toml display
//!
//! # In another shell: join and echo controls back as waveforms
//! wavelink --config config/wavelink.toml producer
//!
//! # Socket transport, JSON logs, stop after 5000 ticks
//! wavelink --config config/socket.toml --json --ticks 5000 display
//! ```

#![deny(warnings)]

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;
use wavelink::display::DisplayEnd;
use wavelink::producer::ProducerEnd;
use wavelink::ticker::{RunFlag, run_loop};
use wavelink_common::config::{ConfigLoader, LinkConfig, LogLevel};
use wavelink_common::consts::{DEFAULT_CONFIG_PATH, DEFAULT_TICK_US};

/// Wavelink - named parameter exchange between a display and a producer
#[derive(Parser, Debug)]
#[command(name = "wavelink")]
#[command(version)]
#[command(about = "Exchange control and waveform parameters over shared memory or TCP")]
#[command(long_about = None)]
struct Args {
    /// Path to the link configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Stop after this many ticks
    #[arg(long)]
    ticks: Option<u64>,

    /// Tick period in microseconds
    #[arg(long, default_value_t = DEFAULT_TICK_US)]
    tick_us: u64,

    /// Replace a segment left behind by an earlier display
    #[arg(long)]
    overwrite: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    role: Role,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Role {
    /// Own the exchange and watch for waveforms
    Display,
    /// Join the exchange and echo controls as waveforms
    Producer,
}

fn main() {
    if let Err(e) = run() {
        error!("wavelink failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = LinkConfig::load(&args.config);
    setup_tracing(
        &args,
        config.as_ref().map(|c| c.shared.log_level).unwrap_or_default(),
    );
    let config = config?;
    config.validate()?;

    info!(
        "wavelink v{} starting as {:?} for {}",
        env!("CARGO_PKG_VERSION"),
        args.role,
        config.shared.service_name
    );

    let flag = RunFlag::new();
    let handler_flag = flag.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        handler_flag.stop();
    })?;

    let period = Duration::from_micros(args.tick_us);
    let ticks = match args.role {
        Role::Display => {
            let mut display = DisplayEnd::open(&config, args.overwrite)?;
            run_loop(&flag, period, args.ticks, |tick| {
                display.step(tick)?;
                if display.peer_gone() {
                    info!("producer went away");
                    flag.stop();
                }
                Ok(())
            })?
        }
        Role::Producer => {
            let mut producer = ProducerEnd::open(&config)?;
            run_loop(&flag, period, args.ticks, |tick| {
                producer.step(tick)?;
                if !producer.is_connected() {
                    info!("display went away");
                    flag.stop();
                }
                Ok(())
            })?
        }
    };

    info!("stopped after {} ticks", ticks);
    Ok(())
}

/// Setup tracing subscriber; `--verbose` overrides the configured level.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::from(configured)
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
