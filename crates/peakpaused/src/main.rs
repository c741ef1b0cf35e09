//! peakpaused - time-of-use mining controller
//!
//! Designed for repeated cron-style invocation: `run` performs one
//! decide-and-reconcile cycle and exits, deriving everything from the
//! clock, the configured temperature source, and the OS process table.
//! `watch` loops the same cycle on an interval and stops the miner on
//! interrupt. `status` is a read-only diagnostic, `force` an operator
//! override.
//!
//! Exit status: 0 on success (sensor and process hiccups are logged, not
//! fatal), 2 on configuration load/validation failure, 1 on any other
//! runtime failure.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use peakpause_config::{load_or_init, ConfigError};
use peakpause_core::{ControlError, Controller, ReconcileAction};
use peakpause_host_api::MinerHost;
use peakpause_host_linux::{build_sensor, MinerSupervisor};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Exit code for configuration load/validation failure
const EXIT_CONFIG: u8 = 2;

/// peakpaused - decides whether the miner should run and enforces it
#[derive(Parser, Debug)]
#[command(name = "peakpaused")]
#[command(about = "Time-of-use electricity controller for a background miner", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/peakpause/peakpause.toml)
    #[arg(short, long, env = peakpause_util::PEAKPAUSE_CONFIG_ENV, default_value_os_t = peakpause_util::default_config_path())]
    config: PathBuf,

    /// Log level override (RUST_LOG wins, then this, then the config file)
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one decision-and-reconcile cycle (the default)
    Run,

    /// Report what a cycle would decide right now, without side effects
    Status,

    /// Start the miner regardless of rates, temperature, or policy
    Force,

    /// Loop decision cycles until interrupted; stops the miner on exit
    Watch {
        /// Seconds between cycles
        #[arg(short, long, default_value_t = 300)]
        interval: u64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("peakpaused: {e:#}");
            exit_code_for(&e)
        }
    }
}

fn exit_code_for(e: &anyhow::Error) -> ExitCode {
    if e.downcast_ref::<ConfigError>().is_some() {
        return ExitCode::from(EXIT_CONFIG);
    }
    if let Some(ControlError::Config(_)) = e.downcast_ref::<ControlError>() {
        return ExitCode::from(EXIT_CONFIG);
    }
    ExitCode::FAILURE
}

fn init_tracing(cli_level: Option<&str>, config_level: &str) {
    let filter = if std::env::var(EnvFilter::DEFAULT_ENV).is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(cli_level.unwrap_or(config_level))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(args: Args) -> Result<()> {
    let settings = load_or_init(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    init_tracing(args.log_level.as_deref(), &settings.logging.level);
    info!(config_path = %args.config.display(), "Configuration loaded");
    if peakpause_util::is_mock_time_active() {
        warn!("Mock time is active; decisions do not follow the real clock");
    }

    let sensor = build_sensor(&settings.sensor);
    let host: Arc<dyn MinerHost> = Arc::new(MinerSupervisor::new(settings.miner.clone()));
    let controller = Controller::new(settings, sensor, host);

    match args.command.unwrap_or(Command::Run) {
        Command::Run => run_cycle(&controller).await,
        Command::Status => print_status(&controller).await,
        Command::Force => {
            let action = controller.force_start().await?;
            match action {
                ReconcileAction::Started => println!("Force mode: miner started"),
                _ => println!("Force mode: miner already running"),
            }
            Ok(())
        }
        Command::Watch { interval } => watch(controller, Duration::from_secs(interval)).await,
    }
}

/// One cycle for cron-style invocation. Process-control failures are
/// logged and swallowed: the next scheduled cycle re-attempts, and a
/// non-zero exit is reserved for configuration and internal faults.
async fn run_cycle(controller: &Controller) -> Result<()> {
    match controller.run_once().await {
        Ok(_) => Ok(()),
        Err(ControlError::Config(e)) => Err(e.into()),
        Err(e @ ControlError::Host(_)) => {
            error!(error = %e, "Process control failed; next cycle will re-attempt");
            Ok(())
        }
    }
}

async fn print_status(controller: &Controller) -> Result<()> {
    let status = controller.status().await?;

    println!(
        "Time: {}",
        peakpause_util::format_datetime_full(&peakpause_util::now())
    );
    println!("Should mine: {}", status.verdict.should_run);
    println!("Reason: {}", status.verdict.reason);
    println!();
    println!("Current status:");
    println!("Period: {}", status.period);
    println!("Rate: {}\u{a2}/kWh", status.rate);
    match status.temperature {
        Some(temp) => println!("Temperature: {temp:.1}\u{b0}C"),
        None => println!("Temperature: N/A"),
    }
    match status.instance_count {
        0 => println!("Miner running: false"),
        1 => println!("Miner running: true"),
        n => println!("Miner running: true ({n} instances)"),
    }

    Ok(())
}

async fn watch(controller: Controller, interval: Duration) -> Result<()> {
    info!(
        interval_secs = interval.as_secs(),
        "Starting continuous monitoring"
    );

    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;

    let mut timer = tokio::time::interval(interval);
    timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = timer.tick() => {
                match controller.run_once().await {
                    Ok(_) => {}
                    // A broken rate table will not fix itself; bail out.
                    Err(ControlError::Config(e)) => return Err(e.into()),
                    Err(e) => warn!(error = %e, "Cycle failed; will retry next interval"),
                }
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
                break;
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down");
                break;
            }
        }
    }

    info!("Stopping miner before exit");
    controller.shutdown().await?;
    Ok(())
}
