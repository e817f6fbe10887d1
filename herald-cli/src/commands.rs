use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use herald_config::HeraldConfig;
use herald_core::StatusEvent;
use herald_engine::{reporter_from_config, ReporterRuntime, TokioClock};
use herald_simulator::{replay_scenario, RandomizedEventDriver};
use herald_telemetry::{EventLogger, MetricsRecorder};

use crate::terminal::TerminalSurface;

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Configuration file; defaults to config/herald.yaml plus environment overrides
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read status commands from stdin and render banners to the terminal
    Watch(WatchArgs),
    /// Replay a scenario file deterministically
    Simulate(SimulateArgs),
    /// Run seeded random sessions and check reporter invariants
    Fuzz(FuzzArgs),
}

#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    /// Disable ANSI colours
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Scenario file to replay
    #[arg(short, long)]
    pub scenario: PathBuf,
    /// Expected state hash; overrides the one stored in the scenario
    #[arg(long)]
    pub validate_hash: Option<String>,
    /// Print every transcript line
    #[arg(long)]
    pub transcript: bool,
}

#[derive(Args, Debug, Clone)]
pub struct FuzzArgs {
    /// Initial seed (auto-increments per iteration); defaults to `simulator.seed`
    #[arg(long)]
    pub seed: Option<u64>,
    /// Number of iterations
    #[arg(long, default_value_t = 100)]
    pub iterations: u64,
    /// Steps per iteration; defaults to `simulator.steps`
    #[arg(long)]
    pub steps: Option<usize>,
}

pub fn load_config(path: Option<&PathBuf>) -> Result<HeraldConfig> {
    let config = match path {
        Some(path) => HeraldConfig::load_from_path(path),
        None => HeraldConfig::load(),
    };
    config.context("failed to load configuration")
}

pub async fn run_command(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_ref())?;
    EventLogger::init(&config.telemetry.log_level);

    match cli.command {
        Commands::Watch(args) => run_watch(&config, args).await,
        Commands::Simulate(args) => run_simulate(args),
        Commands::Fuzz(args) => run_fuzz(&config, args),
    }
}

/// Parses one input line: `fail <message>`, `delay <message>` or `ok`.
pub fn parse_line(line: &str) -> Result<Option<StatusEvent>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let message = rest.trim();
    let event = match command {
        "fail" | "failure" => StatusEvent::Failure(non_empty(message, "failure")?),
        "delay" => StatusEvent::Delay(non_empty(message, "delay")?),
        "ok" | "success" => StatusEvent::Success,
        other => bail!("unknown command {other:?} (expected fail, delay or ok)"),
    };
    Ok(Some(event))
}

fn non_empty(message: &str, command: &str) -> Result<String> {
    if message.is_empty() {
        bail!("{command} needs a message");
    }
    Ok(message.to_string())
}

async fn run_watch(config: &HeraldConfig, args: WatchArgs) -> Result<()> {
    let stdout = std::io::stdout();
    let color = !args.no_color && stdout.is_terminal();
    let surface = TerminalSurface::new(stdout, config.reporter.container.clone(), color);
    let reporter = reporter_from_config(&config.reporter, surface, TokioClock::new());

    let metrics = Arc::new(MetricsRecorder::new());
    let (handle, task) = ReporterRuntime::spawn(reporter, metrics.clone());
    info!("Reading status commands from stdin (fail <msg> | delay <msg> | ok)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Ok(Some(event)) => handle.send(event)?,
            Ok(None) => {}
            Err(e) => warn!("{e}"),
        }
    }

    let stats = handle.close(task).await?;
    info!(
        events = stats.events,
        rechecks = stats.rechecks,
        final_kind = %stats.final_kind,
        "Session ended"
    );

    if config.telemetry.metrics {
        print!("{}", metrics.gather_metrics()?);
    }
    Ok(())
}

fn run_simulate(args: SimulateArgs) -> Result<()> {
    let report = replay_scenario(&args.scenario, args.validate_hash.as_deref())
        .with_context(|| format!("scenario {} failed", args.scenario.display()))?;

    if args.transcript {
        for line in &report.transcript {
            println!("{line}");
        }
    }
    println!("final: {}", report.final_kind);
    println!("state hash: {}", report.state_hash);
    Ok(())
}

fn run_fuzz(config: &HeraldConfig, args: FuzzArgs) -> Result<()> {
    let base_seed = args.seed.unwrap_or(config.simulator.seed);
    let steps = args.steps.unwrap_or(config.simulator.steps);

    for iteration in 0..args.iterations {
        let seed = base_seed.wrapping_add(iteration);
        let report = RandomizedEventDriver::new(seed, config.simulator.max_advance_ms)
            .run(&config.reporter, steps)
            .with_context(|| format!("fuzz iteration with seed {seed} failed"))?;

        info!(
            seed,
            rechecks = report.rechecks,
            hash = %report.state_hash,
            "Completed fuzz iteration {}",
            iteration + 1
        );
        if (iteration + 1) % 10 == 0 {
            info!("Progress: {}/{}", iteration + 1, args.iterations);
        }
    }

    println!("{} iterations passed", args.iterations);
    Ok(())
}
