//! Command-line entry point for the traffic simulator.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;

use flagsim::assignment_log::JsonlAssignmentLog;
use flagsim::evaluator::SplitEvaluator;
use flagsim::sink::{JsonlMetricStore, TrackingSink, WarehouseSink};
use flagsim::{
    CancellationToken, Engine, EngineConfig, Error, EventSink, Result, RunSummary, Runner,
};

#[derive(Debug, Parser)]
#[command(name = "flagsim", version, about = "Simulate experiment traffic and outcome events")]
struct Cli {
    /// Number of user journeys to simulate.
    #[arg(long, default_value_t = 100)]
    records: usize,

    /// Where decided events go: immediate tracking calls, or structured
    /// records for batch insertion.
    #[arg(long, value_enum, default_value = "track")]
    mode: Mode,

    /// Keep running batches on a time-of-day traffic pattern until
    /// interrupted.
    #[arg(long)]
    continuous: bool,

    /// File that warehouse-mode metric records are appended to. Required in
    /// warehouse mode.
    #[arg(long, env = "FLAGSIM_EVENTS_PATH")]
    events_path: Option<PathBuf>,

    /// Append-only per-journey assignment log.
    #[arg(long, default_value = "experiment_assignments.jsonl")]
    assignments_log: PathBuf,

    /// Bounded uniform noise applied to each event rate.
    #[arg(long, default_value_t = 0.0)]
    noise_level: f64,

    /// Seed for the behavioral RNG, for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,

    /// Delay between journeys, in milliseconds.
    #[arg(long, default_value_t = 10)]
    pace_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Track,
    Warehouse,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::new().default_filter_or("flagsim=info")).init();

    match run(cli) {
        Ok(summary) => {
            println!("Simulation complete.");
            print!("{summary}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!(target: "flagsim", err:display; "simulation failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<RunSummary> {
    let sink = build_sink(&cli)?;
    let assignment_log = JsonlAssignmentLog::open(&cli.assignments_log)?;

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let evaluator = match cli.seed {
        // Offset so evaluation draws don't mirror the behavioral draws.
        Some(seed) => {
            SplitEvaluator::with_default_experiments().with_rng(StdRng::seed_from_u64(seed ^ 1))
        }
        None => SplitEvaluator::with_default_experiments(),
    };

    let engine = Engine::new(EngineConfig {
        noise_level: cli.noise_level,
        ..EngineConfig::default()
    });

    let token = CancellationToken::new();
    spawn_listener(&token);

    let mut runner = Runner::new(engine, evaluator, sink, assignment_log);
    if cli.continuous {
        runner.run_continuous(&token, &mut rng)
    } else {
        runner.run_batch(
            cli.records,
            Duration::from_millis(cli.pace_ms),
            &token,
            &mut rng,
        )
    }
}

fn build_sink(cli: &Cli) -> Result<Box<dyn EventSink>> {
    match cli.mode {
        Mode::Track => Ok(Box::new(TrackingSink::new())),
        Mode::Warehouse => {
            let path = cli.events_path.as_ref().ok_or_else(|| {
                Error::Configuration(
                    "warehouse mode requires --events-path (or FLAGSIM_EVENTS_PATH)".to_owned(),
                )
            })?;
            let store = JsonlMetricStore::open(path)?;
            log::info!(target: "flagsim",
                       path:display = store.path().display();
                       "appending metric records");
            Ok(Box::new(WarehouseSink::new(store)))
        }
    }
}

fn spawn_listener(token: &CancellationToken) {
    if let Err(err) = flagsim::runner::spawn_interrupt_listener(token.clone()) {
        log::warn!(target: "flagsim", err:display; "running without interrupt handling");
    }
}
