//! Command-line driver for the healthcare resource allocation simulator.
//!
//! Builds an environment from flags (or a JSON config file), runs it for a
//! fixed number of steps, and prints either a plain-text summary or a full
//! JSON snapshot. Logs go to stderr so `--json` output stays parseable.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};

use healthcare_simulator_core_rs::{Environment, EnvironmentConfig, StepResult};

/// Messages included in the `--json` snapshot
const MESSAGE_TAIL: usize = 20;

#[derive(Parser)]
#[command(name = "healthcare-sim", version, about = "Discrete-step healthcare resource allocation simulator", long_about = None)]
struct Cli {
    /// Number of hospitals (ignored with --config)
    #[arg(long, default_value_t = 5)]
    hospitals: usize,

    /// Number of patients (ignored with --config)
    #[arg(long, default_value_t = 50)]
    patients: usize,

    /// Initial capacity per hospital, in units (ignored with --config)
    #[arg(long, default_value_t = 1000)]
    capacity: i64,

    /// Number of steps to simulate
    #[arg(short, long, default_value_t = 10)]
    steps: usize,

    /// RNG seed (ignored with --config)
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Load the complete environment configuration from a JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the final environment snapshot as JSON on stdout
    #[arg(long)]
    json: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn load_config(cli: &Cli) -> Result<EnvironmentConfig> {
    match &cli.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing config file {}", path.display()))
        }
        None => Ok(EnvironmentConfig::uniform(
            cli.hospitals,
            cli.patients,
            cli.capacity,
            cli.seed,
        )),
    }
}

fn print_summary(results: &[StepResult], env: &Environment) {
    let fulfilled: usize = results.iter().map(|r| r.allocations_fulfilled).sum();
    let failed: usize = results.iter().map(|r| r.allocations_failed).sum();
    let transfers: usize = results.iter().map(|r| r.transfers_executed).sum();
    let transferred: i64 = results.iter().map(|r| r.transferred_value).sum();
    let metrics = env.metrics();

    println!("--- simulation complete ---");
    println!("steps:                 {}", results.len());
    println!("allocations fulfilled: {}", fulfilled);
    println!("allocations failed:    {}", failed);
    println!("transfers executed:    {} ({} units moved)", transfers, transferred);
    println!("total balance:         {}", metrics.total_balance);
    println!("total unmet demand:    {}", metrics.total_unmet_demand);
    println!("allocation efficiency: {:.4}", metrics.allocation_efficiency);
    println!("messages logged:       {}", env.message_log().len());

    println!("--- hospitals ---");
    for hospital in env.hospitals() {
        println!(
            "{:<14} {:>7} units  (capacity {}, {})",
            hospital.id(),
            hospital.current_balance(),
            hospital.initial_capacity(),
            hospital.specialty()
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;
    let mut env = Environment::new(config)?;

    info!(
        hospitals = env.hospitals().len(),
        patients = env.patients().len(),
        steps = cli.steps,
        "starting simulation"
    );
    let results = env.run(cli.steps);

    if cli.json {
        let snapshot = env.snapshot(MESSAGE_TAIL);
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_summary(&results, &env);
    }

    Ok(())
}
