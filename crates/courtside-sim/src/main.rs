use std::path::PathBuf;

use clap::Parser;

use courtside_core::AppInfo;
use courtside_sim::config::{ResolvedOutputs, SimulationConfig};
use courtside_sim::logging::init_logging;
use courtside_sim::runner::SimulationRunner;

/// Rotation simulator for social doubles sessions.
#[derive(Debug, Parser)]
#[command(
    name = "courtside-sim",
    author,
    version = AppInfo::version(),
    about = "Deterministic court rotation simulator"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "sim/sim.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of matches to play.
    #[arg(long, value_name = "MATCHES")]
    matches: Option<usize>,

    /// Override the session RNG seed.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Override the number of courts.
    #[arg(long, value_name = "COUNT")]
    courts: Option<usize>,

    /// Exit after validating the configuration (no session is played).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = SimulationConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(matches) = cli.matches {
        config.session.matches = matches;
    }

    if let Some(seed) = cli.seed {
        config.session.seed = Some(seed);
    }

    if let Some(courts) = cli.courts {
        config.session.courts = courts;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let player_count = config.session.roster().len();
    let run_id = config.run_id.clone();
    let courts = config.session.courts;
    let matches = config.session.matches;

    println!("{} {} ({})", AppInfo::name(), AppInfo::version(), AppInfo::codename());
    println!(
        "Loaded configuration '{run_id}' with {player_count} players on {courts} court{} ({matches} matches)",
        if courts == 1 { "" } else { "s" }
    );

    if cli.validate_only {
        println!("Validation-only mode: simulation skipped.");
        return Ok(());
    }

    let _logging_guard = init_logging(&config.logging, &outputs)?;
    let runner = SimulationRunner::new(config, outputs)?;
    let summary = runner.run()?;

    println!(
        "Simulation complete for '{run_id}': {} matches, {} carry-overs → {} rows at {}",
        summary.matches_played,
        summary.carry_overs,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!(
        "Results committed: {} ({} unsent)",
        summary.committed, summary.unsent
    );
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(plot_path) = summary.plot_path.as_ref() {
        println!("Games plot: {}", plot_path.display());
    }
    if let Some(telemetry_path) = summary.telemetry_path.as_ref() {
        println!("Telemetry log: {}", telemetry_path.display());
    }

    Ok(())
}
