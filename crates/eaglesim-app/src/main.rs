use anyhow::Result;
use clap::Parser;
use eaglesim_app::run_session;
use eaglesim_core::SimConfig;
use eaglesim_ledger::ScoreLedger;
use std::io;
use tracing::info;

/// Turn-based eagle foraging simulation.
#[derive(Parser, Debug)]
#[command(name = "eaglesim", version, about)]
struct Cli {
    /// Eagle name; prompted for interactively when omitted.
    #[arg(long)]
    name: Option<String>,

    /// Path of the high-score store.
    #[arg(long, default_value = "eaglescores.txt")]
    scores: String,

    /// RNG seed for a reproducible session.
    #[arg(long)]
    seed: Option<u64>,

    /// Half-extent of the territory along x.
    #[arg(long, default_value_t = 100)]
    length: i32,

    /// Half-extent of the territory along y.
    #[arg(long, default_value_t = 100)]
    width: i32,

    /// Number of actionable days before the win day.
    #[arg(long, default_value_t = 25)]
    days: u32,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = SimConfig {
        territory_length: cli.length,
        territory_width: cli.width,
        playable_days: cli.days,
        rng_seed: cli.seed,
        ..SimConfig::default()
    };

    let mut ledger = ScoreLedger::file(&cli.scores);
    let mut input = io::stdin().lock();
    let mut output = io::stdout().lock();

    let report = run_session(config, cli.name, &mut ledger, &mut input, &mut output)?;
    info!(
        outcome = ?report.outcome,
        score = report.score,
        days = report.days_played,
        rank = report.rank,
        "session finished"
    );
    Ok(())
}
