use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use connect4_engine::genetic::*;

/// Evolve scripted Connect 4 openings against the minimax agent.
#[derive(Parser)]
#[command(name = "evolve", about = "Evolve Connect 4 opening strategies by self-play")]
struct Cli {
    /// Number of strategies in each generation
    #[arg(long, default_value_t = 40)]
    population: usize,

    /// Number of top strategies kept as parents each generation
    #[arg(long, default_value_t = 15)]
    parents: usize,

    /// Number of generations to run
    #[arg(long, default_value_t = 400)]
    generations: usize,

    /// Per-gene mutation probability for offspring
    #[arg(long, default_value_t = 0.05)]
    mutation_rate: f64,

    /// Number of scripted moves in each strategy
    #[arg(long, default_value_t = 20)]
    strategy_len: usize,

    /// Search depth of the minimax opponent
    #[arg(long, default_value_t = 4)]
    depth: usize,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Fitness shaping: per-move or chained
    #[arg(long, default_value = "per-move")]
    shaping: String,

    /// Hide the progress bar
    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    let shaping = match cli.shaping.as_str() {
        "per-move" => FitnessShaping::PerMove,
        "chained" => FitnessShaping::Chained,
        other => bail!("unknown shaping '{}' (expected 'per-move' or 'chained')", other),
    };

    let config = EvolverConfig {
        population_size: cli.population,
        parents_size: cli.parents,
        generations: cli.generations,
        mutation_rate: cli.mutation_rate,
        strategy_len: cli.strategy_len,
        opponent_depth: cli.depth,
        seed: cli.seed,
        shaping,
    };

    let evolver = Evolver::new(config)
        .context("invalid evolver configuration")?
        .with_progress_bar(!cli.quiet);
    info!(seed = evolver.seed(), "starting evolution");
    println!("Seed: {}", evolver.seed());

    let result = evolver.run();

    println!("Best strategy: {}", result.best);
    println!("Fitness score: {} ({:?})", result.fitness, result.outcome);
    Ok(())
}
