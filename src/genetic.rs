//! A genetic optimiser for scripted opening sequences
//!
//! Each member of the population is a fixed list of columns played in order
//! against the minimax agent. Members are scored by how much their moves
//! improve the heuristic evaluation of their own position over a full game,
//! the best members survive unchanged and the rest of the population is bred
//! from them by uniform crossover and per-gene mutation.

use anyhow::{bail, Result};
use indicatif::*;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info, trace};

use std::fmt;
use std::time::Instant;

use crate::board::{Board, Piece};
use crate::heuristic::{evaluate, Directions};
use crate::minimax::Minimax;
use crate::WIDTH;

/// The side played by scripted strategies, the minimax agent plays its opponent
pub const STRATEGY_PIECE: Piece = Piece::Player;

/// An ordered list of columns, the k-th entry being played on the strategy's k-th turn
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Strategy(Vec<usize>);

impl Strategy {
    pub fn new(moves: Vec<usize>) -> Self {
        Self(moves)
    }

    /// A strategy of `len` uniformly random columns
    pub fn random<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Self {
        Self((0..len).map(|_| rng.gen_range(0..WIDTH)).collect())
    }

    pub fn moves(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Uniform crossover: each gene comes from `self` or `other` with equal probability
    pub fn crossover<R: Rng + ?Sized>(&self, other: &Strategy, rng: &mut R) -> Strategy {
        let mut child = self.clone();
        for (gene, &other_gene) in child.0.iter_mut().zip(other.0.iter()) {
            if rng.gen::<f64>() < 0.5 {
                *gene = other_gene;
            }
        }
        child
    }

    /// Replaces each gene by a random column with probability `rate`
    pub fn mutate<R: Rng + ?Sized>(&mut self, rate: f64, rng: &mut R) {
        for gene in self.0.iter_mut() {
            if rng.gen::<f64>() < rate {
                *gene = rng.gen_range(0..WIDTH);
            }
        }
    }

    /// The column to play on the strategy's `turn`-th move
    ///
    /// A scripted column that can't be played, or a turn past the end of the
    /// script, falls back to a random valid column. A fallback inside the
    /// script overwrites the offending gene so the repaired strategy is what
    /// survives into later generations. Returns `None` on a full board.
    pub fn scripted_move<R: Rng + ?Sized>(
        &mut self,
        turn: usize,
        board: &Board,
        rng: &mut R,
    ) -> Option<usize> {
        match self.0.get(turn).copied() {
            Some(column) if board.is_valid_location(column) => Some(column),
            scripted => {
                let fallback = *board.valid_locations().choose(rng)?;
                if let Some(invalid) = scripted {
                    trace!(turn, invalid, fallback, "repairing strategy gene");
                    self.0[turn] = fallback;
                }
                Some(fallback)
            }
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let moves: Vec<String> = self.0.iter().map(|c| c.to_string()).collect();
        write!(f, "[{}]", moves.join(", "))
    }
}

/// How a game's scripted moves are turned into a fitness score
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum FitnessShaping {
    /// Each scripted move adds the change in its side's evaluation caused by that move
    PerMove,
    /// Each scripted move adds its post-move evaluation minus the previous move's term
    Chained,
}

impl Default for FitnessShaping {
    fn default() -> Self {
        FitnessShaping::PerMove
    }
}

/// Tuning parameters of the optimiser
#[derive(Clone, PartialEq, Debug)]
pub struct EvolverConfig {
    pub population_size: usize,
    /// Members kept unchanged each generation and used to breed the rest
    pub parents_size: usize,
    pub generations: usize,
    /// Per-gene probability of replacement in offspring
    pub mutation_rate: f64,
    pub strategy_len: usize,
    /// Search depth of the minimax opponent
    pub opponent_depth: usize,
    /// Seed for a reproducible run, a random one is drawn if unset
    pub seed: Option<u64>,
    pub shaping: FitnessShaping,
}

impl Default for EvolverConfig {
    fn default() -> Self {
        Self {
            population_size: 40,
            parents_size: 15,
            generations: 400,
            mutation_rate: 0.05,
            strategy_len: 20,
            opponent_depth: 4,
            seed: None,
            shaping: FitnessShaping::PerMove,
        }
    }
}

impl EvolverConfig {
    pub fn validate(&self) -> Result<()> {
        if self.parents_size < 2 {
            bail!("parents_size must be at least 2, got {}", self.parents_size);
        }
        if self.parents_size > self.population_size {
            bail!(
                "parents_size ({}) must not exceed population_size ({})",
                self.parents_size,
                self.population_size
            );
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            bail!("mutation_rate must be in [0, 1], got {}", self.mutation_rate);
        }
        if self.strategy_len == 0 {
            bail!("strategy_len must be greater than 0");
        }
        if self.opponent_depth == 0 {
            bail!("opponent_depth must be greater than 0");
        }
        Ok(())
    }
}

/// The result of a game from the strategy's point of view
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct GameRecord {
    pub fitness: i64,
    pub outcome: Outcome,
    /// Total pieces dropped by both sides
    pub plies: usize,
}

/// Plays `strategy` against the minimax agent until the game ends
///
/// The strategy moves first. Invalid scripted moves are repaired in place.
/// `config.opponent_depth` must be at least 1, see [`EvolverConfig::validate`].
pub fn play_game<R: Rng + ?Sized>(
    strategy: &mut Strategy,
    config: &EvolverConfig,
    rng: &mut R,
) -> GameRecord {
    debug_assert!(
        config.opponent_depth > 0,
        "the minimax agent needs a search depth of at least 1"
    );
    let opponent = STRATEGY_PIECE.opponent();
    let mut board = Board::new();
    let mut fitness = 0i64;
    let mut previous_term = 0i64;
    let mut plies = 0;

    for turn in 0.. {
        // scripted move
        let before = evaluate(&board, STRATEGY_PIECE, Directions::ALL) as i64;
        let column = match strategy.scripted_move(turn, &board, rng) {
            Some(column) => column,
            None => break,
        };
        board.play(column, STRATEGY_PIECE);
        plies += 1;

        let after = evaluate(&board, STRATEGY_PIECE, Directions::ALL) as i64;
        let term = match config.shaping {
            FitnessShaping::PerMove => after - before,
            FitnessShaping::Chained => after - previous_term,
        };
        previous_term = term;
        fitness += term;

        if board.is_game_over(STRATEGY_PIECE) {
            info!(%strategy, fitness, "strategy beat the minimax agent");
            return GameRecord {
                fitness,
                outcome: Outcome::Win,
                plies,
            };
        }
        if board.is_full() {
            break;
        }

        // minimax reply
        let mut minimax = Minimax::new(opponent, &mut *rng);
        let column = match minimax.best_move(&board, config.opponent_depth).0 {
            Some(column) => column,
            None => break,
        };
        board.play(column, opponent);
        plies += 1;

        if board.is_game_over(opponent) {
            return GameRecord {
                fitness,
                outcome: Outcome::Loss,
                plies,
            };
        }
        if board.is_full() {
            break;
        }
    }

    GameRecord {
        fitness,
        outcome: Outcome::Draw,
        plies,
    }
}

/// Fitness summary of one evaluated generation
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct GenerationStats {
    pub generation: usize,
    pub best_fitness: i64,
    pub mean_fitness: f64,
    pub wins: usize,
}

#[derive(Clone, Debug)]
pub struct EvolutionResult {
    pub best: Strategy,
    pub fitness: i64,
    pub outcome: Outcome,
    pub history: Vec<GenerationStats>,
}

/// Runs the generational loop over a population of strategies
pub struct Evolver {
    config: EvolverConfig,
    seed: u64,
    rng: ChaCha8Rng,
    population: Vec<Strategy>,
    progress: bool,
}

impl Evolver {
    /// Creates an evolver with a random initial population
    pub fn new(config: EvolverConfig) -> Result<Self> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let population = (0..config.population_size)
            .map(|_| Strategy::random(config.strategy_len, &mut rng))
            .collect();

        debug!(seed, ?config, "evolver created");
        Ok(Self {
            config,
            seed,
            rng,
            population,
            progress: false,
        })
    }

    /// Shows a progress bar on the terminal while running
    pub fn with_progress_bar(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &EvolverConfig {
        &self.config
    }

    pub fn population(&self) -> &[Strategy] {
        &self.population
    }

    /// Plays one game for every member in parallel
    ///
    /// Each member draws from its own stream of the seeded generator, so the
    /// records don't depend on how the games are scheduled.
    pub fn evaluate(&mut self, generation: usize) -> Vec<GameRecord> {
        let config = &self.config;
        let seed = self.seed;
        self.population
            .par_iter_mut()
            .enumerate()
            .map(|(index, strategy)| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                // stream 0 belongs to the breeding generator
                rng.set_stream(1 + (((generation as u64) << 32) | index as u64));
                play_game(strategy, config, &mut rng)
            })
            .collect()
    }

    /// Evaluates the current population and replaces it with the next generation
    pub fn step(&mut self, generation: usize) -> GenerationStats {
        let records = self.evaluate(generation);
        let stats = summarise(generation, &records);
        self.breed(&records);

        info!(
            generation = stats.generation,
            best = stats.best_fitness,
            mean = stats.mean_fitness,
            wins = stats.wins,
            "generation evaluated"
        );
        stats
    }

    /// Replaces the population by its fittest members followed by their offspring
    ///
    /// `records` must come from evaluating the current population.
    pub fn breed(&mut self, records: &[GameRecord]) {
        assert_eq!(records.len(), self.population.len(), "one record per member");

        // stable sort, equal fitness keeps population order
        let mut ranking: Vec<usize> = (0..self.population.len()).collect();
        ranking.sort_by(|&a, &b| records[b].fitness.cmp(&records[a].fitness));

        let parents: Vec<Strategy> = ranking
            .iter()
            .take(self.config.parents_size)
            .map(|&i| self.population[i].clone())
            .collect();

        let mut next = parents.clone();
        while next.len() < self.config.population_size {
            let pair: Vec<&Strategy> = parents.choose_multiple(&mut self.rng, 2).collect();
            let mut child = pair[0].crossover(pair[1], &mut self.rng);
            child.mutate(self.config.mutation_rate, &mut self.rng);
            next.push(child);
        }
        self.population = next;
    }

    /// Runs every generation, then evaluates the final population once more
    /// and returns its fittest member
    pub fn run(mut self) -> EvolutionResult {
        let start = Instant::now();
        let generations = self.config.generations;

        let progress = if self.progress {
            ProgressBar::new(generations as u64)
        } else {
            ProgressBar::hidden()
        };
        progress.set_style(
            ProgressStyle::default_bar()
                .template("Evolving strategies: {bar:40.cyan/blue} {pos}/{len} {msg} ~{eta} remaining")
                .progress_chars("█▓▒░  "),
        );

        let mut history = Vec::with_capacity(generations + 1);
        for generation in 0..generations {
            let stats = self.step(generation);
            progress.set_message(&format!(
                "(best {}, mean {:.1})",
                stats.best_fitness, stats.mean_fitness
            ));
            progress.inc(1);
            history.push(stats);
        }
        progress.finish();

        let records = self.evaluate(generations);
        history.push(summarise(generations, &records));

        // first member with the highest fitness
        let mut best = 0;
        for (i, record) in records.iter().enumerate() {
            if record.fitness > records[best].fitness {
                best = i;
            }
        }

        info!(
            fitness = records[best].fitness,
            strategy = %self.population[best],
            elapsed = %HumanDuration(start.elapsed()),
            "evolution complete"
        );
        EvolutionResult {
            best: self.population.swap_remove(best),
            fitness: records[best].fitness,
            outcome: records[best].outcome,
            history,
        }
    }
}

fn summarise(generation: usize, records: &[GameRecord]) -> GenerationStats {
    let best_fitness = records.iter().map(|r| r.fitness).max().unwrap_or_default();
    let mean_fitness = if records.is_empty() {
        0.0
    } else {
        records.iter().map(|r| r.fitness as f64).sum::<f64>() / records.len() as f64
    };
    GenerationStats {
        generation,
        best_fitness,
        mean_fitness,
        wins: records
            .iter()
            .filter(|r| r.outcome == Outcome::Win)
            .count(),
    }
}
