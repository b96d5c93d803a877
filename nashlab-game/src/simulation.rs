//! Monte Carlo play of a game under fixed or mixed choices.
//!
//! Trials are grouped into chunks of `chunk_size`. Chunk `k` draws from its
//! own [`SmallRng`] stream seeded by an HMAC of the run seed and `k`, and
//! chunk tallies are merged in chunk order. A run therefore depends only on
//! its seed and chunk size, whether chunks execute sequentially, in parallel,
//! or are stopped early.
use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use smallvec::smallvec;

use crate::constants::{CHUNK_STREAM_TAG, DEFAULT_CHUNK_SIZE, DEFAULT_CONVERGENCE_POINTS};
use crate::dominance::analyze_dominance;
use crate::equilibrium::{NashEquilibrium, find_pure_nash_equilibrium};
use crate::error::ValidationError;
use crate::mixed::MixedStrategy;
use crate::numbers::{count_to_f64, share};
use crate::payoff::{PayoffMatrix, Profile};

/// How one player picks a strategy each trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyChoice {
    Fixed(usize),
    Mixed(MixedStrategy),
}

impl StrategyChoice {
    fn draw(&self, rng: &mut SmallRng) -> usize {
        match self {
            Self::Fixed(strategy) => *strategy,
            Self::Mixed(distribution) => distribution.sample(rng),
        }
    }

    /// The choice as a distribution over `player`'s strategies.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming `player` when the player is
    /// unknown, a fixed index is out of range, or a mixed distribution has the
    /// wrong length.
    pub fn to_distribution(
        &self,
        matrix: &PayoffMatrix,
        player: usize,
    ) -> Result<MixedStrategy, ValidationError> {
        matrix.check_player(player)?;
        let count = matrix.strategy_count(player);
        match self {
            Self::Fixed(strategy) => {
                matrix.check_strategy(player, *strategy)?;
                MixedStrategy::pure(count, *strategy)
            }
            Self::Mixed(distribution) if distribution.len() == count => Ok(distribution.clone()),
            Self::Mixed(distribution) => Err(ValidationError::DistributionLength {
                player,
                expected: count,
                found: distribution.len(),
            }),
        }
    }
}

fn default_convergence_points() -> usize {
    DEFAULT_CONVERGENCE_POINTS
}

fn default_chunk_size() -> u64 {
    DEFAULT_CHUNK_SIZE
}

/// Parameters of a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConfig {
    pub iterations: u64,
    /// One choice per player.
    pub choices: Vec<StrategyChoice>,
    /// Run seed; drawn from OS entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Upper bound on the number of convergence snapshots.
    #[serde(default = "default_convergence_points")]
    pub convergence_points: usize,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,
}

impl SimulationConfig {
    #[must_use]
    pub fn new(iterations: u64, choices: Vec<StrategyChoice>) -> Self {
        Self {
            iterations,
            choices,
            seed: None,
            convergence_points: DEFAULT_CONVERGENCE_POINTS,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_convergence_points(mut self, points: usize) -> Self {
        self.convergence_points = points;
        self
    }

    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Check the configuration against `matrix`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for zero iterations, zero chunk size or
    /// convergence points, a choice count different from the player count,
    /// an out-of-range fixed strategy, or a distribution of the wrong length.
    pub fn validate(&self, matrix: &PayoffMatrix) -> Result<(), ValidationError> {
        if self.iterations == 0 {
            return Err(ValidationError::ZeroIterations);
        }
        if self.chunk_size == 0 {
            return Err(ValidationError::ZeroParameter {
                field: "chunk_size",
            });
        }
        if self.convergence_points == 0 {
            return Err(ValidationError::ZeroParameter {
                field: "convergence_points",
            });
        }
        if self.choices.len() != matrix.player_count() {
            return Err(ValidationError::ChoiceCount {
                expected: matrix.player_count(),
                found: self.choices.len(),
            });
        }
        for (player, choice) in self.choices.iter().enumerate() {
            let count = matrix.strategy_count(player);
            match choice {
                StrategyChoice::Fixed(strategy) if *strategy >= count => {
                    return Err(ValidationError::StrategyOutOfRange {
                        player,
                        strategy: *strategy,
                        count,
                    });
                }
                StrategyChoice::Mixed(distribution) if distribution.len() != count => {
                    return Err(ValidationError::DistributionLength {
                        player,
                        expected: count,
                        found: distribution.len(),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn chunk_count(&self) -> u64 {
        self.iterations.div_ceil(self.chunk_size)
    }

    fn snapshot_interval(&self) -> u64 {
        let points = u64::try_from(self.convergence_points).unwrap_or(u64::MAX);
        self.iterations.div_ceil(points).max(1)
    }
}

/// Running strategy shares after `iteration` trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvergenceSnapshot {
    pub iteration: u64,
    /// `[player][strategy]` share of trials so far.
    pub strategy_shares: Vec<Vec<f64>>,
}

/// Everything a run reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    /// Trials actually executed.
    pub iterations: u64,
    pub seed: u64,
    /// Counts keyed by `Player: Strategy, ...` labels.
    pub outcomes: BTreeMap<String, u64>,
    /// Counts keyed by `Strategy vs Strategy` labels.
    pub strategy_frequencies: BTreeMap<String, u64>,
    /// Final `[player][strategy]` share of trials.
    pub strategy_shares: Vec<Vec<f64>>,
    pub convergence_data: Vec<ConvergenceSnapshot>,
    /// Mean realized payoff per player.
    pub expected_payoffs: Vec<f64>,
    pub nash_equilibrium: Option<NashEquilibrium>,
    pub dominant_strategies: Option<Vec<String>>,
}

/// Chunks executed so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationProgress {
    pub completed: u64,
    pub total: u64,
}

/// Tally of one chunk. Checkpoints hold chunk-local cumulative counts.
#[derive(Debug, Clone)]
struct ChunkTally {
    trials: u64,
    cells: Vec<u64>,
    strategy_counts: Vec<Vec<u64>>,
    payoff_means: Vec<f64>,
    checkpoints: Vec<(u64, Vec<Vec<u64>>)>,
}

impl ChunkTally {
    fn empty(matrix: &PayoffMatrix) -> Self {
        Self {
            trials: 0,
            cells: vec![0; matrix.profile_count()],
            strategy_counts: (0..matrix.player_count())
                .map(|player| vec![0; matrix.strategy_count(player)])
                .collect(),
            payoff_means: vec![0.0; matrix.player_count()],
            checkpoints: Vec::new(),
        }
    }
}

fn derive_chunk_seed(seed: u64, chunk: u64) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&seed.to_le_bytes()) else {
        return seed.rotate_left(17) ^ chunk;
    };
    mac.update(CHUNK_STREAM_TAG);
    mac.update(&chunk.to_le_bytes());
    let digest = mac.finalize().into_bytes();
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

fn run_chunk(
    matrix: &PayoffMatrix,
    config: &SimulationConfig,
    seed: u64,
    chunk: u64,
    interval: u64,
) -> ChunkTally {
    let start = chunk * config.chunk_size;
    let len = config.chunk_size.min(config.iterations - start);
    let chunk_seed = derive_chunk_seed(seed, chunk);
    log::trace!("chunk {chunk} seeded with {chunk_seed:#018x}");
    let mut rng = SmallRng::seed_from_u64(chunk_seed);

    let mut tally = ChunkTally::empty(matrix);
    let mut profile: Profile = smallvec![0; matrix.player_count()];
    for offset in 0..len {
        for (slot, choice) in profile.iter_mut().zip(&config.choices) {
            *slot = choice.draw(&mut rng);
        }
        let cell = matrix.cell_index(&profile);
        tally.cells[cell] += 1;
        for (counts, &strategy) in tally.strategy_counts.iter_mut().zip(&profile) {
            counts[strategy] += 1;
        }
        tally.trials += 1;
        let n = count_to_f64(tally.trials);
        for (mean, &payoff) in tally.payoff_means.iter_mut().zip(matrix.payoffs_at(cell)) {
            *mean += (payoff - *mean) / n;
        }
        let iteration = start + offset + 1;
        if iteration % interval == 0 {
            tally.checkpoints.push((iteration, tally.strategy_counts.clone()));
        }
    }
    tally
}

/// Tallies merged in chunk order.
#[derive(Debug, Clone)]
struct SimulationTally {
    trials: u64,
    cells: Vec<u64>,
    strategy_counts: Vec<Vec<u64>>,
    payoff_means: Vec<f64>,
    snapshots: Vec<ConvergenceSnapshot>,
}

impl SimulationTally {
    fn new(matrix: &PayoffMatrix) -> Self {
        let empty = ChunkTally::empty(matrix);
        Self {
            trials: 0,
            cells: empty.cells,
            strategy_counts: empty.strategy_counts,
            payoff_means: empty.payoff_means,
            snapshots: Vec::new(),
        }
    }

    fn absorb(&mut self, chunk: ChunkTally) {
        for (iteration, local) in chunk.checkpoints {
            let strategy_shares = self
                .strategy_counts
                .iter()
                .zip(&local)
                .map(|(before, during)| {
                    before
                        .iter()
                        .zip(during)
                        .map(|(a, b)| share(a + b, iteration))
                        .collect()
                })
                .collect();
            self.snapshots.push(ConvergenceSnapshot {
                iteration,
                strategy_shares,
            });
        }

        let merged = self.trials + chunk.trials;
        if merged > 0 {
            let weight = share(chunk.trials, merged);
            for (mean, other) in self.payoff_means.iter_mut().zip(&chunk.payoff_means) {
                *mean += (other - *mean) * weight;
            }
        }
        self.trials = merged;
        for (total, count) in self.cells.iter_mut().zip(&chunk.cells) {
            *total += count;
        }
        for (totals, counts) in self.strategy_counts.iter_mut().zip(&chunk.strategy_counts) {
            for (total, count) in totals.iter_mut().zip(counts) {
                *total += count;
            }
        }
    }

    fn shares(&self) -> Vec<Vec<f64>> {
        self.strategy_counts
            .iter()
            .map(|counts| counts.iter().map(|&c| share(c, self.trials)).collect())
            .collect()
    }

    fn into_result(mut self, matrix: &PayoffMatrix, seed: u64) -> SimulationResult {
        let needs_final = self
            .snapshots
            .last()
            .is_none_or(|snapshot| snapshot.iteration != self.trials);
        if self.trials > 0 && needs_final {
            self.snapshots.push(ConvergenceSnapshot {
                iteration: self.trials,
                strategy_shares: self.shares(),
            });
        }

        let mut outcomes = BTreeMap::new();
        let mut strategy_frequencies = BTreeMap::new();
        for (cell, &count) in self.cells.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let profile = matrix.profile_at(cell);
            *outcomes.entry(matrix.profile_label(&profile)).or_insert(0) += count;
            *strategy_frequencies
                .entry(matrix.pair_label(&profile))
                .or_insert(0) += count;
        }

        let analysis = analyze_dominance(matrix);
        let dominant_strategies = analysis
            .has_dominant_strategies
            .then(|| analysis.dominant_labels());
        let nash_equilibrium = find_pure_nash_equilibrium(matrix);

        SimulationResult {
            iterations: self.trials,
            seed,
            outcomes,
            strategy_frequencies,
            strategy_shares: self.shares(),
            convergence_data: self.snapshots,
            expected_payoffs: self.payoff_means,
            nash_equilibrium,
            dominant_strategies,
        }
    }
}

/// A simulation advanced one chunk at a time.
#[derive(Debug)]
pub struct SimulationRun<'a> {
    matrix: &'a PayoffMatrix,
    config: &'a SimulationConfig,
    seed: u64,
    interval: u64,
    next_chunk: u64,
    chunk_count: u64,
    tally: SimulationTally,
}

impl<'a> SimulationRun<'a> {
    /// Validate `config` and prepare a run.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when `config` does not fit `matrix`.
    pub fn new(matrix: &'a PayoffMatrix, config: &'a SimulationConfig) -> Result<Self, ValidationError> {
        config.validate(matrix)?;
        let seed = config.seed.unwrap_or_else(rand::random);
        Ok(Self {
            matrix,
            config,
            seed,
            interval: config.snapshot_interval(),
            next_chunk: 0,
            chunk_count: config.chunk_count(),
            tally: SimulationTally::new(matrix),
        })
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.next_chunk >= self.chunk_count
    }

    /// Execute the next chunk; `None` once every chunk has run.
    pub fn advance(&mut self) -> Option<SimulationProgress> {
        if self.is_complete() {
            return None;
        }
        let chunk = run_chunk(
            self.matrix,
            self.config,
            self.seed,
            self.next_chunk,
            self.interval,
        );
        self.tally.absorb(chunk);
        self.next_chunk += 1;
        log::debug!(
            "simulation chunk {}/{} done ({} trials)",
            self.next_chunk,
            self.chunk_count,
            self.tally.trials
        );
        Some(SimulationProgress {
            completed: self.next_chunk,
            total: self.chunk_count,
        })
    }

    /// Build the result from the chunks executed so far.
    #[must_use]
    pub fn finish(self) -> SimulationResult {
        self.tally.into_result(self.matrix, self.seed)
    }
}

/// Run every chunk sequentially.
///
/// # Errors
///
/// Returns a [`ValidationError`] when `config` does not fit `matrix`.
pub fn run_simulation(
    matrix: &PayoffMatrix,
    config: &SimulationConfig,
) -> Result<SimulationResult, ValidationError> {
    let mut run = SimulationRun::new(matrix, config)?;
    while run.advance().is_some() {}
    Ok(run.finish())
}

/// Run chunks until `keep_going` returns false, then report what ran.
///
/// # Errors
///
/// Returns a [`ValidationError`] when `config` does not fit `matrix`.
pub fn run_simulation_until<F>(
    matrix: &PayoffMatrix,
    config: &SimulationConfig,
    mut keep_going: F,
) -> Result<SimulationResult, ValidationError>
where
    F: FnMut(&SimulationProgress) -> bool,
{
    let mut run = SimulationRun::new(matrix, config)?;
    while let Some(progress) = run.advance() {
        if !keep_going(&progress) {
            log::debug!(
                "simulation stopped after {}/{} chunks",
                progress.completed,
                progress.total
            );
            break;
        }
    }
    Ok(run.finish())
}

/// Run chunks on the current rayon pool. Produces the same result as
/// [`run_simulation`] for the same seed and chunk size.
///
/// # Errors
///
/// Returns a [`ValidationError`] when `config` does not fit `matrix`.
pub fn run_simulation_parallel(
    matrix: &PayoffMatrix,
    config: &SimulationConfig,
) -> Result<SimulationResult, ValidationError> {
    config.validate(matrix)?;
    let seed = config.seed.unwrap_or_else(rand::random);
    let interval = config.snapshot_interval();
    let chunks: Vec<ChunkTally> = (0..config.chunk_count())
        .into_par_iter()
        .map(|chunk| run_chunk(matrix, config, seed, chunk, interval))
        .collect();
    let mut tally = SimulationTally::new(matrix);
    for chunk in chunks {
        tally.absorb(chunk);
    }
    log::debug!(
        "parallel simulation merged {} trials on {} threads",
        tally.trials,
        rayon::current_num_threads()
    );
    Ok(tally.into_result(matrix, seed))
}

/// Unseeded convenience wrapper around [`run_simulation`].
///
/// # Errors
///
/// Returns a [`ValidationError`] when the choices do not fit `matrix` or
/// `iterations` is zero.
pub fn simulate(
    matrix: &PayoffMatrix,
    iterations: u64,
    choices: Vec<StrategyChoice>,
) -> Result<SimulationResult, ValidationError> {
    run_simulation(matrix, &SimulationConfig::new(iterations, choices))
}
