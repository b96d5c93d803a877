use anyhow::{Context, Result, ensure};
use nashlab_game::numbers::count_to_f64;
use nashlab_game::{
    DominanceKind, IndifferenceSolution, MixedStrategy, OpponentPlay, PayoffMatrix,
    SimulationConfig, StrategyChoice, analyze_dominance, best_response, expected_payoffs,
    find_all_pure_nash_equilibria, find_pure_nash_equilibrium, is_pure_nash_equilibrium,
    run_simulation, run_simulation_parallel, run_simulation_until,
    solve_indifference_mixed_equilibrium,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Standard errors allowed between an observed share and its target.
const SAMPLING_SIGMAS: f64 = 5.0;
const SAMPLING_FLOOR: f64 = 0.01;

/// Everything a scenario check may look at.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioCtx<'a> {
    pub matrix: &'a PayoffMatrix,
    pub choices: &'a [StrategyChoice],
    pub trials: u64,
    pub seed: u64,
}

impl ScenarioCtx<'_> {
    fn config(&self) -> SimulationConfig {
        SimulationConfig::new(self.trials, self.choices.to_vec()).with_seed(self.seed)
    }
}

pub type ScenarioCheck = fn(&ScenarioCtx<'_>) -> Result<()>;

#[derive(Clone, Copy)]
pub struct TestScenario {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    check: ScenarioCheck,
}

impl std::fmt::Debug for TestScenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestScenario")
            .field("key", &self.key)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl TestScenario {
    const fn new(
        key: &'static str,
        name: &'static str,
        description: &'static str,
        check: ScenarioCheck,
    ) -> Self {
        Self {
            key,
            name,
            description,
            check,
        }
    }

    /// # Errors
    ///
    /// Returns the first violated expectation.
    pub fn run(&self, ctx: &ScenarioCtx<'_>) -> Result<()> {
        (self.check)(ctx)
    }
}

pub fn catalog_scenarios() -> Vec<TestScenario> {
    vec![
        TestScenario::new(
            "determinism",
            "Deterministic Simulation",
            "Same seed and chunk size reproduce the identical result",
            determinism_expectation,
        ),
        TestScenario::new(
            "frequency-totals",
            "Frequency Totals",
            "Outcome and strategy-pair counts each sum to the trial count",
            frequency_totals_expectation,
        ),
        TestScenario::new(
            "fixed-profile",
            "Fixed Profile Concentration",
            "All-fixed choices produce a single outcome with the pure payoffs",
            fixed_profile_expectation,
        ),
        TestScenario::new(
            "sampling-rates",
            "Sampling Rates",
            "Observed strategy shares stay within tolerance of the configured mix",
            sampling_rates_expectation,
        ),
        TestScenario::new(
            "dominance-consistency",
            "Dominance Consistency",
            "Dominant strategies are never dominated and elimination removes one strategy per step",
            dominance_consistency_expectation,
        ),
        TestScenario::new(
            "equilibrium-consistency",
            "Equilibrium Consistency",
            "Every reported equilibrium is a mutual best response",
            equilibrium_consistency_expectation,
        ),
        TestScenario::new(
            "pure-expectation",
            "Point-Mass Expectation",
            "Expected payoffs under point masses equal the pure payoff lookup",
            pure_expectation_expectation,
        ),
        TestScenario::new(
            "mixed-indifference",
            "Mixed Indifference",
            "An interior 2x2 mixed equilibrium leaves both players indifferent",
            mixed_indifference_expectation,
        ),
        TestScenario::new(
            "parallel-parity",
            "Parallel Parity",
            "Parallel chunk execution matches the sequential run",
            parallel_parity_expectation,
        ),
        TestScenario::new(
            "cancellation-prefix",
            "Cancellation Prefix",
            "Stopping between chunks reports exactly the trials executed",
            cancellation_prefix_expectation,
        ),
    ]
}

pub fn find_scenario(key: &str) -> Option<TestScenario> {
    catalog_scenarios()
        .into_iter()
        .find(|scenario| scenario.key == key || scenario.name.eq_ignore_ascii_case(key))
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    catalog_scenarios()
        .into_iter()
        .map(|scenario| (scenario.key, scenario.description))
        .collect()
}

/// Expand `all` into every scenario key, keeping explicit entries in order.
pub fn expand_scenarios(requested: &[String]) -> Vec<String> {
    let mut scenarios: Vec<String> = requested.iter().filter(|s| *s != "all").cloned().collect();
    if requested.iter().any(|s| s == "all") {
        for scenario in catalog_scenarios() {
            if !scenarios.iter().any(|s| s == scenario.key) {
                scenarios.push(scenario.key.to_string());
            }
        }
    }
    scenarios
}

fn determinism_expectation(ctx: &ScenarioCtx<'_>) -> Result<()> {
    let config = ctx.config();
    let first = run_simulation(ctx.matrix, &config)?;
    let second = run_simulation(ctx.matrix, &config)?;
    ensure!(first == second, "seed {} produced two different results", ctx.seed);
    Ok(())
}

fn frequency_totals_expectation(ctx: &ScenarioCtx<'_>) -> Result<()> {
    let result = run_simulation(ctx.matrix, &ctx.config())?;
    let outcomes: u64 = result.outcomes.values().sum();
    let pairs: u64 = result.strategy_frequencies.values().sum();
    ensure!(
        outcomes == ctx.trials,
        "outcome counts sum to {outcomes}, expected {}",
        ctx.trials
    );
    ensure!(
        pairs == ctx.trials,
        "strategy-pair counts sum to {pairs}, expected {}",
        ctx.trials
    );
    for (player, shares) in result.strategy_shares.iter().enumerate() {
        let total: f64 = shares.iter().sum();
        ensure!(
            (total - 1.0).abs() < 1e-9,
            "shares for {} sum to {total}",
            ctx.matrix.player_name(player)
        );
    }
    Ok(())
}

fn fixed_profile_expectation(ctx: &ScenarioCtx<'_>) -> Result<()> {
    let mut rng = ChaCha20Rng::seed_from_u64(ctx.seed);
    let profile: Vec<usize> = (0..ctx.matrix.player_count())
        .map(|player| rng.gen_range(0..ctx.matrix.strategy_count(player)))
        .collect();
    let choices = profile.iter().copied().map(StrategyChoice::Fixed).collect();
    let config = SimulationConfig::new(ctx.trials, choices).with_seed(ctx.seed);
    let result = run_simulation(ctx.matrix, &config)?;

    let label = ctx.matrix.profile_label(&profile);
    ensure!(
        result.outcomes.len() == 1,
        "expected only '{label}', saw {} outcomes",
        result.outcomes.len()
    );
    let count = result.outcomes.get(&label).copied().unwrap_or(0);
    ensure!(count == ctx.trials, "'{label}' occurred {count} times");
    let payoffs = ctx.matrix.payoff_of(&profile)?;
    ensure!(
        result
            .expected_payoffs
            .iter()
            .zip(payoffs)
            .all(|(a, b)| (a - b).abs() < 1e-9),
        "average payoffs {:?} differ from {payoffs:?}",
        result.expected_payoffs
    );
    Ok(())
}

fn sampling_rates_expectation(ctx: &ScenarioCtx<'_>) -> Result<()> {
    let result = run_simulation(ctx.matrix, &ctx.config())?;
    let n = count_to_f64(ctx.trials);
    for (player, choice) in ctx.choices.iter().enumerate() {
        let target = choice.to_distribution(ctx.matrix, player)?;
        for (strategy, &expected) in target.probabilities().iter().enumerate() {
            let observed = result.strategy_shares[player][strategy];
            let tolerance =
                (SAMPLING_SIGMAS * (expected * (1.0 - expected) / n).sqrt()).max(SAMPLING_FLOOR);
            ensure!(
                (observed - expected).abs() <= tolerance,
                "{} drifted: observed {observed:.4}, expected {expected:.4} (±{tolerance:.4})",
                ctx.matrix.choice_label(player, strategy)
            );
        }
    }
    Ok(())
}

fn dominance_consistency_expectation(ctx: &ScenarioCtx<'_>) -> Result<()> {
    let analysis = analyze_dominance(ctx.matrix);
    for dominant in &analysis.dominant_strategies {
        ensure!(
            !analysis
                .dominated_strategies
                .iter()
                .any(|d| d.player == dominant.player && d.strategy == dominant.strategy),
            "{} is both dominant and dominated",
            ctx.matrix.choice_label(dominant.player, dominant.strategy)
        );
    }

    let mut remaining = ctx.matrix.total_strategies();
    for step in &analysis.elimination_steps {
        let total: usize = step.remaining_strategies.iter().map(Vec::len).sum();
        ensure!(
            total + 1 == remaining,
            "eliminating {} changed the strategy count from {remaining} to {total}",
            step.eliminated_name
        );
        ensure!(
            step.remaining_strategies.iter().all(|set| !set.is_empty()),
            "elimination emptied a player"
        );
        remaining = total;
    }

    let strict: Vec<usize> = (0..ctx.matrix.player_count())
        .filter_map(|player| {
            analysis
                .dominant_strategies
                .iter()
                .find(|d| d.player == player && d.kind == DominanceKind::Strict)
                .map(|d| d.strategy)
        })
        .collect();
    if strict.len() == ctx.matrix.player_count() {
        ensure!(
            is_pure_nash_equilibrium(ctx.matrix, &strict)?,
            "strictly dominant profile {} is not an equilibrium",
            ctx.matrix.profile_label(&strict)
        );
    }
    Ok(())
}

fn equilibrium_consistency_expectation(ctx: &ScenarioCtx<'_>) -> Result<()> {
    let all = find_all_pure_nash_equilibria(ctx.matrix);
    ensure!(
        find_pure_nash_equilibrium(ctx.matrix) == all.first().cloned(),
        "first equilibrium disagrees with the full enumeration"
    );
    for equilibrium in &all {
        for player in 0..ctx.matrix.player_count() {
            let response = best_response(
                ctx.matrix,
                player,
                OpponentPlay::Pure(&equilibrium.strategies),
            )?;
            ensure!(
                response.contains(equilibrium.strategies[player]),
                "{} is not a best response in {}",
                ctx.matrix
                    .choice_label(player, equilibrium.strategies[player]),
                equilibrium.label(ctx.matrix)
            );
        }
    }
    Ok(())
}

fn pure_expectation_expectation(ctx: &ScenarioCtx<'_>) -> Result<()> {
    for profile in ctx.matrix.profiles() {
        let distributions = profile
            .iter()
            .enumerate()
            .map(|(player, &strategy)| {
                MixedStrategy::pure(ctx.matrix.strategy_count(player), strategy)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let expected = expected_payoffs(ctx.matrix, &distributions)?;
        let pure = ctx.matrix.payoff_of(&profile)?;
        ensure!(
            expected.iter().zip(pure).all(|(a, b)| (a - b).abs() < 1e-12),
            "point masses at {} give {expected:?}, lookup gives {pure:?}",
            ctx.matrix.profile_label(&profile)
        );
    }
    Ok(())
}

fn mixed_indifference_expectation(ctx: &ScenarioCtx<'_>) -> Result<()> {
    if ctx.matrix.shape() != [2, 2] {
        log::debug!("mixed-indifference skipped for a non-2x2 game");
        return Ok(());
    }
    let solution = solve_indifference_mixed_equilibrium(ctx.matrix)?;
    let IndifferenceSolution::Interior(equilibrium) = solution else {
        return Ok(());
    };
    for player in 0..2 {
        let probability = equilibrium.probabilities[player];
        ensure!(
            probability > 0.0 && probability < 1.0,
            "probability {probability} for {} is not interior",
            ctx.matrix.player_name(player)
        );
        let response = best_response(
            ctx.matrix,
            player,
            OpponentPlay::Mixed(&equilibrium.distributions),
        )?;
        ensure!(
            response.strategies == [0, 1],
            "{} is not indifferent at the mixed equilibrium",
            ctx.matrix.player_name(player)
        );
    }
    let recomputed = expected_payoffs(ctx.matrix, &equilibrium.distributions)?;
    ensure!(
        recomputed
            .iter()
            .zip(&equilibrium.expected_payoffs)
            .all(|(a, b)| (a - b).abs() < 1e-12),
        "reported equilibrium payoffs are stale"
    );
    Ok(())
}

fn parallel_parity_expectation(ctx: &ScenarioCtx<'_>) -> Result<()> {
    let config = ctx.config().with_chunk_size(chunk_size_for(ctx.trials));
    let sequential = run_simulation(ctx.matrix, &config)?;
    let parallel = run_simulation_parallel(ctx.matrix, &config)?;
    ensure!(
        sequential == parallel,
        "parallel run diverged from the sequential run"
    );
    Ok(())
}

fn cancellation_prefix_expectation(ctx: &ScenarioCtx<'_>) -> Result<()> {
    let chunk_size = chunk_size_for(ctx.trials);
    let config = ctx.config().with_chunk_size(chunk_size);
    let chunks = ctx.trials.div_ceil(chunk_size);
    let stop_after = (chunks / 2).max(1);
    let partial = run_simulation_until(ctx.matrix, &config, |progress| {
        progress.completed < stop_after
    })?;
    let expected = (stop_after * chunk_size).min(ctx.trials);
    ensure!(
        partial.iterations == expected,
        "stopped run reports {} trials, expected {expected}",
        partial.iterations
    );
    let counted: u64 = partial.outcomes.values().sum();
    ensure!(counted == expected, "stopped run counted {counted} trials");
    let last = partial
        .convergence_data
        .last()
        .context("stopped run has no convergence data")?;
    ensure!(
        last.iteration == expected,
        "last snapshot at {} instead of {expected}",
        last.iteration
    );
    Ok(())
}

/// Roughly eight chunks per run so chunk boundaries are exercised.
fn chunk_size_for(trials: u64) -> u64 {
    trials.div_ceil(8).max(1)
}
