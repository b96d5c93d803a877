use nashlab_game::{
    GameCatalog, MixedStrategy, PayoffMatrix, SimulationConfig, StrategyChoice, expected_payoffs,
    run_simulation, run_simulation_parallel, run_simulation_until,
};
use std::convert::TryFrom;

const SAMPLE_SIZE: u64 = 20_000;
const TOLERANCE: f64 = 0.025;

fn game(key: &str) -> &'static PayoffMatrix {
    GameCatalog::default_catalog().game(key).expect("catalog game")
}

fn mixed(probabilities: &[f64]) -> StrategyChoice {
    StrategyChoice::Mixed(MixedStrategy::new(probabilities.to_vec()).expect("valid mix"))
}

#[test]
fn strategy_shares_track_mixing_weights() {
    let config = SimulationConfig::new(SAMPLE_SIZE, vec![mixed(&[0.3, 0.7]), mixed(&[0.8, 0.2])])
        .with_seed(0xACED);
    let result = run_simulation(game("battle_of_the_sexes"), &config).unwrap();

    assert!(
        (result.strategy_shares[0][0] - 0.3).abs() <= TOLERANCE,
        "row share drifted: {:.4}",
        result.strategy_shares[0][0]
    );
    assert!(
        (result.strategy_shares[1][0] - 0.8).abs() <= TOLERANCE,
        "column share drifted: {:.4}",
        result.strategy_shares[1][0]
    );

    let total = f64::from(u32::try_from(SAMPLE_SIZE).expect("sample size fits"));
    let both_opera = f64::from(
        u32::try_from(result.strategy_frequencies["Opera vs Opera"]).expect("count fits"),
    ) / total;
    assert!((both_opera - 0.24).abs() <= TOLERANCE, "joint rate {both_opera:.4}");
}

#[test]
fn realized_payoffs_approach_expected_payoffs() {
    let row = MixedStrategy::new(vec![0.5, 0.5]).unwrap();
    let column = MixedStrategy::new(vec![0.25, 0.75]).unwrap();
    let matrix = game("prisoners_dilemma");
    let theory = expected_payoffs(matrix, &[row.clone(), column.clone()]).unwrap();

    let config = SimulationConfig::new(
        SAMPLE_SIZE,
        vec![StrategyChoice::Mixed(row), StrategyChoice::Mixed(column)],
    )
    .with_seed(99);
    let result = run_simulation(matrix, &config).unwrap();
    for (observed, expected) in result.expected_payoffs.iter().zip(&theory) {
        assert!(
            (observed - expected).abs() <= 0.1,
            "payoff drifted: observed {observed:.4}, expected {expected:.4}"
        );
    }
}

#[test]
fn every_trial_is_counted_once() {
    for iterations in [1, 7, 1_023, 1_024, 1_025, 5_000] {
        let config = SimulationConfig::new(iterations, vec![mixed(&[0.5, 0.5]); 3])
            .with_seed(iterations);
        let result = run_simulation(game("public_goods"), &config).unwrap();
        assert_eq!(result.iterations, iterations);
        assert_eq!(result.outcomes.values().sum::<u64>(), iterations);
        assert_eq!(result.strategy_frequencies.values().sum::<u64>(), iterations);
        assert_eq!(
            result.convergence_data.last().map(|s| s.iteration),
            Some(iterations)
        );
    }
}

#[test]
fn fixed_profile_yields_single_outcome() {
    let config = SimulationConfig::new(
        SAMPLE_SIZE,
        vec![StrategyChoice::Fixed(1), StrategyChoice::Fixed(2)],
    )
    .with_seed(5);
    let result = run_simulation(game("rock_paper_scissors"), &config).unwrap();
    assert_eq!(result.outcomes.len(), 1);
    assert_eq!(result.outcomes["Row: Paper, Column: Scissors"], SAMPLE_SIZE);
    assert_eq!(result.expected_payoffs, vec![-1.0, 1.0]);
    assert!(result.nash_equilibrium.is_none());
    assert!(result.dominant_strategies.is_none());
}

#[test]
fn parallel_run_matches_sequential_run() {
    let config = SimulationConfig::new(SAMPLE_SIZE, vec![mixed(&[0.2, 0.3, 0.5]), mixed(&[0.6, 0.2, 0.2])])
        .with_seed(2024)
        .with_chunk_size(512);
    let matrix = game("rock_paper_scissors");
    let sequential = run_simulation(matrix, &config).unwrap();
    let parallel = run_simulation_parallel(matrix, &config).unwrap();
    assert_eq!(sequential, parallel);
}

#[test]
fn cancelled_run_is_a_prefix_of_the_full_run() {
    let config = SimulationConfig::new(10_000, vec![mixed(&[0.5, 0.5]), mixed(&[0.5, 0.5])])
        .with_seed(11)
        .with_chunk_size(1_000)
        .with_convergence_points(10);
    let matrix = game("stag_hunt");
    let full = run_simulation(matrix, &config).unwrap();
    let partial = run_simulation_until(matrix, &config, |progress| progress.completed < 4).unwrap();

    assert_eq!(partial.iterations, 4_000);
    assert_eq!(partial.outcomes.values().sum::<u64>(), 4_000);
    assert_eq!(partial.convergence_data[..], full.convergence_data[..4]);
}
