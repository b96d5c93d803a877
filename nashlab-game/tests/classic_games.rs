use nashlab_game::{
    DominanceKind, GameCatalog, IndifferenceSolution, MixedStrategy, NoInteriorReason,
    OpponentPlay, PayoffMatrix, analyze_dominance, analyze_game, best_response, expected_payoffs,
    find_all_pure_nash_equilibria, find_pure_nash_equilibrium,
    solve_indifference_mixed_equilibrium,
};

fn game(key: &str) -> &'static PayoffMatrix {
    GameCatalog::default_catalog()
        .game(key)
        .unwrap_or_else(|err| panic!("catalog game {key}: {err}"))
}

#[test]
fn prisoners_dilemma_is_solved_by_dominance() {
    let matrix = game("prisoners_dilemma");
    let equilibrium = find_pure_nash_equilibrium(matrix).expect("pure equilibrium");
    assert_eq!(equilibrium.strategy_names, vec!["Defect", "Defect"]);
    assert_eq!(equilibrium.payoffs, vec![1.0, 1.0]);

    let analysis = analyze_dominance(matrix);
    assert!(analysis.has_dominant_strategies);
    assert!(
        analysis
            .dominant_strategies
            .iter()
            .all(|d| d.strategy_name == "Defect" && d.kind == DominanceKind::Strict)
    );
    assert!(analysis.is_solved_by_elimination());
}

#[test]
fn battle_of_the_sexes_needs_coordination() {
    let matrix = game("battle_of_the_sexes");
    let analysis = analyze_dominance(matrix);
    assert!(!analysis.has_dominant_strategies);
    assert!(find_pure_nash_equilibrium(matrix).is_some());
    assert_eq!(find_all_pure_nash_equilibria(matrix).len(), 2);

    let solution = solve_indifference_mixed_equilibrium(matrix).unwrap();
    let equilibrium = solution.equilibrium().expect("interior mix");
    // Row mixes to make Column indifferent: 2p = 3(1 - p).
    assert!((equilibrium.probabilities[0] - 0.6).abs() < 1e-12);
    assert!((equilibrium.probabilities[1] - 0.4).abs() < 1e-12);
}

#[test]
fn matching_pennies_only_mixes() {
    let matrix = game("matching_pennies");
    assert!(find_pure_nash_equilibrium(matrix).is_none());
    let report = analyze_game(matrix);
    let equilibrium = report
        .mixed_equilibrium
        .as_ref()
        .and_then(IndifferenceSolution::equilibrium)
        .expect("interior mix");
    assert!((equilibrium.probabilities[0] - 0.5).abs() < 1e-12);
    for curve in &report.best_response_curves {
        assert_eq!(curve.breakpoints.len(), 1);
        assert!((curve.breakpoints[0] - 0.5).abs() < 1e-12);
    }
}

#[test]
fn chicken_has_two_asymmetric_equilibria() {
    let matrix = game("chicken");
    let names: Vec<Vec<String>> = find_all_pure_nash_equilibria(matrix)
        .into_iter()
        .map(|e| e.strategy_names)
        .collect();
    assert_eq!(
        names,
        vec![vec!["Swerve", "Straight"], vec!["Straight", "Swerve"]]
    );
}

#[test]
fn prisoners_dilemma_mix_is_out_of_range() {
    let solution = solve_indifference_mixed_equilibrium(game("prisoners_dilemma")).unwrap();
    assert!(matches!(
        solution,
        IndifferenceSolution::NoInteriorSolution(NoInteriorReason::OutOfRange { .. })
    ));
}

#[test]
fn rock_paper_scissors_uniform_mix_makes_everything_a_best_response() {
    let matrix = game("rock_paper_scissors");
    let uniform = vec![
        MixedStrategy::uniform(3).unwrap(),
        MixedStrategy::uniform(3).unwrap(),
    ];
    let response = best_response(matrix, 0, OpponentPlay::Mixed(&uniform)).unwrap();
    assert_eq!(response.strategies, vec![0, 1, 2]);
    let payoffs = expected_payoffs(matrix, &uniform).unwrap();
    assert!(payoffs.iter().all(|p| p.abs() < 1e-12));
    assert!(!analyze_dominance(matrix).can_simplify_by_elimination);
}

#[test]
fn public_goods_free_riding_dominates_for_three_players() {
    let matrix = game("public_goods");
    let analysis = analyze_dominance(matrix);
    assert_eq!(analysis.dominant_strategies.len(), 3);
    assert!(
        analysis
            .dominant_strategies
            .iter()
            .all(|d| d.strategy_name == "Free-ride" && d.kind == DominanceKind::Strict)
    );
    // Each comparison covers the four combinations of the other two players.
    assert!(
        analysis.dominant_strategies[0].comparisons[0]
            .scenarios
            .iter()
            .all(|s| (s.difference - 0.5).abs() < 1e-12)
    );
    assert_eq!(analysis.dominant_strategies[0].comparisons[0].scenarios.len(), 4);
    assert_eq!(analysis.surviving_strategies, vec![vec![1], vec![1], vec![1]]);

    let equilibrium = find_pure_nash_equilibrium(matrix).unwrap();
    assert_eq!(equilibrium.strategies, vec![1, 1, 1]);
}

#[test]
fn iterated_elimination_game_reduces_to_one_profile() {
    let matrix = game("iterated_elimination");
    let analysis = analyze_dominance(matrix);
    assert!(!analysis.has_dominant_strategies);
    let eliminated: Vec<&str> = analysis
        .elimination_steps
        .iter()
        .map(|s| s.eliminated_name.as_str())
        .collect();
    assert_eq!(eliminated, vec!["Right", "Down", "Left"]);
    assert!(analysis.is_solved_by_elimination());
    assert!(
        analysis
            .recommendations
            .iter()
            .any(|r| r.contains("Row: Up, Column: Center"))
    );
    let equilibrium = find_pure_nash_equilibrium(matrix).unwrap();
    assert_eq!(equilibrium.strategy_names, vec!["Up", "Center"]);
}

#[test]
fn stag_hunt_has_payoff_and_risk_dominant_equilibria() {
    let matrix = game("stag_hunt");
    let equilibria: Vec<Vec<usize>> = find_all_pure_nash_equilibria(matrix)
        .into_iter()
        .map(|e| e.strategies)
        .collect();
    assert_eq!(equilibria, vec![vec![0, 0], vec![1, 1]]);
}

fn scaled(matrix: &PayoffMatrix, factor: f64) -> PayoffMatrix {
    PayoffMatrix::from_fn(matrix.players().to_vec(), |profile| {
        let payoffs = matrix.payoff_of(profile).unwrap();
        payoffs.iter().map(|payoff| payoff * factor).collect()
    })
    .unwrap()
}

#[test]
fn uniform_scaling_keeps_the_dilemma_analysis() {
    let base = game("prisoners_dilemma");
    let expected = analyze_game(base);
    for factor in [1e-10, 1e10] {
        let matrix = scaled(base, factor);
        let report = analyze_game(&matrix);
        let dominance = &report.dominance;

        assert_eq!(dominance.dominant_labels(), vec!["Row: Defect", "Column: Defect"]);
        assert!(
            dominance
                .dominant_strategies
                .iter()
                .all(|d| d.kind == DominanceKind::Strict),
            "factor {factor}"
        );
        assert_eq!(dominance.recommendations, expected.dominance.recommendations);
        assert_eq!(dominance.surviving_strategies, vec![vec![1], vec![1]]);

        let equilibrium = report.nash_equilibrium.expect("pure equilibrium");
        assert_eq!(equilibrium.strategy_names, vec!["Defect", "Defect"]);
        assert_eq!(report.pure_equilibria.len(), 1);
        assert!(matches!(
            report.mixed_equilibrium,
            Some(IndifferenceSolution::NoInteriorSolution(NoInteriorReason::OutOfRange {
                player: 0,
                ..
            }))
        ));
        for curve in &report.best_response_curves {
            assert!(curve.breakpoints.is_empty());
            assert!(curve.points.iter().all(|p| p.strategies == vec![1]));
        }
    }
}

#[test]
fn uniform_scaling_keeps_the_coordination_mix() {
    let base = game("battle_of_the_sexes");
    for factor in [1e-10, 1e10] {
        let matrix = scaled(base, factor);
        assert_eq!(find_all_pure_nash_equilibria(&matrix).len(), 2);

        let solution = solve_indifference_mixed_equilibrium(&matrix).unwrap();
        let equilibrium = solution.equilibrium().expect("interior mix");
        assert!((equilibrium.probabilities[0] - 0.6).abs() < 1e-9, "factor {factor}");
        assert!((equilibrium.probabilities[1] - 0.4).abs() < 1e-9, "factor {factor}");

        let column = OpponentPlay::Mixed(&equilibrium.distributions);
        let response = best_response(&matrix, 0, column).unwrap();
        assert_eq!(response.strategies, vec![0, 1]);
    }
}
