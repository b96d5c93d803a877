//! Nashlab Analysis Engine
//!
//! Platform-agnostic analysis of finite normal-form games: dominance and
//! iterated elimination, pure Nash equilibria, mixed strategies and Monte
//! Carlo play. This crate has no UI or I/O dependencies; callers supply games
//! as data and render the serializable results themselves.

pub mod catalog;
pub mod constants;
pub mod dominance;
pub mod equilibrium;
pub mod error;
pub mod mixed;
pub mod numbers;
pub mod payoff;
pub mod simulation;

// Re-export commonly used types
pub use catalog::{CatalogEntry, GameCatalog};
pub use dominance::{
    DominanceAnalysis, DominanceKind, DominantStrategyFinding, DominatedStrategyFinding,
    EliminationStep, EliminationTermination, PayoffComparison, ScenarioDifference,
    analyze_dominance, dominance_relation,
};
pub use equilibrium::{
    BestResponse, BestResponseCurve, BestResponsePoint, NashEquilibrium, OpponentPlay,
    best_response, best_response_curve, find_all_pure_nash_equilibria,
    find_pure_nash_equilibrium, is_pure_nash_equilibrium,
};
pub use error::{CatalogError, EngineError, ValidationError};
pub use mixed::{
    IndifferenceSolution, MixedEquilibrium, MixedStrategy, NoInteriorReason, expected_payoffs,
    solve_indifference_mixed_equilibrium,
};
pub use payoff::{GameDefinition, PayoffMatrix, PayoffTensor, Player, Profile, Profiles};
pub use simulation::{
    ConvergenceSnapshot, SimulationConfig, SimulationProgress, SimulationResult, SimulationRun,
    StrategyChoice, run_simulation, run_simulation_parallel, run_simulation_until, simulate,
};

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_CURVE_STEPS;

/// Trait for abstracting where games come from
/// Hosts provide this to feed games from files, stores or the built-in catalog
pub trait GameSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the game registered under `key`
    ///
    /// # Errors
    ///
    /// Returns an error if the game is unknown or cannot be built.
    fn load_game(&self, key: &str) -> Result<PayoffMatrix, Self::Error>;
}

impl GameSource for GameCatalog {
    type Error = CatalogError;

    fn load_game(&self, key: &str) -> Result<PayoffMatrix, Self::Error> {
        self.game(key).cloned()
    }
}

/// Combined static analysis of one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameReport {
    pub dominance: DominanceAnalysis,
    pub nash_equilibrium: Option<NashEquilibrium>,
    pub pure_equilibria: Vec<NashEquilibrium>,
    /// Present only for 2x2 games.
    pub mixed_equilibrium: Option<IndifferenceSolution>,
    /// Present for players of two-player games whose opponent has two strategies.
    pub best_response_curves: Vec<BestResponseCurve>,
}

/// Run every static analysis that applies to `matrix`.
#[must_use]
pub fn analyze_game(matrix: &PayoffMatrix) -> GameReport {
    let pure_equilibria = find_all_pure_nash_equilibria(matrix);
    let mixed_equilibrium = (matrix.shape() == [2, 2])
        .then(|| solve_indifference_mixed_equilibrium(matrix).ok())
        .flatten();
    let best_response_curves = if matrix.player_count() == 2 {
        (0..2)
            .filter_map(|player| best_response_curve(matrix, player, DEFAULT_CURVE_STEPS).ok())
            .collect()
    } else {
        Vec::new()
    };
    GameReport {
        dominance: analyze_dominance(matrix),
        nash_equilibrium: pure_equilibria.first().cloned(),
        pure_equilibria,
        mixed_equilibrium,
        best_response_curves,
    }
}

/// Main engine resolving games from a source and analysing them
pub struct AnalysisEngine<S>
where
    S: GameSource,
{
    source: S,
}

impl<S> AnalysisEngine<S>
where
    S: GameSource,
{
    /// Create a new engine over the provided game source
    pub const fn new(source: S) -> Self {
        Self { source }
    }

    /// Load a game by key
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot provide the game.
    pub fn game(&self, key: &str) -> Result<PayoffMatrix, S::Error> {
        self.source.load_game(key)
    }

    /// Load and analyse a game
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot provide the game.
    pub fn analyze(&self, key: &str) -> Result<GameReport, S::Error> {
        let matrix = self.source.load_game(key)?;
        Ok(analyze_game(&matrix))
    }

    /// Load a game and run a seeded simulation on it
    ///
    /// # Errors
    ///
    /// Returns an error if the game cannot be loaded or the configuration
    /// does not fit it.
    pub fn simulate(
        &self,
        key: &str,
        config: &SimulationConfig,
    ) -> Result<SimulationResult, EngineError<S::Error>> {
        let matrix = self.source.load_game(key).map_err(EngineError::Source)?;
        Ok(run_simulation(&matrix, config)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemorySource {
        games: HashMap<String, PayoffMatrix>,
    }

    impl GameSource for MemorySource {
        type Error = CatalogError;

        fn load_game(&self, key: &str) -> Result<PayoffMatrix, Self::Error> {
            self.games
                .get(key)
                .cloned()
                .ok_or_else(|| CatalogError::UnknownGame {
                    key: key.to_string(),
                })
        }
    }

    fn coordination() -> PayoffMatrix {
        let players = vec![
            Player::new("Row", ["Left", "Right"]),
            Player::new("Column", ["Left", "Right"]),
        ];
        PayoffMatrix::from_fn(players, |p| {
            if p[0] == p[1] {
                vec![1.0, 1.0]
            } else {
                vec![0.0, 0.0]
            }
        })
        .unwrap()
    }

    #[test]
    fn engine_resolves_games_from_any_source() {
        let mut source = MemorySource::default();
        source.games.insert("drive".to_string(), coordination());
        let engine = AnalysisEngine::new(source);

        let report = engine.analyze("drive").unwrap();
        assert_eq!(report.pure_equilibria.len(), 2);
        assert_eq!(
            report.nash_equilibrium.as_ref().map(|e| e.strategies.clone()),
            Some(vec![0, 0])
        );
        let mixed = report.mixed_equilibrium.unwrap();
        let equilibrium = mixed.equilibrium().unwrap();
        assert!((equilibrium.probabilities[0] - 0.5).abs() < 1e-12);
        assert_eq!(report.best_response_curves.len(), 2);

        assert!(matches!(
            engine.analyze("missing"),
            Err(CatalogError::UnknownGame { .. })
        ));
    }

    #[test]
    fn engine_simulation_separates_source_and_validation_errors() {
        let engine = AnalysisEngine::new(GameCatalog::load_from_static());
        let config = SimulationConfig::new(
            200,
            vec![StrategyChoice::Fixed(1), StrategyChoice::Fixed(1)],
        )
        .with_seed(3);
        let result = engine.simulate("prisoners_dilemma", &config).unwrap();
        assert_eq!(result.outcomes["Row: Defect, Column: Defect"], 200);

        assert!(matches!(
            engine.simulate("nope", &config),
            Err(EngineError::Source(CatalogError::UnknownGame { .. }))
        ));
        assert!(matches!(
            engine.simulate("public_goods", &config),
            Err(EngineError::Validation(ValidationError::ChoiceCount { .. }))
        ));
    }

    #[test]
    fn report_skips_two_by_two_extras_for_larger_games() {
        let catalog = GameCatalog::default_catalog();
        let report = analyze_game(catalog.game("public_goods").unwrap());
        assert!(report.mixed_equilibrium.is_none());
        assert!(report.best_response_curves.is_empty());
        assert_eq!(
            report.nash_equilibrium.unwrap().strategy_names,
            vec!["Free-ride", "Free-ride", "Free-ride"]
        );

        let report = analyze_game(catalog.game("rock_paper_scissors").unwrap());
        assert!(report.pure_equilibria.is_empty());
        assert!(report.mixed_equilibrium.is_none());
        assert!(report.best_response_curves.is_empty());
    }
}
