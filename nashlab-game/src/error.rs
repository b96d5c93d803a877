//! Error taxonomy for the analysis engine.
//!
//! `ValidationError` is the only failure the engine raises. Degenerate
//! outcomes (no equilibrium, no interior solution) are modelled in result
//! types instead.
use thiserror::Error;

/// Raised when an input violates a structural or numeric invariant.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("a game needs at least {min} players (got {found})")]
    TooFewPlayers { min: usize, found: usize },
    #[error("player {player} has no strategies")]
    NoStrategies { player: usize },
    #[error("payoff tensor depth {depth} does not match player count {players}")]
    TensorDepth { depth: usize, players: usize },
    #[error("payoff tensor axis {axis} has {found} entries, expected {expected}")]
    AxisLength {
        axis: usize,
        expected: usize,
        found: usize,
    },
    #[error("payoff vector at {cell:?} has {found} entries, expected {expected}")]
    PayoffArity {
        cell: Vec<usize>,
        expected: usize,
        found: usize,
    },
    #[error("payoff at {cell:?} for player {player} is not finite")]
    NonFinitePayoff { cell: Vec<usize>, player: usize },
    #[error("profile has {found} choices, expected {expected}")]
    ProfileLength { expected: usize, found: usize },
    #[error("player {player} is out of range ({count} players)")]
    PlayerOutOfRange { player: usize, count: usize },
    #[error("strategy {strategy} is out of range for player {player} ({count} strategies)")]
    StrategyOutOfRange {
        player: usize,
        strategy: usize,
        count: usize,
    },
    #[error("point mass on strategy {strategy} is out of range ({count} strategies)")]
    PointMassOutOfRange { strategy: usize, count: usize },
    #[error("restriction leaves player {player} without strategies")]
    EmptyRestriction { player: usize },
    #[error("probabilities sum to {sum:.6}, expected 1 within {tolerance:e}")]
    ProbabilitySum { sum: f64, tolerance: f64 },
    #[error("probability {value} at index {index} is negative or not finite")]
    InvalidProbability { index: usize, value: f64 },
    #[error("weights must have a positive finite sum (got {sum})")]
    DegenerateWeights { sum: f64 },
    #[error("distribution for player {player} has {found} entries, expected {expected}")]
    DistributionLength {
        player: usize,
        expected: usize,
        found: usize,
    },
    #[error("{found} choices supplied for {expected} players")]
    ChoiceCount { expected: usize, found: usize },
    #[error("iteration count must be positive")]
    ZeroIterations,
    #[error("{field} must be positive")]
    ZeroParameter { field: &'static str },
    #[error("operation requires a {expected} (got {found})")]
    UnsupportedShape {
        expected: &'static str,
        found: String,
    },
}

/// Errors raised while resolving games from a [`crate::GameSource`].
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("unknown game '{key}'")]
    UnknownGame { key: String },
    #[error("game catalog could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failures of [`crate::AnalysisEngine`] operations that both load and run.
#[derive(Debug, Error)]
pub enum EngineError<E>
where
    E: std::error::Error + 'static,
{
    #[error("game source failed: {0}")]
    Source(#[source] E),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_structured_fields() {
        let err = ValidationError::AxisLength {
            axis: 1,
            expected: 2,
            found: 3,
        };
        assert_eq!(
            err.to_string(),
            "payoff tensor axis 1 has 3 entries, expected 2"
        );

        let err = ValidationError::PayoffArity {
            cell: vec![0, 1],
            expected: 2,
            found: 1,
        };
        assert!(err.to_string().contains("[0, 1]"));
    }

    #[test]
    fn catalog_error_names_key() {
        let err = CatalogError::UnknownGame {
            key: "snowdrift".to_string(),
        };
        assert_eq!(err.to_string(), "unknown game 'snowdrift'");
    }
}
