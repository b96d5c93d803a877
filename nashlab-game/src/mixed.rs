//! Mixed strategies: validated distributions, expected payoffs, and the
//! indifference equilibrium of 2x2 games.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{PROBABILITY_TOLERANCE, RELATIVE_TOLERANCE};
use crate::error::ValidationError;
use crate::payoff::PayoffMatrix;

/// Probability distribution over one player's strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct MixedStrategy(Vec<f64>);

impl MixedStrategy {
    /// Wrap probabilities that already sum to 1.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for an empty vector, negative or
    /// non-finite entries, or a sum further than 1e-6 from 1.
    pub fn new(probabilities: Vec<f64>) -> Result<Self, ValidationError> {
        check_entries(&probabilities)?;
        let sum: f64 = probabilities.iter().sum();
        if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(ValidationError::ProbabilitySum {
                sum,
                tolerance: PROBABILITY_TOLERANCE,
            });
        }
        Ok(Self(probabilities))
    }

    /// Rescale non-negative weights so they sum to 1.
    ///
    /// This is the only place the engine normalizes on the caller's behalf.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for negative or non-finite weights, or
    /// when the weights do not have a positive sum.
    pub fn normalized(weights: Vec<f64>) -> Result<Self, ValidationError> {
        check_entries(&weights)?;
        let sum: f64 = weights.iter().sum();
        if !(sum.is_finite() && sum > 0.0) {
            return Err(ValidationError::DegenerateWeights { sum });
        }
        Ok(Self(weights.into_iter().map(|w| w / sum).collect()))
    }

    /// Point mass on `strategy` out of `count` strategies.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::PointMassOutOfRange`] when `strategy >= count`.
    pub fn pure(count: usize, strategy: usize) -> Result<Self, ValidationError> {
        if strategy >= count {
            return Err(ValidationError::PointMassOutOfRange { strategy, count });
        }
        let mut probabilities = vec![0.0; count];
        probabilities[strategy] = 1.0;
        Ok(Self(probabilities))
    }

    /// Uniform distribution over `count` strategies.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ZeroParameter`] when `count` is zero.
    pub fn uniform(count: usize) -> Result<Self, ValidationError> {
        if count == 0 {
            return Err(ValidationError::ZeroParameter { field: "count" });
        }
        let weight = 1.0 / crate::numbers::usize_to_f64(count);
        Ok(Self(vec![weight; count]))
    }

    #[must_use]
    pub fn probabilities(&self) -> &[f64] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn probability(&self, strategy: usize) -> f64 {
        self.0.get(strategy).copied().unwrap_or(0.0)
    }

    /// Draw a strategy index with one uniform roll.
    pub fn sample<R>(&self, rng: &mut R) -> usize
    where
        R: Rng + ?Sized,
    {
        let mut roll = rng.gen_range(0.0..1.0);
        let mut last_positive = 0;
        for (index, &weight) in self.0.iter().enumerate() {
            if weight <= 0.0 {
                continue;
            }
            if roll < weight {
                return index;
            }
            roll -= weight;
            last_positive = index;
        }
        // Rounding can leave a sliver past the final weight.
        last_positive
    }
}

impl TryFrom<Vec<f64>> for MixedStrategy {
    type Error = ValidationError;

    fn try_from(probabilities: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(probabilities)
    }
}

impl From<MixedStrategy> for Vec<f64> {
    fn from(strategy: MixedStrategy) -> Self {
        strategy.0
    }
}

fn check_entries(values: &[f64]) -> Result<(), ValidationError> {
    if values.is_empty() {
        return Err(ValidationError::ZeroParameter {
            field: "distribution length",
        });
    }
    if let Some((index, &value)) = values
        .iter()
        .enumerate()
        .find(|(_, v)| !v.is_finite() || **v < 0.0)
    {
        return Err(ValidationError::InvalidProbability { index, value });
    }
    Ok(())
}

/// Check that `distributions` holds one correctly sized entry per player.
///
/// # Errors
///
/// Returns a [`ValidationError`] on a count or length mismatch.
pub fn check_distributions(
    matrix: &PayoffMatrix,
    distributions: &[MixedStrategy],
) -> Result<(), ValidationError> {
    if distributions.len() != matrix.player_count() {
        return Err(ValidationError::ChoiceCount {
            expected: matrix.player_count(),
            found: distributions.len(),
        });
    }
    for (player, distribution) in distributions.iter().enumerate() {
        let expected = matrix.strategy_count(player);
        if distribution.len() != expected {
            return Err(ValidationError::DistributionLength {
                player,
                expected,
                found: distribution.len(),
            });
        }
    }
    Ok(())
}

/// Each player's expected payoff when everyone mixes independently.
///
/// # Errors
///
/// Returns a [`ValidationError`] when the distributions do not match the
/// matrix shape.
pub fn expected_payoffs(
    matrix: &PayoffMatrix,
    distributions: &[MixedStrategy],
) -> Result<Vec<f64>, ValidationError> {
    check_distributions(matrix, distributions)?;
    let mut totals = vec![0.0; matrix.player_count()];
    for profile in matrix.profiles() {
        let weight = profile_weight(distributions, &profile, None);
        if weight == 0.0 {
            continue;
        }
        for (total, payoff) in totals.iter_mut().zip(matrix.payoffs(&profile)) {
            *total += weight * payoff;
        }
    }
    Ok(totals)
}

/// Expected payoff of each of `player`'s pure strategies against the other
/// players' distributions. `player`'s own entry is ignored.
pub(crate) fn strategy_values(
    matrix: &PayoffMatrix,
    player: usize,
    distributions: &[MixedStrategy],
) -> Vec<f64> {
    let mut values = vec![0.0; matrix.strategy_count(player)];
    for mut profile in matrix.opponent_profiles(player) {
        let weight = profile_weight(distributions, &profile, Some(player));
        if weight == 0.0 {
            continue;
        }
        for (strategy, value) in values.iter_mut().enumerate() {
            profile[player] = strategy;
            *value += weight * matrix.payoff(&profile, player);
        }
    }
    values
}

fn profile_weight(distributions: &[MixedStrategy], profile: &[usize], skip: Option<usize>) -> f64 {
    profile
        .iter()
        .enumerate()
        .filter(|(player, _)| Some(*player) != skip)
        .map(|(player, &strategy)| distributions[player].probability(strategy))
        .product()
}

/// Interior mixed equilibrium of a 2x2 game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixedEquilibrium {
    /// Probability each player assigns to their first strategy.
    pub probabilities: [f64; 2],
    pub distributions: Vec<MixedStrategy>,
    pub expected_payoffs: Vec<f64>,
}

/// Why the indifference equations have no interior solution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum NoInteriorReason {
    /// The opponent's payoff differences cancel, so `player` cannot make
    /// them indifferent.
    Degenerate { player: usize },
    /// The indifference probability for `player` lies outside (0, 1).
    OutOfRange { player: usize, probability: f64 },
}

/// Outcome of [`solve_indifference_mixed_equilibrium`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum IndifferenceSolution {
    Interior(MixedEquilibrium),
    NoInteriorSolution(NoInteriorReason),
}

impl IndifferenceSolution {
    #[must_use]
    pub const fn equilibrium(&self) -> Option<&MixedEquilibrium> {
        match self {
            Self::Interior(equilibrium) => Some(equilibrium),
            Self::NoInteriorSolution(_) => None,
        }
    }
}

/// Solve the indifference conditions of a 2x2 game.
///
/// The row player's probability `p` on their first strategy makes the column
/// player indifferent between columns; `q` for the column player makes the
/// row player indifferent between rows.
///
/// # Errors
///
/// Returns [`ValidationError::UnsupportedShape`] unless the game has two
/// players with two strategies each.
pub fn solve_indifference_mixed_equilibrium(
    matrix: &PayoffMatrix,
) -> Result<IndifferenceSolution, ValidationError> {
    if matrix.shape() != [2, 2] {
        return Err(ValidationError::UnsupportedShape {
            expected: "2x2 game",
            found: shape_label(matrix.shape()),
        });
    }
    let row = |r: usize, c: usize| matrix.payoff(&[r, c], 0);
    let column = |r: usize, c: usize| matrix.payoff(&[r, c], 1);
    let tolerance = matrix.payoff_tolerance();

    let p = match indifference_probability(
        column(0, 0) - column(1, 0) - column(0, 1) + column(1, 1),
        column(1, 1) - column(1, 0),
        0,
        tolerance,
    ) {
        Ok(p) => p,
        Err(reason) => return Ok(IndifferenceSolution::NoInteriorSolution(reason)),
    };
    let q = match indifference_probability(
        row(0, 0) - row(0, 1) - row(1, 0) + row(1, 1),
        row(1, 1) - row(0, 1),
        1,
        tolerance,
    ) {
        Ok(q) => q,
        Err(reason) => return Ok(IndifferenceSolution::NoInteriorSolution(reason)),
    };

    let distributions = vec![
        MixedStrategy(vec![p, 1.0 - p]),
        MixedStrategy(vec![q, 1.0 - q]),
    ];
    let expected_payoffs = expected_payoffs(matrix, &distributions)?;
    Ok(IndifferenceSolution::Interior(MixedEquilibrium {
        probabilities: [p, q],
        distributions,
        expected_payoffs,
    }))
}

fn indifference_probability(
    denominator: f64,
    numerator: f64,
    player: usize,
    tolerance: f64,
) -> Result<f64, NoInteriorReason> {
    if denominator.abs() <= tolerance {
        return Err(NoInteriorReason::Degenerate { player });
    }
    let probability = numerator / denominator;
    if probability <= RELATIVE_TOLERANCE || probability >= 1.0 - RELATIVE_TOLERANCE {
        return Err(NoInteriorReason::OutOfRange {
            player,
            probability,
        });
    }
    Ok(probability)
}

pub(crate) fn shape_label(shape: &[usize]) -> String {
    shape
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("x")
}
