//! Pure Nash equilibria, best responses and 2x2 best-response curves.
use serde::{Deserialize, Serialize};
use smallvec::smallvec;

use crate::constants::RELATIVE_TOLERANCE;
use crate::error::ValidationError;
use crate::mixed::{self, MixedStrategy};
use crate::numbers::usize_to_f64;
use crate::payoff::{PayoffMatrix, Profile};

/// A profile where no player gains by deviating alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NashEquilibrium {
    pub strategies: Vec<usize>,
    pub strategy_names: Vec<String>,
    pub payoffs: Vec<f64>,
}

impl NashEquilibrium {
    fn at(matrix: &PayoffMatrix, profile: &[usize]) -> Self {
        Self {
            strategies: profile.to_vec(),
            strategy_names: matrix.strategy_names(profile),
            payoffs: matrix.payoffs(profile).to_vec(),
        }
    }

    /// `Player: Strategy` label for the whole profile.
    #[must_use]
    pub fn label(&self, matrix: &PayoffMatrix) -> String {
        matrix.profile_label(&self.strategies)
    }
}

/// What the other players are assumed to do.
#[derive(Debug, Clone, Copy)]
pub enum OpponentPlay<'a> {
    /// A full profile; the responding player's own entry is ignored.
    Pure(&'a [usize]),
    /// One distribution per player; the responding player's own entry is ignored.
    Mixed(&'a [MixedStrategy]),
}

/// The strategies maximizing a player's payoff against fixed opponents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestResponse {
    pub player: usize,
    /// Every maximizing strategy, ascending.
    pub strategies: Vec<usize>,
    pub payoff: f64,
}

impl BestResponse {
    #[must_use]
    pub fn contains(&self, strategy: usize) -> bool {
        self.strategies.contains(&strategy)
    }
}

/// Best responses of `player` to the opponents' `play`.
///
/// # Errors
///
/// Returns a [`ValidationError`] for an unknown player or when `play` does
/// not match the matrix shape.
pub fn best_response(
    matrix: &PayoffMatrix,
    player: usize,
    play: OpponentPlay<'_>,
) -> Result<BestResponse, ValidationError> {
    matrix.check_player(player)?;
    let (values, tolerance) = match play {
        OpponentPlay::Pure(profile) => {
            let mut profile: Profile = profile.iter().copied().collect();
            if let Some(slot) = profile.get_mut(player) {
                *slot = 0;
            }
            matrix.check_profile(&profile)?;
            let values: Vec<f64> = (0..matrix.strategy_count(player))
                .map(|strategy| {
                    profile[player] = strategy;
                    matrix.payoff(&profile, player)
                })
                .collect();
            (values, 0.0)
        }
        OpponentPlay::Mixed(distributions) => {
            mixed::check_distributions(matrix, distributions)?;
            let values = mixed::strategy_values(matrix, player, distributions);
            (values, matrix.payoff_tolerance())
        }
    };
    let (strategies, payoff) = maximizers(&values, tolerance);
    Ok(BestResponse {
        player,
        strategies,
        payoff,
    })
}

/// Indices within `tolerance` of the best value. Stored payoffs use a zero
/// tolerance; computed expectations use [`PayoffMatrix::payoff_tolerance`].
fn maximizers(values: &[f64], tolerance: f64) -> (Vec<usize>, f64) {
    let best = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let strategies = values
        .iter()
        .enumerate()
        .filter(|(_, value)| best - **value <= tolerance)
        .map(|(strategy, _)| strategy)
        .collect();
    (strategies, best)
}

/// True when every player's choice in `profile` is a best response to the rest.
///
/// # Errors
///
/// Returns a [`ValidationError`] when `profile` does not fit the matrix.
pub fn is_pure_nash_equilibrium(
    matrix: &PayoffMatrix,
    profile: &[usize],
) -> Result<bool, ValidationError> {
    matrix.check_profile(profile)?;
    Ok(is_stable(matrix, profile))
}

fn is_stable(matrix: &PayoffMatrix, profile: &[usize]) -> bool {
    let mut deviation: Profile = profile.iter().copied().collect();
    (0..matrix.player_count()).all(|player| {
        let current = matrix.payoff(profile, player);
        let stable = (0..matrix.strategy_count(player)).all(|alternative| {
            deviation[player] = alternative;
            matrix.payoff(&deviation, player) <= current
        });
        deviation[player] = profile[player];
        stable
    })
}

/// First pure equilibrium in profile enumeration order (player 0 most
/// significant), or `None` when the game has none.
#[must_use]
pub fn find_pure_nash_equilibrium(matrix: &PayoffMatrix) -> Option<NashEquilibrium> {
    matrix
        .profiles()
        .find(|profile| is_stable(matrix, profile))
        .map(|profile| NashEquilibrium::at(matrix, &profile))
}

/// Every pure equilibrium in profile enumeration order.
#[must_use]
pub fn find_all_pure_nash_equilibria(matrix: &PayoffMatrix) -> Vec<NashEquilibrium> {
    let equilibria: Vec<NashEquilibrium> = matrix
        .profiles()
        .filter(|profile| is_stable(matrix, profile))
        .map(|profile| NashEquilibrium::at(matrix, &profile))
        .collect();
    log::debug!(
        "found {} pure equilibria among {} profiles",
        equilibria.len(),
        matrix.profile_count()
    );
    equilibria
}

/// Best response at one opponent mixing probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestResponsePoint {
    /// Probability the opponent plays their first strategy.
    pub opponent_probability: f64,
    pub strategies: Vec<usize>,
    pub payoff: f64,
}

/// Best responses of `player` as the opponent's mix sweeps from 0 to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestResponseCurve {
    pub player: usize,
    pub opponent: usize,
    pub points: Vec<BestResponsePoint>,
    /// Opponent probabilities where the best response switches.
    pub breakpoints: Vec<f64>,
}

/// Sample `player`'s best response at `steps + 1` evenly spaced opponent
/// mixes and locate the exact switching points.
///
/// # Errors
///
/// Returns a [`ValidationError`] unless the game has two players and the
/// opponent has exactly two strategies, or when `steps` is zero.
pub fn best_response_curve(
    matrix: &PayoffMatrix,
    player: usize,
    steps: usize,
) -> Result<BestResponseCurve, ValidationError> {
    matrix.check_player(player)?;
    if matrix.player_count() != 2 {
        return Err(ValidationError::UnsupportedShape {
            expected: "two-player game",
            found: format!("{}-player game", matrix.player_count()),
        });
    }
    let opponent = 1 - player;
    if matrix.strategy_count(opponent) != 2 {
        return Err(ValidationError::UnsupportedShape {
            expected: "opponent with two strategies",
            found: mixed::shape_label(matrix.shape()),
        });
    }
    if steps == 0 {
        return Err(ValidationError::ZeroParameter { field: "steps" });
    }

    // Payoff of each own strategy is linear in the opponent's probability q:
    // value(q) = q * first + (1 - q) * second.
    let lines: Vec<(f64, f64)> = (0..matrix.strategy_count(player))
        .map(|strategy| {
            let mut profile: Profile = smallvec![0; 2];
            profile[player] = strategy;
            profile[opponent] = 0;
            let first = matrix.payoff(&profile, player);
            profile[opponent] = 1;
            (first, matrix.payoff(&profile, player))
        })
        .collect();
    let value = |line: (f64, f64), q: f64| q * line.0 + (1.0 - q) * line.1;
    let tolerance = matrix.payoff_tolerance();

    let points = (0..=steps)
        .map(|step| {
            let q = usize_to_f64(step) / usize_to_f64(steps);
            let values: Vec<f64> = lines.iter().map(|&line| value(line, q)).collect();
            let (strategies, payoff) = maximizers(&values, tolerance);
            BestResponsePoint {
                opponent_probability: q,
                strategies,
                payoff,
            }
        })
        .collect();

    let mut breakpoints: Vec<f64> = Vec::new();
    for (i, &a) in lines.iter().enumerate() {
        for &b in &lines[i + 1..] {
            let slope = (a.0 - a.1) - (b.0 - b.1);
            if slope.abs() <= tolerance {
                continue;
            }
            let q = (b.1 - a.1) / slope;
            if !(-RELATIVE_TOLERANCE..=1.0 + RELATIVE_TOLERANCE).contains(&q) {
                continue;
            }
            let q = q.clamp(0.0, 1.0);
            let best = lines
                .iter()
                .map(|&line| value(line, q))
                .fold(f64::NEG_INFINITY, f64::max);
            if best - value(a, q) <= tolerance {
                breakpoints.push(q);
            }
        }
    }
    breakpoints.sort_by(f64::total_cmp);
    breakpoints.dedup_by(|a, b| (*a - *b).abs() <= RELATIVE_TOLERANCE);

    Ok(BestResponseCurve {
        player,
        opponent,
        points,
        breakpoints,
    })
}
