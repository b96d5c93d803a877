//! Payoff model: players, their strategy sets, and the payoff tensor.
//!
//! A [`PayoffMatrix`] stores one payoff per player for every strategy
//! profile in a flat, row-major buffer (the last player's axis varies
//! fastest). It is immutable after construction; sub-games are produced with
//! [`PayoffMatrix::restrict`].
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

use crate::constants::{
    MIN_PLAYERS, PAIR_LABEL_SEPARATOR, PROFILE_LABEL_SEPARATOR, RELATIVE_TOLERANCE,
};
use crate::error::ValidationError;

/// One strategy index per player.
pub type Profile = SmallVec<[usize; 4]>;

/// A participant and the ordered names of their strategies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub strategies: Vec<String>,
}

impl Player {
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, strategies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            strategies: strategies.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn strategy_count(&self) -> usize {
        self.strategies.len()
    }

    #[must_use]
    pub fn strategy_name(&self, strategy: usize) -> Option<&str> {
        self.strategies.get(strategy).map(String::as_str)
    }
}

/// Nested payoff literal: one axis per player, payoff vectors at the leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayoffTensor {
    Cell(Vec<f64>),
    Axis(Vec<PayoffTensor>),
}

impl PayoffTensor {
    /// Number of axis levels along the first branch.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Cell(_) => 0,
            Self::Axis(children) => 1 + children.first().map_or(0, Self::depth),
        }
    }
}

/// Wire shape of a game: players plus the nested payoff literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameDefinition {
    pub players: Vec<Player>,
    pub payoffs: PayoffTensor,
}

/// Validated, immutable normal-form game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GameDefinition", into = "GameDefinition")]
pub struct PayoffMatrix {
    players: Vec<Player>,
    shape: Vec<usize>,
    strides: Vec<usize>,
    cells: Vec<f64>,
}

impl PayoffMatrix {
    /// Build a matrix from players and a nested payoff literal.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when there are fewer than two players, a
    /// player has no strategies, the tensor depth differs from the player
    /// count, an axis length differs from the owning player's strategy count,
    /// or a leaf does not hold exactly one finite payoff per player.
    pub fn build(players: Vec<Player>, tensor: &PayoffTensor) -> Result<Self, ValidationError> {
        let shape = check_players(&players)?;
        let arity = players.len();
        let mut cells = Vec::with_capacity(shape.iter().product::<usize>() * arity);
        let mut path = Vec::with_capacity(arity);
        flatten(tensor, &shape, &mut path, &mut cells)?;
        Ok(Self::from_parts(players, shape, cells))
    }

    /// Build a matrix by evaluating `payoff` for every profile in
    /// enumeration order.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for invalid players or when `payoff`
    /// yields a vector of the wrong length or a non-finite value.
    pub fn from_fn<F>(players: Vec<Player>, mut payoff: F) -> Result<Self, ValidationError>
    where
        F: FnMut(&[usize]) -> Vec<f64>,
    {
        let shape = check_players(&players)?;
        let arity = players.len();
        let mut cells = Vec::with_capacity(shape.iter().product::<usize>() * arity);
        for profile in Profiles::new(shape.clone()) {
            let values = payoff(&profile);
            check_leaf(&values, &profile, arity)?;
            cells.extend_from_slice(&values);
        }
        Ok(Self::from_parts(players, shape, cells))
    }

    fn from_parts(players: Vec<Player>, shape: Vec<usize>, cells: Vec<f64>) -> Self {
        let mut strides = vec![1; shape.len()];
        for axis in (0..shape.len().saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1] * shape[axis + 1];
        }
        Self {
            players,
            shape,
            strides,
            cells,
        }
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Number of strategies owned by `player`, or 0 for an unknown player.
    #[must_use]
    pub fn strategy_count(&self, player: usize) -> usize {
        self.shape.get(player).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Total number of strategy profiles.
    #[must_use]
    pub fn profile_count(&self) -> usize {
        self.shape.iter().product()
    }

    /// Sum of all players' strategy counts.
    #[must_use]
    pub fn total_strategies(&self) -> usize {
        self.shape.iter().sum()
    }

    #[must_use]
    pub fn player_name(&self, player: usize) -> &str {
        self.players.get(player).map_or("?", |p| p.name.as_str())
    }

    #[must_use]
    pub fn strategy_name(&self, player: usize, strategy: usize) -> &str {
        self.players
            .get(player)
            .and_then(|p| p.strategy_name(strategy))
            .unwrap_or("?")
    }

    /// Largest absolute payoff of any player in any profile.
    #[must_use]
    pub fn payoff_scale(&self) -> f64 {
        self.cells.iter().fold(0.0, |scale, value| scale.max(value.abs()))
    }

    /// Tie tolerance for payoffs computed from this matrix (expected values,
    /// line intersections), proportional to [`Self::payoff_scale`].
    #[must_use]
    pub fn payoff_tolerance(&self) -> f64 {
        RELATIVE_TOLERANCE * self.payoff_scale()
    }

    /// Payoff vector for a full profile.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the profile length differs from the
    /// player count or a strategy index is out of range.
    pub fn payoff_of(&self, profile: &[usize]) -> Result<&[f64], ValidationError> {
        self.check_profile(profile)?;
        Ok(self.payoffs(profile))
    }

    /// Validate a profile against the matrix shape.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] describing the first mismatch.
    pub fn check_profile(&self, profile: &[usize]) -> Result<(), ValidationError> {
        if profile.len() != self.shape.len() {
            return Err(ValidationError::ProfileLength {
                expected: self.shape.len(),
                found: profile.len(),
            });
        }
        for (player, (&strategy, &count)) in profile.iter().zip(&self.shape).enumerate() {
            if strategy >= count {
                return Err(ValidationError::StrategyOutOfRange {
                    player,
                    strategy,
                    count,
                });
            }
        }
        Ok(())
    }

    /// Validate a player index.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::PlayerOutOfRange`] for unknown players.
    pub fn check_player(&self, player: usize) -> Result<(), ValidationError> {
        if player < self.players.len() {
            Ok(())
        } else {
            Err(ValidationError::PlayerOutOfRange {
                player,
                count: self.players.len(),
            })
        }
    }

    /// Validate one strategy index of `player`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for an unknown player or an index past
    /// the player's strategy count.
    pub fn check_strategy(&self, player: usize, strategy: usize) -> Result<(), ValidationError> {
        self.check_player(player)?;
        let count = self.strategy_count(player);
        if strategy < count {
            Ok(())
        } else {
            Err(ValidationError::StrategyOutOfRange {
                player,
                strategy,
                count,
            })
        }
    }

    pub(crate) fn cell_index(&self, profile: &[usize]) -> usize {
        profile
            .iter()
            .zip(&self.strides)
            .map(|(strategy, stride)| strategy * stride)
            .sum()
    }

    pub(crate) fn payoffs_at(&self, cell: usize) -> &[f64] {
        let arity = self.players.len();
        &self.cells[cell * arity..(cell + 1) * arity]
    }

    pub(crate) fn profile_at(&self, cell: usize) -> Profile {
        self.strides
            .iter()
            .zip(&self.shape)
            .map(|(stride, count)| (cell / stride) % count)
            .collect()
    }

    /// Payoff vector for a profile already known to be valid.
    pub(crate) fn payoffs(&self, profile: &[usize]) -> &[f64] {
        self.payoffs_at(self.cell_index(profile))
    }

    pub(crate) fn payoff(&self, profile: &[usize], player: usize) -> f64 {
        self.payoffs(profile)[player]
    }

    /// Every profile in player-major, strategy-ascending order.
    #[must_use]
    pub fn profiles(&self) -> Profiles {
        Profiles::new(self.shape.clone())
    }

    /// Every combination of the opponents' strategies; `player`'s slot is
    /// always 0 and is meant to be overwritten by the caller.
    #[must_use]
    pub fn opponent_profiles(&self, player: usize) -> Profiles {
        let mut shape = self.shape.clone();
        if let Some(axis) = shape.get_mut(player) {
            *axis = 1;
        }
        Profiles::new(shape)
    }

    /// Build the sub-game keeping only `allowed[p]` for each player `p`.
    ///
    /// Allowed sets are sorted and de-duplicated, so local strategy `i` of
    /// the result is the `i`-th smallest allowed index of the original.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when `allowed` does not cover every
    /// player, a set is empty, or an index is out of range.
    pub fn restrict(&self, allowed: &[Vec<usize>]) -> Result<Self, ValidationError> {
        if allowed.len() != self.players.len() {
            return Err(ValidationError::ProfileLength {
                expected: self.players.len(),
                found: allowed.len(),
            });
        }
        let mut kept: Vec<Vec<usize>> = Vec::with_capacity(allowed.len());
        for (player, set) in allowed.iter().enumerate() {
            let mut set = set.clone();
            set.sort_unstable();
            set.dedup();
            if set.is_empty() {
                return Err(ValidationError::EmptyRestriction { player });
            }
            let count = self.strategy_count(player);
            if let Some(&strategy) = set.iter().find(|&&s| s >= count) {
                return Err(ValidationError::StrategyOutOfRange {
                    player,
                    strategy,
                    count,
                });
            }
            kept.push(set);
        }
        Ok(self.sub_game(&kept))
    }

    /// Sub-game over `kept`, which must hold one sorted, non-empty set of
    /// in-range strategy indices per player.
    pub(crate) fn sub_game(&self, kept: &[Vec<usize>]) -> Self {
        let players: Vec<Player> = self
            .players
            .iter()
            .zip(kept)
            .map(|(player, set)| Player {
                name: player.name.clone(),
                strategies: set.iter().map(|&s| player.strategies[s].clone()).collect(),
            })
            .collect();
        let shape: Vec<usize> = kept.iter().map(Vec::len).collect();
        let mut cells = Vec::with_capacity(shape.iter().product::<usize>() * players.len());
        let mut original: Profile = smallvec![0; shape.len()];
        for local in Profiles::new(shape.clone()) {
            for (slot, (set, &index)) in original.iter_mut().zip(kept.iter().zip(&local)) {
                *slot = set[index];
            }
            cells.extend_from_slice(self.payoffs(&original));
        }
        Self::from_parts(players, shape, cells)
    }

    /// Nested payoff literal equivalent to this matrix.
    #[must_use]
    pub fn to_tensor(&self) -> PayoffTensor {
        let mut prefix = Vec::with_capacity(self.shape.len());
        self.tensor_from(&mut prefix)
    }

    fn tensor_from(&self, prefix: &mut Vec<usize>) -> PayoffTensor {
        let axis = prefix.len();
        if axis == self.shape.len() {
            return PayoffTensor::Cell(self.payoffs(prefix).to_vec());
        }
        let mut children = Vec::with_capacity(self.shape[axis]);
        for strategy in 0..self.shape[axis] {
            prefix.push(strategy);
            children.push(self.tensor_from(prefix));
            prefix.pop();
        }
        PayoffTensor::Axis(children)
    }

    /// Strategy names of a profile, in player order.
    #[must_use]
    pub fn strategy_names(&self, profile: &[usize]) -> Vec<String> {
        profile
            .iter()
            .enumerate()
            .map(|(player, &strategy)| self.strategy_name(player, strategy).to_string())
            .collect()
    }

    /// Human-readable outcome label, e.g. `Row: Defect, Column: Defect`.
    #[must_use]
    pub fn profile_label(&self, profile: &[usize]) -> String {
        profile
            .iter()
            .enumerate()
            .map(|(player, &strategy)| self.choice_label(player, strategy))
            .collect::<Vec<_>>()
            .join(PROFILE_LABEL_SEPARATOR)
    }

    /// Strategy-pair label, e.g. `Defect vs Defect`.
    #[must_use]
    pub fn pair_label(&self, profile: &[usize]) -> String {
        self.strategy_names(profile).join(PAIR_LABEL_SEPARATOR)
    }

    /// Label of the opponents' choices in `profile`, skipping `player`.
    #[must_use]
    pub fn scenario_label(&self, profile: &[usize], player: usize) -> String {
        profile
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != player)
            .map(|(other, &strategy)| self.choice_label(other, strategy))
            .collect::<Vec<_>>()
            .join(PROFILE_LABEL_SEPARATOR)
    }

    /// `Player: Strategy` label for a single choice.
    #[must_use]
    pub fn choice_label(&self, player: usize, strategy: usize) -> String {
        format!(
            "{}: {}",
            self.player_name(player),
            self.strategy_name(player, strategy)
        )
    }
}

impl TryFrom<GameDefinition> for PayoffMatrix {
    type Error = ValidationError;

    fn try_from(definition: GameDefinition) -> Result<Self, Self::Error> {
        Self::build(definition.players, &definition.payoffs)
    }
}

impl From<PayoffMatrix> for GameDefinition {
    fn from(matrix: PayoffMatrix) -> Self {
        let payoffs = matrix.to_tensor();
        Self {
            players: matrix.players,
            payoffs,
        }
    }
}

/// Odometer over strategy profiles; the last axis varies fastest.
#[derive(Debug, Clone)]
pub struct Profiles {
    shape: Vec<usize>,
    next: Option<Profile>,
}

impl Profiles {
    #[must_use]
    pub fn new(shape: Vec<usize>) -> Self {
        let next = shape
            .iter()
            .all(|&count| count > 0)
            .then(|| smallvec![0; shape.len()]);
        Self { shape, next }
    }
}

impl Iterator for Profiles {
    type Item = Profile;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        let mut successor = current.clone();
        for axis in (0..self.shape.len()).rev() {
            successor[axis] += 1;
            if successor[axis] < self.shape[axis] {
                self.next = Some(successor);
                return Some(current);
            }
            successor[axis] = 0;
        }
        Some(current)
    }
}

fn check_players(players: &[Player]) -> Result<Vec<usize>, ValidationError> {
    if players.len() < MIN_PLAYERS {
        return Err(ValidationError::TooFewPlayers {
            min: MIN_PLAYERS,
            found: players.len(),
        });
    }
    if let Some(player) = players.iter().position(|p| p.strategies.is_empty()) {
        return Err(ValidationError::NoStrategies { player });
    }
    Ok(players.iter().map(Player::strategy_count).collect())
}

fn check_leaf(values: &[f64], cell: &[usize], arity: usize) -> Result<(), ValidationError> {
    if values.len() != arity {
        return Err(ValidationError::PayoffArity {
            cell: cell.to_vec(),
            expected: arity,
            found: values.len(),
        });
    }
    if let Some(player) = values.iter().position(|v| !v.is_finite()) {
        return Err(ValidationError::NonFinitePayoff {
            cell: cell.to_vec(),
            player,
        });
    }
    Ok(())
}

fn flatten(
    node: &PayoffTensor,
    shape: &[usize],
    path: &mut Vec<usize>,
    out: &mut Vec<f64>,
) -> Result<(), ValidationError> {
    let depth = path.len();
    let players = shape.len();
    match node {
        PayoffTensor::Axis(children) if depth < players => {
            let expected = shape[depth];
            if children.len() != expected {
                return Err(ValidationError::AxisLength {
                    axis: depth,
                    expected,
                    found: children.len(),
                });
            }
            for (index, child) in children.iter().enumerate() {
                path.push(index);
                flatten(child, shape, path, out)?;
                path.pop();
            }
            Ok(())
        }
        PayoffTensor::Axis(_) => Err(ValidationError::TensorDepth {
            depth: depth + node.depth(),
            players,
        }),
        PayoffTensor::Cell(values) if depth == players => {
            check_leaf(values, path, players)?;
            out.extend_from_slice(values);
            Ok(())
        }
        // `[]` parses as an empty leaf; above the leaf level it is an empty axis.
        PayoffTensor::Cell(values) if values.is_empty() => Err(ValidationError::AxisLength {
            axis: depth,
            expected: shape[depth],
            found: 0,
        }),
        PayoffTensor::Cell(_) => Err(ValidationError::TensorDepth { depth, players }),
    }
}
