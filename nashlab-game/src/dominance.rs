//! Dominance analysis and iterated elimination of dominated strategies.
//!
//! Player `p`'s strategy `s` dominates `t` when, against every combination of
//! the opponents' strategies, `s` pays `p` more (strict) or at least as much
//! and sometimes more (weak). Iterated elimination repeatedly removes one
//! dominated strategy from the restricted sub-game until none remain.
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::payoff::PayoffMatrix;

/// Strength of a dominance relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DominanceKind {
    Strict,
    Weak,
}

impl DominanceKind {
    /// Adverb used in explanations.
    #[must_use]
    pub const fn adverb(self) -> &'static str {
        match self {
            Self::Strict => "strictly",
            Self::Weak => "weakly",
        }
    }
}

impl std::fmt::Display for DominanceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::Weak => write!(f, "weak"),
        }
    }
}

/// Payoff difference between two strategies in one opponent scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDifference {
    /// Opponents' choices, e.g. `Column: Cooperate`.
    pub scenario: String,
    pub opponent_strategies: Vec<usize>,
    pub payoff: f64,
    pub alternative_payoff: f64,
    pub difference: f64,
}

/// Comparison of a dominant strategy against one alternative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoffComparison {
    pub against: usize,
    pub against_name: String,
    pub relation: DominanceKind,
    pub scenarios: Vec<ScenarioDifference>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DominantStrategyFinding {
    pub player: usize,
    pub player_name: String,
    pub strategy: usize,
    pub strategy_name: String,
    #[serde(rename = "type")]
    pub kind: DominanceKind,
    pub explanation: String,
    pub comparisons: Vec<PayoffComparison>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DominatedStrategyFinding {
    pub player: usize,
    pub player_name: String,
    pub strategy: usize,
    pub strategy_name: String,
    #[serde(rename = "type")]
    pub kind: DominanceKind,
    pub dominated_by: usize,
    pub dominated_by_name: String,
    pub explanation: String,
}

/// One round of iterated elimination. Indices refer to the original game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EliminationStep {
    pub player: usize,
    pub eliminated_strategy: usize,
    pub eliminated_name: String,
    pub kind: DominanceKind,
    pub dominated_by: usize,
    pub reason: String,
    /// Surviving strategies per player after this step.
    pub remaining_strategies: Vec<Vec<usize>>,
}

/// How iterated elimination stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum EliminationTermination {
    /// No surviving strategy is dominated.
    Converged,
    /// Removing the next candidate would leave `player` with no strategies.
    Exhausted { player: usize },
}

/// Everything [`analyze_dominance`] reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DominanceAnalysis {
    pub dominant_strategies: Vec<DominantStrategyFinding>,
    pub dominated_strategies: Vec<DominatedStrategyFinding>,
    pub elimination_steps: Vec<EliminationStep>,
    pub surviving_strategies: Vec<Vec<usize>>,
    pub termination: EliminationTermination,
    pub has_dominant_strategies: bool,
    pub can_simplify_by_elimination: bool,
    pub recommendations: Vec<String>,
}

impl DominanceAnalysis {
    /// `Player: Strategy` labels of every dominant strategy.
    #[must_use]
    pub fn dominant_labels(&self) -> Vec<String> {
        self.dominant_strategies
            .iter()
            .map(|finding| format!("{}: {}", finding.player_name, finding.strategy_name))
            .collect()
    }

    /// True when elimination leaves exactly one strategy per player.
    #[must_use]
    pub fn is_solved_by_elimination(&self) -> bool {
        self.can_simplify_by_elimination && self.surviving_strategies.iter().all(|s| s.len() == 1)
    }
}

/// Classify how `s` relates to `t` for `player` across all opponent
/// profiles; `Ok(None)` means `s` does not dominate `t`.
///
/// # Errors
///
/// Returns a [`ValidationError`] for an unknown player or when `s` or `t` is
/// not one of the player's strategies.
pub fn dominance_relation(
    matrix: &PayoffMatrix,
    player: usize,
    s: usize,
    t: usize,
) -> Result<Option<DominanceKind>, ValidationError> {
    matrix.check_strategy(player, s)?;
    matrix.check_strategy(player, t)?;
    Ok(relation(matrix, player, s, t))
}

/// Unchecked [`dominance_relation`]; stored payoffs are compared exactly.
fn relation(matrix: &PayoffMatrix, player: usize, s: usize, t: usize) -> Option<DominanceKind> {
    if s == t {
        return None;
    }
    let mut always_better = true;
    let mut sometimes_better = false;
    for mut profile in matrix.opponent_profiles(player) {
        profile[player] = s;
        let ours = matrix.payoff(&profile, player);
        profile[player] = t;
        let theirs = matrix.payoff(&profile, player);
        if ours < theirs {
            return None;
        }
        if ours > theirs {
            sometimes_better = true;
        } else {
            always_better = false;
        }
    }
    if always_better {
        Some(DominanceKind::Strict)
    } else if sometimes_better {
        Some(DominanceKind::Weak)
    } else {
        None
    }
}

/// Pairwise dominance relations for every player, indexed `[player][s][t]`.
#[derive(Debug, Clone)]
struct DominanceTable {
    relations: Vec<Vec<Vec<Option<DominanceKind>>>>,
}

/// A dominated strategy and its preferred dominator, in local indices.
#[derive(Debug, Clone, Copy)]
struct DominatedCandidate {
    player: usize,
    strategy: usize,
    dominator: usize,
    kind: DominanceKind,
}

impl DominanceTable {
    fn build(matrix: &PayoffMatrix) -> Self {
        let relations = (0..matrix.player_count())
            .map(|player| {
                let count = matrix.strategy_count(player);
                (0..count)
                    .map(|s| {
                        (0..count)
                            .map(|t| relation(matrix, player, s, t))
                            .collect()
                    })
                    .collect()
            })
            .collect();
        Self { relations }
    }

    fn relation(&self, player: usize, s: usize, t: usize) -> Option<DominanceKind> {
        self.relations[player][s][t]
    }

    /// Strongest classification of `s` as dominant, if it dominates every
    /// alternative.
    fn dominant_kind(&self, player: usize, s: usize) -> Option<DominanceKind> {
        let count = self.relations[player].len();
        if count < 2 {
            return None;
        }
        let mut kind = DominanceKind::Strict;
        for t in (0..count).filter(|&t| t != s) {
            match self.relation(player, s, t)? {
                DominanceKind::Strict => {}
                DominanceKind::Weak => kind = DominanceKind::Weak,
            }
        }
        Some(kind)
    }

    /// First strict dominator of `t` in ascending order, else the first weak.
    fn dominator_of(&self, player: usize, t: usize) -> Option<(usize, DominanceKind)> {
        let count = self.relations[player].len();
        let mut weak = None;
        for s in 0..count {
            match self.relation(player, s, t) {
                Some(DominanceKind::Strict) => return Some((s, DominanceKind::Strict)),
                Some(DominanceKind::Weak) if weak.is_none() => weak = Some(s),
                _ => {}
            }
        }
        weak.map(|s| (s, DominanceKind::Weak))
    }

    /// Dominated strategies in player-major, strategy-ascending order.
    fn dominated(&self) -> Vec<DominatedCandidate> {
        let mut candidates = Vec::new();
        for (player, rows) in self.relations.iter().enumerate() {
            for strategy in 0..rows.len() {
                if let Some((dominator, kind)) = self.dominator_of(player, strategy) {
                    candidates.push(DominatedCandidate {
                        player,
                        strategy,
                        dominator,
                        kind,
                    });
                }
            }
        }
        candidates
    }
}

/// Run the full dominance analysis on `matrix`.
#[must_use]
pub fn analyze_dominance(matrix: &PayoffMatrix) -> DominanceAnalysis {
    let table = DominanceTable::build(matrix);

    let mut dominant_strategies = Vec::new();
    for player in 0..matrix.player_count() {
        for strategy in 0..matrix.strategy_count(player) {
            if let Some(kind) = table.dominant_kind(player, strategy) {
                dominant_strategies.push(dominant_finding(matrix, &table, player, strategy, kind));
            }
        }
    }

    let dominated_strategies: Vec<DominatedStrategyFinding> = table
        .dominated()
        .into_iter()
        .map(|candidate| dominated_finding(matrix, candidate))
        .collect();

    let (elimination_steps, surviving_strategies, termination) = eliminate(matrix);

    let has_dominant_strategies = !dominant_strategies.is_empty();
    let can_simplify_by_elimination = !elimination_steps.is_empty();
    let mut analysis = DominanceAnalysis {
        dominant_strategies,
        dominated_strategies,
        elimination_steps,
        surviving_strategies,
        termination,
        has_dominant_strategies,
        can_simplify_by_elimination,
        recommendations: Vec::new(),
    };
    analysis.recommendations = recommendations(matrix, &analysis);
    analysis
}

fn dominant_finding(
    matrix: &PayoffMatrix,
    table: &DominanceTable,
    player: usize,
    strategy: usize,
    kind: DominanceKind,
) -> DominantStrategyFinding {
    let comparisons: Vec<PayoffComparison> = (0..matrix.strategy_count(player))
        .filter(|&t| t != strategy)
        .filter_map(|t| {
            let relation = table.relation(player, strategy, t)?;
            Some(PayoffComparison {
                against: t,
                against_name: matrix.strategy_name(player, t).to_string(),
                relation,
                scenarios: scenario_differences(matrix, player, strategy, t),
            })
        })
        .collect();
    let strategy_name = matrix.strategy_name(player, strategy).to_string();
    let player_name = matrix.player_name(player).to_string();
    let explanation = match kind {
        DominanceKind::Strict => format!(
            "{strategy_name} strictly dominates every alternative: it pays {player_name} more than any other strategy against every opponent choice."
        ),
        DominanceKind::Weak => format!(
            "{strategy_name} weakly dominates every alternative: it pays {player_name} at least as much as any other strategy against every opponent choice, and strictly more in some."
        ),
    };
    DominantStrategyFinding {
        player,
        player_name,
        strategy,
        strategy_name,
        kind,
        explanation,
        comparisons,
    }
}

fn dominated_finding(matrix: &PayoffMatrix, candidate: DominatedCandidate) -> DominatedStrategyFinding {
    let DominatedCandidate {
        player,
        strategy,
        dominator,
        kind,
    } = candidate;
    let strategy_name = matrix.strategy_name(player, strategy).to_string();
    let dominated_by_name = matrix.strategy_name(player, dominator).to_string();
    let player_name = matrix.player_name(player).to_string();
    let explanation = format!(
        "{strategy_name} is {} dominated by {dominated_by_name}: {player_name} never does better with {strategy_name}.",
        kind.adverb()
    );
    DominatedStrategyFinding {
        player,
        player_name,
        strategy,
        strategy_name,
        kind,
        dominated_by: dominator,
        dominated_by_name,
        explanation,
    }
}

fn scenario_differences(
    matrix: &PayoffMatrix,
    player: usize,
    s: usize,
    t: usize,
) -> Vec<ScenarioDifference> {
    matrix
        .opponent_profiles(player)
        .map(|mut profile| {
            profile[player] = s;
            let payoff = matrix.payoff(&profile, player);
            profile[player] = t;
            let alternative_payoff = matrix.payoff(&profile, player);
            let opponent_strategies = profile
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != player)
                .map(|(_, &strategy)| strategy)
                .collect();
            ScenarioDifference {
                scenario: matrix.scenario_label(&profile, player),
                opponent_strategies,
                payoff,
                alternative_payoff,
                difference: payoff - alternative_payoff,
            }
        })
        .collect()
}

type Elimination = (
    Vec<EliminationStep>,
    Vec<Vec<usize>>,
    EliminationTermination,
);

fn eliminate(matrix: &PayoffMatrix) -> Elimination {
    let mut surviving: Vec<Vec<usize>> = (0..matrix.player_count())
        .map(|player| (0..matrix.strategy_count(player)).collect())
        .collect();
    let mut steps = Vec::new();

    for _ in 0..matrix.total_strategies() {
        // Surviving sets stay sorted, in range and non-empty.
        let sub_game = matrix.sub_game(&surviving);
        let candidates = DominanceTable::build(&sub_game).dominated();
        let pick = candidates
            .iter()
            .find(|c| c.kind == DominanceKind::Strict)
            .or_else(|| candidates.first())
            .copied();
        let Some(candidate) = pick else {
            return (steps, surviving, EliminationTermination::Converged);
        };
        let set = &mut surviving[candidate.player];
        // Unreachable while every dominated strategy has a surviving dominator.
        if set.len() <= 1 {
            return (
                steps,
                surviving,
                EliminationTermination::Exhausted {
                    player: candidate.player,
                },
            );
        }

        let dominated_by = set[candidate.dominator];
        let eliminated = set.remove(candidate.strategy);
        let eliminated_name = matrix.strategy_name(candidate.player, eliminated).to_string();
        let reason = format!(
            "{eliminated_name} is {} dominated by {}",
            candidate.kind.adverb(),
            matrix.strategy_name(candidate.player, dominated_by)
        );
        log::debug!(
            "eliminating {} for {} ({reason})",
            eliminated_name,
            matrix.player_name(candidate.player)
        );
        steps.push(EliminationStep {
            player: candidate.player,
            eliminated_strategy: eliminated,
            eliminated_name,
            kind: candidate.kind,
            dominated_by,
            reason,
            remaining_strategies: surviving.clone(),
        });
    }

    (steps, surviving, EliminationTermination::Converged)
}

fn recommendations(matrix: &PayoffMatrix, analysis: &DominanceAnalysis) -> Vec<String> {
    let mut notes = Vec::new();
    for finding in &analysis.dominant_strategies {
        notes.push(format!(
            "{} should play {}: it is a {} dominant strategy.",
            finding.player_name, finding.strategy_name, finding.kind
        ));
    }
    for step in &analysis.elimination_steps {
        notes.push(format!(
            "Eliminate {} for {} because it is {} dominated by {}.",
            step.eliminated_name,
            matrix.player_name(step.player),
            step.kind.adverb(),
            matrix.strategy_name(step.player, step.dominated_by)
        ));
    }
    if analysis.is_solved_by_elimination() {
        let profile: Vec<usize> = analysis.surviving_strategies.iter().map(|s| s[0]).collect();
        notes.push(format!(
            "Iterated elimination solves the game: {}.",
            matrix.profile_label(&profile)
        ));
    }
    if let EliminationTermination::Exhausted { player } = analysis.termination {
        notes.push(format!(
            "Elimination stopped before {} ran out of strategies.",
            matrix.player_name(player)
        ));
    }
    if notes.is_empty() {
        notes.push(
            "No strategy dominates another; consider mixed strategies or look for Nash equilibria."
                .to_string(),
        );
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payoff::Player;

    fn two_player(
        rows: &[&str],
        columns: &[&str],
        payoffs: &[&[(f64, f64)]],
    ) -> PayoffMatrix {
        let players = vec![
            Player::new("Row", rows.iter().copied()),
            Player::new("Column", columns.iter().copied()),
        ];
        PayoffMatrix::from_fn(players, |profile| {
            let (a, b) = payoffs[profile[0]][profile[1]];
            vec![a, b]
        })
        .unwrap()
    }

    fn dilemma() -> PayoffMatrix {
        two_player(
            &["Cooperate", "Defect"],
            &["Cooperate", "Defect"],
            &[&[(3.0, 3.0), (0.0, 5.0)], &[(5.0, 0.0), (1.0, 1.0)]],
        )
    }

    #[test]
    fn relation_classifies_strict_weak_and_incomparable() {
        let matrix = two_player(
            &["A", "B", "C"],
            &["L", "R"],
            &[
                &[(2.0, 0.0), (2.0, 0.0)],
                &[(1.0, 0.0), (2.0, 0.0)],
                &[(3.0, 0.0), (0.0, 0.0)],
            ],
        );
        assert_eq!(dominance_relation(&matrix, 0, 0, 1), Ok(Some(DominanceKind::Weak)));
        assert_eq!(dominance_relation(&matrix, 0, 1, 0), Ok(None));
        assert_eq!(dominance_relation(&matrix, 0, 0, 2), Ok(None));
        assert_eq!(dominance_relation(&matrix, 0, 0, 0), Ok(None));
        assert_eq!(dominance_relation(&matrix, 1, 0, 1), Ok(None));
    }

    #[test]
    fn relation_rejects_unknown_players_and_strategies() {
        let matrix = dilemma();
        assert_eq!(
            dominance_relation(&matrix, 5, 0, 1),
            Err(ValidationError::PlayerOutOfRange {
                player: 5,
                count: 2
            })
        );
        assert_eq!(
            dominance_relation(&matrix, 0, 0, 3),
            Err(ValidationError::StrategyOutOfRange {
                player: 0,
                strategy: 3,
                count: 2
            })
        );
        assert_eq!(
            dominance_relation(&matrix, 1, 2, 0),
            Err(ValidationError::StrategyOutOfRange {
                player: 1,
                strategy: 2,
                count: 2
            })
        );
    }

    #[test]
    fn weakly_dominant_strategy_is_reported_as_weak() {
        // A ties B against L and beats it against R; Column has no dominance.
        let matrix = two_player(
            &["A", "B"],
            &["L", "R"],
            &[&[(1.0, 1.0), (1.0, 0.0)], &[(1.0, 0.0), (0.0, 1.0)]],
        );
        let analysis = analyze_dominance(&matrix);

        assert_eq!(analysis.dominant_strategies.len(), 1);
        let dominant = &analysis.dominant_strategies[0];
        assert_eq!((dominant.player, dominant.strategy), (0, 0));
        assert_eq!(dominant.kind, DominanceKind::Weak);
        assert_eq!(dominant.comparisons[0].relation, DominanceKind::Weak);
        assert!(dominant.explanation.contains("weakly dominates every alternative"));

        assert_eq!(analysis.dominated_strategies.len(), 1);
        let dominated = &analysis.dominated_strategies[0];
        assert_eq!((dominated.player, dominated.strategy), (0, 1));
        assert_eq!(dominated.kind, DominanceKind::Weak);
        assert_eq!(dominated.dominated_by, 0);
        assert_eq!(dominated.dominated_by_name, "A");

        let weak_step = &analysis.elimination_steps[0];
        assert_eq!((weak_step.player, weak_step.eliminated_strategy), (0, 1));
        assert_eq!(weak_step.kind, DominanceKind::Weak);
        assert_eq!(weak_step.dominated_by, 0);
        assert_eq!(weak_step.reason, "B is weakly dominated by A");
        // With B gone, L strictly beats R for Column.
        assert_eq!(analysis.elimination_steps[1].kind, DominanceKind::Strict);
        assert_eq!(analysis.surviving_strategies, vec![vec![0], vec![0]]);

        assert!(
            analysis
                .recommendations
                .contains(&"Row should play A: it is a weak dominant strategy.".to_string())
        );
        assert!(
            analysis
                .recommendations
                .contains(&"Eliminate B for Row because it is weakly dominated by A.".to_string())
        );
    }

    #[test]
    fn strict_dominator_is_preferred_over_earlier_weak_one() {
        // A weakly and B strictly dominate C; B only weakly dominates A.
        let matrix = two_player(
            &["A", "B", "C"],
            &["L", "R"],
            &[
                &[(1.0, 0.0), (1.0, 0.0)],
                &[(2.0, 0.0), (1.0, 0.0)],
                &[(1.0, 0.0), (0.0, 0.0)],
            ],
        );
        assert_eq!(dominance_relation(&matrix, 0, 0, 2), Ok(Some(DominanceKind::Weak)));
        assert_eq!(dominance_relation(&matrix, 0, 1, 2), Ok(Some(DominanceKind::Strict)));

        let analysis = analyze_dominance(&matrix);
        let c = analysis
            .dominated_strategies
            .iter()
            .find(|d| d.player == 0 && d.strategy == 2)
            .unwrap();
        assert_eq!(c.kind, DominanceKind::Strict);
        assert_eq!(c.dominated_by, 1);
        assert_eq!(c.dominated_by_name, "B");
        assert!(c.explanation.starts_with("C is strictly dominated by B"));

        let first = &analysis.elimination_steps[0];
        assert_eq!((first.eliminated_strategy, first.dominated_by), (2, 1));
        assert_eq!(first.kind, DominanceKind::Strict);
        assert!(
            analysis
                .recommendations
                .contains(&"Eliminate C for Row because it is strictly dominated by B.".to_string())
        );
    }

    #[test]
    fn dilemma_defect_is_strictly_dominant() {
        let analysis = analyze_dominance(&dilemma());
        assert!(analysis.has_dominant_strategies);
        assert_eq!(analysis.dominant_strategies.len(), 2);
        for (player, finding) in analysis.dominant_strategies.iter().enumerate() {
            assert_eq!(finding.player, player);
            assert_eq!(finding.strategy, 1);
            assert_eq!(finding.kind, DominanceKind::Strict);
            assert_eq!(finding.comparisons.len(), 1);
            let comparison = &finding.comparisons[0];
            assert_eq!(comparison.against_name, "Cooperate");
            assert_eq!(comparison.scenarios.len(), 2);
            assert!(comparison.scenarios.iter().all(|s| s.difference > 0.0));
        }
        assert!(
            analysis
                .dominated_strategies
                .iter()
                .all(|d| d.strategy == 0 && d.dominated_by == 1)
        );
        assert_eq!(analysis.dominant_labels(), vec!["Row: Defect", "Column: Defect"]);
    }

    #[test]
    fn dominant_strategy_never_listed_as_dominated() {
        let analysis = analyze_dominance(&dilemma());
        for dominant in &analysis.dominant_strategies {
            assert!(!analysis.dominated_strategies.iter().any(|d| {
                d.player == dominant.player && d.strategy == dominant.strategy
            }));
        }
    }

    #[test]
    fn dilemma_elimination_reaches_defect_defect() {
        let analysis = analyze_dominance(&dilemma());
        assert!(analysis.can_simplify_by_elimination);
        assert_eq!(analysis.elimination_steps.len(), 2);
        let first = &analysis.elimination_steps[0];
        assert_eq!((first.player, first.eliminated_strategy), (0, 0));
        assert_eq!(first.remaining_strategies, vec![vec![1], vec![0, 1]]);
        let second = &analysis.elimination_steps[1];
        assert_eq!((second.player, second.eliminated_strategy), (1, 0));
        assert_eq!(analysis.surviving_strategies, vec![vec![1], vec![1]]);
        assert_eq!(analysis.termination, EliminationTermination::Converged);
        assert!(analysis.is_solved_by_elimination());
        assert!(
            analysis
                .recommendations
                .iter()
                .any(|r| r.contains("Row: Defect, Column: Defect"))
        );
    }

    #[test]
    fn iterated_elimination_uses_sub_game_dominance() {
        // Right is dominated by Center; only then is Down dominated by Up,
        // and only then is Left dominated by Center.
        let matrix = two_player(
            &["Up", "Down"],
            &["Left", "Center", "Right"],
            &[
                &[(1.0, 0.0), (1.0, 2.0), (0.0, 1.0)],
                &[(0.0, 3.0), (0.0, 1.0), (2.0, 0.0)],
            ],
        );
        let analysis = analyze_dominance(&matrix);
        assert!(!analysis.has_dominant_strategies);
        let removed: Vec<(usize, usize)> = analysis
            .elimination_steps
            .iter()
            .map(|s| (s.player, s.eliminated_strategy))
            .collect();
        assert_eq!(removed, vec![(1, 2), (0, 1), (1, 0)]);
        assert_eq!(analysis.surviving_strategies, vec![vec![0], vec![1]]);
        assert_eq!(analysis.elimination_steps[1].dominated_by, 0);
    }

    #[test]
    fn strict_candidates_are_eliminated_before_weak_ones() {
        let matrix = two_player(
            &["A", "B"],
            &["L", "M", "R"],
            &[
                &[(1.0, 1.0), (1.0, 1.0), (1.0, 0.0)],
                &[(1.0, 1.0), (0.0, 1.0), (1.0, 0.0)],
            ],
        );
        let analysis = analyze_dominance(&matrix);
        let first = &analysis.elimination_steps[0];
        assert_eq!(first.kind, DominanceKind::Strict);
        assert_eq!((first.player, first.eliminated_strategy), (1, 2));
    }

    #[test]
    fn elimination_shrinks_by_one_each_step() {
        let matrix = two_player(
            &["A", "B", "C"],
            &["L", "M", "R"],
            &[
                &[(4.0, 3.0), (5.0, 1.0), (6.0, 2.0)],
                &[(2.0, 1.0), (8.0, 4.0), (3.0, 6.0)],
                &[(3.0, 0.0), (9.0, 6.0), (2.0, 8.0)],
            ],
        );
        let analysis = analyze_dominance(&matrix);
        let mut previous = matrix.total_strategies();
        for step in &analysis.elimination_steps {
            let total: usize = step.remaining_strategies.iter().map(Vec::len).sum();
            assert_eq!(total + 1, previous);
            assert!(step.remaining_strategies.iter().all(|s| !s.is_empty()));
            previous = total;
        }
    }

    #[test]
    fn coordination_game_falls_back_to_mixed_advice() {
        let matrix = two_player(
            &["Opera", "Football"],
            &["Opera", "Football"],
            &[&[(3.0, 2.0), (0.0, 0.0)], &[(0.0, 0.0), (2.0, 3.0)]],
        );
        let analysis = analyze_dominance(&matrix);
        assert!(!analysis.has_dominant_strategies);
        assert!(!analysis.can_simplify_by_elimination);
        assert!(analysis.dominated_strategies.is_empty());
        assert_eq!(analysis.recommendations.len(), 1);
        assert!(analysis.recommendations[0].contains("mixed strategies"));
    }

    #[test]
    fn analysis_is_deterministic() {
        let matrix = dilemma();
        assert_eq!(analyze_dominance(&matrix), analyze_dominance(&matrix));
    }
}
