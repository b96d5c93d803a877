//! Centralized tolerances and limits for Nashlab analysis.
//!
//! Every comparison between payoffs or probabilities goes through these
//! values so analyses agree with each other on what counts as a tie.

// Numeric tolerances -------------------------------------------------------
/// Relative tolerance for values produced by arithmetic on payoffs.
///
/// Payoff-valued comparisons scale it by the matrix's largest absolute
/// payoff; probability-valued comparisons use it as is. Stored payoffs are
/// always compared exactly.
pub const RELATIVE_TOLERANCE: f64 = 1e-9;
/// Allowed deviation of a distribution's sum from 1.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

// Game shape ---------------------------------------------------------------
pub const MIN_PLAYERS: usize = 2;

// Simulation defaults ------------------------------------------------------
pub const DEFAULT_CONVERGENCE_POINTS: usize = 50;
pub const DEFAULT_CHUNK_SIZE: u64 = 1024;
pub const DEFAULT_CURVE_STEPS: usize = 100;

// RNG domain tags ----------------------------------------------------------
pub(crate) const CHUNK_STREAM_TAG: &[u8] = b"nashlab/chunk";

// Label formatting ---------------------------------------------------------
pub(crate) const PROFILE_LABEL_SEPARATOR: &str = ", ";
pub(crate) const PAIR_LABEL_SEPARATOR: &str = " vs ";
