//! Tournament performance rating (TPR) estimation.
//!
//! The differential solver finds how far above the field a player has to be
//! rated so that scoring at least their actual points is reasonably likely
//! (at least `threshold` probability). Per-game expectation follows the
//! logistic Elo curve; the total score is approximated by a normal
//! distribution with the matching mean and variance.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::derived::round_rating;

/// Default confidence threshold for the performance estimate.
pub const DEFAULT_THRESHOLD: f64 = 0.75;

/// Search interval for the differential, in rating points.
pub const MAX_DIFFERENTIAL: f64 = 4000.0;

/// Scores are kept this many points away from 0 and from a perfect score.
pub const SCORE_MARGIN: f64 = 0.25;

const TOLERANCE: f64 = 1e-6;
const MAX_ITERATIONS: usize = 200;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolveError {
    #[error("invalid solver input: {0}")]
    InvalidInput(String),

    #[error("no differential in [-{bound}, {bound}] reaches probability {threshold}")]
    OutOfRange { bound: f64, threshold: f64 },

    #[error("bisection did not converge after {0} iterations")]
    MaxIterations(usize),
}

/// Expected score of a player rated `r_a` against one rated `r_b`.
pub fn expected_score(r_a: f64, r_b: f64) -> f64 {
    1.0 / (1.0 + 10.0_f64.powf(-(r_a - r_b) / 400.0))
}

/// Moves a raw score into `[SCORE_MARGIN, games - SCORE_MARGIN]` so that
/// zero and perfect scores still have a finite solution.
pub fn clamp_score(points: f64, games: u32) -> f64 {
    let n = games as f64;
    points.clamp(SCORE_MARGIN.min(n / 2.0), (n - SCORE_MARGIN).max(n / 2.0))
}

/// Smallest differential `w` such that a player rated `w` above the field
/// scores at least `points` out of `games` with probability `>= threshold`.
pub fn solve_rating_differential(points: f64, games: u32, threshold: f64) -> Result<f64, SolveError> {
    if games == 0 {
        return Err(SolveError::InvalidInput("no games played".to_string()));
    }
    if !threshold.is_finite() || threshold <= 0.0 || threshold >= 1.0 {
        return Err(SolveError::InvalidInput(format!(
            "threshold must be in (0, 1), got {threshold}"
        )));
    }
    if !points.is_finite() || points < 0.0 || points > games as f64 {
        return Err(SolveError::InvalidInput(format!(
            "points {points} outside 0..={games}"
        )));
    }

    let standard = Normal::new(0.0, 1.0)
        .map_err(|err| SolveError::InvalidInput(format!("normal distribution: {err}")))?;
    let target = clamp_score(points, games);
    let excess = |w: f64| probability_at_least(target, games, w, &standard) - threshold;

    let mut lo = -MAX_DIFFERENTIAL;
    let mut hi = MAX_DIFFERENTIAL;
    if excess(lo) >= 0.0 || excess(hi) < 0.0 {
        return Err(SolveError::OutOfRange {
            bound: MAX_DIFFERENTIAL,
            threshold,
        });
    }

    for _ in 0..MAX_ITERATIONS {
        if hi - lo <= TOLERANCE {
            return Ok(hi);
        }
        let mid = 0.5 * (lo + hi);
        if excess(mid) >= 0.0 {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    Err(SolveError::MaxIterations(MAX_ITERATIONS))
}

/// Performance rating from a solved differential and the field's average rating.
pub fn estimate_performance_rating(differential: f64, average_opponent_rating: f64) -> i64 {
    round_rating(average_opponent_rating + differential)
}

/// TPR for one player, or `None` when it does not apply (no games, no opponents).
pub fn performance_rating(
    points: f64,
    games: u32,
    average_opponent_rating: Option<f64>,
    threshold: f64,
) -> Result<Option<i64>, SolveError> {
    let Some(avg_opp) = average_opponent_rating else {
        return Ok(None);
    };
    if games == 0 {
        return Ok(None);
    }
    let w = solve_rating_differential(points, games, threshold)?;
    Ok(Some(estimate_performance_rating(w, avg_opp)))
}

fn probability_at_least(points: f64, games: u32, differential: f64, standard: &Normal) -> f64 {
    let n = games as f64;
    let p = expected_score(differential, 0.0);
    let mean = n * p;
    let sd = (n * p * (1.0 - p)).sqrt();
    if sd <= f64::EPSILON {
        return if mean >= points { 1.0 } else { 0.0 };
    }
    1.0 - standard.cdf((points - mean) / sd)
}
