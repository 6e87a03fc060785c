//! Score range checks

use crate::config::DEFAULT_TOTAL_POINTS;

/// Upper bound for an assessment's scores.
pub fn max_points(total_points: Option<f64>) -> f64 {
    total_points.unwrap_or(DEFAULT_TOTAL_POINTS)
}

/// `None` is always valid: it means "not graded yet".
/// A number is valid when it lies in `0..=max`. NaN is never valid.
pub fn is_valid_score(score: Option<f64>, max: f64) -> bool {
    match score {
        None => true,
        Some(s) if s.is_nan() || max.is_nan() => false,
        Some(s) => (0.0..=max).contains(&s),
    }
}
