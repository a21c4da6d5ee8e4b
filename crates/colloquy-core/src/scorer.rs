//! Rubric scoring.

use std::collections::BTreeMap;

/// Weighted sum of `sub_scores` under `weights`, clamped to [0, 1].
///
/// Characteristics missing from `sub_scores` contribute 0, so a partially
/// populated evaluation lowers the score instead of failing. Sub-scores with
/// no weight are ignored.
pub fn score(sub_scores: &BTreeMap<String, f64>, weights: &BTreeMap<String, f64>) -> f64 {
    let total: f64 = weights
        .iter()
        .map(|(name, weight)| weight * sub_scores.get(name).copied().unwrap_or(0.0))
        .sum();
    if total.is_nan() {
        return 0.0;
    }
    total.clamp(0.0, 1.0)
}
