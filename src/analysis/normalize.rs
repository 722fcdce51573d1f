//! Shared signal normalizers
//!
//! Two normalization styles appear in the scorers and are not
//! interchangeable: rank-based percentiles flatten skewed distributions
//! (view counts), linear min-max preserves them. Each scoring formula
//! names the style it uses.

/// Map values to rank-based [0,1] scores.
///
/// Each output is `count(values strictly less) / (N-1)`. Ties share the
/// rank of the lowest index at which the value would insert in sorted
/// order, so equal inputs always produce equal outputs. An empty list
/// yields an empty result; a singleton yields exactly 0.5 (neutral).
pub fn percentile_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![0.5];
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let denom = (n - 1) as f64;
    values
        .iter()
        .map(|v| sorted.partition_point(|x| x < v) as f64 / denom)
        .collect()
}

/// Linearly scale values to [0,1] between their min and max.
///
/// A constant list (including a singleton) maps to all 0.5.
pub fn min_max(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let mut mn = f64::INFINITY;
    let mut mx = f64::NEG_INFINITY;
    for &v in values {
        mn = mn.min(v);
        mx = mx.max(v);
    }
    let range = mx - mn;
    if range == 0.0 {
        return vec![0.5; values.len()];
    }
    values.iter().map(|v| (v - mn) / range).collect()
}

/// Clamp a score into [0,1]
pub fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}
