//! Rolling z-score anomaly scoring over a trailing window.

/// Minimum number of in-window values before the statistic is trusted.
pub fn min_periods(window: usize) -> usize {
    (window / 4).max(10)
}

/// Standardized deviation score for every position of `values`.
///
/// The window trails: position `i` sees `values[i + 1 - W ..= i]` (fewer
/// near the start). Positions with fewer than `min_periods(window)` values,
/// and positions where the window deviation is zero, score 0.0 -- a flat
/// signal carries no anomaly evidence. Scores are causal: nothing after
/// position `i` can change score `i`.
pub fn rolling_zscore(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let min_periods = min_periods(window);
    let mut scores = Vec::with_capacity(values.len());

    for i in 0..values.len() {
        let start = (i + 1).saturating_sub(window);
        let slice = &values[start..=i];
        scores.push(zscore_of_last(slice, min_periods));
    }

    scores
}

/// Z-score of the last element of `window` against the whole window,
/// using the sample standard deviation (n - 1 denominator).
fn zscore_of_last(window: &[f64], min_periods: usize) -> f64 {
    let n = window.len();
    if n < min_periods || n < 2 {
        return 0.0;
    }

    let mean = window.iter().sum::<f64>() / n as f64;
    let sum_sq: f64 = window.iter().map(|v| (v - mean) * (v - mean)).sum();
    let std = (sum_sq / (n - 1) as f64).sqrt();

    if std == 0.0 {
        return 0.0;
    }

    (window[n - 1] - mean) / std
}
