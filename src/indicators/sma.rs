// =============================================================================
// Simple Moving Average, population standard deviation, volatility
// =============================================================================
//
// All window-based helpers here share one fallback: when the series is shorter
// than the requested window, the whole series is used instead.

/// The last `period` values of `values`, or all of them when shorter.
pub fn trailing(values: &[f64], period: usize) -> &[f64] {
    &values[values.len().saturating_sub(period)..]
}

/// Arithmetic mean. Empty input yields 0.0 rather than NaN.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divide by N, not N-1).
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Mean of the last `period` closes.
pub fn calculate_sma(closes: &[f64], period: usize) -> f64 {
    mean(trailing(closes, period))
}

/// Standard deviation of the last `period` closes.
pub fn calculate_volatility(closes: &[f64], period: usize) -> f64 {
    population_std_dev(trailing(closes, period))
}
