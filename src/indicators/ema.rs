// =============================================================================
// Exponential Moving Average (EMA) and MACD
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_t      = close_t * multiplier + EMA_{t-1} * (1 - multiplier)
//
// The first EMA value is seeded with the SMA of the first `period` closes and
// the recurrence then walks forward oldest -> newest.
//
// MACD line = EMA(12) - EMA(26). Both EMAs seed from the very start of the
// series (first 12 vs. first 26 closes); the asymmetric seed windows are part
// of the reference numbers and must not be aligned.
// =============================================================================

use super::sma::mean;

/// Short EMA period for the MACD line.
pub const MACD_FAST: usize = 12;
/// Long EMA period for the MACD line.
pub const MACD_SLOW: usize = 26;

/// Compute the latest EMA value for `closes` and look-back `period`.
///
/// # Edge cases
/// - `closes.len() < period` => arithmetic mean of the whole series.
/// - `period == 0` => arithmetic mean of the whole series.
/// - Empty input => 0.0.
pub fn calculate_ema(closes: &[f64], period: usize) -> f64 {
    if period == 0 || closes.len() < period {
        return mean(closes);
    }

    let multiplier = 2.0 / (period + 1) as f64;

    let mut ema = mean(&closes[..period]);
    for &close in &closes[period..] {
        ema = close * multiplier + ema * (1.0 - multiplier);
    }
    ema
}

/// MACD line value: `EMA(12) - EMA(26)`, or 0.0 with fewer than 26 closes.
pub fn calculate_macd(closes: &[f64]) -> f64 {
    if closes.len() < MACD_SLOW {
        return 0.0;
    }
    calculate_ema(closes, MACD_FAST) - calculate_ema(closes, MACD_SLOW)
}
