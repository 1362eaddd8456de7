// =============================================================================
// Stochastic Oscillator (%K)
// =============================================================================
//
// %K locates the latest close within the high/low range of the look-back
// window:
//   %K = (close - lowest_low) / (highest_high - lowest_low) * 100
//
// Readings above 80 are conventionally overbought, below 20 oversold.

use crate::types::OhlcvBar;

/// Neutral reading for short histories and flat ranges.
pub const NEUTRAL_STOCHASTIC: f64 = 50.0;

/// Compute %K over the most recent `period` bars (oldest first).
///
/// # Edge cases
/// - `period == 0` or fewer than `period` bars => `NEUTRAL_STOCHASTIC`.
/// - `highest_high == lowest_low` => `NEUTRAL_STOCHASTIC`.
///
/// The result is clamped to [0, 100] so a close printed outside its own
/// high/low (bad feed data) cannot escape the oscillator's range.
pub fn calculate_stochastic(bars: &[OhlcvBar], period: usize) -> f64 {
    if period == 0 || bars.len() < period {
        return NEUTRAL_STOCHASTIC;
    }

    let window = &bars[bars.len() - period..];
    let highest_high = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let lowest_low = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let current_close = window[window.len() - 1].close;

    if highest_high == lowest_low {
        return NEUTRAL_STOCHASTIC;
    }

    let k = (current_close - lowest_low) / (highest_high - lowest_low) * 100.0;
    k.clamp(0.0, 100.0)
}
