// =============================================================================
// Relative Strength Index (RSI) — trailing simple average
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1 — Compute price changes (deltas) from consecutive closes.
// Step 2 — Split deltas into gains (positive part) and losses (magnitude of
//          the negative part).
// Step 3 — Average gains / losses over the most recent `period` deltas only.
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// Thresholds:  RSI > 70 => OVERBOUGHT,  RSI < 30 => OVERSOLD.
// =============================================================================

/// Neutral reading returned when there is not enough history.
pub const NEUTRAL_RSI: f64 = 50.0;

/// Compute the current RSI for `closes` (oldest first).
///
/// # Edge cases
/// - `period == 0` or `closes.len() < period + 1` => `NEUTRAL_RSI`.
/// - Average loss of exactly zero => 100.0 (only gains in the window).
pub fn calculate_rsi(closes: &[f64], period: usize) -> f64 {
    if period == 0 || closes.len() < period + 1 {
        return NEUTRAL_RSI;
    }

    // --- Deltas over the trailing window -------------------------------------
    let window = &closes[closes.len() - period - 1..];
    let (sum_gain, sum_loss) = window.windows(2).fold((0.0_f64, 0.0_f64), |(g, l), w| {
        let delta = w[1] - w[0];
        if delta > 0.0 {
            (g + delta, l)
        } else if delta < 0.0 {
            (g, l - delta)
        } else {
            (g, l)
        }
    });

    let period_f = period as f64;
    let avg_gain = sum_gain / period_f;
    let avg_loss = sum_loss / period_f;

    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// Human-readable zone for an RSI value.
pub fn rsi_zone(value: f64) -> &'static str {
    if value > 70.0 {
        "OVERBOUGHT"
    } else if value < 30.0 {
        "OVERSOLD"
    } else {
        "NEUTRAL"
    }
}
