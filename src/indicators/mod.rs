// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators behind every
// analysis.  Unlike a streaming engine these never return "no value": each
// indicator has an explicit fallback (neutral reading, whole-series window)
// so that a short history still produces a complete, finite IndicatorSet.

pub mod bollinger;
pub mod ema;
pub mod rsi;
pub mod sma;
pub mod stochastic;

use serde::{Deserialize, Serialize};

use crate::types::OhlcvBar;

pub use bollinger::BollingerBands;

/// RSI look-back.
pub const RSI_PERIOD: usize = 14;
/// Bollinger look-back.
pub const BOLLINGER_PERIOD: usize = 20;
/// Bollinger band width in standard deviations.
pub const BOLLINGER_STD: f64 = 2.0;
/// Stochastic %K look-back.
pub const STOCHASTIC_PERIOD: usize = 14;
/// Window for the volatility reading.
pub const VOLATILITY_PERIOD: usize = 20;

/// Snapshot of every indicator derived from one price history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub rsi: f64,
    pub macd: f64,
    pub bollinger: BollingerBands,
    pub stochastic: f64,
    pub sma20: f64,
    pub sma50: f64,
    pub volatility: f64,
}

impl IndicatorSet {
    /// Name of the first non-finite field, if any.
    pub fn first_non_finite(&self) -> Option<&'static str> {
        let fields = [
            ("rsi", self.rsi),
            ("macd", self.macd),
            ("bollinger.upper", self.bollinger.upper),
            ("bollinger.middle", self.bollinger.middle),
            ("bollinger.lower", self.bollinger.lower),
            ("stochastic", self.stochastic),
            ("sma20", self.sma20),
            ("sma50", self.sma50),
            ("volatility", self.volatility),
        ];
        fields.iter().find(|(_, v)| !v.is_finite()).map(|(name, _)| *name)
    }
}

/// Compute the full IndicatorSet.
///
/// `closes` drives every price-based indicator; `bars` (same trading days,
/// oldest first) is only needed for the stochastic high/low range.
pub fn calculate_indicators(closes: &[f64], bars: &[OhlcvBar]) -> IndicatorSet {
    IndicatorSet {
        rsi: rsi::calculate_rsi(closes, RSI_PERIOD),
        macd: ema::calculate_macd(closes),
        bollinger: bollinger::calculate_bollinger(closes, BOLLINGER_PERIOD, BOLLINGER_STD),
        stochastic: stochastic::calculate_stochastic(bars, STOCHASTIC_PERIOD),
        sma20: sma::calculate_sma(closes, 20),
        sma50: sma::calculate_sma(closes, 50),
        volatility: sma::calculate_volatility(closes, VOLATILITY_PERIOD),
    }
}
