// =============================================================================
// Signal Generator — ordered rule evaluation
// =============================================================================
//
// Rules are checked top to bottom and the first match wins:
//
//   1. RSI < 30 and price <= lower band  => Strong Buy
//   2. RSI > 70 and price >= upper band  => Strong Sell
//   3. MACD > 0 and RSI > 50             => Bullish Momentum
//   4. MACD < 0 and RSI < 50             => Bearish Momentum
//   5. otherwise                         => Neutral
//
// Comparisons are strict on RSI, so readings of exactly 30 / 50 / 70 fall
// through to the next rule.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::indicators::IndicatorSet;

/// Discrete trading signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalKind {
    StrongBuy,
    StrongSell,
    BullishMomentum,
    BearishMomentum,
    Neutral,
}

impl SignalKind {
    /// Headline shown to the user.
    pub fn label(self) -> &'static str {
        match self {
            Self::StrongBuy => "Strong Buy Signal - Oversold with Bollinger Support",
            Self::StrongSell => "Strong Sell Signal - Overbought with Bollinger Resistance",
            Self::BullishMomentum => "Bullish Momentum - MACD and RSI Aligned",
            Self::BearishMomentum => "Bearish Momentum - MACD and RSI Declining",
            Self::Neutral => "Neutral - Mixed Signals",
        }
    }

    /// Advisory text paired with the label.
    pub fn recommendation(self) -> &'static str {
        match self {
            Self::StrongBuy => {
                "Multiple indicators suggest oversold conditions. High probability bounce expected."
            }
            Self::StrongSell => {
                "Multiple indicators suggest overbought conditions. Consider taking profits."
            }
            Self::BullishMomentum => "Positive momentum indicators suggest potential upward movement.",
            Self::BearishMomentum => {
                "Negative momentum indicators suggest potential downward pressure."
            }
            Self::Neutral => "Technical indicators are mixed. Wait for clearer directional signals.",
        }
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Signal label plus recommendation, as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalResult {
    #[serde(skip)]
    pub kind: Option<SignalKind>,
    pub current_signal: String,
    pub recommendation: String,
}

impl From<SignalKind> for SignalResult {
    fn from(kind: SignalKind) -> Self {
        Self {
            kind: Some(kind),
            current_signal: kind.label().to_string(),
            recommendation: kind.recommendation().to_string(),
        }
    }
}

/// Pick the signal for the given indicators and price.
pub fn classify(indicators: &IndicatorSet, current_price: f64) -> SignalKind {
    let rsi = indicators.rsi;
    let macd = indicators.macd;
    let bands = &indicators.bollinger;

    if rsi < 30.0 && current_price <= bands.lower {
        SignalKind::StrongBuy
    } else if rsi > 70.0 && current_price >= bands.upper {
        SignalKind::StrongSell
    } else if macd > 0.0 && rsi > 50.0 {
        SignalKind::BullishMomentum
    } else if macd < 0.0 && rsi < 50.0 {
        SignalKind::BearishMomentum
    } else {
        SignalKind::Neutral
    }
}

/// Run the rules and build the caller-facing result.
pub fn generate_signal(indicators: &IndicatorSet, current_price: f64) -> SignalResult {
    classify(indicators, current_price).into()
}
