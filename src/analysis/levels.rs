// =============================================================================
// Level Calculator — candidate buy / sell prices
// =============================================================================
//
// Each level pairs a deterministic anchor price with cosmetic probability and
// upside/downside figures drawn uniformly from fixed half-open integer ranges.
// The draws come from an injected `JitterSource` so a seeded source makes the
// whole output reproducible.
//
//   buy  1: lower band      prob [70,85)  upside   [10,25)  target   middle
//   buy  2: price * 0.95    prob [60,80)  upside   [8,20)   target   price * 1.12
//   sell 1: upper band      prob [65,85)  downside [8,18)   stop     middle
//   sell 2: price * 1.05    prob [55,70)  downside [12,20)  stop     price * 0.92
// =============================================================================

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::indicators::IndicatorSet;

// -----------------------------------------------------------------------------
// Jitter sources
// -----------------------------------------------------------------------------

/// Source of the uniform integer draws used to dress up price levels.
pub trait JitterSource {
    /// Uniform draw from `[low, high)`. Callers always pass `low < high`.
    fn draw(&mut self, low: u32, high: u32) -> u32;
}

/// `StdRng`-backed jitter: entropy-seeded in production, fixed seed in tests.
#[derive(Debug, Clone)]
pub struct RandomJitter {
    rng: StdRng,
}

impl RandomJitter {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl JitterSource for RandomJitter {
    fn draw(&mut self, low: u32, high: u32) -> u32 {
        self.rng.gen_range(low..high)
    }
}

/// Always returns the bottom of the range.
#[cfg(test)]
#[derive(Debug, Clone, Copy, Default)]
pub struct FloorJitter;

#[cfg(test)]
impl JitterSource for FloorJitter {
    fn draw(&mut self, low: u32, _high: u32) -> u32 {
        low
    }
}

// -----------------------------------------------------------------------------
// Level types
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuyLevel {
    pub price: f64,
    pub probability: u32,
    pub upside: u32,
    pub target: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellLevel {
    pub price: f64,
    pub probability: u32,
    pub downside: u32,
    pub stop_loss: f64,
}

impl BuyLevel {
    pub fn is_finite(&self) -> bool {
        self.price.is_finite() && self.target.is_finite()
    }
}

impl SellLevel {
    pub fn is_finite(&self) -> bool {
        self.price.is_finite() && self.stop_loss.is_finite()
    }
}

// -----------------------------------------------------------------------------
// Calculation
// -----------------------------------------------------------------------------

/// Candidate entry levels, strongest first.
pub fn calculate_buy_levels(
    current_price: f64,
    indicators: &IndicatorSet,
    jitter: &mut dyn JitterSource,
) -> Vec<BuyLevel> {
    let bands = &indicators.bollinger;
    vec![
        BuyLevel {
            price: bands.lower,
            probability: jitter.draw(70, 85),
            upside: jitter.draw(10, 25),
            target: bands.middle,
        },
        BuyLevel {
            price: current_price * 0.95,
            probability: jitter.draw(60, 80),
            upside: jitter.draw(8, 20),
            target: current_price * 1.12,
        },
    ]
}

/// Candidate exit levels, strongest first.
pub fn calculate_sell_levels(
    current_price: f64,
    indicators: &IndicatorSet,
    jitter: &mut dyn JitterSource,
) -> Vec<SellLevel> {
    let bands = &indicators.bollinger;
    vec![
        SellLevel {
            price: bands.upper,
            probability: jitter.draw(65, 85),
            downside: jitter.draw(8, 18),
            stop_loss: bands.middle,
        },
        SellLevel {
            price: current_price * 1.05,
            probability: jitter.draw(55, 70),
            downside: jitter.draw(12, 20),
            stop_loss: current_price * 0.92,
        },
    ]
}
