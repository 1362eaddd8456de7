// =============================================================================
// Confidence Scorer — heuristic tiering of an IndicatorSet
// =============================================================================
//
// Each indicator contributes a sub-score in (0, 1]: 1.0 when the reading sits
// in its "normal" band, a fixed penalty value otherwise.  The composite score
// is the unweighted mean of the four sub-scores and selects a tier:
//
//   s > 0.8        => High    success = 75 + (s - 0.8) * 125   risk = max(1, 5 - 3s)
//   0.6 < s <= 0.8 => Medium  success = 55 + (s - 0.6) * 100   risk = 4 + (0.8 - s) * 10
//   s <= 0.6       => Low     success = 35 + 33s               risk = 6 + (0.6 - s) * 8
//
// Integer outputs truncate toward zero, success is capped at 95 and risk is
// clamped to [1, 10].  The constants are fixed heuristics, not a fitted model.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::indicators::IndicatorSet;
use crate::types::Confidence;

/// Hard cap on the reported success probability.
const MAX_SUCCESS_PROBABILITY: i64 = 95;

/// Sub-score of a single indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubScore {
    pub name: &'static str,
    pub value: f64,
    pub score: f64,
}

/// Output of the confidence scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceResult {
    pub confidence: Confidence,
    pub success_probability: u8,
    pub risk_score: u8,
}

/// Per-indicator sub-scores, in the order they are averaged.
pub fn sub_scores(indicators: &IndicatorSet, current_price: f64) -> [SubScore; 4] {
    let rsi = indicators.rsi;
    let macd = indicators.macd;
    let stoch = indicators.stochastic;

    [
        SubScore {
            name: "rsi",
            value: rsi,
            score: if (30.0..=70.0).contains(&rsi) { 1.0 } else { 0.6 },
        },
        SubScore {
            name: "macd",
            value: macd,
            score: if macd.abs() < 2.0 { 1.0 } else { 0.7 },
        },
        SubScore {
            name: "bollinger",
            value: current_price,
            score: if indicators.bollinger.contains(current_price) { 1.0 } else { 0.6 },
        },
        SubScore {
            name: "stochastic",
            value: stoch,
            score: if (20.0..=80.0).contains(&stoch) { 1.0 } else { 0.5 },
        },
    ]
}

/// Unweighted mean of the four sub-scores.
pub fn composite_score(indicators: &IndicatorSet, current_price: f64) -> f64 {
    let total = sub_scores(indicators, current_price)
        .iter()
        .fold(0.0, |acc, s| acc + s.score);
    total / 4.0
}

/// Map an IndicatorSet and current price to a confidence tier.
pub fn score_confidence(indicators: &IndicatorSet, current_price: f64) -> ConfidenceResult {
    let s = composite_score(indicators, current_price);

    let (confidence, success, risk) = if s > 0.8 {
        (
            Confidence::High,
            (75.0 + (s - 0.8) * 125.0) as i64,
            ((5.0 - s * 3.0) as i64).max(1),
        )
    } else if s > 0.6 {
        (
            Confidence::Medium,
            (55.0 + (s - 0.6) * 100.0) as i64,
            (4.0 + (0.8 - s) * 10.0) as i64,
        )
    } else {
        (
            Confidence::Low,
            (35.0 + s * 33.0) as i64,
            (6.0 + (0.6 - s) * 8.0) as i64,
        )
    };

    ConfidenceResult {
        confidence,
        success_probability: success.clamp(0, MAX_SUCCESS_PROBABILITY) as u8,
        risk_score: risk.clamp(1, 10) as u8,
    }
}
