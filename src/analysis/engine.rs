// =============================================================================
// Analysis Engine — validation, fan-out and assembly
// =============================================================================
//
// The only component that knows about every stage:
//
//   closes + bars ──► indicators ──┬──► confidence
//                                  ├──► signal
//                                  └──► buy / sell levels
//
// Inputs are validated up front so calculators never see partial data, and
// the finished result is checked for non-finite numbers before it leaves.
// Either a complete AnalysisResult or an error is returned, never a mix.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::analysis::confidence::{score_confidence, sub_scores, ConfidenceResult};
use crate::analysis::error::AnalysisError;
use crate::analysis::levels::{calculate_buy_levels, calculate_sell_levels, BuyLevel, JitterSource, SellLevel};
use crate::analysis::signal::{generate_signal, SignalResult};
use crate::indicators::{calculate_indicators, rsi::rsi_zone, IndicatorSet};
use crate::types::OhlcvBar;

/// Raw payload as supplied by the request adapter. Every field is optional so
/// that presence can be validated here rather than by the JSON decoder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    #[serde(default)]
    pub candlestick_data: Option<Vec<OhlcvBar>>,
    #[serde(default)]
    pub historical_prices: Option<Vec<f64>>,
    #[serde(default)]
    pub current_price: Option<f64>,
}

/// Complete, self-contained analysis of one price history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(flatten)]
    pub confidence: ConfidenceResult,
    #[serde(flatten)]
    pub signal: SignalResult,
    pub buy_levels: Vec<BuyLevel>,
    pub sell_levels: Vec<SellLevel>,
    pub technical_indicators: IndicatorSet,
}

/// Validate optional payload fields and run the pipeline.
pub fn analyze_request(
    request: &AnalysisRequest,
    jitter: &mut dyn JitterSource,
) -> Result<AnalysisResult, AnalysisError> {
    let bars = request
        .candlestick_data
        .as_deref()
        .ok_or_else(|| AnalysisError::validation("candlestickData is required"))?;
    let closes = request
        .historical_prices
        .as_deref()
        .ok_or_else(|| AnalysisError::validation("historicalPrices is required"))?;
    let current_price = request
        .current_price
        .ok_or_else(|| AnalysisError::validation("currentPrice is required"))?;

    analyze(bars, closes, current_price, jitter)
}

/// Run the full analysis pipeline.
///
/// `bars` and `closes` cover the same trading days. Bars are re-ordered by
/// date before use; closes are taken as given (oldest first).
pub fn analyze(
    bars: &[OhlcvBar],
    closes: &[f64],
    current_price: f64,
    jitter: &mut dyn JitterSource,
) -> Result<AnalysisResult, AnalysisError> {
    validate_inputs(bars, closes, current_price)?;

    let mut ordered = bars.to_vec();
    ordered.sort_by_key(|b| b.date);

    let indicators = calculate_indicators(closes, &ordered);
    if let Some(field) = indicators.first_non_finite() {
        error!(field, ?indicators, "indicator produced a non-finite value");
        return Err(AnalysisError::computation(format!("indicator `{field}` is not finite")));
    }

    debug!(
        rsi = indicators.rsi,
        rsi_zone = rsi_zone(indicators.rsi),
        macd = indicators.macd,
        stochastic = indicators.stochastic,
        sub_scores = ?sub_scores(&indicators, current_price),
        "indicators computed"
    );

    let confidence = score_confidence(&indicators, current_price);
    let signal = generate_signal(&indicators, current_price);
    let buy_levels = calculate_buy_levels(current_price, &indicators, jitter);
    let sell_levels = calculate_sell_levels(current_price, &indicators, jitter);

    if !buy_levels.iter().all(BuyLevel::is_finite) || !sell_levels.iter().all(SellLevel::is_finite) {
        error!(?buy_levels, ?sell_levels, current_price, "price level is not finite");
        return Err(AnalysisError::computation("price level is not finite"));
    }

    Ok(AnalysisResult {
        confidence,
        signal,
        buy_levels,
        sell_levels,
        technical_indicators: indicators,
    })
}

fn validate_inputs(bars: &[OhlcvBar], closes: &[f64], current_price: f64) -> Result<(), AnalysisError> {
    if bars.is_empty() {
        return Err(AnalysisError::validation("candlestickData must not be empty"));
    }
    if closes.is_empty() {
        return Err(AnalysisError::validation("historicalPrices must not be empty"));
    }
    if !current_price.is_finite() || current_price <= 0.0 {
        return Err(AnalysisError::validation(format!(
            "currentPrice must be a positive number, got {current_price}"
        )));
    }
    if bars.len() != closes.len() {
        return Err(AnalysisError::validation(format!(
            "candlestickData ({}) and historicalPrices ({}) must cover the same days",
            bars.len(),
            closes.len()
        )));
    }
    if let Some(i) = closes.iter().position(|c| !c.is_finite()) {
        return Err(AnalysisError::validation(format!("historicalPrices[{i}] is not a finite number")));
    }
    if let Some(bar) = bars.iter().find(|b| !b.is_finite()) {
        return Err(AnalysisError::validation(format!(
            "candlestickData entry for {} has a non-finite price",
            bar.date
        )));
    }
    if let Some(i) = closes.iter().position(|&c| c <= 0.0) {
        return Err(AnalysisError::validation(format!("historicalPrices[{i}] must be positive")));
    }
    if let Some(bar) = bars.iter().find(|b| !b.is_positive()) {
        return Err(AnalysisError::validation(format!(
            "candlestickData entry for {} has a non-positive price",
            bar.date
        )));
    }
    if let Some(bar) = bars.iter().find(|b| b.high < b.low) {
        return Err(AnalysisError::validation(format!(
            "candlestickData entry for {} has high below low",
            bar.date
        )));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::levels::{FloorJitter, RandomJitter};
    use crate::analysis::signal::SignalKind;
    use crate::types::Confidence;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn bars_from_closes(closes: &[f64]) -> Vec<OhlcvBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| OhlcvBar {
                date: start + chrono::Days::new(i as u64),
                open: c,
                high: c * 1.01,
                low: c * 0.99,
                close: c,
                volume: 50_000,
            })
            .collect()
    }

    fn rising(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64 * 0.5).collect()
    }

    #[test]
    fn flat_history_end_to_end() {
        let closes = vec![50.0; 20];
        let bars = bars_from_closes(&closes);
        let result = analyze(&bars, &closes, 50.0, &mut FloorJitter).unwrap();

        let ind = result.technical_indicators;
        assert_eq!((ind.bollinger.upper, ind.bollinger.middle, ind.bollinger.lower), (50.0, 50.0, 50.0));
        assert_eq!(ind.volatility, 0.0);
        assert_eq!(ind.macd, 0.0);
        // Flat run => no losses => RSI 100 => overbought and price on the upper band.
        assert_eq!(ind.rsi, 100.0);
        assert_eq!(result.signal.kind, Some(SignalKind::StrongSell));
        assert_eq!(result.buy_levels[0].price, 50.0);
        assert_eq!(result.sell_levels[0].stop_loss, 50.0);
    }

    #[test]
    fn rising_history_is_bullish() {
        let closes = rising(60);
        let bars = bars_from_closes(&closes);
        let price = *closes.last().unwrap();
        let result = analyze(&bars, &closes, price, &mut FloorJitter).unwrap();
        assert!(result.technical_indicators.macd > 0.0);
        assert_eq!(result.technical_indicators.rsi, 100.0);
        // Price sits exactly on the close, inside the envelope.
        assert!(result.technical_indicators.bollinger.contains(price));
        assert_eq!(result.signal.kind, Some(SignalKind::BullishMomentum));
        assert_eq!(result.confidence.confidence, Confidence::Medium);
    }

    #[test]
    fn bars_are_sorted_before_stochastic() {
        let closes = rising(30);
        let mut bars = bars_from_closes(&closes);
        let in_order = analyze(&bars, &closes, 110.0, &mut FloorJitter).unwrap();
        bars.reverse();
        let reversed = analyze(&bars, &closes, 110.0, &mut FloorJitter).unwrap();
        assert_eq!(
            in_order.technical_indicators.stochastic,
            reversed.technical_indicators.stochastic
        );
    }

    #[test]
    fn seeded_runs_are_identical() {
        let closes = rising(40);
        let bars = bars_from_closes(&closes);
        let a = analyze(&bars, &closes, 118.0, &mut RandomJitter::seeded(11)).unwrap();
        let b = analyze(&bars, &closes, 118.0, &mut RandomJitter::seeded(11)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn missing_fields_are_validation_errors() {
        let closes = rising(20);
        let bars = bars_from_closes(&closes);

        let req = AnalysisRequest {
            candlestick_data: None,
            historical_prices: Some(closes.clone()),
            current_price: Some(100.0),
        };
        assert_eq!(
            analyze_request(&req, &mut FloorJitter),
            Err(AnalysisError::validation("candlestickData is required"))
        );

        let req = AnalysisRequest {
            candlestick_data: Some(bars.clone()),
            historical_prices: None,
            current_price: Some(100.0),
        };
        assert!(matches!(analyze_request(&req, &mut FloorJitter), Err(AnalysisError::Validation(_))));

        let req = AnalysisRequest {
            candlestick_data: Some(bars),
            historical_prices: Some(closes),
            current_price: None,
        };
        assert_eq!(
            analyze_request(&req, &mut FloorJitter),
            Err(AnalysisError::validation("currentPrice is required"))
        );
    }

    #[test]
    fn malformed_inputs_are_rejected() {
        let closes = rising(20);
        let bars = bars_from_closes(&closes);

        assert!(matches!(analyze(&[], &closes, 100.0, &mut FloorJitter), Err(AnalysisError::Validation(_))));
        assert!(matches!(analyze(&bars, &[], 100.0, &mut FloorJitter), Err(AnalysisError::Validation(_))));
        assert!(matches!(analyze(&bars, &closes, 0.0, &mut FloorJitter), Err(AnalysisError::Validation(_))));
        assert!(matches!(analyze(&bars, &closes, f64::NAN, &mut FloorJitter), Err(AnalysisError::Validation(_))));
        assert!(matches!(
            analyze(&bars[1..], &closes, 100.0, &mut FloorJitter),
            Err(AnalysisError::Validation(_))
        ));

        let mut bad = closes.clone();
        bad[3] = f64::INFINITY;
        let err = analyze(&bars, &bad, 100.0, &mut FloorJitter).unwrap_err();
        assert_eq!(err.public_message(), "historicalPrices[3] is not a finite number");
    }

    #[test]
    fn non_positive_prices_are_rejected() {
        let closes = rising(20);
        let bars = bars_from_closes(&closes);

        let mut zero_close = closes.clone();
        zero_close[5] = 0.0;
        let err = analyze(&bars, &zero_close, 100.0, &mut FloorJitter).unwrap_err();
        assert_eq!(err.public_message(), "historicalPrices[5] must be positive");

        let mut negative_close = closes.clone();
        negative_close[0] = -12.5;
        assert!(matches!(
            analyze(&bars, &negative_close, 100.0, &mut FloorJitter),
            Err(AnalysisError::Validation(_))
        ));

        let mut negative_low = bars.clone();
        negative_low[2].low = -1.0;
        let err = analyze(&negative_low, &closes, 100.0, &mut FloorJitter).unwrap_err();
        assert!(err.public_message().contains("non-positive price"));
    }

    #[test]
    fn inverted_bar_range_is_rejected() {
        let closes = rising(20);
        let mut bars = bars_from_closes(&closes);
        bars[7].high = bars[7].low - 0.5;

        let err = analyze(&bars, &closes, 100.0, &mut FloorJitter).unwrap_err();
        assert!(matches!(err, AnalysisError::Validation(_)));
        assert!(err.public_message().ends_with("has high below low"));
    }

    #[test]
    fn overflow_becomes_computation_error() {
        // Finite inputs whose squared deviations overflow to infinity.
        let closes = vec![1e300, 1.0, 1e300, 1.0];
        let bars = bars_from_closes(&[1.0, 1.0, 1.0, 1.0]);
        let err = analyze(&bars, &closes, 100.0, &mut FloorJitter).unwrap_err();
        assert!(matches!(err, AnalysisError::Computation(_)));
        assert_eq!(err.public_message(), crate::analysis::error::GENERIC_FAILURE);
    }

    #[test]
    fn result_serialises_to_flat_layout() {
        let closes = rising(30);
        let bars = bars_from_closes(&closes);
        let result = analyze(&bars, &closes, 112.0, &mut FloorJitter).unwrap();
        let json = serde_json::to_value(&result).unwrap();

        for key in [
            "confidence",
            "successProbability",
            "riskScore",
            "currentSignal",
            "recommendation",
            "buyLevels",
            "sellLevels",
            "technicalIndicators",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert!(json["technicalIndicators"]["bollinger"]["upper"].is_number());
        assert_eq!(json["buyLevels"].as_array().unwrap().len(), 2);
        assert!(json["sellLevels"][0]["stopLoss"].is_number());
    }

    #[test]
    fn request_payload_deserialises() {
        let json = serde_json::json!({
            "candlestickData": [
                {"date": "2024-01-02", "open": 10.0, "high": 11.0, "low": 9.0, "close": 10.5, "volume": 100}
            ],
            "historicalPrices": [10.5],
            "currentPrice": 10.7
        });
        let req: AnalysisRequest = serde_json::from_value(json).unwrap();
        let result = analyze_request(&req, &mut FloorJitter).unwrap();
        assert_eq!(result.technical_indicators.rsi, 50.0);
        assert_eq!(result.technical_indicators.stochastic, 50.0);
    }

    #[test]
    fn extreme_oversold_scenario() {
        // Long decline: RSI 0, MACD negative, price below the lower band.
        let closes: Vec<f64> = (0..40).map(|i| 200.0 - i as f64 * 2.0).collect();
        let bars = bars_from_closes(&closes);
        let result = analyze(&bars, &closes, 100.0, &mut FloorJitter).unwrap();
        assert_eq!(result.signal.kind, Some(SignalKind::StrongBuy));
        // Every sub-score is penalised.
        assert_eq!(result.confidence.confidence, Confidence::Low);
        assert_eq!(result.confidence.success_probability, 54);
        assert_eq!(result.confidence.risk_score, 6);
    }

    proptest! {
        #[test]
        fn pipeline_never_fails_on_sane_input(
            closes in prop::collection::vec(1.0f64..10_000.0, 1..70),
            price in 0.01f64..20_000.0,
            seed in any::<u64>(),
        ) {
            let bars = bars_from_closes(&closes);
            let result = analyze(&bars, &closes, price, &mut RandomJitter::seeded(seed));
            prop_assert!(result.is_ok());
            let r = result.unwrap();
            prop_assert!(r.confidence.success_probability <= 95);
            prop_assert!((1..=10).contains(&r.confidence.risk_score));
            prop_assert!((0.0..=100.0).contains(&r.technical_indicators.stochastic));
        }
    }
}
