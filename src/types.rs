// =============================================================================
// Shared types used across the stock analyzer
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily OHLCV bar as delivered by the market-data feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: u64,
}

impl OhlcvBar {
    /// `true` when every price field is a finite number.
    pub fn is_finite(&self) -> bool {
        self.open.is_finite() && self.high.is_finite() && self.low.is_finite() && self.close.is_finite()
    }

    /// `true` when every price field is strictly above zero.
    pub fn is_positive(&self) -> bool {
        self.open > 0.0 && self.high > 0.0 && self.low > 0.0 && self.close > 0.0
    }
}

/// Heuristic confidence tier attached to an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_deserialises_from_feed_shape() {
        let json = r#"{"date":"2024-03-01","open":10.0,"high":11.5,"low":9.5,"close":11.0,"volume":1200}"#;
        let bar: OhlcvBar = serde_json::from_str(json).unwrap();
        assert_eq!(bar.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(bar.volume, 1200);
        assert!(bar.is_finite());
    }

    #[test]
    fn bar_with_nan_is_not_finite() {
        let bar = OhlcvBar {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            open: 1.0,
            high: f64::NAN,
            low: 1.0,
            close: 1.0,
            volume: 0,
        };
        assert!(!bar.is_finite());
    }

    #[test]
    fn zero_low_is_not_positive() {
        let bar = OhlcvBar {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            open: 1.0,
            high: 1.2,
            low: 0.0,
            close: 1.1,
            volume: 10,
        };
        assert!(!bar.is_positive());
    }

    #[test]
    fn confidence_serialises_as_tier_name() {
        assert_eq!(serde_json::to_string(&Confidence::High).unwrap(), "\"High\"");
        assert_eq!(Confidence::Medium.to_string(), "Medium");
    }
}
