// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (SMA), an upper band (SMA + k*σ),
// and a lower band (SMA - k*σ), where σ is the population standard deviation
// over the same window.
//
// Short histories are not rejected: the whole series is used as the window.

use serde::{Deserialize, Serialize};

use super::sma::{mean, population_std_dev, trailing};

/// Result of a Bollinger Band calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerBands {
    /// `true` when `price` sits inside the envelope (bounds inclusive).
    pub fn contains(&self, price: f64) -> bool {
        self.lower <= price && price <= self.upper
    }
}

/// Calculate Bollinger Bands over the last `period` closes.
///
/// - `upper`  = SMA + `num_std` * σ
/// - `middle` = SMA
/// - `lower`  = SMA - `num_std` * σ
///
/// Empty input yields all-zero bands.
pub fn calculate_bollinger(closes: &[f64], period: usize, num_std: f64) -> BollingerBands {
    let window = trailing(closes, period);
    let middle = mean(window);
    let std_dev = population_std_dev(window);

    BollingerBands {
        upper: middle + num_std * std_dev,
        middle,
        lower: middle - num_std * std_dev,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bollinger_basic() {
        let closes: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        let bb = calculate_bollinger(&closes, 20, 2.0);
        assert!(bb.upper > bb.middle);
        assert!(bb.lower < bb.middle);
        assert!((bb.middle - 10.5).abs() < 1e-12);
    }

    #[test]
    fn bollinger_short_series_uses_everything() {
        let bb = calculate_bollinger(&[1.0, 2.0, 3.0], 20, 2.0);
        assert!((bb.middle - 2.0).abs() < 1e-12);
        // population σ of [1,2,3] = sqrt(2/3)
        let sigma = (2.0_f64 / 3.0).sqrt();
        assert!((bb.upper - (2.0 + 2.0 * sigma)).abs() < 1e-12);
        assert!((bb.lower - (2.0 - 2.0 * sigma)).abs() < 1e-12);
    }

    #[test]
    fn bollinger_flat() {
        let bb = calculate_bollinger(&vec![50.0; 20], 20, 2.0);
        assert_eq!(
            bb,
            BollingerBands {
                upper: 50.0,
                middle: 50.0,
                lower: 50.0
            }
        );
    }

    #[test]
    fn bollinger_only_looks_at_window() {
        let mut closes = vec![1000.0; 10];
        closes.extend(std::iter::repeat(10.0).take(20));
        let bb = calculate_bollinger(&closes, 20, 2.0);
        assert_eq!(bb.middle, 10.0);
        assert_eq!(bb.upper, 10.0);
    }

    #[test]
    fn contains_is_inclusive() {
        let bb = BollingerBands {
            upper: 110.0,
            middle: 100.0,
            lower: 90.0,
        };
        assert!(bb.contains(90.0));
        assert!(bb.contains(110.0));
        assert!(!bb.contains(89.99));
    }
}
