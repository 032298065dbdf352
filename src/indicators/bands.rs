//! Bollinger band position and squeeze.

use serde::{Deserialize, Serialize};

use crate::window::{quantile, RollingWindow};
use crate::{Computed, Label, Period, Ratio};

/// Where the latest close sits, by octile of the band range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandPosition {
    AboveUpperBand,
    NearUpperBand,
    UpperHalf,
    LowerHalf,
    NearLowerBand,
    BelowLowerBand,
    /// Zero-width bands: every close equals the middle line
    InsideBand,
}

impl BandPosition {
    /// `%b` is `(close - lower) / (upper - lower)`.
    pub fn from_percent_b(pct_b: f64) -> Self {
        match pct_b {
            p if p > 1.0 => BandPosition::AboveUpperBand,
            p if p >= 7.0 / 8.0 => BandPosition::NearUpperBand,
            p if p >= 0.5 => BandPosition::UpperHalf,
            p if p > 1.0 / 8.0 => BandPosition::LowerHalf,
            p if p >= 0.0 => BandPosition::NearLowerBand,
            _ => BandPosition::BelowLowerBand,
        }
    }
}

impl Label for BandPosition {
    fn label(&self) -> &'static str {
        match self {
            BandPosition::AboveUpperBand => "above upper band",
            BandPosition::NearUpperBand => "near upper band",
            BandPosition::UpperHalf => "upper half",
            BandPosition::LowerHalf => "lower half",
            BandPosition::NearLowerBand => "near lower band",
            BandPosition::BelowLowerBand => "below lower band",
            BandPosition::InsideBand => "inside band",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerReading {
    pub position: BandPosition,
    pub percent_b: Option<f64>,
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    /// `(upper - lower) / middle`, undefined for a zero middle line
    pub bandwidth: Option<f64>,
    /// `None` until `period` bandwidth values exist
    pub squeeze: Option<bool>,
}

impl Label for BollingerReading {
    fn label(&self) -> &'static str {
        self.position.label()
    }
}

/// Bands of `period` bars at `k` population standard deviations.
///
/// The squeeze flag compares the latest bandwidth with the
/// `squeeze_quantile` of the last `period` bandwidths.
pub fn bollinger(
    closes: &[f64],
    period: Period,
    k: f64,
    squeeze_quantile: Ratio,
) -> Computed<BollingerReading> {
    let n = closes.len();
    if n < period.get() {
        return Computed::InsufficientData {
            need: period.get(),
            got: n,
        };
    }

    let mut window = RollingWindow::new(period);
    let mut bandwidths = Vec::with_capacity(n + 1 - period.get());
    let mut latest = (0.0, 0.0);
    for &c in closes {
        window.push(c);
        if !window.is_full() {
            continue;
        }
        let (Some(mean), Some(std)) = (window.mean(), window.std_dev()) else {
            continue;
        };
        latest = (mean, std);
        if mean != 0.0 {
            bandwidths.push(2.0 * k * std / mean);
        }
    }

    let (middle, std) = latest;
    let upper = middle + k * std;
    let lower = middle - k * std;
    let close = closes[n - 1];

    let (position, percent_b) = if upper - lower > 0.0 {
        let pct_b = (close - lower) / (upper - lower);
        (BandPosition::from_percent_b(pct_b), Some(pct_b))
    } else {
        (BandPosition::InsideBand, None)
    };

    let bandwidth = (middle != 0.0).then(|| (upper - lower) / middle);
    let squeeze = match bandwidth {
        Some(bw) if bandwidths.len() >= period.get() => {
            let recent = &bandwidths[bandwidths.len() - period.get()..];
            quantile(recent, squeeze_quantile.get()).map(|threshold| bw <= threshold)
        }
        _ => None,
    };

    Computed::Ready(BollingerReading {
        position,
        percent_b,
        upper,
        middle,
        lower,
        bandwidth,
        squeeze,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const P20: Period = Period::new_const(20);
    const Q20: Ratio = Ratio::new_const(0.2);

    #[test]
    fn test_octile_boundaries() {
        assert_eq!(BandPosition::from_percent_b(1.01), BandPosition::AboveUpperBand);
        assert_eq!(BandPosition::from_percent_b(1.0), BandPosition::NearUpperBand);
        assert_eq!(BandPosition::from_percent_b(0.875), BandPosition::NearUpperBand);
        assert_eq!(BandPosition::from_percent_b(0.5), BandPosition::UpperHalf);
        assert_eq!(BandPosition::from_percent_b(0.49), BandPosition::LowerHalf);
        assert_eq!(BandPosition::from_percent_b(0.125), BandPosition::NearLowerBand);
        assert_eq!(BandPosition::from_percent_b(0.0), BandPosition::NearLowerBand);
        assert_eq!(BandPosition::from_percent_b(-0.01), BandPosition::BelowLowerBand);
    }

    #[test]
    fn test_flat_series_is_inside_band() {
        let reading = bollinger(&[100.0; 30], P20, 2.0, Q20).ready().copied().unwrap();
        assert_eq!(reading.position, BandPosition::InsideBand);
        assert_eq!(reading.percent_b, None);
        assert_eq!(reading.bandwidth, Some(0.0));
        // only 11 bandwidths so far
        assert_eq!(reading.squeeze, None);
    }

    #[test]
    fn test_spike_is_above_band() {
        let mut closes = vec![100.0; 25];
        closes[24] = 120.0;
        let reading = bollinger(&closes, P20, 2.0, Q20).ready().copied().unwrap();
        // a lone outlier in 20 bars sits sqrt(19) deviations above the mean
        assert_eq!(reading.position, BandPosition::AboveUpperBand);
    }

    #[test]
    fn test_insufficient() {
        assert_eq!(
            bollinger(&[1.0; 19], P20, 2.0, Q20),
            Computed::InsufficientData { need: 20, got: 19 }
        );
    }

    #[test]
    fn test_squeeze_after_volatility_collapse() {
        let mut closes: Vec<f64> = (0..40).map(|i| if i % 2 == 0 { 90.0 } else { 110.0 }).collect();
        closes.extend((0..20).map(|i| 100.0 + if i % 2 == 0 { 0.1 } else { -0.1 }));
        let reading = bollinger(&closes, P20, 2.0, Q20).ready().copied().unwrap();
        assert_eq!(reading.squeeze, Some(true));
    }
}
