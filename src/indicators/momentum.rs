//! RSI with Wilder smoothing.

use serde::{Deserialize, Serialize};

use crate::window::{ExpSmoother, Seed};
use crate::{Label, Period};

/// Below this RSI is oversold
pub const RSI_OVERSOLD: f64 = 30.0;
/// Upper bound (exclusive) of the neutral-bearish band
pub const RSI_NEUTRAL_LOW: f64 = 45.0;
/// Upper bound (inclusive) of the neutral band
pub const RSI_NEUTRAL_HIGH: f64 = 55.0;
/// Above this RSI is overbought
pub const RSI_OVERBOUGHT: f64 = 70.0;

/// RSI interpretation. Bands are `< 30`, `[30, 45)`, `[45, 55]`, `(55, 70]`, `> 70`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RsiLabel {
    Oversold,
    NeutralBearish,
    Neutral,
    NeutralBullish,
    Overbought,
}

impl RsiLabel {
    pub fn from_value(value: f64) -> Self {
        match value {
            v if v < RSI_OVERSOLD => RsiLabel::Oversold,
            v if v < RSI_NEUTRAL_LOW => RsiLabel::NeutralBearish,
            v if v <= RSI_NEUTRAL_HIGH => RsiLabel::Neutral,
            v if v <= RSI_OVERBOUGHT => RsiLabel::NeutralBullish,
            _ => RsiLabel::Overbought,
        }
    }
}

impl Label for RsiLabel {
    fn label(&self) -> &'static str {
        match self {
            RsiLabel::Oversold => "oversold",
            RsiLabel::NeutralBearish => "neutral-bearish",
            RsiLabel::Neutral => "neutral",
            RsiLabel::NeutralBullish => "neutral-bullish",
            RsiLabel::Overbought => "overbought",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RsiReading {
    /// Always within 0..=100
    pub value: f64,
    pub label: RsiLabel,
}

impl RsiReading {
    pub fn new(value: f64) -> Self {
        let value = value.clamp(0.0, 100.0);
        Self {
            value,
            label: RsiLabel::from_value(value),
        }
    }
}

impl Label for RsiReading {
    fn label(&self) -> &'static str {
        self.label.label()
    }
}

/// Latest RSI, smoothing seeded with the first price change.
/// `None` with fewer than `period + 1` values.
pub fn rsi_inhouse(closes: &[f64], period: Period) -> Option<f64> {
    if closes.len() < period.get() + 1 {
        return None;
    }
    let mut gains = ExpSmoother::wilder(period, Seed::First);
    let mut losses = ExpSmoother::wilder(period, Seed::First);
    for w in closes.windows(2) {
        let delta = w[1] - w[0];
        gains.update(delta.max(0.0));
        losses.update((-delta).max(0.0));
    }
    Some(rsi_from_averages(gains.value()?, losses.value()?))
}

/// Latest RSI with TA-Lib seeding: the first averages are simple means of
/// the first `period` gains and losses.
pub fn rsi_talib(closes: &[f64], period: Period) -> Option<f64> {
    if closes.len() < period.get() + 1 {
        return None;
    }
    let mut gains = ExpSmoother::wilder(period, Seed::Sma(period));
    let mut losses = ExpSmoother::wilder(period, Seed::Sma(period));
    for w in closes.windows(2) {
        let delta = w[1] - w[0];
        gains.update(delta.max(0.0));
        losses.update((-delta).max(0.0));
    }
    Some(rsi_from_averages(gains.value()?, losses.value()?))
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    let total = avg_gain + avg_loss;
    if total <= 0.0 {
        // no movement at all
        return 50.0;
    }
    (100.0 * avg_gain / total).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const P14: Period = Period::new_const(14);

    #[test]
    fn test_label_boundaries() {
        assert_eq!(RsiLabel::from_value(29.999), RsiLabel::Oversold);
        assert_eq!(RsiLabel::from_value(30.0), RsiLabel::NeutralBearish);
        assert_eq!(RsiLabel::from_value(44.999), RsiLabel::NeutralBearish);
        assert_eq!(RsiLabel::from_value(45.0), RsiLabel::Neutral);
        assert_eq!(RsiLabel::from_value(55.0), RsiLabel::Neutral);
        assert_eq!(RsiLabel::from_value(55.001), RsiLabel::NeutralBullish);
        assert_eq!(RsiLabel::from_value(70.0), RsiLabel::NeutralBullish);
        assert_eq!(RsiLabel::from_value(70.001), RsiLabel::Overbought);
    }

    #[test]
    fn test_rsi_needs_period_plus_one() {
        let closes: Vec<f64> = (0..14).map(|i| 100.0 + i as f64).collect();
        assert_eq!(rsi_inhouse(&closes, P14), None);
        assert_eq!(rsi_talib(&closes, P14), None);

        let closes: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        assert_eq!(rsi_inhouse(&closes, P14), Some(100.0));
        assert_eq!(rsi_talib(&closes, P14), Some(100.0));
    }

    #[test]
    fn test_rsi_flat_is_neutral() {
        let closes = vec![50.0; 30];
        assert_eq!(rsi_inhouse(&closes, P14), Some(50.0));
        assert_eq!(rsi_talib(&closes, P14), Some(50.0));
    }

    #[test]
    fn test_rsi_falling_is_zero() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
        assert_eq!(rsi_inhouse(&closes, P14), Some(0.0));
    }

    #[test]
    fn test_rsi_alternating_is_balanced() {
        let closes: Vec<f64> = (0..200).map(|i| if i % 2 == 0 { 100.0 } else { 101.0 }).collect();
        let value = rsi_talib(&closes, P14).unwrap();
        assert!((value - 50.0).abs() < 5.0, "got {value}");
    }
}
