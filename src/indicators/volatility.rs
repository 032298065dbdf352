//! Historical volatility percentile.

use serde::{Deserialize, Serialize};

use crate::window::{pct_returns, rank_percentile, rolling_std};
use crate::{Computed, Label, Period};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VolatilityLabel {
    ExtremelyLow,
    Low,
    Moderate,
    High,
    ExtremelyHigh,
}

impl VolatilityLabel {
    /// `<= 10` extremely low, `<= 25` low, `>= 90` extremely high,
    /// `>= 75` high, moderate otherwise.
    pub fn from_percentile(percentile: u8) -> Self {
        match percentile {
            0..=10 => VolatilityLabel::ExtremelyLow,
            11..=25 => VolatilityLabel::Low,
            90..=u8::MAX => VolatilityLabel::ExtremelyHigh,
            75..=89 => VolatilityLabel::High,
            _ => VolatilityLabel::Moderate,
        }
    }
}

impl Label for VolatilityLabel {
    fn label(&self) -> &'static str {
        match self {
            VolatilityLabel::ExtremelyLow => "extremely low",
            VolatilityLabel::Low => "low",
            VolatilityLabel::Moderate => "moderate",
            VolatilityLabel::High => "high",
            VolatilityLabel::ExtremelyHigh => "extremely high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolatilityReading {
    /// 0..=100
    pub percentile: u8,
    pub label: VolatilityLabel,
}

impl Label for VolatilityReading {
    fn label(&self) -> &'static str {
        self.label.label()
    }
}

/// Rank of the latest rolling std of returns among all earlier ones
/// (or the last `lookback` of them). Needs `window + 2` closes.
pub fn volatility_percentile(
    closes: &[f64],
    window: Period,
    lookback: Option<Period>,
) -> Computed<VolatilityReading> {
    let need = window.get() + 2;
    if closes.len() < need {
        return Computed::InsufficientData {
            need,
            got: closes.len(),
        };
    }

    let vols = rolling_std(&pct_returns(closes), window);
    let ranked = match lookback {
        Some(lb) if lb.get() < vols.len() => &vols[vols.len() - lb.get()..],
        _ => &vols[..],
    };
    let Some(&current) = ranked.last() else {
        return Computed::InsufficientData {
            need,
            got: closes.len(),
        };
    };

    let percentile = rank_percentile(ranked, current);
    Computed::Ready(VolatilityReading {
        percentile,
        label: VolatilityLabel::from_percentile(percentile),
    })
}
