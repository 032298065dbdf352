//! Technical indicators and their interpretation labels.
//!
//! RSI and MACD have two interchangeable implementations behind
//! [`IndicatorBackend`]: the in-house closed form and a TA-Lib compatible
//! one. The two agree closely but not bit-for-bit (different seeding).
//! Every other indicator has a single implementation.

pub mod bands;
pub mod crossover;
pub mod macd;
pub mod momentum;
pub mod volatility;
pub mod volume;

pub use bands::{bollinger, BandPosition, BollingerReading};
pub use crossover::{last_sign_change, sma_cross, SmaCross};
pub use macd::{classify_macd, macd_inhouse, macd_talib, Bias, MacdCross, MacdLines, MacdMomentum, MacdSeries, MacdState};
pub use momentum::{rsi_inhouse, rsi_talib, RsiLabel, RsiReading};
pub use volatility::{volatility_percentile, VolatilityLabel, VolatilityReading};
pub use volume::{volume_ratio, VolumeLabel, VolumeReading};

use serde::{Deserialize, Serialize};

use crate::{AnalysisError, Capabilities, Computed, Period, PriceField, Ratio, Result, SeriesView};

// ============================================================
// BACKENDS
// ============================================================

/// One implementation of the backend-sensitive indicators
pub trait IndicatorBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Latest RSI, `None` when fewer than `period + 1` values
    fn rsi(&self, closes: &[f64], period: Period) -> Option<f64>;

    fn macd(&self, closes: &[f64], fast: Period, slow: Period, signal: Period) -> MacdSeries;
}

/// Self-contained smoothing seeded with the first observation
#[derive(Debug, Clone, Copy, Default)]
pub struct InHouse;

impl IndicatorBackend for InHouse {
    fn name(&self) -> &'static str {
        "in-house"
    }

    fn rsi(&self, closes: &[f64], period: Period) -> Option<f64> {
        rsi_inhouse(closes, period)
    }

    fn macd(&self, closes: &[f64], fast: Period, slow: Period, signal: Period) -> MacdSeries {
        macd_inhouse(closes, fast, slow, signal)
    }
}

/// TA-Lib seeding and warm-up layout
#[derive(Debug, Clone, Copy, Default)]
pub struct TaLibCompat;

impl IndicatorBackend for TaLibCompat {
    fn name(&self) -> &'static str {
        "talib-compat"
    }

    fn rsi(&self, closes: &[f64], period: Period) -> Option<f64> {
        rsi_talib(closes, period)
    }

    fn macd(&self, closes: &[f64], fast: Period, slow: Period, signal: Period) -> MacdSeries {
        macd_talib(closes, fast, slow, signal)
    }
}

/// Backend for the given capabilities
pub fn select_backend(caps: &Capabilities) -> &'static dyn IndicatorBackend {
    if caps.indicators {
        &TaLibCompat
    } else {
        &InHouse
    }
}

// ============================================================
// CONFIG
// ============================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub column: PriceField,
    pub rsi_period: Period,
    pub macd_fast: Period,
    pub macd_slow: Period,
    pub macd_signal: Period,
    pub bollinger_period: Period,
    pub bollinger_k: f64,
    pub squeeze_quantile: Ratio,
    pub sma_fast: Period,
    pub sma_slow: Period,
    pub volume_period: Period,
    pub volatility_window: Period,
    /// Rank only against the last N rolling values; full history when unset
    pub volatility_lookback: Option<Period>,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            column: PriceField::Close,
            rsi_period: Period::new_const(14),
            macd_fast: Period::new_const(12),
            macd_slow: Period::new_const(26),
            macd_signal: Period::new_const(9),
            bollinger_period: Period::new_const(20),
            bollinger_k: 2.0,
            squeeze_quantile: Ratio::new_const(0.2),
            sma_fast: Period::new_const(50),
            sma_slow: Period::new_const(200),
            volume_period: Period::new_const(20),
            volatility_window: Period::new_const(20),
            volatility_lookback: None,
        }
    }
}

impl IndicatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.rsi_period.get() < 2 {
            return Err(AnalysisError::InvalidConfig("rsi_period must be >= 2".into()));
        }
        if self.macd_fast >= self.macd_slow {
            return Err(AnalysisError::InvalidConfig(
                "macd_fast must be smaller than macd_slow".into(),
            ));
        }
        if self.sma_fast >= self.sma_slow {
            return Err(AnalysisError::InvalidConfig(
                "sma_fast must be smaller than sma_slow".into(),
            ));
        }
        if !self.bollinger_k.is_finite() || self.bollinger_k <= 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "bollinger_k must be a positive number, got {}",
                self.bollinger_k
            )));
        }
        Ok(())
    }
}

// ============================================================
// RESULT
// ============================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorResult {
    pub rsi: Computed<RsiReading>,
    pub macd: MacdState,
    pub bollinger: Computed<BollingerReading>,
    pub sma_cross: Computed<SmaCross>,
    pub volume: Computed<VolumeReading>,
    pub volatility: Computed<VolatilityReading>,
    /// Which backend produced RSI and MACD
    pub backend: String,
}

/// Compute every indicator. Short series never fail: each field that lacks
/// history reports [`Computed::InsufficientData`] on its own.
pub fn compute_indicators(
    view: &SeriesView,
    config: &IndicatorConfig,
    caps: &Capabilities,
) -> IndicatorResult {
    let backend = select_backend(caps);
    log::debug!("{}: indicators via {} backend", view.ticker(), backend.name());

    let prices = view.column(config.column);
    let n = prices.len();

    let rsi = match backend.rsi(&prices, config.rsi_period) {
        Some(value) => Computed::Ready(RsiReading::new(value)),
        None => Computed::InsufficientData {
            need: config.rsi_period.get() + 1,
            got: n,
        },
    };

    let macd = classify_macd(&backend.macd(
        &prices,
        config.macd_fast,
        config.macd_slow,
        config.macd_signal,
    ));

    IndicatorResult {
        rsi,
        macd,
        bollinger: bollinger(
            &prices,
            config.bollinger_period,
            config.bollinger_k,
            config.squeeze_quantile,
        ),
        sma_cross: sma_cross(&prices, config.sma_fast, config.sma_slow),
        volume: volume_ratio(&view.volumes(), config.volume_period),
        volatility: volatility_percentile(
            &prices,
            config.volatility_window,
            config.volatility_lookback,
        ),
        backend: backend.name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_selection() {
        assert_eq!(select_backend(&Capabilities::none()).name(), "in-house");
        assert_eq!(select_backend(&Capabilities::all()).name(), "talib-compat");
    }

    #[test]
    fn test_config_validation() {
        assert!(IndicatorConfig::default().validate().is_ok());

        let bad = IndicatorConfig {
            macd_fast: Period::new_const(30),
            ..IndicatorConfig::default()
        };
        assert!(matches!(bad.validate(), Err(AnalysisError::InvalidConfig(_))));

        let bad = IndicatorConfig {
            bollinger_k: f64::NAN,
            ..IndicatorConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_backends_agree_on_long_series() {
        let closes: Vec<f64> = (0..300).map(|i| 100.0 + (i as f64 / 9.0).sin() * 4.0 + i as f64 * 0.05).collect();
        let p = Period::new_const(14);
        let a = InHouse.rsi(&closes, p).unwrap();
        let b = TaLibCompat.rsi(&closes, p).unwrap();
        assert!((a - b).abs() < 1.0, "{a} vs {b}");
    }
}
