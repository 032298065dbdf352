//! Chart patterns and candlestick classification.
//!
//! With the pattern capability, triangle boundaries come from fitted
//! trendlines and candlesticks from the trailing-average rules in
//! [`crate::detectors`]. Without it both fall back to plain ratio rules.

pub mod candles;
pub mod chart;
pub mod extrema;

pub use candles::{classify_inhouse, detect_candlestick, CandlestickHit, CandlestickKind, CANDLE_WINDOW};
pub use chart::{detect_chart_patterns, ChartPattern, ChartPatternKind, ChartPatterns, Geometry};
pub use extrema::{swing_highs, swing_lows, swing_points, Swing};

use serde::{Deserialize, Serialize};

use crate::detectors::CandleScanner;
use crate::{AnalysisError, Capabilities, Result, SeriesView};

/// Shortest usable chart-pattern lookback
pub const MIN_LOOKBACK: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Trailing bars searched for chart patterns
    pub lookback: usize,
    /// Neighborhood half-width for swing points
    pub swing_order: usize,
    /// Relative spread at which a boundary (or a pair of peaks) is level
    pub flat_tolerance: f64,
    pub min_touches: usize,
    /// Relative distance of the intervening swing for double tops/bottoms
    pub min_depth: f64,
    /// Relative distance to a fitted trendline that still counts as a touch
    pub touch_tolerance: f64,
    /// Relative per-bar trendline slope treated as flat
    pub trendline_flat_slope: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            lookback: 60,
            swing_order: 3,
            flat_tolerance: 0.01,
            min_touches: 2,
            min_depth: 0.03,
            touch_tolerance: 0.015,
            trendline_flat_slope: 0.0007,
        }
    }
}

impl PatternConfig {
    pub fn validate(&self) -> Result<()> {
        if self.lookback < MIN_LOOKBACK {
            return Err(AnalysisError::InvalidConfig(format!(
                "lookback must be >= {MIN_LOOKBACK}, got {}",
                self.lookback
            )));
        }
        if self.swing_order == 0 {
            return Err(AnalysisError::InvalidConfig("swing_order must be >= 1".into()));
        }
        if self.min_touches < 2 {
            return Err(AnalysisError::InvalidConfig(format!(
                "min_touches must be >= 2, got {}",
                self.min_touches
            )));
        }
        for (name, v) in [
            ("flat_tolerance", self.flat_tolerance),
            ("min_depth", self.min_depth),
            ("touch_tolerance", self.touch_tolerance),
            ("trendline_flat_slope", self.trendline_flat_slope),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(AnalysisError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {v}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternResult {
    pub chart: ChartPatterns,
    /// Most recent candlestick among the final bars, if any
    pub candlestick: Option<CandlestickHit>,
}

/// Chart patterns over the trailing window plus one candlestick label.
pub fn detect_patterns(view: &SeriesView, config: &PatternConfig, caps: &Capabilities) -> Result<PatternResult> {
    config.validate()?;

    let (geometry, scanner) = if caps.patterns {
        (Geometry::Trendline, Some(CandleScanner::default().with_all_defaults()))
    } else {
        (Geometry::Heuristic, None)
    };
    log::debug!("{}: patterns via {:?} geometry", view.ticker(), geometry);

    Ok(PatternResult {
        chart: detect_chart_patterns(view, config, geometry),
        candlestick: detect_candlestick(view, scanner.as_ref()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bar;
    use chrono::{Duration, TimeZone, Utc};

    fn view_of(closes: &[f64]) -> SeriesView {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(t0 + Duration::days(i as i64), c, c + 0.5, c - 0.5, c, 1000.0))
            .collect();
        SeriesView::new("PAT", bars).unwrap()
    }

    #[test]
    fn test_config_validation() {
        assert!(PatternConfig::default().validate().is_ok());
        let short = PatternConfig {
            lookback: 5,
            ..Default::default()
        };
        assert!(matches!(short.validate(), Err(AnalysisError::InvalidConfig(_))));
        let negative = PatternConfig {
            min_depth: -0.1,
            ..Default::default()
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_short_series_has_no_chart_patterns() {
        let view = view_of(&[100.0, 101.0, 102.0]);
        for caps in [Capabilities::none(), Capabilities::all()] {
            let result = detect_patterns(&view, &PatternConfig::default(), &caps).unwrap();
            assert!(result.chart.is_none());
        }
    }

    #[test]
    fn test_double_top_detected() {
        // two peaks near 120 with a trough at 108 between them
        let mut closes = Vec::new();
        closes.extend((0..10).map(|i| 100.0 + 2.0 * i as f64));
        closes.extend((0..6).map(|i| 118.0 - 2.0 * i as f64));
        closes.extend((0..6).map(|i| 108.0 + 2.0 * i as f64));
        closes.extend((0..10).map(|i| 118.0 - 2.0 * i as f64));
        let view = view_of(&closes);
        let result = detect_patterns(&view, &PatternConfig::default(), &Capabilities::none()).unwrap();
        let kinds: Vec<_> = result.chart.patterns().iter().map(|p| p.kind).collect();
        assert!(kinds.contains(&ChartPatternKind::DoubleTop), "{kinds:?}");
    }
}
