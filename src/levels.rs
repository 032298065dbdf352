//! Support and resistance levels from clustered swing points.
//!
//! Swing lows feed support, swing highs feed resistance, whatever their
//! price relative to the last close.

use serde::{Deserialize, Serialize};

use crate::patterns::extrema::{swing_highs, swing_lows};
use crate::{AnalysisError, Period, Result, SeriesView};

/// Smallest tolerance used for clustering
const MIN_TOLERANCE: f64 = 1e-9;

/// Where swing points are taken from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LevelSource {
    /// Closes for both sides
    #[default]
    Close,
    /// Lows for support, highs for resistance
    HighLow,
}

/// Clustering distance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tolerance {
    /// Share of the last close
    Percent(f64),
    /// Share of the average true range
    AtrFraction(f64),
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance::Percent(0.01)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub source: LevelSource,
    /// Swing neighborhood half-width
    pub order: usize,
    pub tolerance: Tolerance,
    pub atr_period: Period,
    /// Levels kept per side
    pub max_levels: usize,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            source: LevelSource::Close,
            order: 5,
            tolerance: Tolerance::default(),
            atr_period: Period::new_const(14),
            max_levels: 3,
        }
    }
}

impl LevelConfig {
    pub fn validate(&self) -> Result<()> {
        if self.order == 0 {
            return Err(AnalysisError::InvalidConfig("order must be >= 1".into()));
        }
        if self.max_levels == 0 {
            return Err(AnalysisError::InvalidConfig("max_levels must be >= 1".into()));
        }
        let (name, v) = match self.tolerance {
            Tolerance::Percent(v) => ("tolerance percent", v),
            Tolerance::AtrFraction(v) => ("tolerance ATR fraction", v),
        };
        if !v.is_finite() || v < 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "{name} must be a non-negative number, got {v}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    /// Cluster centroid
    pub price: f64,
    /// Swing points in the cluster
    pub touches: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelResult {
    /// Strongest first
    pub support: Vec<PriceLevel>,
    pub resistance: Vec<PriceLevel>,
}

/// Mean true range of the trailing `period` bars. The first bar has no
/// previous close and contributes its high-low range.
pub fn average_true_range(view: &SeriesView, period: Period) -> f64 {
    let bars = view.bars();
    let start = bars.len().saturating_sub(period.get());
    let ranges: Vec<f64> = (start..bars.len())
        .map(|i| {
            let b = &bars[i];
            let hl = b.high - b.low;
            match i.checked_sub(1).map(|p| bars[p].close) {
                Some(prev) => hl.max((b.high - prev).abs()).max((b.low - prev).abs()),
                None => hl,
            }
        })
        .collect();
    ranges.iter().sum::<f64>() / ranges.len() as f64
}

/// Greedy clustering in the given order; each value joins the first
/// cluster whose running mean is within `tolerance`.
fn cluster(values: &[f64], tolerance: f64) -> Vec<PriceLevel> {
    let mut clusters: Vec<(f64, usize)> = Vec::new();
    for &v in values {
        let slot = clusters
            .iter_mut()
            .find(|(sum, count)| (v - *sum / *count as f64).abs() <= tolerance);
        match slot {
            Some((sum, count)) => {
                *sum += v;
                *count += 1;
            }
            None => clusters.push((v, 1)),
        }
    }
    clusters
        .into_iter()
        .map(|(sum, count)| PriceLevel {
            price: sum / count as f64,
            touches: count,
        })
        .collect()
}

fn rank(mut levels: Vec<PriceLevel>, last_close: f64, max_levels: usize) -> Vec<PriceLevel> {
    levels.retain(|l| l.touches >= 2);
    levels.sort_by(|a, b| {
        b.touches.cmp(&a.touches).then_with(|| {
            (a.price - last_close)
                .abs()
                .total_cmp(&(b.price - last_close).abs())
        })
    });
    levels.truncate(max_levels);
    levels
}

/// Support and resistance levels over the whole series.
pub fn extract_levels(view: &SeriesView, config: &LevelConfig) -> Result<LevelResult> {
    config.validate()?;

    let (low_src, high_src) = match config.source {
        LevelSource::Close => (view.closes(), view.closes()),
        LevelSource::HighLow => (view.lows(), view.highs()),
    };
    let last_close = view.last().close;
    let tolerance = match config.tolerance {
        Tolerance::Percent(r) => r * last_close.abs(),
        Tolerance::AtrFraction(f) => f * average_true_range(view, config.atr_period),
    }
    .max(MIN_TOLERANCE);

    let mut support: Vec<f64> = swing_lows(&low_src, config.order)
        .into_iter()
        .map(|i| low_src[i])
        .collect();
    let mut resistance: Vec<f64> = swing_highs(&high_src, config.order)
        .into_iter()
        .map(|i| high_src[i])
        .collect();
    support.sort_by(|a, b| b.total_cmp(a));
    resistance.sort_by(|a, b| a.total_cmp(b));
    log::trace!(
        "{}: {} swing lows, {} swing highs, tolerance {tolerance:.6}",
        view.ticker(),
        support.len(),
        resistance.len()
    );

    Ok(LevelResult {
        support: rank(cluster(&support, tolerance), last_close, config.max_levels),
        resistance: rank(cluster(&resistance, tolerance), last_close, config.max_levels),
    })
}
