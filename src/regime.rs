//! Trend direction and volatility regime.
//!
//! Two independent classifiers:
//! - slope: trailing least-squares slope with a dead band and a channel test
//! - changepoint: PELT over returns; the last segment is the current regime
//!
//! They can disagree on `since` for the same input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::changepoint::{pelt, PeltConfig};
use crate::indicators::VolatilityLabel;
use crate::window::{linear_slope, mean_std, pct_returns, rank_percentile, rolling_std};
use crate::{AnalysisError, Capabilities, Computed, Label, Period, PriceField, Result, SeriesView};

/// Changepoint search needs at least this many returns
pub const MIN_CHANGEPOINT_RETURNS: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Uptrend,
    Downtrend,
    Ranging,
}

impl Label for Direction {
    fn label(&self) -> &'static str {
        match self {
            Direction::Uptrend => "Uptrend",
            Direction::Downtrend => "Downtrend",
            Direction::Ranging => "Ranging",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegimeMethod {
    Slope,
    Changepoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeResult {
    pub direction: Direction,
    /// Start of the current regime
    pub since: DateTime<Utc>,
    pub since_index: usize,
    pub volatility: Computed<VolatilityLabel>,
    pub method: RegimeMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeConfig {
    pub column: PriceField,
    /// Trailing window for the slope classifier
    pub window: Period,
    /// Relative per-bar slope (and mean return) treated as flat
    pub dead_band: f64,
    /// `(max - min) / mean` at or below which the window is a channel
    pub channel_ratio: f64,
    pub volatility_window: Period,
    pub changepoint: PeltConfig,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            column: PriceField::Close,
            window: Period::new_const(40),
            dead_band: 0.0005,
            channel_ratio: 0.02,
            volatility_window: Period::new_const(20),
            changepoint: PeltConfig::default(),
        }
    }
}

impl RegimeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window.get() < 3 {
            return Err(AnalysisError::InvalidConfig("regime window must be >= 3".into()));
        }
        for (name, v) in [("dead_band", self.dead_band), ("channel_ratio", self.channel_ratio)] {
            if !v.is_finite() || v < 0.0 {
                return Err(AnalysisError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {v}"
                )));
            }
        }
        self.changepoint.validate()
    }
}

/// Classify the current regime. Uses changepoint segmentation when the
/// capability is present and there are enough returns, the slope
/// classifier otherwise.
pub fn classify_regime(view: &SeriesView, config: &RegimeConfig, caps: &Capabilities) -> RegimeResult {
    let prices = view.column(config.column);
    let returns = pct_returns(&prices);
    let min_returns = config.window.get().max(MIN_CHANGEPOINT_RETURNS);

    if caps.changepoint && returns.len() >= min_returns {
        log::debug!("{}: regime via changepoint segmentation", view.ticker());
        changepoint_regime(view, &returns, config)
    } else {
        log::debug!("{}: regime via trailing slope", view.ticker());
        slope_regime(view, &prices, &returns, config)
    }
}

// ============================================================
// SLOPE CLASSIFIER
// ============================================================

fn classify_window(values: &[f64], config: &RegimeConfig) -> Direction {
    let Some((mean, _)) = mean_std(values) else {
        return Direction::Ranging;
    };
    let scale = if mean != 0.0 { mean.abs() } else { 1.0 };
    let rel_slope = linear_slope(values) / scale;

    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let channel = (hi - lo) / scale;

    if rel_slope.abs() <= config.dead_band || channel <= config.channel_ratio {
        Direction::Ranging
    } else if rel_slope > 0.0 {
        Direction::Uptrend
    } else {
        Direction::Downtrend
    }
}

fn slope_regime(
    view: &SeriesView,
    prices: &[f64],
    returns: &[f64],
    config: &RegimeConfig,
) -> RegimeResult {
    let n = prices.len();
    let w = config.window.get().min(n);

    let (direction, since_index) = if w < 3 {
        (Direction::Ranging, 0)
    } else {
        let current = classify_window(&prices[n - w..], config);
        // earliest window end, walking back, that keeps the same label
        let stable_from = (w - 1..n)
            .rev()
            .take_while(|&end| classify_window(&prices[end + 1 - w..=end], config) == current)
            .last()
            .unwrap_or(n - 1);
        // no change anywhere in the history: the regime runs from the first bar
        let since = if stable_from == w - 1 { 0 } else { stable_from };
        (current, since)
    };

    RegimeResult {
        direction,
        since: view.bars()[since_index].timestamp,
        since_index,
        volatility: returns_volatility(returns, config.volatility_window),
        method: RegimeMethod::Slope,
    }
}

/// Percentile of the latest rolling std of returns, banded.
fn returns_volatility(returns: &[f64], window: Period) -> Computed<VolatilityLabel> {
    let vols = rolling_std(returns, window);
    match vols.last() {
        Some(&current) if vols.len() >= 2 => {
            Computed::Ready(VolatilityLabel::from_percentile(rank_percentile(&vols, current)))
        }
        _ => Computed::InsufficientData {
            need: window.get() + 2,
            got: returns.len() + 1,
        },
    }
}

// ============================================================
// CHANGEPOINT CLASSIFIER
// ============================================================

fn changepoint_regime(view: &SeriesView, returns: &[f64], config: &RegimeConfig) -> RegimeResult {
    let breakpoints = pelt(returns, &config.changepoint);
    let last_start = match breakpoints.len() {
        n if n >= 2 => breakpoints[n - 2],
        _ => 0,
    };
    let segment = &returns[last_start..];
    let (mean_ret, seg_std) = mean_std(segment).unwrap_or((0.0, 0.0));

    let direction = if mean_ret > config.dead_band {
        Direction::Uptrend
    } else if mean_ret < -config.dead_band {
        Direction::Downtrend
    } else {
        Direction::Ranging
    };

    // segment std ranked among every rolling std of the full return history
    let mut history = rolling_std(returns, config.volatility_window);
    let volatility = if history.is_empty() {
        Computed::InsufficientData {
            need: config.volatility_window.get() + 2,
            got: returns.len() + 1,
        }
    } else {
        history.push(seg_std);
        Computed::Ready(VolatilityLabel::from_percentile(rank_percentile(&history, seg_std)))
    };

    // return i spans bars i..=i+1, so a later segment starts at bar
    // last_start + 1; a single segment covers the series from bar 0
    let since_index = if breakpoints.len() >= 2 { last_start + 1 } else { 0 };
    RegimeResult {
        direction,
        since: view.bars()[since_index].timestamp,
        since_index,
        volatility,
        method: RegimeMethod::Changepoint,
    }
}
