//! MACD lines and crossover classification.

use serde::{Deserialize, Serialize};

use super::crossover::last_sign_change;
use crate::window::{smooth_series, ExpSmoother, Seed};
use crate::{Label, Period};

/// MACD and signal line per bar; `None` where a line is not yet defined.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
}

/// Latest line values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdLines {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacdCross {
    BullishCrossover { days_since: usize },
    BearishCrossover { days_since: usize },
    None,
}

impl Label for MacdCross {
    fn label(&self) -> &'static str {
        match self {
            MacdCross::BullishCrossover { .. } => "bullish crossover",
            MacdCross::BearishCrossover { .. } => "bearish crossover",
            MacdCross::None => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bias {
    Bullish,
    Bearish,
}

/// Histogram drift when no crossover exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdMomentum {
    pub bias: Bias,
    pub widening: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdState {
    pub cross: MacdCross,
    pub lines: Option<MacdLines>,
    pub momentum: Option<MacdMomentum>,
}

impl Label for MacdState {
    fn label(&self) -> &'static str {
        self.cross.label()
    }
}

/// EMAs seeded with the first close; both lines exist from bar 0.
pub fn macd_inhouse(closes: &[f64], fast: Period, slow: Period, signal: Period) -> MacdSeries {
    let fast_ema = smooth_series(closes, ExpSmoother::ema(fast, Seed::First));
    let slow_ema = smooth_series(closes, ExpSmoother::ema(slow, Seed::First));
    let macd: Vec<Option<f64>> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    let mut smoother = ExpSmoother::ema(signal, Seed::First);
    let signal_line = macd.iter().map(|m| m.and_then(|v| smoother.update(v))).collect();
    MacdSeries {
        macd,
        signal: signal_line,
    }
}

/// TA-Lib layout: SMA-seeded EMAs, the fast one started so both are first
/// defined at bar `slow - 1`; the signal line starts at `slow + signal - 2`.
pub fn macd_talib(closes: &[f64], fast: Period, slow: Period, signal: Period) -> MacdSeries {
    let n = closes.len();
    let offset = slow.get().saturating_sub(fast.get());

    let slow_ema = smooth_series(closes, ExpSmoother::ema(slow, Seed::Sma(slow)));
    let mut fast_ema = vec![None; n];
    let mut fast_smoother = ExpSmoother::ema(fast, Seed::Sma(fast));
    for i in offset..n {
        fast_ema[i] = fast_smoother.update(closes[i]);
    }

    let macd: Vec<Option<f64>> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    let mut smoother = ExpSmoother::ema(signal, Seed::Sma(signal));
    let signal_line = macd.iter().map(|m| m.and_then(|v| smoother.update(v))).collect();
    MacdSeries {
        macd,
        signal: signal_line,
    }
}

/// Crossover, latest lines and histogram momentum.
pub fn classify_macd(series: &MacdSeries) -> MacdState {
    let diffs: Vec<(usize, f64)> = series
        .macd
        .iter()
        .zip(&series.signal)
        .enumerate()
        .filter_map(|(i, (m, s))| Some((i, (*m)? - (*s)?)))
        .collect();

    let Some(&(last_index, last_diff)) = diffs.last() else {
        return MacdState {
            cross: MacdCross::None,
            lines: None,
            momentum: None,
        };
    };

    let lines = series.macd[last_index]
        .zip(series.signal[last_index])
        .map(|(macd, signal)| MacdLines {
            macd,
            signal,
            histogram: macd - signal,
        });

    let cross = match last_sign_change(diffs.iter().copied()) {
        Some((i, true)) => MacdCross::BullishCrossover {
            days_since: last_index - i,
        },
        Some((i, false)) => MacdCross::BearishCrossover {
            days_since: last_index - i,
        },
        None => MacdCross::None,
    };

    let momentum = matches!(cross, MacdCross::None).then(|| {
        let widening = match diffs.len() {
            n if n >= 2 => last_diff.abs() >= diffs[n - 2].1.abs(),
            _ => true,
        };
        MacdMomentum {
            bias: if last_diff >= 0.0 {
                Bias::Bullish
            } else {
                Bias::Bearish
            },
            widening,
        }
    });

    MacdState {
        cross,
        lines,
        momentum,
    }
}
