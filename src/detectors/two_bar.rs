//! Two-bar rules: CDLENGULFING, CDLHARAMI

use super::helpers::{self, body_bounds, is_body_long_f, is_body_short_f};
use super::{MarketContext, PatternDetector, PatternId, PatternMatch, Polarity};
use crate::{AnalysisError, OHLCVExt, Ratio, Result, OHLCV};

impl_with_defaults!(EngulfingDetector, HaramiDetector);

// ============================================================
// ENGULFING
// ============================================================

/// CDLENGULFING - a body of the opposite color covering the previous body.
/// At most one end may be equal.
#[derive(Debug, Clone)]
pub struct EngulfingDetector {
    /// Minimum current/previous body ratio
    pub min_engulf_ratio: f64,
}

impl Default for EngulfingDetector {
    fn default() -> Self {
        Self {
            min_engulf_ratio: 1.0,
        }
    }
}

impl PatternDetector for EngulfingDetector {
    fn id(&self) -> PatternId {
        PatternId("CDL_ENGULFING")
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect<T: OHLCV>(
        &self,
        bars: &[T],
        index: usize,
        _ctx: &MarketContext,
    ) -> Option<PatternMatch> {
        if index < 1 {
            return None;
        }
        let prev = bars.get(index - 1)?;
        let curr = bars.get(index)?;

        // TA_CANDLECOLOR: close >= open is white
        let curr_white = curr.close() >= curr.open();
        let prev_white = prev.close() >= prev.open();
        if curr_white == prev_white {
            return None;
        }
        if curr.body() < prev.body() * self.min_engulf_ratio {
            return None;
        }

        let (covers, polarity) = if curr_white {
            (
                (curr.close() >= prev.open() && curr.open() < prev.close())
                    || (curr.close() > prev.open() && curr.open() <= prev.close()),
                Polarity::Bullish,
            )
        } else {
            (
                (curr.open() >= prev.close() && curr.close() < prev.open())
                    || (curr.open() > prev.close() && curr.close() <= prev.open()),
                Polarity::Bearish,
            )
        };
        if !covers {
            return None;
        }

        let strict = curr.open() != prev.close() && curr.close() != prev.open();
        Some(PatternMatch {
            pattern_id: PatternDetector::id(self),
            polarity,
            strength: if strict { 0.7 } else { 0.6 },
            start_index: index - 1,
            end_index: index,
        })
    }

    fn validate_config(&self) -> Result<()> {
        if !self.min_engulf_ratio.is_finite() || self.min_engulf_ratio < 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "min_engulf_ratio must be a non-negative number, got {}",
                self.min_engulf_ratio
            )));
        }
        Ok(())
    }
}

// ============================================================
// HARAMI
// ============================================================

/// CDLHARAMI - a short body inside a long previous body (inside bar)
#[derive(Debug, Clone)]
pub struct HaramiDetector {
    /// Largest current/previous body ratio still counted as inside
    pub max_body_ratio: Ratio,
    pub body_long_factor: f64,
    pub body_short_factor: f64,
}

impl Default for HaramiDetector {
    fn default() -> Self {
        Self {
            max_body_ratio: Ratio::new_const(1.0),
            body_long_factor: helpers::BODY_LONG_FACTOR,
            body_short_factor: helpers::BODY_SHORT_FACTOR,
        }
    }
}

impl PatternDetector for HaramiDetector {
    fn id(&self) -> PatternId {
        PatternId("CDL_HARAMI")
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect<T: OHLCV>(
        &self,
        bars: &[T],
        index: usize,
        ctx: &MarketContext,
    ) -> Option<PatternMatch> {
        if index < 1 {
            return None;
        }
        let prev = bars.get(index - 1)?;
        let curr = bars.get(index)?;

        let prev_body = prev.body();
        if prev_body <= f64::EPSILON {
            return None;
        }
        // the mother bar is judged against the average ending before it
        let prev_avg_body = helpers::trailing_avg_body(bars, index - 1, helpers::CANDLE_PERIOD);
        if !is_body_long_f(prev_body, prev_avg_body, prev.range(), self.body_long_factor) {
            return None;
        }

        let curr_body = curr.body();
        if !is_body_short_f(curr_body, ctx.avg_body, curr.range(), self.body_short_factor) {
            return None;
        }
        if curr_body / prev_body > self.max_body_ratio.get() {
            return None;
        }

        let (prev_low, prev_high) = body_bounds(prev);
        let (curr_low, curr_high) = body_bounds(curr);
        if curr_high > prev_high || curr_low < prev_low {
            return None;
        }

        let polarity = if prev.is_bearish() {
            Polarity::Bullish
        } else {
            Polarity::Bearish
        };
        let strictly_inside = curr_high < prev_high && curr_low > prev_low;

        Some(PatternMatch {
            pattern_id: PatternDetector::id(self),
            polarity,
            strength: if strictly_inside { 0.7 } else { 0.6 },
            start_index: index - 1,
            end_index: index,
        })
    }
}
