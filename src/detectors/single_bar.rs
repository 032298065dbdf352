//! Single-bar rules: CDLDOJI, CDLHAMMER, CDLSHOOTINGSTAR
//!
//! Hammer and Shooting Star also look at the previous bar for position.

use super::helpers::{
    self, body_bounds, is_body_short_f, is_doji_f, is_shadow_long, is_shadow_very_short_f,
};
use super::{MarketContext, PatternDetector, PatternId, PatternMatch, Polarity};
use crate::{OHLCVExt, OHLCV};

impl_with_defaults!(DojiDetector, HammerDetector, ShootingStarDetector);

// ============================================================
// DOJI
// ============================================================

/// CDLDOJI - body no larger than a tenth of the average range
#[derive(Debug, Clone, Copy)]
pub struct DojiDetector {
    pub doji_factor: f64,
}

impl Default for DojiDetector {
    fn default() -> Self {
        Self {
            doji_factor: helpers::DOJI_FACTOR,
        }
    }
}

impl PatternDetector for DojiDetector {
    fn id(&self) -> PatternId {
        PatternId("CDL_DOJI")
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect<T: OHLCV>(
        &self,
        bars: &[T],
        index: usize,
        ctx: &MarketContext,
    ) -> Option<PatternMatch> {
        let bar = bars.get(index)?;
        let body = bar.body();
        let range = bar.range();

        if !is_doji_f(body, ctx.avg_range, range, self.doji_factor) {
            return None;
        }

        let tightness = if range > 0.0 {
            1.0 - (body / range / helpers::DOJI_RATIO).min(1.0)
        } else {
            0.5
        };

        Some(PatternMatch {
            pattern_id: PatternDetector::id(self),
            polarity: Polarity::Neutral,
            strength: 0.5 + tightness * 0.5,
            start_index: index,
            end_index: index,
        })
    }
}

// ============================================================
// HAMMER / SHOOTING STAR
// ============================================================

/// CDLHAMMER - short body at the top of a long lower shadow, printed at or
/// below the previous bar's low
#[derive(Debug, Clone, Copy)]
pub struct HammerDetector {
    pub body_short_factor: f64,
    pub shadow_veryshort_factor: f64,
    pub near_factor: f64,
}

impl Default for HammerDetector {
    fn default() -> Self {
        Self {
            body_short_factor: helpers::BODY_SHORT_FACTOR,
            shadow_veryshort_factor: helpers::SHADOW_VERYSHORT_FACTOR,
            near_factor: helpers::NEAR_FACTOR,
        }
    }
}

impl PatternDetector for HammerDetector {
    fn id(&self) -> PatternId {
        PatternId("CDL_HAMMER")
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
        let bar = bars.get(index)?;
        let prev = bars.get(index - 1)?;

        let body = bar.body();
        let range = bar.range();

        if !is_body_short_f(body, ctx.avg_body, range, self.body_short_factor) {
            return None;
        }
        if !is_shadow_long(bar.lower_shadow(), body) {
            return None;
        }
        if !is_shadow_very_short_f(bar.upper_shadow(), ctx.avg_range, range, self.shadow_veryshort_factor) {
            return None;
        }

        // body low within Near of the prior low (Near measured at bar i-1)
        let near = helpers::trailing_avg_range(bars, index - 1, helpers::NEAR_PERIOD) * self.near_factor;
        let (body_low, _) = body_bounds(bar);
        if body_low > prev.low() + near {
            return None;
        }

        Some(PatternMatch {
            pattern_id: PatternDetector::id(self),
            polarity: Polarity::Bullish,
            strength: 0.6,
            start_index: index,
            end_index: index,
        })
    }
}

/// CDLSHOOTINGSTAR - short body under a long upper shadow, gapping up from
/// the previous body
#[derive(Debug, Clone, Copy)]
pub struct ShootingStarDetector {
    pub body_short_factor: f64,
    pub shadow_veryshort_factor: f64,
}

impl Default for ShootingStarDetector {
    fn default() -> Self {
        Self {
            body_short_factor: helpers::BODY_SHORT_FACTOR,
            shadow_veryshort_factor: helpers::SHADOW_VERYSHORT_FACTOR,
        }
    }
}

impl PatternDetector for ShootingStarDetector {
    fn id(&self) -> PatternId {
        PatternId("CDL_SHOOTINGSTAR")
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
        let bar = bars.get(index)?;
        let prev = bars.get(index - 1)?;

        // real-body gap up
        let (body_low, _) = body_bounds(bar);
        let (_, prev_body_high) = body_bounds(prev);
        if body_low <= prev_body_high {
            return None;
        }

        let body = bar.body();
        let range = bar.range();

        if !is_body_short_f(body, ctx.avg_body, range, self.body_short_factor) {
            return None;
        }
        if !is_shadow_long(bar.upper_shadow(), body) {
            return None;
        }
        if !is_shadow_very_short_f(bar.lower_shadow(), ctx.avg_range, range, self.shadow_veryshort_factor) {
            return None;
        }

        Some(PatternMatch {
            pattern_id: PatternDetector::id(self),
            polarity: Polarity::Bearish,
            strength: 0.7,
            start_index: index,
            end_index: index,
        })
    }
}
