//! Three-bar rules: CDLMORNINGSTAR, CDLEVENINGSTAR
//!
//! Each leg is judged against the trailing average ending just before it.

use super::helpers::{self, body_bounds, is_body_long_f, is_body_short_f};
use super::{MarketContext, PatternDetector, PatternId, PatternMatch, Polarity};
use crate::{AnalysisError, OHLCVExt, Result, OHLCV};

impl_with_defaults!(MorningStarDetector, EveningStarDetector);

fn check_penetration(penetration: f64) -> Result<()> {
  if !(0.0..=1.0).contains(&penetration) {
    return Err(AnalysisError::OutOfRange {
      field: "penetration",
      value: penetration,
      min:   0.0,
      max:   1.0,
    });
  }
  Ok(())
}

/// Long first body, short second body, third body longer than average.
fn legs_qualify<T: OHLCV>(bars: &[T], index: usize, long_factor: f64, short_factor: f64) -> bool {
  let first = &bars[index - 2];
  let second = &bars[index - 1];
  let third = &bars[index];

  let avg_first = helpers::trailing_avg_body(bars, index - 2, helpers::CANDLE_PERIOD);
  let avg_second = helpers::trailing_avg_body(bars, index - 1, helpers::CANDLE_PERIOD);
  let avg_third = helpers::trailing_avg_body(bars, index, helpers::CANDLE_PERIOD);

  is_body_long_f(first.body(), avg_first, first.range(), long_factor)
    && is_body_short_f(second.body(), avg_second, second.range(), short_factor)
    && third.body() > avg_third
}

// ============================================================
// MORNING STAR / EVENING STAR
// ============================================================

/// CDLMORNINGSTAR - long black, star gapping down, white closing well into
/// the first body
#[derive(Debug, Clone)]
pub struct MorningStarDetector {
  pub body_long_factor: f64,
  pub body_short_factor: f64,
  /// Share of the first body the third close must recover
  pub penetration: f64,
}

impl Default for MorningStarDetector {
  fn default() -> Self {
    Self {
      body_long_factor: helpers::BODY_LONG_FACTOR,
      body_short_factor: helpers::BODY_SHORT_FACTOR,
      penetration: 0.3,
    }
  }
}

impl PatternDetector for MorningStarDetector {
  fn id(&self) -> PatternId {
    PatternId("CDL_MORNINGSTAR")
  }

  fn min_bars(&self) -> usize {
    3
  }

  fn detect<T: OHLCV>(
    &self,
    bars: &[T],
    index: usize,
    _ctx: &MarketContext,
  ) -> Option<PatternMatch> {
    if index < 2 || index >= bars.len() {
      return None;
    }
    let first = &bars[index - 2];
    let second = &bars[index - 1];
    let third = &bars[index];

    if first.close() >= first.open() || third.close() < third.open() {
      return None;
    }
    if !legs_qualify(bars, index, self.body_long_factor, self.body_short_factor) {
      return None;
    }

    // real-body gap down between first and star
    let (_, star_top) = body_bounds(second);
    let (first_bottom, _) = body_bounds(first);
    if star_top >= first_bottom {
      return None;
    }

    if third.close() <= first.close() + first.body() * self.penetration {
      return None;
    }

    Some(PatternMatch {
      pattern_id:  PatternDetector::id(self),
      polarity:    Polarity::Bullish,
      strength:    0.75,
      start_index: index - 2,
      end_index:   index,
    })
  }

  fn validate_config(&self) -> Result<()> {
    check_penetration(self.penetration)
  }
}

/// CDLEVENINGSTAR - long white, star gapping up, black closing well into
/// the first body
#[derive(Debug, Clone)]
pub struct EveningStarDetector {
  pub body_long_factor: f64,
  pub body_short_factor: f64,
  pub penetration: f64,
}

impl Default for EveningStarDetector {
  fn default() -> Self {
    Self {
      body_long_factor: helpers::BODY_LONG_FACTOR,
      body_short_factor: helpers::BODY_SHORT_FACTOR,
      penetration: 0.3,
    }
  }
}

impl PatternDetector for EveningStarDetector {
  fn id(&self) -> PatternId {
    PatternId("CDL_EVENINGSTAR")
  }

  fn min_bars(&self) -> usize {
    3
  }

  fn detect<T: OHLCV>(
    &self,
    bars: &[T],
    index: usize,
    _ctx: &MarketContext,
  ) -> Option<PatternMatch> {
    if index < 2 || index >= bars.len() {
      return None;
    }
    let first = &bars[index - 2];
    let second = &bars[index - 1];
    let third = &bars[index];

    if first.close() < first.open() || third.close() >= third.open() {
      return None;
    }
    if !legs_qualify(bars, index, self.body_long_factor, self.body_short_factor) {
      return None;
    }

    // real-body gap up between first and star
    let (star_bottom, _) = body_bounds(second);
    let (_, first_top) = body_bounds(first);
    if star_bottom <= first_top {
      return None;
    }

    if third.close() >= first.close() - first.body() * self.penetration {
      return None;
    }

    Some(PatternMatch {
      pattern_id:  PatternDetector::id(self),
      polarity:    Polarity::Bearish,
      strength:    0.75,
      start_index: index - 2,
      end_index:   index,
    })
  }

  fn validate_config(&self) -> Result<()> {
    check_penetration(self.penetration)
  }
}
