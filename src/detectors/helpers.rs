//! Candle thresholds and comparisons shared by the rules
//!
//! TA-Lib compatible factors (ta_global.c), each with a plain ratio fallback
//! for when the trailing average is zero (e.g. a run of flat bars).

use crate::{OHLCVExt, OHLCV};

// ============================================================
// TA-Lib THRESHOLDS
// ============================================================

/// Body is doji-like: body <= avg_range * DOJI_FACTOR
pub const DOJI_FACTOR: f64 = 0.1;
/// Body is short: body < avg_body * BODY_SHORT_FACTOR
pub const BODY_SHORT_FACTOR: f64 = 1.0;
/// Body is long: body > avg_body * BODY_LONG_FACTOR
pub const BODY_LONG_FACTOR: f64 = 1.0;
/// Shadow very short: shadow < avg_range * SHADOW_VERYSHORT_FACTOR
pub const SHADOW_VERYSHORT_FACTOR: f64 = 0.1;
/// Price near-equality, as a share of the 5-bar average range
pub const NEAR_FACTOR: f64 = 0.2;
/// Trailing window for Near comparisons (TA-Lib: Period=5)
pub const NEAR_PERIOD: usize = 5;
/// TA_CANDLEAVGPERIOD
pub const CANDLE_PERIOD: usize = 10;

// ratio fallbacks, against the bar's own range
pub const DOJI_RATIO: f64 = 0.1;
pub const BODY_SHORT_RATIO: f64 = 0.3;
pub const BODY_LONG_RATIO: f64 = 0.7;
pub const SHADOW_SHORT_RATIO: f64 = 0.1;

// ============================================================
// COMPARISONS
// ============================================================

/// TA-Lib BodyDoji. A zero body is always a doji.
#[inline]
pub fn is_doji_f(body: f64, avg_range: f64, range: f64, factor: f64) -> bool {
    if body <= 0.0 {
        return true;
    }
    if avg_range > 0.0 {
        body <= avg_range * factor
    } else {
        range > 0.0 && body / range <= DOJI_RATIO
    }
}

/// TA-Lib BodyShort
#[inline]
pub fn is_body_short_f(body: f64, avg_body: f64, range: f64, factor: f64) -> bool {
    if avg_body > 0.0 {
        body < avg_body * factor
    } else {
        range > 0.0 && body / range <= BODY_SHORT_RATIO
    }
}

/// TA-Lib BodyLong
#[inline]
pub fn is_body_long_f(body: f64, avg_body: f64, range: f64, factor: f64) -> bool {
    if avg_body > 0.0 {
        body > avg_body * factor
    } else {
        range > 0.0 && body / range >= BODY_LONG_RATIO
    }
}

/// TA-Lib ShadowLong: RangeType=RealBody, Period=0, so the bar's own body
/// is the yardstick. With a zero body any positive shadow passes.
#[inline]
pub fn is_shadow_long(shadow: f64, body: f64) -> bool {
    shadow > body
}

/// TA-Lib ShadowVeryShort
#[inline]
pub fn is_shadow_very_short_f(shadow: f64, avg_range: f64, range: f64, factor: f64) -> bool {
    if avg_range > 0.0 {
        shadow < avg_range * factor
    } else {
        range > 0.0 && shadow / range <= SHADOW_SHORT_RATIO
    }
}

// ============================================================
// PER-BAR TRAILING AVERAGES
// ============================================================
// Multi-bar rules judge each leg against the average ending just before it,
// not against the context of the last bar.

#[inline]
pub fn trailing_avg_body<T: OHLCV>(bars: &[T], at: usize, period: usize) -> f64 {
    trailing_avg(bars, at, period, |b| b.body())
}

#[inline]
pub fn trailing_avg_range<T: OHLCV>(bars: &[T], at: usize, period: usize) -> f64 {
    trailing_avg(bars, at, period, |b| b.range())
}

fn trailing_avg<T: OHLCV>(bars: &[T], at: usize, period: usize, f: impl Fn(&T) -> f64) -> f64 {
    if at == 0 {
        return f(&bars[0]);
    }
    let slice = &bars[at.saturating_sub(period)..at];
    slice.iter().map(f).sum::<f64>() / slice.len() as f64
}

/// Bottom and top of the real body
#[inline]
pub fn body_bounds<T: OHLCV>(bar: &T) -> (f64, f64) {
    (bar.open().min(bar.close()), bar.open().max(bar.close()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doji_fallback_on_zero_average() {
        assert!(is_doji_f(0.0, 0.0, 0.0, DOJI_FACTOR));
        assert!(is_doji_f(0.05, 0.0, 1.0, DOJI_FACTOR));
        assert!(!is_doji_f(0.5, 0.0, 1.0, DOJI_FACTOR));
        assert!(!is_doji_f(0.5, 0.0, 0.0, DOJI_FACTOR));
    }

    #[test]
    fn test_body_thresholds() {
        assert!(is_body_short_f(0.5, 1.0, 2.0, BODY_SHORT_FACTOR));
        assert!(!is_body_short_f(1.0, 1.0, 2.0, BODY_SHORT_FACTOR));
        assert!(is_body_long_f(1.5, 1.0, 2.0, BODY_LONG_FACTOR));
        assert!(is_body_long_f(0.8, 0.0, 1.0, BODY_LONG_FACTOR));
    }
}
