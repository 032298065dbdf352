//! Candlestick classification of the last few bars.
//!
//! The in-house rules use the bar's own body/wick ratios. The backend rules
//! ([`crate::detectors`]) compare against trailing averages instead; when
//! they find nothing the in-house answer stands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::detectors::{CandleScanner, PatternMatch, Polarity};
use crate::series::Bar;
use crate::{Label, OHLCVExt, SeriesView};

/// Only end indices among the final bars are examined
pub const CANDLE_WINDOW: usize = 3;

/// Body at most this share of the range
pub const DOJI_BODY_RATIO: f64 = 0.10;
/// Bodies at least this share of the range are long
pub const LONG_BODY_RATIO: f64 = 0.6;
/// Bodies at most this share of the range are short
pub const SHORT_BODY_RATIO: f64 = 0.3;
/// Hammer and shooting star body ceiling
pub const PIN_BODY_RATIO: f64 = 0.35;
/// Working shadow must be at least this many bodies
pub const PIN_SHADOW_MULTIPLE: f64 = 2.0;
/// Opposite shadow at most this share of the range
pub const PIN_TAIL_RATIO: f64 = 0.1;

/// Floor for a bar's range when computing ratios
const MIN_RANGE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandlestickKind {
    MorningStar,
    EveningStar,
    BullishEngulfing,
    BearishEngulfing,
    InsideBar,
    Doji,
    Hammer,
    ShootingStar,
}

impl Label for CandlestickKind {
    fn label(&self) -> &'static str {
        match self {
            CandlestickKind::MorningStar => "Morning Star",
            CandlestickKind::EveningStar => "Evening Star",
            CandlestickKind::BullishEngulfing => "Bullish Engulfing",
            CandlestickKind::BearishEngulfing => "Bearish Engulfing",
            CandlestickKind::InsideBar => "Inside Bar",
            CandlestickKind::Doji => "Doji",
            CandlestickKind::Hammer => "Hammer",
            CandlestickKind::ShootingStar => "Shooting Star",
        }
    }
}

impl CandlestickKind {
    /// Name for a backend rule hit
    pub fn from_match(m: &PatternMatch) -> Option<Self> {
        Some(match (m.pattern_id.as_str(), m.polarity) {
            ("CDL_MORNINGSTAR", _) => CandlestickKind::MorningStar,
            ("CDL_EVENINGSTAR", _) => CandlestickKind::EveningStar,
            ("CDL_ENGULFING", Polarity::Bullish) => CandlestickKind::BullishEngulfing,
            ("CDL_ENGULFING", Polarity::Bearish) => CandlestickKind::BearishEngulfing,
            ("CDL_HARAMI", _) => CandlestickKind::InsideBar,
            ("CDL_DOJI", _) => CandlestickKind::Doji,
            ("CDL_HAMMER", _) => CandlestickKind::Hammer,
            ("CDL_SHOOTINGSTAR", _) => CandlestickKind::ShootingStar,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandlestickHit {
    pub kind: CandlestickKind,
    pub timestamp: DateTime<Utc>,
    pub index: usize,
}

/// End indices to examine, most recent first
fn recent_indices(n: usize) -> impl Iterator<Item = usize> {
    (n.saturating_sub(CANDLE_WINDOW)..n).rev()
}

// ============================================================
// IN-HOUSE RULES
// ============================================================

fn body_ratio(bar: &Bar) -> f64 {
    bar.body() / bar.range().max(MIN_RANGE)
}

fn star(first: &Bar, middle: &Bar, third: &Bar) -> Option<CandlestickKind> {
    if body_ratio(first) < LONG_BODY_RATIO || body_ratio(middle) > SHORT_BODY_RATIO {
        return None;
    }
    let first_mid = (first.open + first.close) / 2.0;
    let star_top = middle.open.max(middle.close);
    let star_bottom = middle.open.min(middle.close);

    if first.is_bearish() && third.is_bullish() && star_top < first.close && third.close > first_mid {
        Some(CandlestickKind::MorningStar)
    } else if first.is_bullish() && third.is_bearish() && star_bottom > first.close && third.close < first_mid {
        Some(CandlestickKind::EveningStar)
    } else {
        None
    }
}

fn pin_bar(bar: &Bar) -> Option<CandlestickKind> {
    let range = bar.range();
    if range <= MIN_RANGE || body_ratio(bar) > PIN_BODY_RATIO {
        return None;
    }
    let body = bar.body();
    let (upper, lower) = (bar.upper_shadow(), bar.lower_shadow());
    if lower >= PIN_SHADOW_MULTIPLE * body && upper <= PIN_TAIL_RATIO * range {
        Some(CandlestickKind::Hammer)
    } else if upper >= PIN_SHADOW_MULTIPLE * body && lower <= PIN_TAIL_RATIO * range {
        Some(CandlestickKind::ShootingStar)
    } else {
        None
    }
}

/// Ratio rules for the pattern ending at `index`. Needs a previous bar.
pub fn classify_inhouse(bars: &[Bar], index: usize) -> Option<CandlestickKind> {
    if index < 1 || index >= bars.len() {
        return None;
    }
    let prev = &bars[index - 1];
    let curr = &bars[index];

    if index >= 2 {
        if let Some(kind) = star(&bars[index - 2], prev, curr) {
            return Some(kind);
        }
    }

    if prev.close < prev.open && curr.close > curr.open && curr.open <= prev.close && curr.close >= prev.open {
        return Some(CandlestickKind::BullishEngulfing);
    }
    if prev.close > prev.open && curr.close < curr.open && curr.open >= prev.close && curr.close <= prev.open {
        return Some(CandlestickKind::BearishEngulfing);
    }
    if curr.high <= prev.high && curr.low >= prev.low {
        return Some(CandlestickKind::InsideBar);
    }
    if body_ratio(curr) <= DOJI_BODY_RATIO {
        return Some(CandlestickKind::Doji);
    }
    pin_bar(curr)
}

// ============================================================
// ENTRY POINT
// ============================================================

fn hit(view: &SeriesView, kind: CandlestickKind, index: usize) -> CandlestickHit {
    CandlestickHit {
        kind,
        timestamp: view.bars()[index].timestamp,
        index,
    }
}

/// Backend rules over the final bars, most recent first
pub fn detect_backend(view: &SeriesView, scanner: &CandleScanner) -> Option<CandlestickHit> {
    let bars = view.bars();
    let contexts = scanner.compute_contexts(bars);
    recent_indices(bars.len()).find_map(|i| {
        scanner
            .first_at(bars, i, &contexts[i])
            .and_then(|m| CandlestickKind::from_match(&m))
            .map(|kind| hit(view, kind, i))
    })
}

/// In-house rules over the final bars, most recent first
pub fn detect_inhouse(view: &SeriesView) -> Option<CandlestickHit> {
    let bars = view.bars();
    recent_indices(bars.len()).find_map(|i| classify_inhouse(bars, i).map(|kind| hit(view, kind, i)))
}

/// At most one label for the final bars. `scanner` is the backend rule set,
/// when available.
pub fn detect_candlestick(view: &SeriesView, scanner: Option<&CandleScanner>) -> Option<CandlestickHit> {
    if let Some(scanner) = scanner {
        if let Some(found) = detect_backend(view, scanner) {
            return Some(found);
        }
        log::debug!("{}: backend found no candlestick, using in-house rules", view.ticker());
    }
    detect_inhouse(view)
}
