//! Chart-pattern geometry over the trailing window.
//!
//! Swing highs come from bar highs, swing lows from bar lows. Triangles are
//! read from the shape of the two boundaries; double tops and bottoms from
//! the two most recent swings of one kind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::extrema::{swing_highs, swing_lows};
use super::PatternConfig;
use crate::window::linear_fit;
use crate::{Label, SeriesView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartPatternKind {
    AscendingTriangle,
    DescendingTriangle,
    SymmetricalTriangle,
    DoubleTop,
    DoubleBottom,
}

impl Label for ChartPatternKind {
    fn label(&self) -> &'static str {
        match self {
            ChartPatternKind::AscendingTriangle => "Ascending triangle",
            ChartPatternKind::DescendingTriangle => "Descending triangle",
            ChartPatternKind::SymmetricalTriangle => "Symmetrical triangle",
            ChartPatternKind::DoubleTop => "Double top",
            ChartPatternKind::DoubleBottom => "Double bottom",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPattern {
    pub kind: ChartPatternKind,
    /// First bar belonging to the shape
    pub start: DateTime<Utc>,
    pub start_index: usize,
    pub end_index: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum ChartPatterns {
    #[default]
    NoneDetected,
    /// Non-overlapping, ordered by start
    Detected(Vec<ChartPattern>),
}

impl ChartPatterns {
    pub fn patterns(&self) -> &[ChartPattern] {
        match self {
            ChartPatterns::NoneDetected => &[],
            ChartPatterns::Detected(p) => p,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ChartPatterns::NoneDetected)
    }
}

/// Geometry used for triangle boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
    /// Spread and monotonicity of the raw swing values
    Heuristic,
    /// Least-squares trendlines with touch counting
    Trendline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    Flat,
    Rising,
    Falling,
}

/// Local candidate, indices relative to the window
#[derive(Debug, Clone, Copy)]
struct Candidate {
    kind: ChartPatternKind,
    start: usize,
    end: usize,
}

// ============================================================
// BOUNDARIES
// ============================================================

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn heuristic_boundary(points: &[(usize, f64)], config: &PatternConfig) -> Option<Boundary> {
    if points.len() < config.min_touches {
        return None;
    }
    let values: Vec<f64> = points.iter().map(|&(_, v)| v).collect();
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let m = mean(&values);

    if m > 0.0 && (hi - lo) / m <= config.flat_tolerance {
        Some(Boundary::Flat)
    } else if values.windows(2).all(|w| w[1] > w[0]) {
        Some(Boundary::Rising)
    } else if values.windows(2).all(|w| w[1] < w[0]) {
        Some(Boundary::Falling)
    } else {
        None
    }
}

fn trendline_boundary(points: &[(usize, f64)], config: &PatternConfig) -> Option<Boundary> {
    if points.len() < config.min_touches {
        return None;
    }
    let xy: Vec<(f64, f64)> = points.iter().map(|&(i, v)| (i as f64, v)).collect();
    let (slope, intercept) = linear_fit(&xy)?;
    let m = mean(&xy.iter().map(|&(_, v)| v).collect::<Vec<_>>());
    if m <= 0.0 {
        return None;
    }

    let touches = xy
        .iter()
        .filter(|&&(x, v)| {
            let line = intercept + slope * x;
            (v - line).abs() <= config.touch_tolerance * line.abs()
        })
        .count();
    if touches < config.min_touches {
        return None;
    }

    let rel = slope / m;
    Some(if rel.abs() <= config.trendline_flat_slope {
        Boundary::Flat
    } else if rel > 0.0 {
        Boundary::Rising
    } else {
        Boundary::Falling
    })
}

// ============================================================
// DETECTION
// ============================================================

fn triangle(
    highs: &[(usize, f64)],
    lows: &[(usize, f64)],
    geometry: Geometry,
    config: &PatternConfig,
    last: usize,
) -> Option<Candidate> {
    let classify: fn(&[(usize, f64)], &PatternConfig) -> Option<Boundary> = match geometry {
        Geometry::Heuristic => heuristic_boundary,
        Geometry::Trendline => trendline_boundary,
    };
    let upper = classify(highs, config)?;
    let lower = classify(lows, config)?;
    let kind = match (upper, lower) {
        (Boundary::Flat, Boundary::Rising) => ChartPatternKind::AscendingTriangle,
        (Boundary::Falling, Boundary::Flat) => ChartPatternKind::DescendingTriangle,
        (Boundary::Falling, Boundary::Rising) => ChartPatternKind::SymmetricalTriangle,
        _ => return None,
    };
    Some(Candidate {
        kind,
        start: highs[0].0.min(lows[0].0),
        end: last,
    })
}

/// Two most recent swings of one kind at the same level with a deep enough
/// opposite swing between them.
fn double(
    peaks: &[(usize, f64)],
    troughs: &[(usize, f64)],
    kind: ChartPatternKind,
    config: &PatternConfig,
) -> Option<Candidate> {
    let [.., (a, va), (b, vb)] = peaks else {
        return None;
    };
    let level = (va + vb) / 2.0;
    if level <= 0.0 || (va - vb).abs() / level > config.flat_tolerance {
        return None;
    }

    let deep = troughs.iter().any(|&(i, v)| {
        i > *a
            && i < *b
            && match kind {
                ChartPatternKind::DoubleTop => v <= va.min(*vb) * (1.0 - config.min_depth),
                _ => v >= va.max(*vb) * (1.0 + config.min_depth),
            }
    });
    deep.then_some(Candidate {
        kind,
        start: *a,
        end: *b,
    })
}

/// Keep candidates in start order, dropping any that overlap a kept one.
fn resolve_overlaps(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by_key(|c| (c.start, c.end));
    let mut kept: Vec<Candidate> = Vec::new();
    for c in candidates {
        if kept.last().map_or(true, |k| c.start > k.end) {
            kept.push(c);
        }
    }
    kept
}

/// Chart patterns in the trailing `config.lookback` bars.
pub fn detect_chart_patterns(view: &SeriesView, config: &PatternConfig, geometry: Geometry) -> ChartPatterns {
    let n = view.len();
    let offset = n.saturating_sub(config.lookback);
    let window = &view.bars()[offset..];
    let highs: Vec<f64> = window.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = window.iter().map(|b| b.low).collect();

    let swing_hi: Vec<(usize, f64)> = swing_highs(&highs, config.swing_order)
        .into_iter()
        .map(|i| (i, highs[i]))
        .collect();
    let swing_lo: Vec<(usize, f64)> = swing_lows(&lows, config.swing_order)
        .into_iter()
        .map(|i| (i, lows[i]))
        .collect();
    log::trace!(
        "{}: {} swing highs, {} swing lows in last {} bars",
        view.ticker(),
        swing_hi.len(),
        swing_lo.len(),
        window.len()
    );

    let candidates: Vec<Candidate> = [
        triangle(&swing_hi, &swing_lo, geometry, config, window.len() - 1),
        double(&swing_hi, &swing_lo, ChartPatternKind::DoubleTop, config),
        double(&swing_lo, &swing_hi, ChartPatternKind::DoubleBottom, config),
    ]
    .into_iter()
    .flatten()
    .collect();

    let patterns: Vec<ChartPattern> = resolve_overlaps(candidates)
        .into_iter()
        .map(|c| ChartPattern {
            kind: c.kind,
            start: view.bars()[offset + c.start].timestamp,
            start_index: offset + c.start,
            end_index: offset + c.end,
        })
        .collect();

    if patterns.is_empty() {
        ChartPatterns::NoneDetected
    } else {
        ChartPatterns::Detected(patterns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> PatternConfig {
        PatternConfig::default()
    }

    fn pts(values: &[(usize, f64)]) -> Vec<(usize, f64)> {
        values.to_vec()
    }

    #[test]
    fn test_heuristic_boundaries() {
        let flat = pts(&[(3, 100.0), (10, 100.5), (20, 99.8)]);
        assert_eq!(heuristic_boundary(&flat, &cfg()), Some(Boundary::Flat));
        let rising = pts(&[(3, 90.0), (10, 93.0), (20, 96.0)]);
        assert_eq!(heuristic_boundary(&rising, &cfg()), Some(Boundary::Rising));
        let mixed = pts(&[(3, 90.0), (10, 96.0), (20, 93.0)]);
        assert_eq!(heuristic_boundary(&mixed, &cfg()), None);
        assert_eq!(heuristic_boundary(&flat[..1], &cfg()), None);
    }

    #[test]
    fn test_trendline_boundaries() {
        let falling = pts(&[(0, 110.0), (10, 107.0), (20, 104.0), (30, 101.0)]);
        assert_eq!(trendline_boundary(&falling, &cfg()), Some(Boundary::Falling));
        let flat = pts(&[(0, 100.0), (10, 100.3), (20, 99.9), (30, 100.1)]);
        assert_eq!(trendline_boundary(&flat, &cfg()), Some(Boundary::Flat));
    }

    #[test]
    fn test_triangle_kinds() {
        let flat = pts(&[(5, 100.0), (25, 100.4)]);
        let rising = pts(&[(10, 90.0), (30, 95.0)]);
        let falling = pts(&[(5, 110.0), (25, 104.0)]);
        let c = triangle(&flat, &rising, Geometry::Heuristic, &cfg(), 59).unwrap();
        assert_eq!(c.kind, ChartPatternKind::AscendingTriangle);
        assert_eq!((c.start, c.end), (5, 59));
        let c = triangle(&falling, &rising, Geometry::Heuristic, &cfg(), 59).unwrap();
        assert_eq!(c.kind, ChartPatternKind::SymmetricalTriangle);
        assert!(triangle(&flat, &flat, Geometry::Heuristic, &cfg(), 59).is_none());
    }

    #[test]
    fn test_double_top_needs_depth() {
        let peaks = pts(&[(10, 120.0), (30, 120.5)]);
        let deep = pts(&[(20, 110.0)]);
        let shallow = pts(&[(20, 119.0)]);
        let c = double(&peaks, &deep, ChartPatternKind::DoubleTop, &cfg()).unwrap();
        assert_eq!((c.start, c.end), (10, 30));
        assert!(double(&peaks, &shallow, ChartPatternKind::DoubleTop, &cfg()).is_none());
    }

    #[test]
    fn test_overlap_resolution() {
        let kept = resolve_overlaps(vec![
            Candidate {
                kind: ChartPatternKind::DoubleTop,
                start: 20,
                end: 40,
            },
            Candidate {
                kind: ChartPatternKind::AscendingTriangle,
                start: 5,
                end: 59,
            },
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].kind, ChartPatternKind::AscendingTriangle);
    }
}
