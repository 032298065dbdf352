//! Chart and candlestick patterns through the public API

mod common;

use common::{day, doji_last, flat, uptrend_120};
use narrata_core::patterns::{detect_patterns, CandlestickKind, ChartPatternKind};
use narrata_core::prelude::*;

const BOTH: [Capabilities; 2] = [Capabilities::none(), Capabilities::all()];

/// Flat peaks near 110 with troughs stepping up by 2.5
fn ascending_triangle() -> SeriesView {
    let mut closes = Vec::new();
    let mut cur = 104.0;
    for t in [100.0, 102.5, 105.0, 107.5] {
        closes.extend((1..=6).map(|j| cur + (t - cur) * j as f64 / 6.0));
        closes.extend((1..=6).map(|j| t + (110.0 - t) * j as f64 / 6.0));
        cur = 110.0;
    }
    closes.extend((1..=3).map(|j| 110.0 + (108.5 - 110.0) * j as f64 / 3.0));

    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar::new(day(i), c, c + 0.3, c - 0.3, c, 1_000.0))
        .collect();
    SeriesView::new("TRI", bars).unwrap()
}

#[test]
fn test_final_bar_doji_regardless_of_backend() {
    let view = doji_last(30);
    for caps in BOTH {
        let result = detect_patterns(&view, &PatternConfig::default(), &caps).unwrap();
        let hit = result.candlestick.expect("doji on the last bar");
        assert_eq!(hit.kind, CandlestickKind::Doji);
        assert_eq!(hit.kind.label(), "Doji");
        assert_eq!(hit.index, 29);
        assert_eq!(hit.timestamp, view.last().timestamp);
    }
}

#[test]
fn test_ascending_triangle_both_geometries() {
    let view = ascending_triangle();
    for caps in BOTH {
        let result = detect_patterns(&view, &PatternConfig::default(), &caps).unwrap();
        let patterns = result.chart.patterns();
        assert_eq!(patterns.len(), 1, "{patterns:?}");
        assert_eq!(patterns[0].kind, ChartPatternKind::AscendingTriangle);
        assert_eq!(patterns[0].kind.label(), "Ascending triangle");
        assert_eq!(patterns[0].start_index, 5);
        assert_eq!(patterns[0].start, day(5));
        assert_eq!(patterns[0].end_index, view.len() - 1);
    }
}

#[test]
fn test_flat_series_has_no_chart_pattern() {
    let view = flat(30, 100.0);
    for caps in BOTH {
        let result = detect_patterns(&view, &PatternConfig::default(), &caps).unwrap();
        assert!(result.chart.is_none());
        assert_eq!(result.chart, ChartPatterns::NoneDetected);
    }
}

#[test]
fn test_patterns_never_overlap() {
    let view = uptrend_120();
    for caps in BOTH {
        let result = detect_patterns(&view, &PatternConfig::default(), &caps).unwrap();
        let patterns = result.chart.patterns();
        assert!(patterns.windows(2).all(|w| w[0].end_index < w[1].start_index));
        assert!(patterns.iter().all(|p| p.start_index >= view.len() - 60));
        if let Some(hit) = result.candlestick {
            assert!(hit.index >= view.len() - 3);
        }
    }
}

#[test]
fn test_invalid_lookback_rejected() {
    let config = PatternConfig {
        lookback: 3,
        ..PatternConfig::default()
    };
    let err = detect_patterns(&flat(30, 1.0), &config, &Capabilities::none()).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidConfig(_)));
}
