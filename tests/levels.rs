//! Support and resistance extraction

mod common;

use common::{day, flat, uptrend_120};
use narrata_core::levels::extract_levels;
use narrata_core::prelude::*;

/// Four 20-bar swings between ~90 and ~110, then a slide to ~70
fn range_then_breakdown() -> SeriesView {
    let leg: Vec<f64> = (0..10).map(|i| 90.0 + 2.0 * i as f64).collect();
    let mut closes = Vec::new();
    for c in 0..4 {
        let wobble = if c % 2 == 0 { 0.0 } else { 0.3 };
        closes.extend(leg.iter().map(|v| v + wobble));
        closes.extend(leg.iter().rev().map(|v| v + 2.0 + wobble));
    }
    closes.extend((1..12).map(|j| 92.3 - 2.0 * j as f64));

    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar::new(day(i), c, c + 1.0, c - 1.0, c, 1_000.0))
        .collect();
    SeriesView::new("RNG", bars).unwrap()
}

#[test]
fn test_side_follows_extremum_type() {
    let view = range_then_breakdown();
    let result = extract_levels(&view, &LevelConfig::default()).unwrap();

    // the old floor sits far above the last close but is still support
    assert_eq!(result.support.len(), 1);
    assert!((result.support[0].price - 90.2).abs() < 1e-9);
    assert_eq!(result.support[0].touches, 3);
    assert!(result.support[0].price > view.last().close);

    assert_eq!(result.resistance.len(), 1);
    assert!((result.resistance[0].price - 110.15).abs() < 1e-9);
    assert_eq!(result.resistance[0].touches, 4);
}

#[test]
fn test_high_low_source_with_atr_tolerance() {
    let view = range_then_breakdown();
    let config = LevelConfig {
        source: LevelSource::HighLow,
        tolerance: Tolerance::AtrFraction(0.5),
        ..LevelConfig::default()
    };
    let result = extract_levels(&view, &config).unwrap();
    assert!((result.support[0].price - 89.2).abs() < 1e-9);
    assert!((result.resistance[0].price - 111.15).abs() < 1e-9);
}

#[test]
fn test_every_level_has_two_touches() {
    for view in [uptrend_120(), flat(40, 25.0), range_then_breakdown()] {
        let result = extract_levels(&view, &LevelConfig::default()).unwrap();
        for level in result.support.iter().chain(&result.resistance) {
            assert!(level.touches >= 2);
        }
        assert!(result.support.len() <= 3 && result.resistance.len() <= 3);
    }
}

#[test]
fn test_short_series_has_no_levels() {
    let view = flat(5, 10.0);
    let result = extract_levels(&view, &LevelConfig::default()).unwrap();
    assert!(result.support.is_empty());
    assert!(result.resistance.is_empty());
}
