//! Shared fixtures for integration tests

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use narrata_core::{Bar, SeriesView};

/// 64-bit LCG, top 53 bits as the uniform draw
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Uniform in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller normal draw
    pub fn normal(&mut self, mean: f64, sd: f64) -> f64 {
        let u1 = self.next_f64().max(1e-12);
        let u2 = self.next_f64();
        mean + sd * (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }
}

pub fn day(i: usize) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::days(i as i64)
}

/// 120 daily bars from 100 to 130 whose latest volatility is low
pub fn uptrend_120() -> SeriesView {
    calming_uptrend(15)
}

/// Closes alternate around a 100 -> 130 trend line with a quiet first
/// stretch, a loud middle and a moderate final 21 bars. The last 20 returns
/// are then calmer than every window touching the loud middle and rougher
/// than the quiet ones, which puts their volatility in the low band for any
/// seed. The seed only jitters the swing sizes and the wicks.
pub fn calming_uptrend(seed: u64) -> SeriesView {
    const POINTS: usize = 120;
    const QUIET_BARS: usize = 36;
    const TAIL_BARS: usize = 21;

    let mut rng = Lcg::new(seed);
    let bars = (0..POINTS)
        .map(|i| {
            let base = 100.0 + 30.0 * i as f64 / (POINTS - 1) as f64;
            let swing = if i < QUIET_BARS {
                0.2
            } else if i >= POINTS - TAIL_BARS {
                0.5
            } else {
                1.2
            };
            let side = if i % 2 == 0 { 1.0 } else { -1.0 };
            let close = base + side * swing * (1.0 + rng.normal(0.0, 0.1));
            let open = close + rng.normal(0.0, 0.3);
            let high = open.max(close) + rng.normal(0.3, 0.1).abs();
            let low = open.min(close) - rng.normal(0.3, 0.1).abs();
            let volume = 900.0 + (rng.next_f64() * 900.0).floor();
            Bar::new(day(i), open, high, low, close, volume)
        })
        .collect();
    SeriesView::new("AAPL", bars).unwrap()
}

pub fn noisy_trend(points: usize, from: f64, to: f64, seed: u64) -> SeriesView {
    let mut rng = Lcg::new(seed);
    let bars = (0..points)
        .map(|i| {
            let base = from + (to - from) * i as f64 / (points - 1) as f64;
            let close = base + rng.normal(0.0, 0.6);
            let open = close + rng.normal(0.0, 0.5);
            let high = open.max(close) + rng.normal(0.4, 0.2).abs();
            let low = open.min(close) - rng.normal(0.4, 0.2).abs();
            let volume = 900.0 + (rng.next_f64() * 900.0).floor();
            Bar::new(day(i), open, high, low, close, volume)
        })
        .collect();
    SeriesView::new("AAPL", bars).unwrap()
}

/// Identical bars at one price
pub fn flat(points: usize, price: f64) -> SeriesView {
    let bars = (0..points)
        .map(|i| Bar::new(day(i), price, price, price, price, 1_000.0))
        .collect();
    SeriesView::new("FLAT", bars).unwrap()
}

/// Half-body bars stepping up by 0.5, closed by a doji whose range
/// covers more than the previous bar.
pub fn doji_last(points: usize) -> SeriesView {
    let mut bars: Vec<Bar> = (0..points - 1)
        .map(|i| {
            let close = 100.0 + 0.5 * i as f64;
            let open = close - 0.5;
            Bar::new(day(i), open, close + 0.25, open - 0.25, close, 1_000.0)
        })
        .collect();
    let p = bars[points - 2].close;
    bars.push(Bar::new(day(points - 1), p + 0.3, p + 1.3, p - 0.7, p + 0.32, 1_000.0));
    SeriesView::new("DOJI", bars).unwrap()
}
