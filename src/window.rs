//! Fixed-size rolling accumulators and small numeric helpers.
//!
//! Every windowed statistic in the crate (SMA, EMA, rolling std, trailing
//! regressions) is built on these primitives so the "not enough bars yet"
//! boundary lives in one place.

use crate::Period;

// ============================================================
// ROLLING WINDOW
// ============================================================

/// Circular buffer over the last `period` values with a running mean and
/// sum of squared deviations (sliding Welford update).
///
/// A constant input keeps the variance at exactly zero, which the band and
/// volatility code rely on to detect degenerate windows.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    buf: Vec<f64>,
    head: usize,
    len: usize,
    mean: f64,
    m2: f64,
}

impl RollingWindow {
    pub fn new(period: Period) -> Self {
        Self {
            buf: vec![0.0; period.get()],
            head: 0,
            len: 0,
            mean: 0.0,
            m2: 0.0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.buf.len()
    }

    /// Push a value, evicting the oldest one once the window is full.
    /// Returns the evicted value.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        if self.is_full() {
            let old = self.buf[self.head];
            self.buf[self.head] = value;
            self.head = (self.head + 1) % self.buf.len();

            let n = self.len as f64;
            let old_mean = self.mean;
            self.mean += (value - old) / n;
            self.m2 += (value - old) * (value - self.mean + old - old_mean);
            Some(old)
        } else {
            let slot = (self.head + self.len) % self.buf.len();
            self.buf[slot] = value;
            self.len += 1;

            let delta = value - self.mean;
            self.mean += delta / self.len as f64;
            self.m2 += delta * (value - self.mean);
            None
        }
    }

    /// Mean of the values currently held
    #[inline]
    pub fn mean(&self) -> Option<f64> {
        (self.len > 0).then_some(self.mean)
    }

    /// Population variance (ddof = 0), clamped at zero
    pub fn variance(&self) -> Option<f64> {
        (self.len > 0).then(|| (self.m2 / self.len as f64).max(0.0))
    }

    #[inline]
    pub fn std_dev(&self) -> Option<f64> {
        self.variance().map(f64::sqrt)
    }

    /// Values in insertion order, oldest first
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.len).map(move |i| self.buf[(self.head + i) % self.buf.len()])
    }
}

/// Rolling mean. Element `i` of the output covers `values[i..i + period]`,
/// so the output has `values.len() - period + 1` entries (empty if shorter).
pub fn rolling_mean(values: &[f64], period: Period) -> Vec<f64> {
    rolling_map(values, period, |w| w.mean())
}

/// Rolling population standard deviation, aligned like [`rolling_mean`].
pub fn rolling_std(values: &[f64], period: Period) -> Vec<f64> {
    rolling_map(values, period, |w| w.std_dev())
}

fn rolling_map(
    values: &[f64],
    period: Period,
    stat: impl Fn(&RollingWindow) -> Option<f64>,
) -> Vec<f64> {
    let mut window = RollingWindow::new(period);
    let mut out = Vec::with_capacity(values.len().saturating_sub(period.get() - 1));
    for &v in values {
        window.push(v);
        if window.is_full() {
            if let Some(s) = stat(&window) {
                out.push(s);
            }
        }
    }
    out
}

// ============================================================
// EXPONENTIAL SMOOTHING
// ============================================================

/// How an exponential smoother obtains its first value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seed {
    /// First observation is the first output (pandas `adjust=False`)
    First,
    /// Simple mean of the first `period` observations (TA-Lib)
    Sma(Period),
}

/// Recursive smoother `s = s + alpha * (x - s)`.
#[derive(Debug, Clone)]
pub struct ExpSmoother {
    alpha: f64,
    seed: Seed,
    state: Option<f64>,
    warmup_sum: f64,
    warmup_len: usize,
}

impl ExpSmoother {
    pub fn new(alpha: f64, seed: Seed) -> Self {
        Self {
            alpha,
            seed,
            state: None,
            warmup_sum: 0.0,
            warmup_len: 0,
        }
    }

    /// EMA with `alpha = 2 / (period + 1)`
    pub fn ema(period: Period, seed: Seed) -> Self {
        Self::new(2.0 / (period.get() as f64 + 1.0), seed)
    }

    /// Wilder smoothing with `alpha = 1 / period`
    pub fn wilder(period: Period, seed: Seed) -> Self {
        Self::new(1.0 / period.get() as f64, seed)
    }

    /// Feed one observation. Returns the smoothed value once seeded.
    pub fn update(&mut self, x: f64) -> Option<f64> {
        match self.state {
            Some(s) => {
                let next = s + self.alpha * (x - s);
                self.state = Some(next);
            }
            None => match self.seed {
                Seed::First => self.state = Some(x),
                Seed::Sma(period) => {
                    self.warmup_sum += x;
                    self.warmup_len += 1;
                    if self.warmup_len == period.get() {
                        self.state = Some(self.warmup_sum / self.warmup_len as f64);
                    }
                }
            },
        }
        self.state
    }

    #[inline]
    pub fn value(&self) -> Option<f64> {
        self.state
    }
}

/// Run a smoother over a series; entries before seeding are `None`.
pub fn smooth_series(values: &[f64], mut smoother: ExpSmoother) -> Vec<Option<f64>> {
    values.iter().map(|&v| smoother.update(v)).collect()
}

// ============================================================
// HELPERS
// ============================================================

/// Simple returns `v[i] / v[i-1] - 1`. A zero previous value yields 0.0.
pub fn pct_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|w| if w[0] != 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}

/// Linear-interpolated quantile (numpy's default method) of unsorted data.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(quantile_sorted(&sorted, q))
}

/// Same as [`quantile`] for data already sorted ascending. Must not be empty.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Least-squares slope of `values` against `0..n`. Zero for fewer than 2 points.
pub fn linear_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = values.iter().sum::<f64>() / n as f64;
    let (num, den) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, &y)| {
            let dx = i as f64 - x_mean;
            (num + dx * (y - y_mean), den + dx * dx)
        });
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

/// Least-squares fit of `(x, y)` points: `(slope, intercept)`.
pub fn linear_fit(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let x_mean = points.iter().map(|p| p.0).sum::<f64>() / n;
    let y_mean = points.iter().map(|p| p.1).sum::<f64>() / n;
    let (num, den) = points.iter().fold((0.0, 0.0), |(num, den), &(x, y)| {
        (num + (x - x_mean) * (y - y_mean), den + (x - x_mean) * (x - x_mean))
    });
    if den <= 0.0 {
        return None;
    }
    let slope = num / den;
    Some((slope, y_mean - slope * x_mean))
}

/// Share (0..=100, rounded) of `history` strictly below `current`, where
/// `history` includes `current` itself as its last element.
pub fn rank_percentile(history: &[f64], current: f64) -> u8 {
    if history.len() <= 1 {
        return 0;
    }
    let below = history.iter().filter(|&&v| v < current).count();
    let pct = 100.0 * below as f64 / (history.len() - 1) as f64;
    pct.round().clamp(0.0, 100.0) as u8
}

/// Mean and population standard deviation of a slice.
pub fn mean_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    Some((mean, var.max(0.0).sqrt()))
}
