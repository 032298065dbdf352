//! Sign-change detection and the 50/200 SMA cross.

use serde::{Deserialize, Serialize};

use crate::window::rolling_mean;
use crate::{Computed, Label, Period};

/// Most recent sign change in `(index, value)` pairs.
///
/// Zeros never start or end a crossing: the walk carries the last non-zero
/// sign across them. Returns the index where the new sign first appears and
/// whether that sign is positive.
pub fn last_sign_change(values: impl IntoIterator<Item = (usize, f64)>) -> Option<(usize, bool)> {
    let mut prev: Option<bool> = None;
    let mut last = None;
    for (index, v) in values {
        if v == 0.0 || v.is_nan() {
            continue;
        }
        let positive = v > 0.0;
        if let Some(p) = prev {
            if p != positive {
                last = Some((index, positive));
            }
        }
        prev = Some(positive);
    }
    last
}

/// Moving-average cross state. `age` counts bars since the cross.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmaCross {
    GoldenCross { age: usize },
    DeathCross { age: usize },
    None,
}

impl Label for SmaCross {
    fn label(&self) -> &'static str {
        match self {
            SmaCross::GoldenCross { .. } => "golden cross",
            SmaCross::DeathCross { .. } => "death cross",
            SmaCross::None => "none",
        }
    }
}

/// Fast/slow SMA cross over `closes`.
pub fn sma_cross(closes: &[f64], fast: Period, slow: Period) -> Computed<SmaCross> {
    let n = closes.len();
    if n < slow.get() {
        return Computed::InsufficientData {
            need: slow.get(),
            got: n,
        };
    }
    let fast_sma = rolling_mean(closes, fast);
    let slow_sma = rolling_mean(closes, slow);

    // bar j is covered by fast_sma[j + 1 - fast] and slow_sma[j + 1 - slow]
    let diffs = (slow.get() - 1..n).map(|j| {
        let f = fast_sma[j + 1 - fast.get()];
        let s = slow_sma[j + 1 - slow.get()];
        (j, f - s)
    });

    let cross = match last_sign_change(diffs) {
        Some((j, true)) => SmaCross::GoldenCross { age: n - 1 - j },
        Some((j, false)) => SmaCross::DeathCross { age: n - 1 - j },
        None => SmaCross::None,
    };
    Computed::Ready(cross)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_sign_change_skips_zeros() {
        let v = [(0, 1.0), (1, 0.0), (2, -1.0), (3, -2.0), (4, 0.0), (5, 3.0)];
        assert_eq!(last_sign_change(v), Some((5, true)));

        let v = [(0, 1.0), (1, 2.0)];
        assert_eq!(last_sign_change(v), None);

        let v = [(0, 0.0), (1, 0.0)];
        assert_eq!(last_sign_change(v), None);
    }

    #[test]
    fn test_insufficient_history() {
        let closes = vec![1.0; 199];
        let out = sma_cross(&closes, Period::new_const(50), Period::new_const(200));
        assert_eq!(out, Computed::InsufficientData { need: 200, got: 199 });
    }

    #[test]
    fn test_golden_cross_age() {
        // falls for 150 bars then rises steeply: the 50 SMA overtakes the 200 SMA
        let mut closes: Vec<f64> = (0..150).map(|i| 300.0 - i as f64).collect();
        closes.extend((0..150).map(|i| 150.0 + 3.0 * i as f64));

        let out = sma_cross(&closes, Period::new_const(50), Period::new_const(200));
        match out {
            Computed::Ready(SmaCross::GoldenCross { age }) => assert!(age < 100),
            other => panic!("expected golden cross, got {other:?}"),
        }
    }

    #[test]
    fn test_monotonic_never_crosses() {
        let closes: Vec<f64> = (0..250).map(|i| 100.0 + i as f64).collect();
        let out = sma_cross(&closes, Period::new_const(50), Period::new_const(200));
        assert_eq!(out, Computed::Ready(SmaCross::None));
    }
}
