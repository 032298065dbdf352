//! Offline changepoint search: PELT (pruned exact linear time) with an
//! RBF-kernel or L2 segment cost.
//!
//! Breakpoints follow the usual convention: the returned indices are segment
//! ends (exclusive) and the last one always equals the signal length.
//!
//! The RBF cost holds an `(n + 1)^2` table of Gram-matrix prefix sums, so its
//! memory grows quadratically with the signal. RBF searches only look at the
//! trailing [`MAX_RBF_POINTS`] values (about 32 MB of table).

use serde::{Deserialize, Serialize};

use crate::{AnalysisError, Period, Result};

/// Longest signal suffix an RBF search segments
pub const MAX_RBF_POINTS: usize = 2_000;

/// Segment cost model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostModel {
    /// Gaussian kernel, bandwidth from the median pairwise distance.
    /// Sensitive to changes in the whole distribution.
    #[default]
    Rbf,
    /// Squared deviation from the segment mean. Mean shifts only.
    L2,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeltConfig {
    pub cost: CostModel,
    /// Minimum segment length
    pub min_size: Period,
    /// Candidate breakpoints are multiples of `jump`
    pub jump: Period,
    pub penalty: f64,
}

impl Default for PeltConfig {
    fn default() -> Self {
        Self {
            cost: CostModel::Rbf,
            min_size: Period::new_const(20),
            jump: Period::new_const(5),
            penalty: 3.0,
        }
    }
}

impl PeltConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.penalty.is_finite() || self.penalty < 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "penalty must be a non-negative number, got {}",
                self.penalty
            )));
        }
        Ok(())
    }
}

// ============================================================
// COSTS
// ============================================================

trait SegmentCost {
    /// Cost of `signal[start..end]`
    fn error(&self, start: usize, end: usize) -> f64;
}

/// Prefix sums of the signal and its square
struct L2Cost {
    sum: Vec<f64>,
    sumsq: Vec<f64>,
}

impl L2Cost {
    fn new(signal: &[f64]) -> Self {
        let mut sum = Vec::with_capacity(signal.len() + 1);
        let mut sumsq = Vec::with_capacity(signal.len() + 1);
        sum.push(0.0);
        sumsq.push(0.0);
        for &x in signal {
            sum.push(sum[sum.len() - 1] + x);
            sumsq.push(sumsq[sumsq.len() - 1] + x * x);
        }
        Self { sum, sumsq }
    }
}

impl SegmentCost for L2Cost {
    fn error(&self, start: usize, end: usize) -> f64 {
        let len = (end - start) as f64;
        let s = self.sum[end] - self.sum[start];
        let sq = self.sumsq[end] - self.sumsq[start];
        (sq - s * s / len).max(0.0)
    }
}

/// 2-D prefix sums of the Gram matrix `exp(-gamma * |xi - xj|^2)`,
/// with `gamma * d^2` clipped to `[0.01, 100]` off the diagonal.
struct RbfCost {
    n: usize,
    prefix: Vec<f64>,
}

impl RbfCost {
    fn new(signal: &[f64]) -> Self {
        let n = signal.len();
        let mut dists = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in i + 1..n {
                let d = signal[i] - signal[j];
                dists.push(d * d);
            }
        }
        let gamma = match median(&mut dists) {
            Some(m) if m != 0.0 => 1.0 / m,
            _ => 1.0,
        };

        let stride = n + 1;
        let mut prefix = vec![0.0; stride * stride];
        for i in 0..n {
            let mut row = 0.0;
            for j in 0..n {
                let k = if i == j {
                    1.0
                } else {
                    let d = signal[i] - signal[j];
                    (-(gamma * d * d).clamp(1e-2, 1e2)).exp()
                };
                row += k;
                prefix[(i + 1) * stride + j + 1] = prefix[i * stride + j + 1] + row;
            }
        }
        Self { n, prefix }
    }

    #[inline]
    fn at(&self, i: usize, j: usize) -> f64 {
        self.prefix[i * (self.n + 1) + j]
    }
}

impl SegmentCost for RbfCost {
    fn error(&self, start: usize, end: usize) -> f64 {
        let block = self.at(end, end) - self.at(start, end) - self.at(end, start)
            + self.at(start, start);
        let len = (end - start) as f64;
        (len - block / len).max(0.0)
    }
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

// ============================================================
// SEARCH
// ============================================================

/// Segment `signal` and return the breakpoints (segment ends, last == len).
///
/// A signal shorter than `2 * min_size` is a single segment. With the RBF
/// cost only the trailing [`MAX_RBF_POINTS`] values are searched; anything
/// before them joins the first segment.
pub fn pelt(signal: &[f64], config: &PeltConfig) -> Vec<usize> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }
    if n < 2 * config.min_size.get() {
        return vec![n];
    }
    match config.cost {
        CostModel::Rbf => {
            let offset = n.saturating_sub(MAX_RBF_POINTS);
            if offset > 0 {
                log::debug!("rbf changepoint search limited to the last {MAX_RBF_POINTS} of {n} points");
            }
            let tail = &signal[offset..];
            search(&RbfCost::new(tail), tail.len(), config)
                .into_iter()
                .map(|b| b + offset)
                .collect()
        }
        CostModel::L2 => search(&L2Cost::new(signal), n, config),
    }
}

fn search(cost: &impl SegmentCost, n: usize, config: &PeltConfig) -> Vec<usize> {
    let min_size = config.min_size.get();
    let jump = config.jump.get();
    let pen = config.penalty;

    // best[t] = (total cost of the best partition of 0..t, previous breakpoint)
    let mut best: Vec<Option<(f64, usize)>> = vec![None; n + 1];
    best[0] = Some((0.0, 0));

    let mut candidates: Vec<usize> = (0..n).step_by(jump).filter(|&k| k >= min_size).collect();
    candidates.push(n);

    let mut admissible: Vec<usize> = Vec::new();
    for &bkp in &candidates {
        admissible.push((bkp - min_size) / jump * jump);

        let scored: Vec<(usize, f64)> = admissible
            .iter()
            .filter_map(|&t| {
                let (left, _) = best[t]?;
                Some((t, left + cost.error(t, bkp) + pen))
            })
            .collect();

        let Some(&(arg, total)) = scored
            .iter()
            .min_by(|a, b| a.1.total_cmp(&b.1))
        else {
            continue;
        };
        best[bkp] = Some((total, arg));
        admissible = scored
            .into_iter()
            .filter(|&(_, c)| c <= total + pen)
            .map(|(t, _)| t)
            .collect();
    }

    let mut breakpoints = Vec::new();
    let mut end = n;
    while end > 0 {
        breakpoints.push(end);
        match best[end] {
            Some((_, prev)) => end = prev,
            None => break,
        }
    }
    breakpoints.reverse();
    breakpoints
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_signal() -> Vec<f64> {
        let mut s: Vec<f64> = (0..60).map(|i| if i % 2 == 0 { 0.1 } else { -0.1 }).collect();
        s.extend((0..60).map(|i| 5.0 + if i % 2 == 0 { 0.1 } else { -0.1 }));
        s
    }

    #[test]
    fn test_short_signal_is_one_segment() {
        assert_eq!(pelt(&[1.0; 10], &PeltConfig::default()), vec![10]);
        assert!(pelt(&[], &PeltConfig::default()).is_empty());
    }

    #[test]
    fn test_finds_mean_shift_l2() {
        let config = PeltConfig {
            cost: CostModel::L2,
            ..PeltConfig::default()
        };
        assert_eq!(pelt(&step_signal(), &config), vec![60, 120]);
    }

    #[test]
    fn test_finds_mean_shift_rbf() {
        assert_eq!(pelt(&step_signal(), &PeltConfig::default()), vec![60, 120]);
    }

    #[test]
    fn test_constant_signal_has_no_breaks() {
        for cost in [CostModel::Rbf, CostModel::L2] {
            let config = PeltConfig {
                cost,
                ..PeltConfig::default()
            };
            assert_eq!(pelt(&[3.0; 100], &config), vec![100]);
        }
    }

    #[test]
    fn test_segments_respect_min_size() {
        let signal: Vec<f64> = (0..200).map(|i| ((i * 37) % 17) as f64 + (i / 40) as f64 * 10.0).collect();
        let bkps = pelt(&signal, &PeltConfig::default());
        assert_eq!(*bkps.last().unwrap(), 200);
        let mut start = 0;
        for &b in &bkps {
            assert!(b - start >= 20, "segment {start}..{b} too short");
            start = b;
        }
    }

    #[test]
    fn test_rbf_search_is_limited_to_the_tail() {
        let wiggle = |i: usize| if i % 2 == 0 { 0.1 } else { -0.1 };
        let head = 500;
        // a shift inside the head, then one inside the searched tail
        let signal: Vec<f64> = (0..head + MAX_RBF_POINTS)
            .map(|i| {
                let level = if i < 250 || i >= 2_200 { 5.0 } else { 0.0 };
                level + wiggle(i)
            })
            .collect();
        let bkps = pelt(&signal, &PeltConfig::default());
        assert_eq!(bkps, vec![2_200, head + MAX_RBF_POINTS]);
    }

    #[test]
    fn test_rbf_cost_grows_with_outlier() {
        let cost = RbfCost::new(&[1.0, 1.0, 1.0, 5.0]);
        // identical points still pay the clipped kernel: (len - 1) * (1 - e^-0.01)
        let floor = 2.0 * (1.0 - (-0.01f64).exp());
        assert!((cost.error(0, 3) - floor).abs() < 1e-12);
        assert!(cost.error(0, 4) > cost.error(0, 3) + 0.5);
    }
}
