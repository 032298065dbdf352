//! Adaptive symbolization: changepoint segments, empirical-quantile alphabet.

use super::sax::{bin_of, symbol, z_normalize};
use crate::changepoint::{pelt, CostModel, PeltConfig};
use crate::window::quantile;
use crate::Period;

/// Mean of each segment delimited by `breakpoints` (segment ends, exclusive).
fn segment_means(values: &[f64], breakpoints: &[usize]) -> Vec<f64> {
    let mut start = 0;
    breakpoints
        .iter()
        .filter_map(|&end| {
            let seg = &values[start..end];
            start = end;
            (!seg.is_empty()).then(|| seg.iter().sum::<f64>() / seg.len() as f64)
        })
        .collect()
}

/// Interior cut points of `means` at `k / alphabet_size`, `k = 1..alphabet_size`.
fn empirical_cuts(means: &[f64], alphabet_size: usize) -> Vec<f64> {
    (1..alphabet_size)
        .filter_map(|k| quantile(means, k as f64 / alphabet_size as f64))
        .collect()
}

/// ASTRIDE word of `values`; one symbol per detected segment.
pub fn astride_word(values: &[f64], n_segments: usize, alphabet_size: usize, penalty: f64) -> String {
    let normalized = z_normalize(values);
    let min_size = (normalized.len() / (2 * n_segments.max(1))).max(2);
    let config = PeltConfig {
        cost: CostModel::Rbf,
        min_size: Period::new_const(min_size),
        jump: Period::new_const(5),
        penalty,
    };

    let breakpoints = pelt(&normalized, &config);
    let means = segment_means(&normalized, &breakpoints);
    log::trace!("astride: {} segments", means.len());

    if means.len() < 2 {
        return "a".repeat(means.len().max(1));
    }

    let cuts = empirical_cuts(&means, alphabet_size);
    means
        .iter()
        .map(|&m| symbol(bin_of(&cuts, m).min(alphabet_size - 1)))
        .collect()
}
