//! Fixed-window symbolic approximation.

use super::normal::gaussian_breakpoints;
use crate::window::mean_std;

/// Standard deviations below this are treated as zero variance
const FLAT_STD: f64 = 1e-8;

/// How a series is cut into `segments` equal parts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paa {
    /// Whole bars per segment, the last segment absorbing the remainder
    Contiguous,
    /// Real-valued segment boundaries, boundary bars weighted by overlap
    Fractional,
}

/// Zero mean, unit population variance. A flat series maps to zeros.
pub fn z_normalize(values: &[f64]) -> Vec<f64> {
    match mean_std(values) {
        Some((mean, std)) if std > FLAT_STD => values.iter().map(|v| (v - mean) / std).collect(),
        _ => vec![0.0; values.len()],
    }
}

/// Piecewise aggregate approximation. Requires `1 <= segments <= values.len()`.
pub fn paa(values: &[f64], segments: usize, mode: Paa) -> Vec<f64> {
    let n = values.len();
    if segments == 0 || n < segments {
        return Vec::new();
    }

    match mode {
        Paa::Contiguous => {
            let size = n / segments;
            (0..segments)
                .map(|j| {
                    let start = j * size;
                    let end = if j + 1 == segments { n } else { start + size };
                    let chunk = &values[start..end];
                    chunk.iter().sum::<f64>() / chunk.len() as f64
                })
                .collect()
        }
        Paa::Fractional => {
            let width = n as f64 / segments as f64;
            (0..segments)
                .map(|j| {
                    let lo = j as f64 * width;
                    let hi = lo + width;
                    let first = lo.floor() as usize;
                    let last = (hi.ceil() as usize).min(n);
                    let acc: f64 = (first..last)
                        .map(|i| {
                            let overlap = (hi.min(i as f64 + 1.0) - lo.max(i as f64)).max(0.0);
                            overlap * values[i]
                        })
                        .sum();
                    acc / width
                })
                .collect()
        }
    }
}

#[inline]
pub(crate) fn symbol(index: usize) -> char {
    (b'a' + index as u8) as char
}

/// Index of the bin holding `value`: the number of cut points `<= value`.
#[inline]
pub(crate) fn bin_of(cuts: &[f64], value: f64) -> usize {
    cuts.partition_point(|&c| c <= value)
}

/// SAX word of `values`. Series shorter than `word_length` get one symbol
/// per value.
pub fn sax_word(values: &[f64], word_length: usize, alphabet_size: usize, mode: Paa) -> String {
    let normalized = z_normalize(values);
    let means = if normalized.len() < word_length {
        normalized
    } else {
        paa(&normalized, word_length, mode)
    };

    let cuts = gaussian_breakpoints(alphabet_size);
    means.iter().map(|&m| symbol(bin_of(&cuts, m))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contiguous_last_segment_absorbs_remainder() {
        let v: Vec<f64> = (0..10).map(f64::from).collect();
        // sizes 3, 3, 4
        assert_eq!(paa(&v, 3, Paa::Contiguous), vec![1.0, 4.0, 7.5]);
    }

    #[test]
    fn test_fractional_weights_boundary_bars() {
        let v = [0.0, 3.0, 6.0];
        // boundaries at 0, 1.5, 3
        let out = paa(&v, 2, Paa::Fractional);
        assert!((out[0] - 1.0).abs() < 1e-12);
        assert!((out[1] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_modes_agree_when_divisible() {
        let v: Vec<f64> = (0..32).map(|i| (i as f64 * 0.7).sin()).collect();
        let a = paa(&v, 8, Paa::Contiguous);
        let b = paa(&v, 8, Paa::Fractional);
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_flat_maps_to_mid_symbol() {
        assert_eq!(sax_word(&[100.0; 50], 4, 8, Paa::Contiguous), "eeee");
        assert_eq!(sax_word(&[100.0; 50], 4, 3, Paa::Contiguous), "bbbb");
    }

    #[test]
    fn test_short_series_one_symbol_per_value() {
        assert_eq!(sax_word(&[1.0, 2.0, 3.0], 16, 3, Paa::Contiguous).len(), 3);
    }

    #[test]
    fn test_ramp_spans_alphabet() {
        let v: Vec<f64> = (0..40).map(f64::from).collect();
        let word = sax_word(&v, 4, 4, Paa::Contiguous);
        assert_eq!(word, "abcd");
    }
}
