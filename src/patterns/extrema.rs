//! Swing points: neighborhood extrema shared by chart patterns and levels.

/// Kind of swing point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Swing {
    High,
    Low,
}

/// Indices `i` with `order <= i < len - order` whose value is `>=` (highs)
/// or `<=` (lows) every value in `[i - order, i + order]`.
///
/// A plateau reports only its first bar: a candidate equal to the previous
/// accepted point no more than `order` bars back is the same swing.
pub fn swing_points(values: &[f64], order: usize, kind: Swing) -> Vec<usize> {
    let n = values.len();
    if order == 0 || n < 2 * order + 1 {
        return Vec::new();
    }

    let mut out: Vec<usize> = Vec::new();
    for i in order..n - order {
        let v = values[i];
        let extreme = values[i - order..=i + order].iter().all(|&w| match kind {
            Swing::High => v >= w,
            Swing::Low => v <= w,
        });
        if !extreme {
            continue;
        }
        if let Some(&j) = out.last() {
            if i - j <= order && values[j] == v {
                continue;
            }
        }
        out.push(i);
    }
    out
}

#[inline]
pub fn swing_highs(values: &[f64], order: usize) -> Vec<usize> {
    swing_points(values, order, Swing::High)
}

#[inline]
pub fn swing_lows(values: &[f64], order: usize) -> Vec<usize> {
    swing_points(values, order, Swing::Low)
}
