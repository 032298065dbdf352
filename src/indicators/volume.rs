//! Latest volume against its trailing average.

use serde::{Deserialize, Serialize};

use crate::window::RollingWindow;
use crate::{Computed, Label, Period};

/// Ratio below this is below average
pub const VOLUME_LOW: f64 = 0.7;
/// Ratio above this is above average
pub const VOLUME_HIGH: f64 = 1.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeLabel {
    BelowAverage,
    Average,
    AboveAverage,
}

impl VolumeLabel {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio < VOLUME_LOW {
            VolumeLabel::BelowAverage
        } else if ratio <= VOLUME_HIGH {
            VolumeLabel::Average
        } else {
            VolumeLabel::AboveAverage
        }
    }
}

impl Label for VolumeLabel {
    fn label(&self) -> &'static str {
        match self {
            VolumeLabel::BelowAverage => "below average",
            VolumeLabel::Average => "average",
            VolumeLabel::AboveAverage => "above average",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeReading {
    pub ratio: f64,
    pub label: VolumeLabel,
}

impl Label for VolumeReading {
    fn label(&self) -> &'static str {
        self.label.label()
    }
}

/// Latest volume over the mean of the last `period` volumes (latest included).
/// A non-positive average reports a ratio of 1.0.
pub fn volume_ratio(volumes: &[f64], period: Period) -> Computed<VolumeReading> {
    let n = volumes.len();
    if n < period.get() {
        return Computed::InsufficientData {
            need: period.get(),
            got: n,
        };
    }
    let mut window = RollingWindow::new(period);
    volumes[n - period.get()..].iter().for_each(|&v| {
        window.push(v);
    });

    let avg = window.mean().unwrap_or(0.0);
    let ratio = if avg > 0.0 { volumes[n - 1] / avg } else { 1.0 };
    Computed::Ready(VolumeReading {
        ratio,
        label: VolumeLabel::from_ratio(ratio),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const P20: Period = Period::new_const(20);

    #[test]
    fn test_bands() {
        assert_eq!(VolumeLabel::from_ratio(0.69), VolumeLabel::BelowAverage);
        assert_eq!(VolumeLabel::from_ratio(0.7), VolumeLabel::Average);
        assert_eq!(VolumeLabel::from_ratio(1.3), VolumeLabel::Average);
        assert_eq!(VolumeLabel::from_ratio(1.31), VolumeLabel::AboveAverage);
    }

    #[test]
    fn test_zero_volume_is_average() {
        let reading = volume_ratio(&[0.0; 25], P20).ready().copied().unwrap();
        assert_eq!(reading.ratio, 1.0);
        assert_eq!(reading.label, VolumeLabel::Average);
    }

    #[test]
    fn test_spike() {
        let mut volumes = vec![1000.0; 20];
        volumes[19] = 2900.0;
        let reading = volume_ratio(&volumes, P20).ready().copied().unwrap();
        // mean is 1095
        assert!((reading.ratio - 2900.0 / 1095.0).abs() < 1e-9);
        assert_eq!(reading.label, VolumeLabel::AboveAverage);
    }

    #[test]
    fn test_insufficient() {
        assert!(!volume_ratio(&[1.0; 19], P20).is_ready());
    }
}
