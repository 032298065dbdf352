//! Optional backend capabilities.
//!
//! Each algorithm family has an in-house path and a higher-fidelity backend
//! path. Which backends exist is decided at build time through cargo
//! features and probed once per process; analyses take a [`Capabilities`]
//! value so tests can pin either path deterministically.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Which optional backends an analysis may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capabilities {
    /// TA-Lib compatible RSI and MACD seeding
    pub indicators: bool,
    /// Trendline chart geometry and TA-Lib style candlestick detectors
    pub patterns: bool,
    /// Penalized changepoint search (enhanced regimes, adaptive symbols)
    pub changepoint: bool,
    /// Fractional-boundary PAA for fixed-window symbols
    pub symbolic: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        capabilities()
    }
}

impl Capabilities {
    /// Everything off: every family runs its in-house path.
    pub const fn none() -> Self {
        Self {
            indicators: false,
            patterns: false,
            changepoint: false,
            symbolic: false,
        }
    }

    /// Everything requested. Use [`Capabilities::restrict_to_compiled`] to
    /// drop what this build does not ship.
    pub const fn all() -> Self {
        Self {
            indicators: true,
            patterns: true,
            changepoint: true,
            symbolic: true,
        }
    }

    /// Backends compiled into this build
    pub const fn compiled() -> Self {
        Self {
            indicators: cfg!(feature = "indicator-backend"),
            patterns: cfg!(feature = "pattern-backend"),
            changepoint: cfg!(feature = "changepoint-backend"),
            symbolic: cfg!(feature = "symbolic-backend"),
        }
    }

    /// Keep only the requested backends that are also compiled in.
    pub const fn restrict_to_compiled(self) -> Self {
        let built = Self::compiled();
        Self {
            indicators: self.indicators && built.indicators,
            patterns: self.patterns && built.patterns,
            changepoint: self.changepoint && built.changepoint,
            symbolic: self.symbolic && built.symbolic,
        }
    }

    /// Read-only name -> availability mapping
    pub fn as_map(&self) -> BTreeMap<&'static str, bool> {
        BTreeMap::from([
            ("changepoint", self.changepoint),
            ("indicators", self.indicators),
            ("patterns", self.patterns),
            ("symbolic", self.symbolic),
        ])
    }
}

static PROBE: OnceLock<Capabilities> = OnceLock::new();

/// Process-wide capability probe, computed on first use.
pub fn capabilities() -> Capabilities {
    *PROBE.get_or_init(|| {
        let caps = Capabilities::compiled();
        log::debug!("backend capabilities: {:?}", caps.as_map());
        caps
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_is_stable() {
        assert_eq!(capabilities(), capabilities());
        assert_eq!(capabilities(), Capabilities::compiled());
    }

    #[test]
    fn test_restrict_never_adds() {
        assert_eq!(Capabilities::none().restrict_to_compiled(), Capabilities::none());
        assert_eq!(Capabilities::all().restrict_to_compiled(), Capabilities::compiled());
    }

    #[test]
    fn test_map_has_all_backends() {
        let map = Capabilities::none().as_map();
        assert_eq!(map.len(), 4);
        assert!(map.values().all(|v| !v));
        assert_eq!(
            map.keys().copied().collect::<Vec<_>>(),
            vec!["changepoint", "indicators", "patterns", "symbolic"]
        );
    }
}
