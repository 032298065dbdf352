//! # narrata-core
//!
//! Turns one ordered OHLCV series into typed, deterministic facts: summary
//! statistics, trend and volatility regime, indicator readings, symbolic
//! shape encodings, chart and candlestick patterns, and support/resistance
//! levels.
//!
//! Every algorithm family has an in-house path and an optional backend
//! path. Which one runs is decided by a [`Capabilities`] value, so results
//! can be pinned in tests.
//!
//! ## Quick Start
//!
//! ```rust
//! use narrata_core::prelude::*;
//! use chrono::{Duration, TimeZone, Utc};
//!
//! let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let bars: Vec<Bar> = (0..120)
//!     .map(|i| {
//!         let c = 100.0 + i as f64 * 0.5;
//!         Bar::new(t0 + Duration::days(i), c - 0.2, c + 0.6, c - 0.6, c, 1_000.0)
//!     })
//!     .collect();
//! let view = SeriesView::new("DEMO", bars).unwrap();
//!
//! let analyzer = AnalyzerBuilder::new()
//!     .capabilities(Capabilities::none())
//!     .build()
//!     .unwrap();
//! let analysis = analyzer.analyze(&view).unwrap();
//! assert_eq!(analysis.regime.direction, Direction::Uptrend);
//! ```

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

pub mod backend;
pub mod changepoint;
pub mod detectors;
pub mod indicators;
pub mod levels;
pub mod patterns;
pub mod regime;
pub mod series;
pub mod summary;
pub mod symbolic;
pub mod window;

pub use backend::{capabilities, Capabilities};
pub use series::{Bar, PriceField, SeriesView};

use indicators::{compute_indicators, IndicatorConfig, IndicatorResult};
use levels::{extract_levels, LevelConfig, LevelResult};
use patterns::{detect_patterns, PatternConfig, PatternResult};
use regime::{classify_regime, RegimeConfig, RegimeResult};
use summary::{summarize, SummaryResult};
use symbolic::{encode_astride, encode_sax, SymbolicConfig, SymbolicEncoding};

pub mod prelude {
    pub use crate::{
        // Facade
        analyze_parallel,
        Analysis,
        AnalysisConfig,
        // Errors
        AnalysisError,
        AnalysisFailure,
        Analyzer,
        AnalyzerBuilder,
        // Data
        Bar,
        capabilities,
        Capabilities,
        Computed,
        Label,
        OHLCVExt,
        Period,
        PriceField,
        Ratio,
        Result,
        SeriesView,
        OHLCV,
    };
    pub use crate::indicators::{IndicatorConfig, IndicatorResult};
    pub use crate::levels::{LevelConfig, LevelResult, LevelSource, PriceLevel, Tolerance};
    pub use crate::patterns::{CandlestickKind, ChartPatternKind, ChartPatterns, PatternConfig, PatternResult};
    pub use crate::regime::{Direction, RegimeConfig, RegimeMethod, RegimeResult};
    pub use crate::summary::{Frequency, SummaryResult};
    pub use crate::symbolic::{SymbolicConfig, SymbolicEncoding, SymbolicMethod};
}

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Precondition violations and invalid configuration.
///
/// Short series are not errors; they show up as
/// [`Computed::InsufficientData`] in the affected result fields.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AnalysisError {
    #[error("Series has no bars")]
    EmptySeries,

    #[error("Timestamp at index {index} does not increase")]
    NonIncreasingTimestamp { index: usize },

    #[error("Invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: &'static str },

    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Normalized value in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    /// Create a new Ratio, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(AnalysisError::InvalidValue("Ratio cannot be NaN or infinite"));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(AnalysisError::OutOfRange {
                field: "Ratio",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    /// Create a Ratio from a compile-time constant (library internal use)
    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl Serialize for Ratio {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> Deserialize<'de> for Ratio {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Ratio::new(value).map_err(serde::de::Error::custom)
    }
}

/// Window length in bars (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(AnalysisError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLCV TRAITS
// ============================================================

/// Core OHLCV data trait
pub trait OHLCV {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> f64;

    /// Required by [`SeriesView::from_ohlcv`]; candle rules ignore it
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        None
    }
}

/// Extension trait with computed properties for OHLCV data
pub trait OHLCVExt: OHLCV {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn upper_shadow(&self) -> f64 {
        self.high() - self.open().max(self.close())
    }

    #[inline]
    fn lower_shadow(&self) -> f64 {
        self.open().min(self.close()) - self.low()
    }

    #[inline]
    fn is_bullish(&self) -> bool {
        self.close() > self.open()
    }

    #[inline]
    fn is_bearish(&self) -> bool {
        self.close() < self.open()
    }

    /// Body as ratio of range. Returns None if range ≈ 0
    #[inline]
    fn body_ratio(&self) -> Option<f64> {
        let range = self.range();
        (range > f64::EPSILON).then(|| self.body() / range)
    }
}

impl<T: OHLCV> OHLCVExt for T {}

// ============================================================
// RESULT VALUES
// ============================================================

/// Human-readable name of a classification
pub trait Label {
    fn label(&self) -> &'static str;
}

/// A value that needs a minimum history to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Computed<T> {
    Ready(T),
    InsufficientData { need: usize, got: usize },
}

impl<T> Computed<T> {
    #[inline]
    pub fn ready(&self) -> Option<&T> {
        match self {
            Computed::Ready(v) => Some(v),
            Computed::InsufficientData { .. } => None,
        }
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        matches!(self, Computed::Ready(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Computed<U> {
        match self {
            Computed::Ready(v) => Computed::Ready(f(v)),
            Computed::InsufficientData { need, got } => Computed::InsufficientData { need, got },
        }
    }
}

impl<T: Label> Label for Computed<T> {
    fn label(&self) -> &'static str {
        match self {
            Computed::Ready(v) => v.label(),
            Computed::InsufficientData { .. } => "insufficient data",
        }
    }
}

// ============================================================
// CONFIG
// ============================================================

/// Settings for every analysis. Missing JSON fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Column summarized by [`Analyzer::summarize`]
    pub column: PriceField,
    pub indicators: IndicatorConfig,
    pub regime: RegimeConfig,
    pub symbolic: SymbolicConfig,
    pub patterns: PatternConfig,
    pub levels: LevelConfig,
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        self.indicators.validate()?;
        self.regime.validate()?;
        self.symbolic.validate()?;
        self.patterns.validate()?;
        self.levels.validate()
    }
}

/// Every analysis of one series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub summary: SummaryResult,
    pub regime: RegimeResult,
    pub indicators: IndicatorResult,
    pub sax: SymbolicEncoding,
    pub astride: SymbolicEncoding,
    pub patterns: PatternResult,
    pub levels: LevelResult,
}

// ============================================================
// ANALYZER
// ============================================================

/// Validated configuration plus the backends it may use
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: AnalysisConfig,
    caps: Capabilities,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self {
            config: AnalysisConfig::default(),
            caps: capabilities(),
        }
    }
}

impl Analyzer {
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    pub fn summarize(&self, view: &SeriesView) -> SummaryResult {
        summarize(view, self.config.column)
    }

    pub fn regime(&self, view: &SeriesView) -> RegimeResult {
        classify_regime(view, &self.config.regime, &self.caps)
    }

    pub fn indicators(&self, view: &SeriesView) -> IndicatorResult {
        compute_indicators(view, &self.config.indicators, &self.caps)
    }

    pub fn sax(&self, view: &SeriesView) -> Result<SymbolicEncoding> {
        encode_sax(view, &self.config.symbolic, &self.caps)
    }

    pub fn astride(&self, view: &SeriesView) -> Result<SymbolicEncoding> {
        encode_astride(view, &self.config.symbolic, &self.caps)
    }

    pub fn patterns(&self, view: &SeriesView) -> Result<PatternResult> {
        detect_patterns(view, &self.config.patterns, &self.caps)
    }

    pub fn levels(&self, view: &SeriesView) -> Result<LevelResult> {
        extract_levels(view, &self.config.levels)
    }

    /// Run every analysis on `view`
    pub fn analyze(&self, view: &SeriesView) -> Result<Analysis> {
        Ok(Analysis {
            summary: self.summarize(view),
            regime: self.regime(view),
            indicators: self.indicators(view),
            sax: self.sax(view)?,
            astride: self.astride(view)?,
            patterns: self.patterns(view)?,
            levels: self.levels(view)?,
        })
    }
}

/// Builder for [`Analyzer`]
#[derive(Debug, Clone)]
pub struct AnalyzerBuilder {
    config: AnalysisConfig,
    caps: Capabilities,
}

impl Default for AnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyzerBuilder {
    /// Default configuration with the process-wide capabilities
    pub fn new() -> Self {
        Self {
            config: AnalysisConfig::default(),
            caps: capabilities(),
        }
    }

    pub fn config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    /// Requested backends; anything not compiled in is dropped at build
    pub fn capabilities(mut self, caps: Capabilities) -> Self {
        self.caps = caps;
        self
    }

    pub fn column(mut self, column: PriceField) -> Self {
        self.config.column = column;
        self
    }

    pub fn indicators(mut self, config: IndicatorConfig) -> Self {
        self.config.indicators = config;
        self
    }

    pub fn regime(mut self, config: RegimeConfig) -> Self {
        self.config.regime = config;
        self
    }

    pub fn symbolic(mut self, config: SymbolicConfig) -> Self {
        self.config.symbolic = config;
        self
    }

    pub fn patterns(mut self, config: PatternConfig) -> Self {
        self.config.patterns = config;
        self
    }

    pub fn levels(mut self, config: LevelConfig) -> Self {
        self.config.levels = config;
        self
    }

    /// Build the analyzer
    pub fn build(self) -> Result<Analyzer> {
        self.config.validate()?;
        let caps = self.caps.restrict_to_compiled();
        if caps != self.caps {
            log::debug!("requested backends {:?} not all compiled in, using {:?}", self.caps, caps);
        }
        Ok(Analyzer {
            config: self.config,
            caps,
        })
    }
}

// ============================================================
// PARALLEL ANALYSIS
// ============================================================

/// Series that could not be analyzed
#[derive(Debug)]
pub struct AnalysisFailure {
    pub ticker: String,
    pub error: AnalysisError,
}

/// Analyze independent instruments in parallel.
///
/// Successes keep the input order; a failing instrument is reported in the
/// second vector instead.
pub fn analyze_parallel<'a, T, I>(analyzer: &Analyzer, instruments: I) -> (Vec<Analysis>, Vec<AnalysisFailure>)
where
    T: OHLCV + Sync + 'a,
    I: IntoParallelIterator<Item = (&'a str, &'a [T])>,
{
    let results: Vec<_> = instruments
        .into_par_iter()
        .map(|(ticker, bars)| {
            SeriesView::from_ohlcv(ticker, bars)
                .and_then(|view| analyzer.analyze(&view))
                .map_err(|error| AnalysisFailure {
                    ticker: ticker.to_string(),
                    error,
                })
        })
        .collect();

    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(r) => successes.push(r),
            Err(e) => errors.push(e),
        }
    }

    (successes, errors)
}

// ============================================================
// TESTS
// ============================================================
