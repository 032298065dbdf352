//! TA-Lib compatible candlestick rules
//!
//! These drive the backend candlestick path. Each rule compares a bar
//! against trailing averages of the bars before it ([`MarketContext`]),
//! which makes it less sensitive to absolute price scale than the plain
//! body/wick ratios of the in-house path.
//!
//! # Catalogue
//!
//! - **Single-bar**: Doji, Hammer, Shooting Star
//! - **Two-bar**: Engulfing, Harami (inside bar)
//! - **Three-bar**: Morning Star, Evening Star

use serde::{Deserialize, Serialize};

use crate::{OHLCVExt, Period, Result, OHLCV};

pub mod helpers;

/// Generate `with_defaults()` -> `Self::default()` for multiple detector types.
macro_rules! impl_with_defaults {
  ($($detector:ty),* $(,)?) => {
    $(impl $detector {
      pub fn with_defaults() -> Self { Self::default() }
    })*
  };
}

pub mod single_bar;
pub mod three_bar;
pub mod two_bar;

pub use helpers::*;
pub use single_bar::*;
pub use three_bar::*;
pub use two_bar::*;

// ============================================================
// PATTERN MATCH
// ============================================================

/// Unique identifier for a candlestick rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatternId(pub &'static str);

impl PatternId {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

/// Bias implied by a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Bullish,
    Neutral,
    Bearish,
}

/// Result of one rule at one bar. Copy, no allocations.
#[derive(Debug, Clone, Copy)]
pub struct PatternMatch {
    pub pattern_id: PatternId,
    pub polarity: Polarity,
    /// Quality score 0.0..=1.0
    pub strength: f64,
    pub start_index: usize,
    pub end_index: usize,
}

// ============================================================
// MARKET CONTEXT
// ============================================================

/// Trailing candle averages at one bar, taken over the bars before it
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MarketContext {
    /// Average real body (TA-Lib: TA_CANDLEAVGPERIOD = 10)
    pub avg_body: f64,
    /// Average high-low range
    pub avg_range: f64,
}

/// Precomputes a context for every bar
pub trait ContextProvider: Send + Sync {
    fn compute_all<T: OHLCV>(&self, bars: &[T]) -> Vec<MarketContext>;
}

#[derive(Debug, Clone)]
pub struct DefaultContextProvider {
    pub candle_period: Period,
}

impl Default for DefaultContextProvider {
    fn default() -> Self {
        Self {
            candle_period: Period::new_const(10),
        }
    }
}

impl ContextProvider for DefaultContextProvider {
    fn compute_all<T: OHLCV>(&self, bars: &[T]) -> Vec<MarketContext> {
        let period = self.candle_period.get();
        (0..bars.len())
            .map(|i| {
                // bar i is excluded; the first bar stands in for itself
                if i == 0 {
                    return MarketContext {
                        avg_body: bars[0].body(),
                        avg_range: bars[0].range(),
                    };
                }
                let trail = &bars[i.saturating_sub(period)..i];
                let count = trail.len() as f64;
                let (body, range) = trail
                    .iter()
                    .fold((0.0, 0.0), |(b, r), bar| (b + bar.body(), r + bar.range()));
                MarketContext {
                    avg_body: body / count,
                    avg_range: range / count,
                }
            })
            .collect()
    }
}

// ============================================================
// DETECTOR TRAIT
// ============================================================

pub trait PatternDetector: Send + Sync {
    fn id(&self) -> PatternId;
    fn min_bars(&self) -> usize;
    fn detect<T: OHLCV>(
        &self,
        bars: &[T],
        index: usize,
        ctx: &MarketContext,
    ) -> Option<PatternMatch>;

    fn validate_config(&self) -> Result<()> {
        Ok(())
    }
}

/// Generate the `CandleDetector` enum (enum dispatch over the built-in rules)
macro_rules! define_builtin_detectors {
    (
        $(
            $variant:ident($detector:ty)
        ),* $(,)?
    ) => {
        #[derive(Debug, Clone)]
        pub enum CandleDetector {
            $($variant($detector)),*
        }

        impl CandleDetector {
            #[inline]
            pub fn detect<T: OHLCV>(
                &self,
                bars: &[T],
                index: usize,
                ctx: &MarketContext,
            ) -> Option<PatternMatch> {
                match self {
                    $(Self::$variant(d) => PatternDetector::detect(d, bars, index, ctx)),*
                }
            }

            #[inline]
            pub fn min_bars(&self) -> usize {
                match self {
                    $(Self::$variant(d) => PatternDetector::min_bars(d)),*
                }
            }
        }
    };
}

define_builtin_detectors! {
    MorningStar(MorningStarDetector),
    EveningStar(EveningStarDetector),
    Engulfing(EngulfingDetector),
    Harami(HaramiDetector),
    Doji(DojiDetector),
    Hammer(HammerDetector),
    ShootingStar(ShootingStarDetector),
}

// ============================================================
// SCANNER
// ============================================================

/// Ordered rule set plus a context provider. Earlier rules win at a bar.
pub struct CandleScanner<C: ContextProvider = DefaultContextProvider> {
    detectors: Vec<CandleDetector>,
    context_provider: C,
}

impl Default for CandleScanner<DefaultContextProvider> {
    fn default() -> Self {
        Self::new(DefaultContextProvider::default())
    }
}

impl<C: ContextProvider> CandleScanner<C> {
    pub fn new(context_provider: C) -> Self {
        Self {
            detectors: Vec::new(),
            context_provider,
        }
    }

    /// All built-in rules with default settings, strongest first
    pub fn with_all_defaults(mut self) -> Self {
        self.detectors.extend([
            CandleDetector::MorningStar(Default::default()),
            CandleDetector::EveningStar(Default::default()),
            CandleDetector::Engulfing(Default::default()),
            CandleDetector::Harami(Default::default()),
            CandleDetector::Doji(Default::default()),
            CandleDetector::Hammer(Default::default()),
            CandleDetector::ShootingStar(Default::default()),
        ]);
        self
    }

    pub fn detectors(&self) -> &[CandleDetector] {
        &self.detectors
    }

    #[inline]
    pub fn compute_contexts<T: OHLCV>(&self, bars: &[T]) -> Vec<MarketContext> {
        self.context_provider.compute_all(bars)
    }

    /// First matching rule at `index`
    pub fn first_at<T: OHLCV>(
        &self,
        bars: &[T],
        index: usize,
        ctx: &MarketContext,
    ) -> Option<PatternMatch> {
        self.detectors
            .iter()
            .filter(|d| index + 1 >= d.min_bars())
            .find_map(|d| d.detect(bars, index, ctx))
    }
}
