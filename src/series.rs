//! Validated, read-only view over one ordered OHLCV series.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AnalysisError, Result, OHLCV};

/// One OHLCV record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

impl OHLCV for Bar {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        Some(self.timestamp)
    }
}

/// Price column an analysis runs on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceField {
    Open,
    High,
    Low,
    #[default]
    Close,
}

impl PriceField {
    #[inline]
    pub fn of<T: OHLCV>(self, bar: &T) -> f64 {
        match self {
            PriceField::Open => bar.open(),
            PriceField::High => bar.high(),
            PriceField::Low => bar.low(),
            PriceField::Close => bar.close(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PriceField::Open => "open",
            PriceField::High => "high",
            PriceField::Low => "low",
            PriceField::Close => "close",
        }
    }
}

/// Ordered, non-empty bar sequence. Immutable once built.
///
/// Construction enforces the invariants every analysis relies on:
/// at least one bar, strictly increasing timestamps, `high >= low`,
/// finite prices and a finite, non-negative volume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesView {
    ticker: String,
    bars: Vec<Bar>,
}

impl SeriesView {
    pub fn new(ticker: impl Into<String>, bars: Vec<Bar>) -> Result<Self> {
        if bars.is_empty() {
            return Err(AnalysisError::EmptySeries);
        }
        for (index, bar) in bars.iter().enumerate() {
            validate_bar(bar, index)?;
            if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
                return Err(AnalysisError::NonIncreasingTimestamp { index });
            }
        }
        Ok(Self {
            ticker: ticker.into(),
            bars,
        })
    }

    /// Build a view from any OHLCV type that carries timestamps.
    pub fn from_ohlcv<T: OHLCV>(ticker: impl Into<String>, bars: &[T]) -> Result<Self> {
        let converted = bars
            .iter()
            .enumerate()
            .map(|(index, b)| {
                let timestamp = b.timestamp().ok_or(AnalysisError::InvalidBar {
                    index,
                    reason: "missing timestamp",
                })?;
                Ok(Bar::new(timestamp, b.open(), b.high(), b.low(), b.close(), b.volume()))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(ticker, converted)
    }

    #[inline]
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    #[inline]
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false; kept for API symmetry with slices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    #[inline]
    pub fn first(&self) -> &Bar {
        &self.bars[0]
    }

    #[inline]
    pub fn last(&self) -> &Bar {
        &self.bars[self.bars.len() - 1]
    }

    #[inline]
    pub fn timestamp(&self, index: usize) -> Option<DateTime<Utc>> {
        self.bars.get(index).map(|b| b.timestamp)
    }

    pub fn column(&self, field: PriceField) -> Vec<f64> {
        self.bars.iter().map(|b| field.of(b)).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.column(PriceField::Close)
    }

    pub fn highs(&self) -> Vec<f64> {
        self.column(PriceField::High)
    }

    pub fn lows(&self) -> Vec<f64> {
        self.column(PriceField::Low)
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }
}

fn validate_bar(bar: &Bar, index: usize) -> Result<()> {
    let prices = [bar.open, bar.high, bar.low, bar.close];
    if prices.iter().any(|p| !p.is_finite()) {
        return Err(AnalysisError::InvalidBar {
            index,
            reason: "non-finite price",
        });
    }
    if bar.high < bar.low {
        return Err(AnalysisError::InvalidBar {
            index,
            reason: "high < low",
        });
    }
    if !bar.volume.is_finite() || bar.volume < 0.0 {
        return Err(AnalysisError::InvalidBar {
            index,
            reason: "volume must be finite and >= 0",
        });
    }
    Ok(())
}
