//! Symbolic shape encodings.
//!
//! - SAX: fixed word length, Gaussian breakpoints
//! - ASTRIDE: one symbol per changepoint segment, data-adaptive breakpoints
//!
//! ASTRIDE has no in-house segmentation. Without the changepoint capability
//! it returns the SAX word instead, tagged [`SymbolicMethod::FixedWindow`].

pub mod astride;
pub mod normal;
pub mod sax;

pub use astride::astride_word;
pub use normal::{gaussian_breakpoints, inv_cdf};
pub use sax::{paa, sax_word, z_normalize, Paa};

use serde::{Deserialize, Serialize};

use crate::{AnalysisError, Capabilities, Period, PriceField, Result, SeriesView};

pub const MIN_ALPHABET: usize = 2;
pub const MAX_ALPHABET: usize = 26;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SymbolicMethod {
    FixedWindow,
    Adaptive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolicEncoding {
    pub method: SymbolicMethod,
    /// Number of symbols actually produced
    pub word_length: usize,
    pub alphabet_size: usize,
    pub symbols: String,
}

impl SymbolicEncoding {
    fn new(method: SymbolicMethod, alphabet_size: usize, symbols: String) -> Self {
        Self {
            method,
            word_length: symbols.chars().count(),
            alphabet_size,
            symbols,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolicConfig {
    pub column: PriceField,
    pub word_length: usize,
    pub alphabet_size: usize,
    /// Encode only the trailing `window` bars
    pub window: Option<Period>,
    /// Target segment count for ASTRIDE; sets the minimum segment size
    pub n_segments: usize,
    pub penalty: f64,
}

impl Default for SymbolicConfig {
    fn default() -> Self {
        Self {
            column: PriceField::Close,
            word_length: 16,
            alphabet_size: 8,
            window: None,
            n_segments: 16,
            penalty: 3.0,
        }
    }
}

impl SymbolicConfig {
    pub fn validate(&self) -> Result<()> {
        if self.word_length < 2 {
            return Err(AnalysisError::InvalidConfig(format!(
                "word_length must be >= 2, got {}",
                self.word_length
            )));
        }
        if !(MIN_ALPHABET..=MAX_ALPHABET).contains(&self.alphabet_size) {
            return Err(AnalysisError::OutOfRange {
                field: "alphabet_size",
                value: self.alphabet_size as f64,
                min: MIN_ALPHABET as f64,
                max: MAX_ALPHABET as f64,
            });
        }
        if self.n_segments == 0 {
            return Err(AnalysisError::InvalidConfig("n_segments must be >= 1".into()));
        }
        if !self.penalty.is_finite() || self.penalty < 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "penalty must be a non-negative number, got {}",
                self.penalty
            )));
        }
        Ok(())
    }

    fn values(&self, view: &SeriesView) -> Vec<f64> {
        let mut values = view.column(self.column);
        if let Some(w) = self.window {
            if w.get() < values.len() {
                values.drain(..values.len() - w.get());
            }
        }
        values
    }
}

/// SAX encoding of the configured column. The symbolic capability switches
/// to fractional segment boundaries.
pub fn encode_sax(
    view: &SeriesView,
    config: &SymbolicConfig,
    caps: &Capabilities,
) -> Result<SymbolicEncoding> {
    config.validate()?;
    let mode = if caps.symbolic {
        Paa::Fractional
    } else {
        Paa::Contiguous
    };
    let word = sax_word(&config.values(view), config.word_length, config.alphabet_size, mode);
    Ok(SymbolicEncoding::new(SymbolicMethod::FixedWindow, config.alphabet_size, word))
}

/// ASTRIDE encoding, or the SAX encoding when changepoint search is unavailable.
///
/// Segmentation memory is quadratic in the series length; see
/// [`crate::changepoint::MAX_RBF_POINTS`].
pub fn encode_astride(
    view: &SeriesView,
    config: &SymbolicConfig,
    caps: &Capabilities,
) -> Result<SymbolicEncoding> {
    if !caps.changepoint {
        log::debug!("{}: no changepoint backend, ASTRIDE falls back to SAX", view.ticker());
        return encode_sax(view, config, caps);
    }
    config.validate()?;
    let word = astride_word(
        &config.values(view),
        config.n_segments,
        config.alphabet_size,
        config.penalty,
    );
    Ok(SymbolicEncoding::new(SymbolicMethod::Adaptive, config.alphabet_size, word))
}
