//! IndicatorFeed — bar-aligned series supplied by the external indicator stage.
//!
//! The engine never computes indicators. Regime masks, the composite filter,
//! ATR, and the optional adaptive moving averages arrive precomputed and
//! bar-aligned. The one-bar-delay discipline (values at index `i` reflect
//! information through bar `i` only) is the producer's responsibility; the
//! engine merely refuses to index past the current bar.

use serde::{Deserialize, Serialize};

use super::bar::DataError;

/// Precomputed, bar-aligned indicator columns.
///
/// `atr` may be NaN during the indicator's warmup window — the signal pass
/// treats those bars as trade-ineligible rather than failing. `mama`/`fama`
/// are only required when the secondary cross filter is enabled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndicatorFeed {
    /// Full bullish condition set fired at this bar.
    pub bullish: Vec<bool>,
    /// Full bearish condition set fired at this bar.
    pub bearish: Vec<bool>,
    /// Composite confirmation filter, per-bar in {-1, 0, 1}.
    pub composite: Vec<i8>,
    /// Average true range; NaN while warming up.
    pub atr: Vec<f64>,
    /// Adaptive MA pair for the secondary cross filter (optional).
    pub mama: Option<Vec<f64>>,
    pub fama: Option<Vec<f64>>,
}

/// Per-bar view over the feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSnapshot {
    pub bullish: bool,
    pub bearish: bool,
    pub composite: i8,
    pub atr: f64,
    pub mama: Option<f64>,
    pub fama: Option<f64>,
}

impl IndicatorFeed {
    /// Validate column lengths against the bar count and composite domain.
    pub fn validate(&self, expected: usize) -> Result<(), DataError> {
        let check = |column: &'static str, actual: usize| {
            if actual == expected {
                Ok(())
            } else {
                Err(DataError::ColumnLengthMismatch {
                    column,
                    actual,
                    expected,
                })
            }
        };
        check("bullish", self.bullish.len())?;
        check("bearish", self.bearish.len())?;
        check("composite", self.composite.len())?;
        check("atr", self.atr.len())?;
        if let Some(mama) = &self.mama {
            check("mama", mama.len())?;
        }
        if let Some(fama) = &self.fama {
            check("fama", fama.len())?;
        }
        for (i, &v) in self.composite.iter().enumerate() {
            if !(-1..=1).contains(&v) {
                return Err(DataError::InvalidCompositeValue { index: i, value: v });
            }
        }
        Ok(())
    }

    /// True when both adaptive MA columns are present.
    pub fn has_cross_series(&self) -> bool {
        self.mama.is_some() && self.fama.is_some()
    }

    /// Per-bar snapshot. Panics on out-of-range index; the runner validates
    /// lengths up front, so indices are always in range inside the loop.
    pub fn snapshot(&self, i: usize) -> IndicatorSnapshot {
        IndicatorSnapshot {
            bullish: self.bullish[i],
            bearish: self.bearish[i],
            composite: self.composite[i],
            atr: self.atr[i],
            mama: self.mama.as_ref().map(|m| m[i]),
            fama: self.fama.as_ref().map(|f| f[i]),
        }
    }
}
