//! Bar — the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLCV bar for a single asset at a single timestamp.
///
/// Timestamps must be unique and strictly increasing across a series; the
/// engine rejects anything else before simulation starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Returns true if any price field is NaN.
    pub fn has_nan(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLCV sanity check: high bounds the range, prices positive,
    /// volume non-negative.
    pub fn is_sane(&self) -> bool {
        if self.has_nan() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
            && self.volume >= 0.0
    }
}

/// Fatal input-data problems. The engine performs no simulation on invalid
/// input (there is no partial replay).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DataError {
    #[error("bar series is empty")]
    EmptySeries,

    #[error("bar {index} at {timestamp} fails OHLCV sanity checks")]
    MalformedBar {
        index: usize,
        timestamp: NaiveDateTime,
    },

    #[error("timestamps not strictly increasing at bar {index} ({previous} >= {current})")]
    NonMonotonicTimestamps {
        index: usize,
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },

    #[error("indicator column '{column}' has length {actual}, expected {expected}")]
    ColumnLengthMismatch {
        column: &'static str,
        actual: usize,
        expected: usize,
    },

    #[error("composite filter value {value} at bar {index} is outside {{-1, 0, 1}}")]
    InvalidCompositeValue { index: usize, value: i8 },

    #[error("indicator column '{column}' is required by the configuration but missing")]
    MissingColumn { column: &'static str },
}

/// Validate a whole bar series: non-empty, sane bars, strictly increasing
/// timestamps.
pub fn validate_bars(bars: &[Bar]) -> Result<(), DataError> {
    if bars.is_empty() {
        return Err(DataError::EmptySeries);
    }
    for (i, bar) in bars.iter().enumerate() {
        if !bar.is_sane() {
            return Err(DataError::MalformedBar {
                index: i,
                timestamp: bar.timestamp,
            });
        }
        if i > 0 && bars[i - 1].timestamp >= bar.timestamp {
            return Err(DataError::NonMonotonicTimestamps {
                index: i,
                previous: bars[i - 1].timestamp,
                current: bar.timestamp,
            });
        }
    }
    Ok(())
}
