//! Structured run trace — the optional diagnostic side channel.
//!
//! The trace is an in-memory object assembled from the signal and
//! simulation passes, captured only when `BacktestConfig.capture_trace` is
//! set, and returned on the run result. The core never performs I/O;
//! persisting or rendering the rows is the caller's business.

use serde::{Deserialize, Serialize};

use crate::domain::Direction;
use crate::signal::{ArmState, SignalTraceRow};

use super::simulator::PositionTraceRow;

/// One fully-joined diagnostic row per bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceRow {
    pub bar_index: usize,
    pub regime: Option<Direction>,
    pub long_state: ArmState,
    pub short_state: ArmState,
    pub composite: i8,
    pub atr: f64,
    pub signal: i8,
    pub open_legs: usize,
    pub stop: Option<f64>,
}

/// Per-bar trace of a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunTrace {
    pub rows: Vec<TraceRow>,
}

impl RunTrace {
    /// Zip the two pass traces into joined rows. Both passes emit exactly
    /// one row per bar, in order.
    pub fn assemble(signal_rows: Vec<SignalTraceRow>, position_rows: Vec<PositionTraceRow>) -> Self {
        debug_assert_eq!(signal_rows.len(), position_rows.len());
        let rows = signal_rows
            .into_iter()
            .zip(position_rows)
            .map(|(sig, pos)| TraceRow {
                bar_index: sig.bar_index,
                regime: sig.regime,
                long_state: sig.long_state,
                short_state: sig.short_state,
                composite: sig.composite,
                atr: sig.atr,
                signal: sig.signal,
                open_legs: pos.open_legs,
                stop: pos.stop,
            })
            .collect();
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
