//! Signal records — per-bar output of the signal state machine.

use serde::{Deserialize, Serialize};

/// Directional intent of a signal or position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1.0 for long, -1.0 for short. Used in price and PnL arithmetic.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }

    /// Signal-column encoding: +1 long, -1 short.
    pub fn signal_value(self) -> i8 {
        match self {
            Direction::Long => 1,
            Direction::Short => -1,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }
}

/// Entry, stop, and target prices attached to a non-zero signal.
///
/// Targets are ordered nearest to farthest from entry (tp1, tp2, tp3 for the
/// default three-leg ladder).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryPlan {
    pub direction: Direction,
    pub entry_price: f64,
    pub sl_price: f64,
    pub target_prices: Vec<f64>,
}

impl EntryPlan {
    /// Initial risk distance (entry to stop). Always positive for a valid plan.
    pub fn risk(&self) -> f64 {
        (self.entry_price - self.sl_price).abs()
    }
}

/// Per-bar signal output: -1, 0, or +1, with prices only when non-zero.
///
/// A zero signal carries no plan — there are no NaN sentinel prices anywhere
/// in the stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub bar_index: usize,
    pub signal: i8,
    pub plan: Option<EntryPlan>,
}

impl SignalRecord {
    pub fn flat(bar_index: usize) -> Self {
        Self {
            bar_index,
            signal: 0,
            plan: None,
        }
    }

    pub fn entry(bar_index: usize, plan: EntryPlan) -> Self {
        Self {
            bar_index,
            signal: plan.direction.signal_value(),
            plan: Some(plan),
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        self.plan.as_ref().map(|p| p.direction)
    }
}
