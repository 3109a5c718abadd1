//! Trade — an immutable closed-leg ledger row.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::signal::Direction;

/// Why a leg closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitReason {
    Tp1,
    Tp2,
    Tp3,
    Stop,
    /// Remaining legs force-closed by an opposite-direction signal.
    Reversal,
}

impl ExitReason {
    /// Map a ladder index (0-based) to its take-profit reason.
    ///
    /// Config validation caps the ladder at three legs, so the index is
    /// always in range here.
    pub fn take_profit(leg_index: usize) -> ExitReason {
        match leg_index {
            0 => ExitReason::Tp1,
            1 => ExitReason::Tp2,
            _ => ExitReason::Tp3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExitReason::Tp1 => "tp1",
            ExitReason::Tp2 => "tp2",
            ExitReason::Tp3 => "tp3",
            ExitReason::Stop => "stop",
            ExitReason::Reversal => "reversal",
        }
    }

    pub fn is_take_profit(self) -> bool {
        matches!(self, ExitReason::Tp1 | ExitReason::Tp2 | ExitReason::Tp3)
    }
}

/// A closed leg: one row of the trade ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    // ── Entry ──
    pub entry_bar: usize,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_bar: usize,
    pub exit_time: NaiveDateTime,
    pub exit_price: f64,
    pub exit_reason: ExitReason,

    // ── Size ──
    pub direction: Direction,
    pub quantity: f64,
    /// Leg notional (leg size fraction x position notional).
    pub notional: f64,

    // ── PnL ──
    pub gross_pnl: f64,
    pub net_pnl: f64,
}

impl Trade {
    pub fn bars_held(&self) -> usize {
        self.exit_bar - self.entry_bar
    }

    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }
}
