//! Open position and its partial-exit legs.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::signal::{Direction, EntryPlan};

/// One still-open partial exit of a position.
///
/// `index` is the leg's place in the original ladder (0 = tp1) and survives
/// earlier legs closing, so exit reasons stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    pub index: usize,
    /// Fraction of the position notional allocated to this leg.
    pub size: f64,
    /// Absolute target price.
    pub target: f64,
}

/// The single open position the simulator advances bar-by-bar.
///
/// `stop` is shared by all remaining legs and only ever ratchets toward
/// profit. `risk` freezes the initial entry-to-stop distance at entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub direction: Direction,
    pub entry_bar: usize,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,
    /// Full position notional at entry (all legs combined).
    pub notional: f64,
    /// Current protective stop, possibly trailed.
    pub stop: f64,
    /// Initial stop distance, |entry - original stop|.
    pub risk: f64,
    /// Full target ladder as priced at entry, indexed by ladder position.
    /// Survives legs closing so trail rules can reference earlier levels.
    pub ladder: Vec<f64>,
    /// Remaining open legs, ordered nearest target first.
    pub legs: Vec<Leg>,
}

impl OpenPosition {
    /// Open a position from an entry plan and the configured leg sizes.
    ///
    /// `sizes` must align 1:1 with `plan.target_prices` (config validation
    /// guarantees this before simulation starts).
    pub fn open(
        plan: &EntryPlan,
        sizes: &[f64],
        notional: f64,
        entry_bar: usize,
        entry_time: NaiveDateTime,
    ) -> Self {
        let legs = sizes
            .iter()
            .zip(&plan.target_prices)
            .enumerate()
            .map(|(index, (&size, &target))| Leg {
                index,
                size,
                target,
            })
            .collect();
        Self {
            direction: plan.direction,
            entry_bar,
            entry_time,
            entry_price: plan.entry_price,
            notional,
            stop: plan.sl_price,
            risk: plan.risk(),
            ladder: plan.target_prices.clone(),
            legs,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.legs.is_empty()
    }

    /// Move the stop toward profit, never backward (ratchet invariant).
    ///
    /// Returns true if the stop actually moved.
    pub fn ratchet_stop(&mut self, candidate: f64) -> bool {
        let improved = match self.direction {
            Direction::Long => candidate > self.stop,
            Direction::Short => candidate < self.stop,
        };
        if improved {
            self.stop = candidate;
        }
        improved
    }

    /// Quantity for one leg: size fraction of notional at the entry price.
    pub fn leg_quantity(&self, leg: &Leg) -> f64 {
        leg.size * self.notional / self.entry_price
    }
}
