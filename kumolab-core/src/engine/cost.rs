//! Execution cost model — fees and slippage in basis points.
//!
//! Pure per-leg function; never touches simulator state. For non-negative
//! parameters the net PnL can only lose to the gross PnL.

use crate::config::BacktestConfig;

/// Combined fee + slippage cost model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    pub fees_bps: f64,
    pub slippage_bps: f64,
}

impl CostModel {
    pub fn new(fees_bps: f64, slippage_bps: f64) -> Self {
        Self {
            fees_bps,
            slippage_bps,
        }
    }

    pub fn frictionless() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn from_config(config: &BacktestConfig) -> Self {
        Self::new(config.fees_bps, config.slippage_bps)
    }

    /// Round-trip cost for one leg:
    /// `(fees_bps + slippage_bps) / 10_000 * (|entry| + |exit|) * quantity`.
    pub fn cost(&self, entry_price: f64, exit_price: f64, quantity: f64) -> f64 {
        (self.fees_bps + self.slippage_bps) / 10_000.0
            * (entry_price.abs() + exit_price.abs())
            * quantity
    }

    /// Net PnL after costs.
    pub fn net_pnl(&self, gross_pnl: f64, entry_price: f64, exit_price: f64, quantity: f64) -> f64 {
        gross_pnl - self.cost(entry_price, exit_price, quantity)
    }
}
