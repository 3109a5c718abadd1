//! Strategy and backtest configuration, with fail-fast validation.
//!
//! Configuration errors are fatal and raised before any simulation step —
//! a run is either fully configured or it does not start.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How position notional is determined at entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizingMode {
    /// Notional is the initial capital, every trade.
    Fixed,
    /// Notional is initial capital plus realized net PnL at entry.
    Equity,
}

/// Deterministic resolution order when a bar breaches both a target and the
/// stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntrabarOrder {
    /// A breached stop closes every remaining leg before targets are looked at.
    StopFirst,
    /// Targets resolve first (nearest to farthest), then the start-of-bar stop.
    TpFirst,
}

/// Where the protective stop moves after a target fills.
///
/// Effective the bar after the fill, never the fill bar itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrailRule {
    /// Entry after tp1; target k-1 after target k. The default ladder step.
    PreviousLevel,
    /// Always to the entry price.
    Breakeven,
    /// To the just-filled target price.
    FilledLevel,
}

/// Static configuration of one partial-exit leg.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegSpec {
    /// Fraction of position notional in (0, 1].
    pub size: f64,
    /// Target distance in ATR multiples from entry.
    pub target_mult: f64,
}

/// Signal-side configuration: toggles, stop/target multiples, leg ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Stop distance in ATR multiples.
    pub sl_mult: f64,
    /// Partial-exit ladder, nearest target first. At most three legs.
    pub legs: Vec<LegSpec>,
    /// Require directional MA agreement (mama vs fama) on the firing bar.
    pub use_secondary_filter: bool,
    /// One-bar grace: a raw crossover on the preceding bar still lets the
    /// signal fire when the level check fails on the firing bar.
    pub allow_grace_bar: bool,
    /// Lock a direction out after a composite veto until its regime flips.
    pub use_lock_cycle: bool,
    pub trail_rule: TrailRule,
    /// ATR lookback used by the external indicator stage; carried here so it
    /// participates in the run fingerprint.
    pub atr_length: usize,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            sl_mult: 1.0,
            legs: vec![
                LegSpec {
                    size: 0.5,
                    target_mult: 2.0,
                },
                LegSpec {
                    size: 0.3,
                    target_mult: 6.0,
                },
                LegSpec {
                    size: 0.2,
                    target_mult: 10.0,
                },
            ],
            use_secondary_filter: false,
            allow_grace_bar: true,
            use_lock_cycle: true,
            trail_rule: TrailRule::PreviousLevel,
            atr_length: 14,
        }
    }
}

impl StrategyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sl_mult <= 0.0 || !self.sl_mult.is_finite() {
            return Err(ConfigError::NonPositiveStopMult(self.sl_mult));
        }
        if self.atr_length == 0 {
            return Err(ConfigError::ZeroAtrLength);
        }
        if self.legs.is_empty() {
            return Err(ConfigError::NoLegs);
        }
        if self.legs.len() > 3 {
            return Err(ConfigError::TooManyLegs {
                count: self.legs.len(),
            });
        }
        let mut total = 0.0;
        for (index, leg) in self.legs.iter().enumerate() {
            if !(leg.size > 0.0 && leg.size <= 1.0) {
                return Err(ConfigError::LegSizeOutOfRange {
                    index,
                    size: leg.size,
                });
            }
            if leg.target_mult <= 0.0 || !leg.target_mult.is_finite() {
                return Err(ConfigError::NonPositiveTargetMult {
                    index,
                    value: leg.target_mult,
                });
            }
            if index > 0 && leg.target_mult <= self.legs[index - 1].target_mult {
                return Err(ConfigError::TargetsNotIncreasing { index });
            }
            total += leg.size;
        }
        if total > 1.0 + 1e-9 {
            return Err(ConfigError::LegSizesExceedNotional { total });
        }
        Ok(())
    }

    pub fn leg_sizes(&self) -> Vec<f64> {
        self.legs.iter().map(|l| l.size).collect()
    }
}

/// Run-side configuration: capital, costs, sizing, tie-break, trace capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub fees_bps: f64,
    pub slippage_bps: f64,
    pub sizing_mode: SizingMode,
    pub intrabar_order: IntrabarOrder,
    /// Capture a per-bar structured trace in the run result.
    pub capture_trace: bool,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            fees_bps: 0.0,
            slippage_bps: 0.0,
            sizing_mode: SizingMode::Fixed,
            intrabar_order: IntrabarOrder::StopFirst,
            capture_trace: false,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_capital <= 0.0 || !self.initial_capital.is_finite() {
            return Err(ConfigError::NonPositiveCapital(self.initial_capital));
        }
        if self.fees_bps < 0.0 || !self.fees_bps.is_finite() {
            return Err(ConfigError::NegativeCost {
                field: "fees_bps",
                value: self.fees_bps,
            });
        }
        if self.slippage_bps < 0.0 || !self.slippage_bps.is_finite() {
            return Err(ConfigError::NegativeCost {
                field: "slippage_bps",
                value: self.slippage_bps,
            });
        }
        Ok(())
    }
}

/// Fatal configuration problems, raised before simulation starts.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("leg {index} size {size} outside (0, 1]")]
    LegSizeOutOfRange { index: usize, size: f64 },

    #[error("leg sizes sum to {total}, exceeding the position notional")]
    LegSizesExceedNotional { total: f64 },

    #[error("at least one leg is required")]
    NoLegs,

    #[error("{count} legs configured, ladder is capped at three")]
    TooManyLegs { count: usize },

    #[error("leg {index} target multiple {value} must be positive")]
    NonPositiveTargetMult { index: usize, value: f64 },

    #[error("leg {index} target multiple must exceed the previous leg's")]
    TargetsNotIncreasing { index: usize },

    #[error("stop multiple {0} must be positive")]
    NonPositiveStopMult(f64),

    #[error("atr length must be >= 1")]
    ZeroAtrLength,

    #[error("initial capital {0} must be positive")]
    NonPositiveCapital(f64),

    #[error("{field} is {value}, costs must be non-negative")]
    NegativeCost { field: &'static str, value: f64 },
}
