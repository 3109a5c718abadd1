//! Kumolab Core — deterministic backtest engine for a multi-leg,
//! single-position trend strategy.
//!
//! The crate contains:
//! - Domain types (bars, indicator feed, signal records, positions, trades)
//! - A per-direction signal state machine with a declared transition table
//! - A bar-by-bar trade simulator with an explicit intrabar tie-break policy
//!   and trailing protective stops
//! - A pure execution cost model and equity aggregation
//! - Run fingerprinting for the determinism contract
//!
//! Indicator computation, parameter search, data loading, and any CLI or
//! report surface live outside this crate; the engine consumes precomputed,
//! bar-aligned series and returns plain values.

pub mod config;
pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod signal;

pub use config::{BacktestConfig, ConfigError, IntrabarOrder, SizingMode, StrategyConfig, TrailRule};
pub use domain::{Bar, DataError, Direction, ExitReason, IndicatorFeed, SignalRecord, Trade};
pub use engine::{run_backtest, BacktestError, RunResult};
