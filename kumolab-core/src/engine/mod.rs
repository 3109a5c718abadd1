//! Backtest engine — trade simulation, execution costs, equity accounting,
//! and the run orchestrator.

pub mod cost;
pub mod equity;
pub mod runner;
pub mod simulator;
pub mod trace;

pub use cost::CostModel;
pub use equity::equity_curve;
pub use runner::{run_backtest, BacktestError, RunResult};
pub use simulator::{simulate, PositionTraceRow, Simulation};
pub use trace::{RunTrace, TraceRow};
