//! Run orchestration — validate, signal pass, simulation pass, equity fold.
//!
//! `run_backtest` is a pure function of its inputs: single-threaded, no
//! suspension points, no I/O. Two invocations with identical inputs produce
//! bit-identical results.

use thiserror::Error;

use crate::config::{BacktestConfig, ConfigError, StrategyConfig};
use crate::domain::{validate_bars, Bar, DataError, IndicatorFeed, SignalRecord, Trade};
use crate::fingerprint::RunFingerprint;
use crate::signal::SignalStateMachine;

use super::equity::equity_curve;
use super::simulator::simulate;
use super::trace::RunTrace;

/// Fatal pre-run failures. Anything recoverable (degenerate ATR, neutral
/// composite) is absorbed inside the passes as a no-signal bar.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BacktestError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] DataError),
}

/// Result of a complete backtest run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Per-bar signal stream, 1:1 with the input bars.
    pub signals: Vec<SignalRecord>,
    /// Closed-leg trade ledger, in exit order.
    pub trades: Vec<Trade>,
    /// Equity at each bar, 1:1 with the input bars.
    pub equity_curve: Vec<f64>,
    pub final_equity: f64,
    pub bar_count: usize,
    /// Present only when `BacktestConfig.capture_trace` was set.
    pub trace: Option<RunTrace>,
    pub fingerprint: RunFingerprint,
}

/// Run a full backtest over one bar series and its indicator feed.
pub fn run_backtest(
    bars: &[Bar],
    feed: &IndicatorFeed,
    strategy: &StrategyConfig,
    backtest: &BacktestConfig,
) -> Result<RunResult, BacktestError> {
    strategy.validate()?;
    backtest.validate()?;
    validate_bars(bars)?;
    feed.validate(bars.len())?;
    if strategy.use_secondary_filter && !feed.has_cross_series() {
        return Err(DataError::MissingColumn { column: "mama/fama" }.into());
    }

    let pass = SignalStateMachine::new(bars, feed, strategy).run(backtest.capture_trace);
    let sim = simulate(bars, &pass.records, strategy, backtest);
    let curve = equity_curve(&sim.trades, bars.len(), backtest.initial_capital);
    let final_equity = curve.last().copied().unwrap_or(backtest.initial_capital);

    let trace = match (pass.trace, sim.trace) {
        (Some(signal_rows), Some(position_rows)) => {
            Some(RunTrace::assemble(signal_rows, position_rows))
        }
        _ => None,
    };

    Ok(RunResult {
        signals: pass.records,
        trades: sim.trades,
        equity_curve: curve,
        final_equity,
        bar_count: bars.len(),
        trace,
        fingerprint: RunFingerprint::new(strategy, backtest, bars),
    })
}
