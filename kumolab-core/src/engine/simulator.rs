//! Trade simulator — replays the signal stream against price action.
//!
//! Exactly zero or one position is open at any bar. Each bar after entry:
//!
//! 1. Resolve breached levels under the configured intrabar tie-break
//!    policy (`stop_first` or `tp_first`).
//! 2. Close legs at the exact breached level, costs applied per leg.
//! 3. Trail the protective stop for surviving legs, effective next bar.
//!
//! Then handle the bar's signal: same-direction signals are ignored while
//! open; an opposite-direction signal force-closes the remainder at the
//! signal bar's close and opens the new side on the same bar.

use crate::config::{BacktestConfig, IntrabarOrder, SizingMode, StrategyConfig, TrailRule};
use crate::domain::{Bar, Direction, ExitReason, Leg, OpenPosition, SignalRecord, Trade};

use super::cost::CostModel;

/// Per-bar diagnostic row for the position side of the trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionTraceRow {
    pub bar_index: usize,
    /// Remaining open legs after this bar (0 = flat).
    pub open_legs: usize,
    /// Current protective stop, when a position is open.
    pub stop: Option<f64>,
}

/// Output of the simulation pass.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub trades: Vec<Trade>,
    pub trace: Option<Vec<PositionTraceRow>>,
}

/// Replay the signal stream bar-by-bar.
///
/// Preconditions (enforced by the runner): configs validated, and
/// `signals.len() == bars.len()`.
pub fn simulate(
    bars: &[Bar],
    signals: &[SignalRecord],
    strategy: &StrategyConfig,
    backtest: &BacktestConfig,
) -> Simulation {
    debug_assert_eq!(bars.len(), signals.len());

    let cost = CostModel::from_config(backtest);
    let sizes = strategy.leg_sizes();
    let mut position: Option<OpenPosition> = None;
    let mut realized_net = 0.0;
    let mut trades: Vec<Trade> = Vec::new();
    let mut trace = backtest
        .capture_trace
        .then(|| Vec::with_capacity(bars.len()));

    for (i, bar) in bars.iter().enumerate() {
        // Advance the open position, but never on its own entry bar.
        let mut fully_closed = false;
        if let Some(pos) = position.as_mut() {
            if i > pos.entry_bar {
                let closed = advance_bar(
                    pos,
                    bar,
                    i,
                    backtest.intrabar_order,
                    strategy.trail_rule,
                    &cost,
                );
                for trade in closed {
                    realized_net += trade.net_pnl;
                    trades.push(trade);
                }
                fully_closed = pos.is_closed();
            }
        }
        if fully_closed {
            position = None;
        }

        // Handle this bar's signal.
        if let Some(plan) = signals[i].plan.as_ref() {
            let open_direction = position.as_ref().map(|p| p.direction);
            match open_direction {
                // Same direction already open: suppressed.
                Some(d) if d == plan.direction => {}
                // Opposite side open: force-close the remainder at the new
                // signal bar's close (which is the new entry price).
                Some(_) => {
                    let mut old = position.take().expect("open position checked above");
                    let closed = close_remaining(
                        &mut old,
                        plan.entry_price,
                        i,
                        bar,
                        ExitReason::Reversal,
                        &cost,
                    );
                    for trade in closed {
                        realized_net += trade.net_pnl;
                        trades.push(trade);
                    }
                    let notional = entry_notional(backtest, realized_net);
                    position = Some(OpenPosition::open(plan, &sizes, notional, i, bar.timestamp));
                }
                None => {
                    let notional = entry_notional(backtest, realized_net);
                    position = Some(OpenPosition::open(plan, &sizes, notional, i, bar.timestamp));
                }
            }
        }

        if let Some(rows) = trace.as_mut() {
            rows.push(PositionTraceRow {
                bar_index: i,
                open_legs: position.as_ref().map_or(0, |p| p.legs.len()),
                stop: position.as_ref().map(|p| p.stop),
            });
        }
    }

    Simulation { trades, trace }
}

/// Position notional at entry under the configured sizing mode.
fn entry_notional(backtest: &BacktestConfig, realized_net: f64) -> f64 {
    match backtest.sizing_mode {
        SizingMode::Fixed => backtest.initial_capital,
        SizingMode::Equity => backtest.initial_capital + realized_net,
    }
}

/// Resolve one bar against the open position. Returns the legs closed on
/// this bar; the position's leg set and stop are updated in place.
fn advance_bar(
    pos: &mut OpenPosition,
    bar: &Bar,
    bar_index: usize,
    order: IntrabarOrder,
    trail_rule: TrailRule,
    cost: &CostModel,
) -> Vec<Trade> {
    // The stop in force for this whole bar is the start-of-bar stop; a trail
    // triggered by a fill on this bar only takes effect on the next one.
    let stop_at_open = pos.stop;
    let stop_breached = match pos.direction {
        Direction::Long => bar.low <= stop_at_open,
        Direction::Short => bar.high >= stop_at_open,
    };

    if order == IntrabarOrder::StopFirst && stop_breached {
        return close_remaining(pos, stop_at_open, bar_index, bar, ExitReason::Stop, cost);
    }

    // Targets resolve nearest to farthest; legs are kept in ladder order, so
    // a wide bar cascades through them in sequence.
    let mut out = Vec::new();
    let mut farthest_fill: Option<usize> = None;
    let legs = std::mem::take(&mut pos.legs);
    let mut remaining = Vec::with_capacity(legs.len());
    for leg in legs {
        let target_reached = match pos.direction {
            Direction::Long => bar.high >= leg.target,
            Direction::Short => bar.low <= leg.target,
        };
        if target_reached {
            out.push(close_leg(
                pos,
                &leg,
                leg.target,
                bar_index,
                bar,
                ExitReason::take_profit(leg.index),
                cost,
            ));
            farthest_fill = Some(leg.index);
        } else {
            remaining.push(leg);
        }
    }
    pos.legs = remaining;

    // Under tp_first the start-of-bar stop still applies to whatever the
    // targets left behind.
    if order == IntrabarOrder::TpFirst && stop_breached && !pos.legs.is_empty() {
        out.extend(close_remaining(
            pos,
            stop_at_open,
            bar_index,
            bar,
            ExitReason::Stop,
            cost,
        ));
        return out;
    }

    // Trail after fills, ratcheted, effective from the next bar.
    if let Some(filled_index) = farthest_fill {
        if !pos.legs.is_empty() {
            pos.ratchet_stop(trail_destination(pos, filled_index, trail_rule));
        }
    }

    out
}

/// Stop destination after the ladder leg `filled_index` filled.
fn trail_destination(pos: &OpenPosition, filled_index: usize, rule: TrailRule) -> f64 {
    match rule {
        TrailRule::Breakeven => pos.entry_price,
        TrailRule::FilledLevel => pos.ladder[filled_index],
        TrailRule::PreviousLevel => {
            if filled_index == 0 {
                pos.entry_price
            } else {
                pos.ladder[filled_index - 1]
            }
        }
    }
}

/// Close every remaining leg at one price.
fn close_remaining(
    pos: &mut OpenPosition,
    price: f64,
    bar_index: usize,
    bar: &Bar,
    reason: ExitReason,
    cost: &CostModel,
) -> Vec<Trade> {
    let legs = std::mem::take(&mut pos.legs);
    legs.iter()
        .map(|leg| close_leg(pos, leg, price, bar_index, bar, reason, cost))
        .collect()
}

/// Build the ledger row for one closed leg.
fn close_leg(
    pos: &OpenPosition,
    leg: &Leg,
    exit_price: f64,
    exit_bar: usize,
    bar: &Bar,
    exit_reason: ExitReason,
    cost: &CostModel,
) -> Trade {
    let quantity = pos.leg_quantity(leg);
    let gross_pnl = pos.direction.sign() * (exit_price - pos.entry_price) * quantity;
    let net_pnl = cost.net_pnl(gross_pnl, pos.entry_price, exit_price, quantity);
    Trade {
        entry_bar: pos.entry_bar,
        entry_time: pos.entry_time,
        entry_price: pos.entry_price,
        exit_bar,
        exit_time: bar.timestamp,
        exit_price,
        exit_reason,
        direction: pos.direction,
        quantity,
        notional: leg.size * pos.notional,
        gross_pnl,
        net_pnl,
    }
}
