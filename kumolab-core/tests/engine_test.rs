//! End-to-end fixtures for the full run: tie-break policies, target
//! cascades, short mirrors, sizing modes, reversal handling, and costs.

use chrono::{NaiveDate, NaiveDateTime};
use kumolab_core::config::LegSpec;
use kumolab_core::engine::run_backtest;
use kumolab_core::{
    BacktestConfig, Bar, Direction, ExitReason, IndicatorFeed, IntrabarOrder, SizingMode,
    StrategyConfig,
};

fn ts(i: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + chrono::Duration::hours(i as i64)
}

/// Bars from (high, low, close) triplets, open = close.
fn make_bars(rows: &[(f64, f64, f64)]) -> Vec<Bar> {
    rows.iter()
        .enumerate()
        .map(|(i, &(high, low, close))| Bar {
            timestamp: ts(i),
            open: close,
            high,
            low,
            close,
            volume: 1_000.0,
        })
        .collect()
}

fn quiet_feed(n: usize) -> IndicatorFeed {
    IndicatorFeed {
        bullish: vec![false; n],
        bearish: vec![false; n],
        composite: vec![0; n],
        atr: vec![10.0; n],
        mama: None,
        fama: None,
    }
}

/// Ladder at 1x/2x/4x ATR: with ATR 10 and entry 100 this prices the
/// canonical fixture (sl 90, targets 110/120/140).
fn fixture_strategy() -> StrategyConfig {
    StrategyConfig {
        sl_mult: 1.0,
        legs: vec![
            LegSpec {
                size: 0.5,
                target_mult: 1.0,
            },
            LegSpec {
                size: 0.3,
                target_mult: 2.0,
            },
            LegSpec {
                size: 0.2,
                target_mult: 4.0,
            },
        ],
        ..Default::default()
    }
}

fn long_at_bar(feed: &mut IndicatorFeed, i: usize) {
    feed.bullish[i] = true;
    feed.composite[i] = 1;
}

fn short_at_bar(feed: &mut IndicatorFeed, i: usize) {
    feed.bearish[i] = true;
    feed.composite[i] = -1;
}

// ──────────────────────────────────────────────
// Intrabar tie-break
// ──────────────────────────────────────────────

#[test]
fn tiebreak_stop_first_wins_on_ambiguous_bar() {
    // Long entry 100, sl 90, tp1 110; next bar spans 89..111.
    let bars = make_bars(&[
        (101.0, 99.0, 100.0),
        (101.0, 99.0, 100.0),
        (111.0, 89.0, 95.0),
        (96.0, 94.0, 95.0),
    ]);
    let mut feed = quiet_feed(4);
    long_at_bar(&mut feed, 1);

    let backtest = BacktestConfig {
        intrabar_order: IntrabarOrder::StopFirst,
        ..Default::default()
    };
    let result = run_backtest(&bars, &feed, &fixture_strategy(), &backtest).unwrap();

    assert_eq!(result.trades.len(), 3);
    for trade in &result.trades {
        assert_eq!(trade.exit_reason, ExitReason::Stop);
        assert_eq!(trade.exit_price, 90.0);
        assert_eq!(trade.exit_bar, 2);
    }
    // 50/30/20 units, 10 points against: -1000 total.
    assert_eq!(result.equity_curve, vec![10_000.0, 10_000.0, 9_000.0, 9_000.0]);
}

#[test]
fn tiebreak_tp_first_fills_target_on_ambiguous_bar() {
    let bars = make_bars(&[
        (101.0, 99.0, 100.0),
        (101.0, 99.0, 100.0),
        (111.0, 89.0, 95.0),
        (96.0, 94.0, 95.0),
    ]);
    let mut feed = quiet_feed(4);
    long_at_bar(&mut feed, 1);

    let backtest = BacktestConfig {
        intrabar_order: IntrabarOrder::TpFirst,
        ..Default::default()
    };
    let result = run_backtest(&bars, &feed, &fixture_strategy(), &backtest).unwrap();

    assert_eq!(result.trades[0].exit_reason, ExitReason::Tp1);
    assert_eq!(result.trades[0].exit_price, 110.0);
    // The start-of-bar stop still takes out the two farther legs.
    assert_eq!(result.trades[1].exit_reason, ExitReason::Stop);
    assert_eq!(result.trades[2].exit_reason, ExitReason::Stop);
    // +500 (tp1) - 300 - 200 (stops) = 0.
    assert_eq!(result.final_equity, 10_000.0);
}

// ──────────────────────────────────────────────
// Cascade
// ──────────────────────────────────────────────

#[test]
fn cascade_fills_two_targets_then_trails_to_tp1() {
    // Bar 2 spans 99..125: tp1 (110) and tp2 (120) both fill, nearest first.
    // Leg 3's stop trails to tp1 and is hit at 110 on bar 3, not bar 2.
    let bars = make_bars(&[
        (101.0, 99.0, 100.0),
        (101.0, 99.0, 100.0),
        (125.0, 99.0, 120.0),
        (112.0, 109.0, 110.0),
    ]);
    let mut feed = quiet_feed(4);
    long_at_bar(&mut feed, 1);

    let backtest = BacktestConfig {
        intrabar_order: IntrabarOrder::TpFirst,
        capture_trace: true,
        ..Default::default()
    };
    let result = run_backtest(&bars, &feed, &fixture_strategy(), &backtest).unwrap();

    assert_eq!(result.trades.len(), 3);
    let (tp1, tp2, tail) = (&result.trades[0], &result.trades[1], &result.trades[2]);
    assert_eq!(tp1.exit_reason, ExitReason::Tp1);
    assert_eq!(tp1.exit_bar, 2);
    assert_eq!(tp2.exit_reason, ExitReason::Tp2);
    assert_eq!(tp2.exit_bar, 2);
    assert_eq!(tail.exit_reason, ExitReason::Stop);
    assert_eq!(tail.exit_price, 110.0);
    assert_eq!(tail.exit_bar, 3, "trailed stop is next-bar effective");

    // Trace shows one surviving leg with the trailed stop after bar 2.
    let trace = result.trace.unwrap();
    assert_eq!(trace.rows[2].open_legs, 1);
    assert_eq!(trace.rows[2].stop, Some(110.0));
    assert_eq!(trace.rows[3].open_legs, 0);

    // +500 (tp1) + 600 (tp2) + 200 (leg3 at 110) = +1300.
    assert_eq!(result.final_equity, 11_300.0);
}

// ──────────────────────────────────────────────
// Short mirror
// ──────────────────────────────────────────────

#[test]
fn short_mirror_tiebreak() {
    // Short entry 100, sl 110, tp1 90; next bar spans 89..111.
    let bars = make_bars(&[
        (101.0, 99.0, 100.0),
        (101.0, 99.0, 100.0),
        (111.0, 89.0, 105.0),
        (106.0, 104.0, 105.0),
    ]);
    let mut feed = quiet_feed(4);
    short_at_bar(&mut feed, 1);

    let stop_first = BacktestConfig {
        intrabar_order: IntrabarOrder::StopFirst,
        ..Default::default()
    };
    let result = run_backtest(&bars, &feed, &fixture_strategy(), &stop_first).unwrap();
    assert!(result
        .trades
        .iter()
        .all(|t| t.exit_reason == ExitReason::Stop && t.exit_price == 110.0));

    let tp_first = BacktestConfig {
        intrabar_order: IntrabarOrder::TpFirst,
        ..Default::default()
    };
    let result = run_backtest(&bars, &feed, &fixture_strategy(), &tp_first).unwrap();
    assert_eq!(result.trades[0].exit_reason, ExitReason::Tp1);
    assert_eq!(result.trades[0].exit_price, 90.0);
    assert_eq!(result.trades[0].direction, Direction::Short);
    assert!(result.trades[0].gross_pnl > 0.0);
}

#[test]
fn short_cascade_mirrors_long() {
    // Short entry 100: tp1 90, tp2 80. Bar spans 75..101: both fill, leg 3's
    // stop trails to tp1 (90) and is hit next bar.
    let bars = make_bars(&[
        (101.0, 99.0, 100.0),
        (101.0, 99.0, 100.0),
        (101.0, 75.0, 80.0),
        (91.0, 88.0, 90.0),
    ]);
    let mut feed = quiet_feed(4);
    short_at_bar(&mut feed, 1);

    let backtest = BacktestConfig {
        intrabar_order: IntrabarOrder::TpFirst,
        ..Default::default()
    };
    let result = run_backtest(&bars, &feed, &fixture_strategy(), &backtest).unwrap();

    assert_eq!(result.trades.len(), 3);
    assert_eq!(result.trades[0].exit_reason, ExitReason::Tp1);
    assert_eq!(result.trades[1].exit_reason, ExitReason::Tp2);
    assert_eq!(result.trades[2].exit_reason, ExitReason::Stop);
    assert_eq!(result.trades[2].exit_price, 90.0);
    assert_eq!(result.trades[2].exit_bar, 3);
}

// ──────────────────────────────────────────────
// Sizing modes
// ──────────────────────────────────────────────

fn single_leg_strategy() -> StrategyConfig {
    StrategyConfig {
        sl_mult: 1.0,
        legs: vec![LegSpec {
            size: 1.0,
            target_mult: 1.0,
        }],
        ..Default::default()
    }
}

fn two_trade_tape() -> (Vec<Bar>, IndicatorFeed) {
    // Long at 100 -> tp at 110 on bar 2; short at 100 -> tp at 90 on bar 4.
    let bars = make_bars(&[
        (101.0, 99.0, 100.0),
        (101.0, 99.0, 100.0),
        (111.0, 99.0, 110.0),
        (101.0, 99.0, 100.0),
        (101.0, 89.0, 90.0),
    ]);
    let mut feed = quiet_feed(5);
    long_at_bar(&mut feed, 1);
    short_at_bar(&mut feed, 3);
    (bars, feed)
}

#[test]
fn equity_sizing_compounds_realized_pnl() {
    let (bars, feed) = two_trade_tape();
    let backtest = BacktestConfig {
        sizing_mode: SizingMode::Equity,
        ..Default::default()
    };
    let result = run_backtest(&bars, &feed, &single_leg_strategy(), &backtest).unwrap();

    assert_eq!(result.trades.len(), 2);
    // First trade: 10_000 notional, +10% = +1_000 net.
    assert_eq!(result.trades[0].notional, 10_000.0);
    assert!((result.trades[0].net_pnl - 1_000.0).abs() < 1e-9);
    // Second trade sized off initial capital + realized net.
    assert_eq!(result.trades[1].notional, 11_000.0);
    assert!((result.trades[1].quantity - 110.0).abs() < 1e-9);
}

#[test]
fn fixed_sizing_ignores_realized_pnl() {
    let (bars, feed) = two_trade_tape();
    let backtest = BacktestConfig {
        sizing_mode: SizingMode::Fixed,
        ..Default::default()
    };
    let result = run_backtest(&bars, &feed, &single_leg_strategy(), &backtest).unwrap();
    assert_eq!(result.trades[1].notional, 10_000.0);
}

// ──────────────────────────────────────────────
// Reversal
// ──────────────────────────────────────────────

#[test]
fn reversal_closes_remaining_legs_at_close() {
    // Long opens at 100 on bar 1; nothing fills on bar 2; a short signal on
    // bar 3 (close 95) force-closes all three legs at 95 and opens the short.
    let bars = make_bars(&[
        (101.0, 99.0, 100.0),
        (101.0, 99.0, 100.0),
        (101.0, 99.0, 100.0),
        (96.0, 94.0, 95.0),
        (96.0, 94.0, 95.0),
    ]);
    let mut feed = quiet_feed(5);
    long_at_bar(&mut feed, 1);
    short_at_bar(&mut feed, 3);

    let backtest = BacktestConfig {
        capture_trace: true,
        ..Default::default()
    };
    let result = run_backtest(&bars, &feed, &fixture_strategy(), &backtest).unwrap();

    assert_eq!(result.signals[3].signal, -1);
    assert_eq!(result.trades.len(), 3);
    for trade in &result.trades {
        assert_eq!(trade.exit_reason, ExitReason::Reversal);
        assert_eq!(trade.exit_price, 95.0);
        assert_eq!(trade.exit_bar, 3);
        assert_eq!(trade.direction, Direction::Long);
    }
    // -5 points on 50/30/20 units = -500 total.
    assert_eq!(result.final_equity, 9_500.0);

    // The short replaces the long on the same bar.
    let trace = result.trace.unwrap();
    assert_eq!(trace.rows[3].open_legs, 3);
    assert_eq!(trace.rows[3].stop, Some(105.0)); // 95 + 1.0 x ATR 10
}

#[test]
fn same_direction_signal_ignored_while_open() {
    let bars = make_bars(&[
        (101.0, 99.0, 100.0),
        (101.0, 99.0, 100.0),
        (101.0, 99.0, 100.0),
        (101.0, 99.0, 100.0),
    ]);
    let mut feed = quiet_feed(4);
    long_at_bar(&mut feed, 1);
    // Regime stays long and composite keeps agreeing: the machine is Active
    // and must not re-fire.
    feed.composite[2] = 1;
    feed.composite[3] = 1;

    let result = run_backtest(
        &bars,
        &feed,
        &fixture_strategy(),
        &BacktestConfig::default(),
    )
    .unwrap();
    let fired: Vec<i8> = result.signals.iter().map(|s| s.signal).collect();
    assert_eq!(fired, vec![0, 1, 0, 0]);
}

// ──────────────────────────────────────────────
// Costs
// ──────────────────────────────────────────────

#[test]
fn costs_reduce_net_pnl() {
    let bars = make_bars(&[
        (101.0, 99.0, 100.0),
        (101.0, 99.0, 100.0),
        (111.0, 99.0, 110.0),
    ]);
    let mut feed = quiet_feed(3);
    long_at_bar(&mut feed, 1);

    let backtest = BacktestConfig {
        fees_bps: 5.0,
        slippage_bps: 5.0,
        ..Default::default()
    };
    let result = run_backtest(&bars, &feed, &single_leg_strategy(), &backtest).unwrap();

    let trade = &result.trades[0];
    // gross: 100 units x 10 points; cost: 10 bps of (100 + 110) x 100.
    assert!((trade.gross_pnl - 1_000.0).abs() < 1e-9);
    assert!((trade.net_pnl - (1_000.0 - 21.0)).abs() < 1e-9);
    assert!(trade.net_pnl <= trade.gross_pnl);
}

// ──────────────────────────────────────────────
// Determinism
// ──────────────────────────────────────────────

#[test]
fn repeated_runs_are_bit_identical() {
    let bars = make_bars(&[
        (101.0, 99.0, 100.0),
        (101.0, 99.0, 100.0),
        (125.0, 99.0, 120.0),
        (112.0, 109.0, 110.0),
        (111.0, 104.0, 105.0),
    ]);
    let mut feed = quiet_feed(5);
    long_at_bar(&mut feed, 1);
    let strategy = fixture_strategy();
    let backtest = BacktestConfig {
        intrabar_order: IntrabarOrder::TpFirst,
        fees_bps: 3.0,
        slippage_bps: 2.0,
        ..Default::default()
    };

    let a = run_backtest(&bars, &feed, &strategy, &backtest).unwrap();
    let b = run_backtest(&bars, &feed, &strategy, &backtest).unwrap();

    assert_eq!(a.signals, b.signals);
    assert_eq!(a.trades, b.trades);
    assert_eq!(a.equity_curve, b.equity_curve);
    assert_eq!(a.fingerprint, b.fingerprint);
}

#[test]
fn equity_curve_always_matches_bar_count() {
    let bars = make_bars(&[
        (101.0, 99.0, 100.0),
        (101.0, 99.0, 100.0),
        (111.0, 89.0, 95.0),
        (96.0, 94.0, 95.0),
        (96.0, 94.0, 95.0),
        (96.0, 94.0, 95.0),
    ]);
    let mut feed = quiet_feed(6);
    long_at_bar(&mut feed, 1);
    let result = run_backtest(
        &bars,
        &feed,
        &fixture_strategy(),
        &BacktestConfig::default(),
    )
    .unwrap();
    assert_eq!(result.equity_curve.len(), bars.len());
}
