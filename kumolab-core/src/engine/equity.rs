//! Equity aggregation — folds the closed-leg ledger back onto the bar index.

use crate::domain::Trade;

/// Build the bar-indexed equity curve: net PnL grouped by exit bar,
/// zero-filled across the full index, cumulative sum plus initial capital.
///
/// The output always has exactly `bar_count` entries; with no trades it is
/// flat at the initial capital.
pub fn equity_curve(trades: &[Trade], bar_count: usize, initial_capital: f64) -> Vec<f64> {
    let mut pnl_by_bar = vec![0.0_f64; bar_count];
    for trade in trades {
        pnl_by_bar[trade.exit_bar] += trade.net_pnl;
    }

    let mut curve = Vec::with_capacity(bar_count);
    let mut equity = initial_capital;
    for pnl in pnl_by_bar {
        equity += pnl;
        curve.push(equity);
    }
    curve
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, ExitReason};
    use chrono::NaiveDate;

    fn trade(exit_bar: usize, net_pnl: f64) -> Trade {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Trade {
            entry_bar: 0,
            entry_time: ts,
            entry_price: 100.0,
            exit_bar,
            exit_time: ts + chrono::Duration::hours(exit_bar as i64),
            exit_price: 110.0,
            exit_reason: ExitReason::Tp1,
            direction: Direction::Long,
            quantity: 10.0,
            notional: 1_000.0,
            gross_pnl: net_pnl,
            net_pnl,
        }
    }

    #[test]
    fn no_trades_flat_at_capital() {
        let curve = equity_curve(&[], 5, 10_000.0);
        assert_eq!(curve, vec![10_000.0; 5]);
    }

    #[test]
    fn pnl_lands_on_exit_bar_and_accumulates() {
        let trades = vec![trade(2, 100.0), trade(4, -50.0)];
        let curve = equity_curve(&trades, 6, 10_000.0);
        assert_eq!(
            curve,
            vec![10_000.0, 10_000.0, 10_100.0, 10_100.0, 10_050.0, 10_050.0]
        );
    }

    #[test]
    fn same_bar_exits_sum() {
        let trades = vec![trade(3, 100.0), trade(3, 200.0)];
        let curve = equity_curve(&trades, 4, 1_000.0);
        assert_eq!(curve[3], 1_300.0);
    }

    #[test]
    fn curve_length_matches_bar_count() {
        for n in [1, 7, 100] {
            assert_eq!(equity_curve(&[], n, 1.0).len(), n);
        }
    }
}
