//! Signal state machine — turns the indicator feed into a per-bar signal
//! stream.
//!
//! One pass over the bars, strictly index-forward. Per bar:
//! 1. Advance the regime flip-flop from the full bullish/bearish masks.
//! 2. Route `RegimeGained`/`RegimeLost` events through the transition table.
//! 3. If the regime side is Pending, check strict composite agreement, the
//!    secondary cross filter (with its one-bar grace), and ATR validity;
//!    fire, wait, or lock accordingly.
//!
//! The machine never inspects data past the current bar index.

use crate::config::StrategyConfig;
use crate::domain::{Bar, Direction, EntryPlan, IndicatorFeed, SignalRecord};

use super::state::{transition, ArmState, StateEvent};

/// Mutable machine state carried across bars.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MachineState {
    /// Regime flip-flop: sticky, toggles only on the opposite full mask.
    pub regime: Option<Direction>,
    pub long: ArmState,
    pub short: ArmState,
}

impl MachineState {
    pub fn initial() -> Self {
        Self {
            regime: None,
            long: ArmState::Inactive,
            short: ArmState::Inactive,
        }
    }

    pub fn get(&self, direction: Direction) -> ArmState {
        match direction {
            Direction::Long => self.long,
            Direction::Short => self.short,
        }
    }

    fn apply(&mut self, direction: Direction, event: StateEvent) {
        match direction {
            Direction::Long => self.long = transition(self.long, event),
            Direction::Short => self.short = transition(self.short, event),
        }
    }
}

/// Per-bar diagnostic row emitted when trace capture is on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalTraceRow {
    pub bar_index: usize,
    pub regime: Option<Direction>,
    pub long_state: ArmState,
    pub short_state: ArmState,
    pub composite: i8,
    pub atr: f64,
    pub signal: i8,
}

/// Output of the signal pass.
#[derive(Debug, Clone)]
pub struct SignalPass {
    pub records: Vec<SignalRecord>,
    pub trace: Option<Vec<SignalTraceRow>>,
}

/// The signal state machine. Pure and total: every valid input bar produces
/// a defined next state and exactly one `SignalRecord`.
pub struct SignalStateMachine<'a> {
    bars: &'a [Bar],
    feed: &'a IndicatorFeed,
    config: &'a StrategyConfig,
}

impl<'a> SignalStateMachine<'a> {
    pub fn new(bars: &'a [Bar], feed: &'a IndicatorFeed, config: &'a StrategyConfig) -> Self {
        Self { bars, feed, config }
    }

    /// Run the full pass. `capture_trace` additionally records per-bar state.
    pub fn run(&self, capture_trace: bool) -> SignalPass {
        let mut state = MachineState::initial();
        let mut records = Vec::with_capacity(self.bars.len());
        let mut trace = capture_trace.then(|| Vec::with_capacity(self.bars.len()));

        for i in 0..self.bars.len() {
            let record = self.step(i, &mut state);
            if let Some(rows) = trace.as_mut() {
                rows.push(SignalTraceRow {
                    bar_index: i,
                    regime: state.regime,
                    long_state: state.long,
                    short_state: state.short,
                    composite: self.feed.composite[i],
                    atr: self.feed.atr[i],
                    signal: record.signal,
                });
            }
            records.push(record);
        }

        SignalPass { records, trace }
    }

    /// Advance one bar and emit its signal record.
    fn step(&self, i: usize, state: &mut MachineState) -> SignalRecord {
        let snap = self.feed.snapshot(i);

        // Regime flip-flop: only the opposite full mask toggles it. When both
        // masks fire on one bar, hysteresis retains the current side.
        let next_regime = match (snap.bullish, snap.bearish) {
            (true, false) => Some(Direction::Long),
            (false, true) => Some(Direction::Short),
            _ => state.regime,
        };
        if next_regime != state.regime {
            if let Some(gained) = next_regime {
                state.apply(gained, StateEvent::RegimeGained);
                state.apply(gained.opposite(), StateEvent::RegimeLost);
            }
            state.regime = next_regime;
        }

        // Only the regime side may arm and fire.
        let Some(direction) = state.regime else {
            return SignalRecord::flat(i);
        };
        if state.get(direction) != ArmState::Pending {
            return SignalRecord::flat(i);
        }

        let agrees = snap.composite == direction.signal_value();
        let vetoed = snap.composite == direction.opposite().signal_value();

        if !agrees {
            // A neutral composite just waits; an opposite-sign composite
            // locks the direction out until its regime flips (when the lock
            // cycle is enabled).
            if vetoed && self.config.use_lock_cycle {
                state.apply(direction, StateEvent::Vetoed);
            }
            return SignalRecord::flat(i);
        }

        if !self.secondary_passes(direction, i) {
            return SignalRecord::flat(i);
        }

        // Degenerate ATR at a signal-eligible bar: no trade, keep waiting.
        let atr = snap.atr;
        if !atr.is_finite() || atr <= 0.0 {
            return SignalRecord::flat(i);
        }

        state.apply(direction, StateEvent::Confirmed);
        state.apply(direction.opposite(), StateEvent::OppositeFired);

        let entry = self.bars[i].close;
        let sign = direction.sign();
        let plan = EntryPlan {
            direction,
            entry_price: entry,
            sl_price: entry - sign * self.config.sl_mult * atr,
            target_prices: self
                .config
                .legs
                .iter()
                .map(|leg| entry + sign * leg.target_mult * atr)
                .collect(),
        };
        SignalRecord::entry(i, plan)
    }

    /// Secondary cross filter: directional MA agreement on the firing bar,
    /// or — with the grace toggle — a raw crossover on the immediately
    /// preceding bar.
    fn secondary_passes(&self, direction: Direction, i: usize) -> bool {
        if !self.config.use_secondary_filter {
            return true;
        }
        // Presence of the columns is validated by the runner.
        let (Some(mama), Some(fama)) = (self.feed.mama.as_deref(), self.feed.fama.as_deref())
        else {
            return false;
        };

        let level_ok = match direction {
            Direction::Long => mama[i] > fama[i],
            Direction::Short => mama[i] < fama[i],
        };
        if level_ok {
            return true;
        }

        // Grace window of exactly one bar: the raw crossover must sit at i-1.
        if self.config.allow_grace_bar && i >= 2 {
            return match direction {
                Direction::Long => mama[i - 1] > fama[i - 1] && mama[i - 2] <= fama[i - 2],
                Direction::Short => mama[i - 1] < fama[i - 1] && mama[i - 2] >= fama[i - 2],
            };
        }
        false
    }
}
