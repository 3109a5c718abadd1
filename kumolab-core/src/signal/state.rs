//! Per-direction arming state and its transition table.
//!
//! The reference control flow expressed arming, locking, and activity as
//! independent boolean flags mutated inside one loop. Here each direction
//! owns an explicit state, and every transition goes through `transition` —
//! a pure function over (state, event) pairs that can be tested in
//! isolation from the bar loop.

use serde::{Deserialize, Serialize};

/// Arming state of one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArmState {
    /// Regime flag not held; nothing to do.
    Inactive,
    /// Regime flag held; waiting for the composite filter to confirm.
    Pending,
    /// Composite vetoed the arming; no re-fire until the regime flips away.
    Locked,
    /// This direction fired and its position is the open one.
    Active,
}

/// Events the bar loop derives from the indicator feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateEvent {
    /// The regime flip-flop turned to this direction.
    RegimeGained,
    /// The regime flip-flop flipped away from this direction.
    RegimeLost,
    /// Composite + secondary filter agreed while Pending: the signal fires.
    Confirmed,
    /// Composite showed the opposite sign while Pending (lock cycle enabled).
    Vetoed,
    /// The opposite direction fired; any active position on this side closes.
    OppositeFired,
}

/// The declared transition table.
///
/// Unlisted pairs are self-loops: an event that does not apply to a state
/// leaves it unchanged. `Active` survives `RegimeLost` deliberately — an
/// open side stays the open side until the opposite direction actually
/// fires; regime noise alone never flattens a position.
pub fn transition(state: ArmState, event: StateEvent) -> ArmState {
    use ArmState::*;
    use StateEvent::*;
    match (state, event) {
        (Inactive, RegimeGained) => Pending,
        (Pending, RegimeLost) => Inactive,
        (Pending, Confirmed) => Active,
        (Pending, Vetoed) => Locked,
        (Locked, RegimeLost) => Inactive,
        (Active, OppositeFired) => Inactive,
        (s, _) => s,
    }
}
