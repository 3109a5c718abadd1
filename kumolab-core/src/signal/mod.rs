//! Signal generation — regime flip-flop, arming states, and the per-bar
//! state machine.

pub mod machine;
pub mod state;

pub use machine::{MachineState, SignalPass, SignalStateMachine, SignalTraceRow};
pub use state::{transition, ArmState, StateEvent};
