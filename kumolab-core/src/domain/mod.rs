//! Domain types for the backtest core.

pub mod bar;
pub mod feed;
pub mod position;
pub mod signal;
pub mod trade;

pub use bar::{validate_bars, Bar, DataError};
pub use feed::{IndicatorFeed, IndicatorSnapshot};
pub use position::{Leg, OpenPosition};
pub use signal::{Direction, EntryPlan, SignalRecord};
pub use trade::{ExitReason, Trade};
