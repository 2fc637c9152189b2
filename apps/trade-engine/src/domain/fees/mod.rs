//! Fees Bounded Context
//!
//! Tiered flat-plus-percentage transaction fees computed from notional.

mod errors;
mod schedule;

pub use errors::{FeeError, FeeScheduleError};
pub use schedule::{FeeSchedule, FeeTier};
