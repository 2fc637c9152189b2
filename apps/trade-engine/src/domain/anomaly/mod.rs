//! Anomaly Detection Bounded Context
//!
//! Advisory scans of completed transaction history for velocity bursts,
//! outsized trades and rapid buy/sell oscillation.

mod detector;
mod flag;

pub use detector::{AnomalyConfig, AnomalyDetector};
pub use flag::{Flag, FlagKind};
