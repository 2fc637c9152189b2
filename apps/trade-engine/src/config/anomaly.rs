//! Anomaly detection thresholds.

use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::domain::anomaly::AnomalyConfig;

/// Anomaly detector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalySettings {
    /// Trailing history scanned (seconds).
    #[serde(default = "default_lookback_secs")]
    pub lookback_secs: u64,
    /// Velocity rule window (seconds).
    #[serde(default = "default_velocity_window_secs")]
    pub velocity_window_secs: u64,
    /// Transactions allowed in one velocity window.
    #[serde(default = "default_velocity_max")]
    pub velocity_max: usize,
    /// Multiple of the trailing average notional that counts as outsized.
    #[serde(default = "default_size_multiple")]
    pub size_multiple: Decimal,
    /// Prior transactions needed before the size rule applies.
    #[serde(default = "default_size_min_samples")]
    pub size_min_samples: usize,
    /// Oscillation rule window (seconds).
    #[serde(default = "default_oscillation_window_secs")]
    pub oscillation_window_secs: u64,
    /// Reversals within the window that raise a flag.
    #[serde(default = "default_oscillation_min_reversals")]
    pub oscillation_min_reversals: usize,
}

impl Default for AnomalySettings {
    fn default() -> Self {
        Self {
            lookback_secs: default_lookback_secs(),
            velocity_window_secs: default_velocity_window_secs(),
            velocity_max: default_velocity_max(),
            size_multiple: default_size_multiple(),
            size_min_samples: default_size_min_samples(),
            oscillation_window_secs: default_oscillation_window_secs(),
            oscillation_min_reversals: default_oscillation_min_reversals(),
        }
    }
}

impl AnomalySettings {
    /// Convert to the detector's thresholds.
    #[must_use]
    pub const fn to_anomaly_config(&self) -> AnomalyConfig {
        AnomalyConfig {
            lookback: Duration::from_secs(self.lookback_secs),
            velocity_window: Duration::from_secs(self.velocity_window_secs),
            velocity_max: self.velocity_max,
            size_multiple: self.size_multiple,
            size_min_samples: self.size_min_samples,
            oscillation_window: Duration::from_secs(self.oscillation_window_secs),
            oscillation_min_reversals: self.oscillation_min_reversals,
        }
    }
}

const fn default_lookback_secs() -> u64 {
    24 * 60 * 60
}

const fn default_velocity_window_secs() -> u64 {
    10
}

const fn default_velocity_max() -> usize {
    3
}

const fn default_size_multiple() -> Decimal {
    dec!(5)
}

const fn default_size_min_samples() -> usize {
    3
}

const fn default_oscillation_window_secs() -> u64 {
    10 * 60
}

const fn default_oscillation_min_reversals() -> usize {
    2
}
