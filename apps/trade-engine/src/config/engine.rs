//! Engine-wide settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::shared::Currency;

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base currency for new portfolios and the default fee schedule.
    #[serde(default = "default_base_currency")]
    pub base_currency: Currency,
    /// Deadline applied to submissions that do not carry their own (milliseconds).
    #[serde(default = "default_submit_timeout_ms")]
    pub default_submit_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_currency: default_base_currency(),
            default_submit_timeout_ms: default_submit_timeout_ms(),
        }
    }
}

impl EngineConfig {
    /// Default submission deadline.
    #[must_use]
    pub const fn default_submit_timeout(&self) -> Duration {
        Duration::from_millis(self.default_submit_timeout_ms)
    }
}

const fn default_base_currency() -> Currency {
    Currency::USD
}

const fn default_submit_timeout_ms() -> u64 {
    5_000
}
