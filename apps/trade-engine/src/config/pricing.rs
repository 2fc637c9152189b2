//! Market price cache configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::application::services::{PriceCacheConfig, RetryPolicy};

/// Price cache and refresh settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Age below which a cached price is served as is (milliseconds).
    #[serde(default = "default_freshness_window_ms")]
    pub freshness_window_ms: u64,
    /// Oldest last-good price served after a failed refresh (milliseconds).
    #[serde(default = "default_max_staleness_ms")]
    pub max_staleness_ms: u64,
    /// Bound on a single fetch attempt (milliseconds).
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    /// Refresh retry policy.
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Retry settings for price refreshes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per refresh, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Backoff before the second attempt (milliseconds).
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Backoff ceiling (milliseconds).
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Growth factor between attempts.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Random spread applied to each backoff (0.1 = ±10%).
    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            freshness_window_ms: default_freshness_window_ms(),
            max_staleness_ms: default_max_staleness_ms(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter_factor: default_jitter_factor(),
        }
    }
}

impl RetryConfig {
    /// Convert to the runtime retry policy.
    #[must_use]
    pub const fn to_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.initial_backoff_ms),
            Duration::from_millis(self.max_backoff_ms),
            self.backoff_multiplier,
            self.jitter_factor,
        )
    }
}

impl PricingConfig {
    /// Convert to the runtime cache policy.
    #[must_use]
    pub const fn to_cache_config(&self) -> PriceCacheConfig {
        PriceCacheConfig {
            freshness_window: Duration::from_millis(self.freshness_window_ms),
            max_staleness: Duration::from_millis(self.max_staleness_ms),
            fetch_timeout: Duration::from_millis(self.fetch_timeout_ms),
            retry: self.retry.to_retry_policy(),
        }
    }
}

const fn default_freshness_window_ms() -> u64 {
    5_000
}

const fn default_max_staleness_ms() -> u64 {
    60_000
}

const fn default_fetch_timeout_ms() -> u64 {
    1_000
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    100
}

const fn default_max_backoff_ms() -> u64 {
    2_000
}

const fn default_backoff_multiplier() -> f64 {
    2.0
}

const fn default_jitter_factor() -> f64 {
    0.1
}
