//! Intent validation configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::validation::{DEFAULT_IDEMPOTENCY_RETENTION, TransactionValidator};

/// Validation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// How long an idempotency key stays bound to its transaction (seconds).
    #[serde(default = "default_idempotency_retention_secs")]
    pub idempotency_retention_secs: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            idempotency_retention_secs: default_idempotency_retention_secs(),
        }
    }
}

impl ValidationConfig {
    /// Build the runtime validator.
    #[must_use]
    pub const fn to_validator(&self) -> TransactionValidator {
        TransactionValidator::new(Duration::from_secs(self.idempotency_retention_secs))
    }
}

const fn default_idempotency_retention_secs() -> u64 {
    DEFAULT_IDEMPOTENCY_RETENTION.as_secs()
}
