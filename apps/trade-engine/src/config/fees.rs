//! Fee schedule configuration.

use serde::{Deserialize, Serialize};

use crate::domain::fees::{FeeSchedule, FeeScheduleError, FeeTier};
use crate::domain::shared::Currency;

/// Tiered fee schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeesConfig {
    /// Currency fees are charged in. Defaults to the engine base currency.
    #[serde(default)]
    pub currency: Option<Currency>,
    /// Tiers in ascending order.
    #[serde(default = "default_tiers")]
    pub tiers: Vec<FeeTier>,
}

impl Default for FeesConfig {
    fn default() -> Self {
        Self {
            currency: None,
            tiers: default_tiers(),
        }
    }
}

impl FeesConfig {
    /// Build the runtime schedule, charging in `base_currency` unless overridden.
    ///
    /// # Errors
    ///
    /// Returns error if the tiers do not form a valid schedule.
    pub fn to_fee_schedule(&self, base_currency: Currency) -> Result<FeeSchedule, FeeScheduleError> {
        FeeSchedule::new(self.currency.unwrap_or(base_currency), self.tiers.clone())
    }
}

fn default_tiers() -> Vec<FeeTier> {
    FeeSchedule::standard(Currency::USD).tiers().to_vec()
}
