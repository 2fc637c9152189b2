//! Tiered fee schedule.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{FeeError, FeeScheduleError};
use crate::domain::shared::{Currency, MoneyAmount};

/// One band of the schedule: `[lower, upper)` charged at `rate` with a floor of `minimum`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeTier {
    /// Inclusive lower bound of notional.
    pub lower: Decimal,
    /// Exclusive upper bound; `None` for the last, unbounded tier.
    pub upper: Option<Decimal>,
    /// Fraction of notional charged (0.01 = 1%).
    pub rate: Decimal,
    /// Minimum fee within this tier.
    pub minimum: Decimal,
}

impl FeeTier {
    /// Create a tier.
    #[must_use]
    pub const fn new(lower: Decimal, upper: Option<Decimal>, rate: Decimal, minimum: Decimal) -> Self {
        Self {
            lower,
            upper,
            rate,
            minimum,
        }
    }

    /// Returns true if `amount` falls in `[lower, upper)`.
    #[must_use]
    pub fn contains(&self, amount: Decimal) -> bool {
        amount >= self.lower && self.upper.is_none_or(|upper| amount < upper)
    }

    /// Unrounded fee for an amount in this tier: `max(amount × rate, minimum)`.
    fn raw_fee(&self, amount: Decimal) -> Option<Decimal> {
        amount.checked_mul(self.rate).map(|f| f.max(self.minimum))
    }
}

/// Tiered flat-plus-percentage fee model.
///
/// Tiers are contiguous, start at zero, end unbounded, and never let the fee
/// drop when a notional crosses into the next tier, so [`compute_fee`] is
/// non-decreasing in the notional.
///
/// [`compute_fee`]: FeeSchedule::compute_fee
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeeSchedule {
    currency: Currency,
    tiers: Vec<FeeTier>,
}

impl FeeSchedule {
    /// Build and validate a schedule.
    ///
    /// # Errors
    ///
    /// Returns [`FeeScheduleError`] if the tiers are not a valid, monotone partition
    /// of `[0, ∞)`.
    pub fn new(currency: Currency, tiers: Vec<FeeTier>) -> Result<Self, FeeScheduleError> {
        Self::validate_tiers(&tiers)?;
        Ok(Self { currency, tiers })
    }

    /// The default schedule in `currency`:
    /// `[0, 1000)` 1% min 1, `[1000, 10000)` 0.5% min 10, `[10000, ∞)` 0.25% min 50.
    #[must_use]
    pub fn standard(currency: Currency) -> Self {
        Self {
            currency,
            tiers: vec![
                FeeTier::new(dec!(0), Some(dec!(1000)), dec!(0.01), dec!(1)),
                FeeTier::new(dec!(1000), Some(dec!(10000)), dec!(0.005), dec!(10)),
                FeeTier::new(dec!(10000), None, dec!(0.0025), dec!(50)),
            ],
        }
    }

    /// Currency the schedule charges in.
    #[must_use]
    pub const fn currency(&self) -> Currency {
        self.currency
    }

    /// Tiers in ascending order.
    #[must_use]
    pub fn tiers(&self) -> &[FeeTier] {
        &self.tiers
    }

    /// The tier containing `amount`, if it is non-negative.
    #[must_use]
    pub fn tier_for(&self, amount: Decimal) -> Option<&FeeTier> {
        self.tiers.iter().find(|t| t.contains(amount))
    }

    /// Compute the fee for a notional.
    ///
    /// Uses only the tier containing the notional and rounds with banker's
    /// rounding as the final step.
    ///
    /// # Errors
    ///
    /// Returns error for a negative notional, a currency other than the
    /// schedule's, or decimal overflow.
    pub fn compute_fee(&self, notional: &MoneyAmount) -> Result<MoneyAmount, FeeError> {
        notional.ensure_currency(self.currency)?;
        if notional.is_negative() {
            return Err(FeeError::NegativeNotional {
                notional: *notional,
            });
        }

        let Some(tier) = self.tier_for(notional.amount()) else {
            // Unreachable for a validated schedule: tiers cover [0, ∞).
            return Err(FeeError::NegativeNotional {
                notional: *notional,
            });
        };

        let fee = notional.mul_rate(tier.rate)?;
        let floor = MoneyAmount::new(tier.minimum, self.currency);
        Ok(fee.try_max(floor)?.round_to_currency())
    }

    fn validate_tiers(tiers: &[FeeTier]) -> Result<(), FeeScheduleError> {
        let Some(first) = tiers.first() else {
            return Err(FeeScheduleError::Empty);
        };
        if !first.lower.is_zero() {
            return Err(FeeScheduleError::FirstTierNotZero { lower: first.lower });
        }

        let last_index = tiers.len() - 1;
        for (index, tier) in tiers.iter().enumerate() {
            if tier.rate < Decimal::ZERO || tier.rate > Decimal::ONE {
                return Err(FeeScheduleError::InvalidTier {
                    index,
                    reason: format!("rate {} outside [0, 1]", tier.rate),
                });
            }
            if tier.minimum < Decimal::ZERO {
                return Err(FeeScheduleError::InvalidTier {
                    index,
                    reason: format!("negative minimum {}", tier.minimum),
                });
            }
            match tier.upper {
                Some(upper) if upper <= tier.lower => {
                    return Err(FeeScheduleError::EmptyTier {
                        index,
                        lower: tier.lower,
                        upper,
                    });
                }
                Some(_) if index == last_index => return Err(FeeScheduleError::LastTierBounded),
                None if index != last_index => {
                    return Err(FeeScheduleError::UnboundedTierNotLast { index });
                }
                _ => {}
            }
        }

        for (index, pair) in tiers.windows(2).enumerate() {
            let (prev, next) = (&pair[0], &pair[1]);
            let Some(boundary) = prev.upper else {
                return Err(FeeScheduleError::UnboundedTierNotLast { index });
            };
            if next.lower != boundary {
                return Err(FeeScheduleError::NotContiguous {
                    index: index + 1,
                    lower: next.lower,
                    previous_upper: boundary,
                });
            }

            // Within a tier the fee is non-decreasing, so only the boundary can
            // introduce a drop: compare the previous tier's supremum with the fee
            // charged at the boundary.
            let previous_fee = prev.raw_fee(boundary).unwrap_or(Decimal::MAX);
            let fee_at_boundary = next.raw_fee(boundary).unwrap_or(Decimal::MAX);
            if fee_at_boundary < previous_fee {
                return Err(FeeScheduleError::NonMonotonicBoundary {
                    boundary,
                    previous_fee,
                    fee_at_boundary,
                });
            }
        }

        Ok(())
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self::standard(Currency::USD)
    }
}
