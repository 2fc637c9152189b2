//! Fee errors.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::shared::{MoneyAmount, MoneyError};

/// Errors computing a fee for a notional amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeeError {
    /// Notional below zero.
    #[error("Negative notional: {notional}")]
    NegativeNotional {
        /// The rejected notional.
        notional: MoneyAmount,
    },

    /// Notional currency differs from the schedule currency, or arithmetic overflowed.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Errors building a [`FeeSchedule`](super::FeeSchedule).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeeScheduleError {
    /// No tiers supplied.
    #[error("Fee schedule has no tiers")]
    Empty,

    /// First tier does not start at zero.
    #[error("First fee tier must start at 0, starts at {lower}")]
    FirstTierNotZero {
        /// Lower bound of the first tier.
        lower: Decimal,
    },

    /// A tier's upper bound is not above its lower bound.
    #[error("Fee tier {index} is empty or inverted: [{lower}, {upper})")]
    EmptyTier {
        /// Tier index.
        index: usize,
        /// Lower bound.
        lower: Decimal,
        /// Upper bound.
        upper: Decimal,
    },

    /// Adjacent tiers leave a gap or overlap.
    #[error("Fee tier {index} starts at {lower} but previous tier ends at {previous_upper}")]
    NotContiguous {
        /// Tier index.
        index: usize,
        /// Lower bound of this tier.
        lower: Decimal,
        /// Upper bound of the previous tier.
        previous_upper: Decimal,
    },

    /// A tier other than the last has no upper bound.
    #[error("Only the last fee tier may be unbounded (tier {index} is unbounded)")]
    UnboundedTierNotLast {
        /// Tier index.
        index: usize,
    },

    /// The last tier has an upper bound.
    #[error("Last fee tier must be unbounded")]
    LastTierBounded,

    /// Rate outside `[0, 1]` or negative minimum.
    #[error("Fee tier {index} has invalid parameters: {reason}")]
    InvalidTier {
        /// Tier index.
        index: usize,
        /// What is wrong.
        reason: String,
    },

    /// The fee would decrease when crossing into tier `index`.
    #[error(
        "Fee drops at boundary {boundary}: {previous_fee} below, {fee_at_boundary} at the boundary"
    )]
    NonMonotonicBoundary {
        /// Boundary amount.
        boundary: Decimal,
        /// Supremum of the fee in the previous tier.
        previous_fee: Decimal,
        /// Fee charged at the boundary.
        fee_at_boundary: Decimal,
    },
}
