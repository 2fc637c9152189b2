//! Portfolio errors.

use thiserror::Error;

use crate::domain::shared::{MoneyError, Quantity, Symbol};

/// Errors applying a trade to a holding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HoldingError {
    /// SELL exceeds the held quantity.
    #[error("Insufficient holdings of {symbol}: held {held}, requested {requested}")]
    InsufficientHoldings {
        /// Symbol being sold.
        symbol: Symbol,
        /// Quantity held.
        held: Quantity,
        /// Quantity requested.
        requested: Quantity,
    },

    /// Quantity would exceed `u64::MAX`.
    #[error("Holding quantity overflow for {symbol}")]
    QuantityOverflow {
        /// Symbol whose holding overflowed.
        symbol: Symbol,
    },

    /// Price and cost basis currencies differ, or arithmetic overflowed.
    #[error(transparent)]
    Money(#[from] MoneyError),
}
