//! Validation errors.

use serde::Serialize;
use thiserror::Error;

use crate::domain::shared::{IdempotencyKey, PortfolioId, Quantity, TransactionId};

/// A rule a trade intent failed. Every rule is checked, so a rejection may
/// carry several of these.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "rule", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationError {
    /// Symbol empty or malformed.
    #[error("Invalid symbol '{symbol}': {message}")]
    InvalidSymbol {
        /// Symbol as supplied.
        symbol: String,
        /// What is wrong with it.
        message: String,
    },

    /// Quantity is not a positive integer.
    #[error("Invalid quantity {quantity}: must be a positive integer")]
    InvalidQuantity {
        /// Quantity as supplied.
        quantity: i64,
    },

    /// Idempotency key blank or too long.
    #[error("Invalid idempotency key: {message}")]
    InvalidIdempotencyKey {
        /// What is wrong with it.
        message: String,
    },

    /// Portfolio id not found.
    #[error("Unknown portfolio: {portfolio_id}")]
    UnknownPortfolio {
        /// Portfolio id as supplied.
        portfolio_id: PortfolioId,
    },

    /// SELL exceeds the held quantity in the snapshot.
    #[error("Insufficient holdings: held {held}, requested {requested}")]
    InsufficientHoldings {
        /// Quantity held.
        held: Quantity,
        /// Quantity requested.
        requested: Quantity,
    },

    /// Idempotency key already used within the retention window and the
    /// earlier outcome cannot be replayed.
    #[error("Duplicate intent for key '{key}' (transaction {existing}): {message}")]
    DuplicateIntent {
        /// The reused key.
        key: IdempotencyKey,
        /// Transaction the key already resolved to.
        existing: TransactionId,
        /// Why it cannot be replayed.
        message: String,
    },
}

impl ValidationError {
    /// Stable rule label for logs and metrics.
    #[must_use]
    pub const fn rule(&self) -> &'static str {
        match self {
            Self::InvalidSymbol { .. } => "INVALID_SYMBOL",
            Self::InvalidQuantity { .. } => "INVALID_QUANTITY",
            Self::InvalidIdempotencyKey { .. } => "INVALID_IDEMPOTENCY_KEY",
            Self::UnknownPortfolio { .. } => "UNKNOWN_PORTFOLIO",
            Self::InsufficientHoldings { .. } => "INSUFFICIENT_HOLDINGS",
            Self::DuplicateIntent { .. } => "DUPLICATE_INTENT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_labels_match_serde_tag() {
        let err = ValidationError::InvalidQuantity { quantity: -1 };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["rule"], err.rule());
    }

    #[test]
    fn insufficient_holdings_display() {
        let err = ValidationError::InsufficientHoldings {
            held: Quantity::ZERO,
            requested: Quantity::new(10),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient holdings: held 0, requested 10"
        );
    }
}
