//! Recorded causes of a FAILED transaction.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::{Currency, Quantity};

/// Why a transaction ended in `FAILED`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    /// No usable market price (all refresh attempts failed, nothing cached within staleness).
    NoPrice {
        /// Detail from the price cache.
        message: String,
    },
    /// The caller's deadline expired.
    Timeout,
    /// SELL exceeded the held quantity at commit time.
    InsufficientHoldings {
        /// Quantity held when the commit ran.
        held: Quantity,
        /// Quantity the transaction tried to sell.
        requested: Quantity,
    },
    /// Price, fee schedule or portfolio currencies disagree.
    CurrencyMismatch {
        /// Currency the operation required.
        expected: Currency,
        /// Currency it received.
        actual: Currency,
    },
    /// Fee computation failed.
    Fee {
        /// Detail from the fee schedule.
        message: String,
    },
    /// Storage failed while committing.
    Repository {
        /// Detail from the repository.
        message: String,
    },
    /// An internal consistency check failed (arithmetic overflow, missing pricing data).
    Invariant {
        /// What was violated.
        message: String,
    },
}

impl FailureReason {
    /// Returns true if the caller may retry with a fresh idempotency key.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Stable label for logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NoPrice { .. } => "NO_PRICE",
            Self::Timeout => "TIMEOUT",
            Self::InsufficientHoldings { .. } => "INSUFFICIENT_HOLDINGS",
            Self::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            Self::Fee { .. } => "FEE",
            Self::Repository { .. } => "REPOSITORY",
            Self::Invariant { .. } => "INVARIANT",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPrice { message } => write!(f, "No price available: {message}"),
            Self::Timeout => write!(f, "Deadline exceeded"),
            Self::InsufficientHoldings { held, requested } => {
                write!(f, "Insufficient holdings: held {held}, requested {requested}")
            }
            Self::CurrencyMismatch { expected, actual } => {
                write!(f, "Currency mismatch: expected {expected}, got {actual}")
            }
            Self::Fee { message } => write!(f, "Fee calculation failed: {message}"),
            Self::Repository { message } => write!(f, "Repository failure: {message}"),
            Self::Invariant { message } => write!(f, "Invariant violated: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_timeout_is_retryable() {
        assert!(FailureReason::Timeout.is_retryable());
        assert!(
            !FailureReason::NoPrice {
                message: "down".to_string()
            }
            .is_retryable()
        );
        assert!(
            !FailureReason::InsufficientHoldings {
                held: Quantity::ZERO,
                requested: Quantity::new(1),
            }
            .is_retryable()
        );
    }

    #[test]
    fn serde_is_tagged() {
        let json = serde_json::to_string(&FailureReason::Timeout).unwrap();
        assert_eq!(json, r#"{"reason":"TIMEOUT"}"#);
    }
}
