//! Transaction lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a transaction.
///
/// `RECEIVED → PRICING → FEE_CALCULATED → COMPLETED`, with `FAILED` reachable
/// from any non-terminal state and `CANCELLED` from `RECEIVED` or `PRICING`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionState {
    /// Intent accepted as a transaction, not yet priced.
    Received,
    /// Validation passed; waiting for a market price.
    Pricing,
    /// Price, notional and fee recorded; awaiting the holdings commit.
    FeeCalculated,
    /// Holdings updated (terminal).
    Completed,
    /// Processing failed with a recorded cause (terminal).
    Failed,
    /// Cancelled by the caller before pricing finished (terminal).
    Cancelled,
}

impl TransactionState {
    /// Every state, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Received,
        Self::Pricing,
        Self::FeeCalculated,
        Self::Completed,
        Self::Failed,
        Self::Cancelled,
    ];

    /// Returns true if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Returns true if the caller may still cancel.
    #[must_use]
    pub const fn is_cancellable(&self) -> bool {
        matches!(self, Self::Received | Self::Pricing)
    }

    /// Stable label for logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "RECEIVED",
            Self::Pricing => "PRICING",
            Self::FeeCalculated => "FEE_CALCULATED",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
