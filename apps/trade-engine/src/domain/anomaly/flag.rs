//! Advisory anomaly flags.

use serde::Serialize;
use std::fmt;

use crate::domain::shared::{MoneyAmount, PortfolioId, Symbol, Timestamp, TransactionId};

/// Kind of anomaly, for metrics and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlagKind {
    /// Too many transactions in a short window.
    Velocity,
    /// One transaction far above the trailing average.
    Size,
    /// Repeated buy/sell reversals of one symbol.
    Oscillation,
}

impl FlagKind {
    /// Stable label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Velocity => "VELOCITY",
            Self::Size => "SIZE",
            Self::Oscillation => "OSCILLATION",
        }
    }
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A suspicious pattern found in transaction history. Advisory only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Flag {
    /// More completed transactions within the velocity window than allowed.
    Velocity {
        /// Portfolio concerned.
        portfolio_id: PortfolioId,
        /// Transactions in the burst.
        count: usize,
        /// Execution time of the first transaction in the burst.
        window_start: Timestamp,
        /// Execution time of the last transaction in the burst.
        window_end: Timestamp,
        /// Transactions in the burst, oldest first.
        transaction_ids: Vec<TransactionId>,
    },

    /// Notional far above the portfolio's trailing average.
    Size {
        /// Portfolio concerned.
        portfolio_id: PortfolioId,
        /// The outlying transaction.
        transaction_id: TransactionId,
        /// Its notional.
        notional: MoneyAmount,
        /// Average notional of the transactions before it.
        trailing_average: MoneyAmount,
    },

    /// Repeated BUY/SELL reversals of one symbol.
    Oscillation {
        /// Portfolio concerned.
        portfolio_id: PortfolioId,
        /// Symbol traded back and forth.
        symbol: Symbol,
        /// Most reversals seen inside one window during the burst.
        reversals: usize,
        /// Execution time of the first transaction in the burst.
        window_start: Timestamp,
        /// Execution time of the last transaction in the burst.
        window_end: Timestamp,
    },
}

impl Flag {
    /// Kind of this flag.
    #[must_use]
    pub const fn kind(&self) -> FlagKind {
        match self {
            Self::Velocity { .. } => FlagKind::Velocity,
            Self::Size { .. } => FlagKind::Size,
            Self::Oscillation { .. } => FlagKind::Oscillation,
        }
    }

    /// Portfolio the flag concerns.
    #[must_use]
    pub const fn portfolio_id(&self) -> &PortfolioId {
        match self {
            Self::Velocity { portfolio_id, .. }
            | Self::Size { portfolio_id, .. }
            | Self::Oscillation { portfolio_id, .. } => portfolio_id,
        }
    }
}
