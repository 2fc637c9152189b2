//! Trade intent: the caller's request to buy or sell.

use serde::{Deserialize, Serialize};

use super::TradeSide;
use crate::domain::shared::{IdempotencyKey, PortfolioId, Symbol, Timestamp};

/// A request to trade, as submitted by the caller.
///
/// The quantity is kept exactly as supplied so that the validator can
/// report non-positive values. Intents are immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeIntent {
    portfolio_id: PortfolioId,
    idempotency_key: IdempotencyKey,
    symbol: Symbol,
    side: TradeSide,
    quantity: i64,
    submitted_at: Timestamp,
}

impl TradeIntent {
    /// Create an intent submitted now.
    #[must_use]
    pub fn new(
        portfolio_id: PortfolioId,
        idempotency_key: IdempotencyKey,
        symbol: Symbol,
        side: TradeSide,
        quantity: i64,
    ) -> Self {
        Self {
            portfolio_id,
            idempotency_key,
            symbol,
            side,
            quantity,
            submitted_at: Timestamp::now(),
        }
    }

    /// Shorthand for a BUY intent.
    #[must_use]
    pub fn buy(
        portfolio_id: impl Into<PortfolioId>,
        idempotency_key: impl Into<IdempotencyKey>,
        symbol: impl Into<Symbol>,
        quantity: i64,
    ) -> Self {
        Self::new(
            portfolio_id.into(),
            idempotency_key.into(),
            symbol.into(),
            TradeSide::Buy,
            quantity,
        )
    }

    /// Shorthand for a SELL intent.
    #[must_use]
    pub fn sell(
        portfolio_id: impl Into<PortfolioId>,
        idempotency_key: impl Into<IdempotencyKey>,
        symbol: impl Into<Symbol>,
        quantity: i64,
    ) -> Self {
        Self::new(
            portfolio_id.into(),
            idempotency_key.into(),
            symbol.into(),
            TradeSide::Sell,
            quantity,
        )
    }

    /// Return the same intent stamped with an explicit submission time.
    #[must_use]
    pub fn with_submitted_at(mut self, submitted_at: Timestamp) -> Self {
        self.submitted_at = submitted_at;
        self
    }

    /// Target portfolio.
    #[must_use]
    pub const fn portfolio_id(&self) -> &PortfolioId {
        &self.portfolio_id
    }

    /// Caller-supplied idempotency key.
    #[must_use]
    pub const fn idempotency_key(&self) -> &IdempotencyKey {
        &self.idempotency_key
    }

    /// Symbol to trade.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Buy or sell.
    #[must_use]
    pub const fn side(&self) -> TradeSide {
        self.side
    }

    /// Requested quantity, unvalidated.
    #[must_use]
    pub const fn quantity(&self) -> i64 {
        self.quantity
    }

    /// When the caller submitted the intent.
    #[must_use]
    pub const fn submitted_at(&self) -> Timestamp {
        self.submitted_at
    }

    /// Returns true if `other` asks for the same trade (symbol, side, quantity).
    #[must_use]
    pub fn same_trade_as(&self, other: &Self) -> bool {
        self.symbol == other.symbol && self.side == other.side && self.quantity == other.quantity
    }
}
