//! Portfolio Aggregate Root

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Holding;
use crate::domain::shared::{Currency, MoneyAmount, OwnerId, PortfolioId, Symbol};

/// A portfolio: owner, base currency and holdings keyed by symbol.
///
/// Aggregate value is derived on read from the price cache and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portfolio {
    id: PortfolioId,
    owner_id: OwnerId,
    base_currency: Currency,
    holdings: BTreeMap<Symbol, Holding>,
}

impl Portfolio {
    /// Create an empty portfolio.
    #[must_use]
    pub const fn new(id: PortfolioId, owner_id: OwnerId, base_currency: Currency) -> Self {
        Self {
            id,
            owner_id,
            base_currency,
            holdings: BTreeMap::new(),
        }
    }

    /// Portfolio id.
    #[must_use]
    pub const fn id(&self) -> &PortfolioId {
        &self.id
    }

    /// Owning user.
    #[must_use]
    pub const fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    /// Currency trades and valuations are expressed in.
    #[must_use]
    pub const fn base_currency(&self) -> Currency {
        self.base_currency
    }

    /// Holdings in symbol order, including zero-quantity ones.
    pub fn holdings(&self) -> impl Iterator<Item = &Holding> {
        self.holdings.values()
    }

    /// Holdings with a positive quantity.
    pub fn open_holdings(&self) -> impl Iterator<Item = &Holding> {
        self.holdings.values().filter(|h| !h.quantity().is_zero())
    }

    /// Look up one holding.
    #[must_use]
    pub fn holding(&self, symbol: &Symbol) -> Option<&Holding> {
        self.holdings.get(symbol)
    }

    /// Insert or replace a holding.
    pub fn upsert_holding(&mut self, holding: Holding) {
        self.holdings.insert(holding.symbol().clone(), holding);
    }

    /// Remove a holding, returning it if present.
    pub fn remove_holding(&mut self, symbol: &Symbol) -> Option<Holding> {
        self.holdings.remove(symbol)
    }

    /// Builder-style [`Portfolio::upsert_holding`].
    #[must_use]
    pub fn with_holding(mut self, holding: Holding) -> Self {
        self.upsert_holding(holding);
        self
    }

    /// Zero in the base currency.
    #[must_use]
    pub const fn zero(&self) -> MoneyAmount {
        MoneyAmount::zero(self.base_currency)
    }
}
