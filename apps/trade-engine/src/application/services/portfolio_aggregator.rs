//! Portfolio Aggregator
//!
//! Applies priced transactions to holdings and values portfolios at current
//! market prices. Value is derived on read and never stored.

use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, warn};

use super::market_price_cache::MarketPriceCache;
use crate::domain::market_data::Price;
use crate::domain::portfolio::{
    Holding, HoldingError, HoldingUpdate, HoldingValuation, PortfolioRepository,
    PortfolioValuation,
};
use crate::domain::shared::{
    MoneyAmount, MoneyError, PortfolioId, Quantity, RepositoryError, Symbol, TransactionId,
};
use crate::domain::transaction::{TradeSide, Transaction};

/// Errors applying a transaction to a holding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregationError {
    /// The transaction carries no executed price.
    #[error("Transaction {transaction_id} has not been priced")]
    NotPriced {
        /// Offending transaction.
        transaction_id: TransactionId,
    },

    /// Portfolio not found.
    #[error("Unknown portfolio: {portfolio_id}")]
    UnknownPortfolio {
        /// Requested portfolio.
        portfolio_id: PortfolioId,
    },

    /// The trade cannot be applied to the holding.
    #[error(transparent)]
    Holding(#[from] HoldingError),

    /// Loading or saving the holding failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Errors valuing a portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValuationError {
    /// Portfolio not found.
    #[error("Unknown portfolio: {portfolio_id}")]
    UnknownPortfolio {
        /// Requested portfolio.
        portfolio_id: PortfolioId,
    },

    /// At least one open holding has no usable price.
    #[error(
        "Valuation incomplete; no price for {}",
        .symbols.iter().map(Symbol::as_str).collect::<Vec<_>>().join(", ")
    )]
    ValuationIncomplete {
        /// Symbols without a price, in symbol order.
        symbols: Vec<Symbol>,
    },

    /// A holding could not be valued.
    #[error(transparent)]
    Holding(#[from] HoldingError),

    /// Currency mismatch or overflow while summing.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// Loading the portfolio failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Holdings maintenance and valuation over a portfolio repository.
pub struct PortfolioAggregator<P>
where
    P: PortfolioRepository,
{
    portfolios: Arc<P>,
    prices: MarketPriceCache,
}

impl<P> PortfolioAggregator<P>
where
    P: PortfolioRepository,
{
    /// Create a new aggregator.
    pub const fn new(portfolios: Arc<P>, prices: MarketPriceCache) -> Self {
        Self { portfolios, prices }
    }

    /// Holding after a trade of `quantity` units at `price`.
    ///
    /// `current` is the holding before the trade (`None` if never held); `base`
    /// is the empty holding to start from in that case.
    ///
    /// # Errors
    ///
    /// Returns [`HoldingError::InsufficientHoldings`] for an oversell, or a
    /// money error on currency mismatch or overflow.
    pub fn plan_update(
        current: Option<Holding>,
        base: Holding,
        side: TradeSide,
        quantity: Quantity,
        price: MoneyAmount,
    ) -> Result<HoldingUpdate, HoldingError> {
        let before = current.as_ref().unwrap_or(&base);
        let (holding, realized_gain) = match side {
            TradeSide::Buy => (before.after_buy(quantity, price)?, None),
            TradeSide::Sell => {
                let (holding, realized) = before.after_sell(quantity, price)?;
                (holding, Some(realized))
            }
        };
        Ok(HoldingUpdate {
            holding,
            previous: current,
            realized_gain,
        })
    }

    /// Apply a priced transaction to its portfolio's holding and persist it.
    ///
    /// The transaction must carry an executed price (state `FEE_CALCULATED`
    /// while being committed, or `COMPLETED`). Callers serialise per portfolio.
    /// Zero-quantity holdings are kept.
    ///
    /// # Errors
    ///
    /// Returns error if the trade cannot be applied or the holding cannot be
    /// loaded or saved. Nothing is written on error.
    #[tracing::instrument(skip(self, transaction), fields(transaction_id = %transaction.id()))]
    pub async fn apply_completed_transaction(
        &self,
        portfolio_id: &PortfolioId,
        transaction: &Transaction,
    ) -> Result<HoldingUpdate, AggregationError> {
        let price = transaction
            .price()
            .ok_or_else(|| AggregationError::NotPriced {
                transaction_id: transaction.id().clone(),
            })?;
        let symbol = transaction.symbol();

        let current = self.portfolios.load_holding(portfolio_id, symbol).await?;
        let base = match &current {
            Some(holding) => holding.clone(),
            None => {
                let portfolio = self
                    .portfolios
                    .load_portfolio(portfolio_id)
                    .await?
                    .ok_or_else(|| AggregationError::UnknownPortfolio {
                        portfolio_id: portfolio_id.clone(),
                    })?;
                Holding::empty(symbol.clone(), portfolio.base_currency())
            }
        };

        let update = Self::plan_update(
            current,
            base,
            transaction.side(),
            transaction.quantity(),
            price.unit(),
        )?;
        self.portfolios
            .save_holding(portfolio_id, &update.holding)
            .await?;

        debug!(
            %symbol,
            quantity = %update.holding.quantity(),
            average_cost = %update.holding.average_cost().amount(),
            "Holding updated"
        );
        Ok(update)
    }

    /// Undo a holding write from [`apply_completed_transaction`](Self::apply_completed_transaction).
    ///
    /// # Errors
    ///
    /// Returns error if the restore write fails.
    pub async fn revert(
        &self,
        portfolio_id: &PortfolioId,
        update: &HoldingUpdate,
    ) -> Result<(), RepositoryError> {
        match &update.previous {
            Some(previous) => self.portfolios.save_holding(portfolio_id, previous).await,
            None => {
                self.portfolios
                    .delete_holding(portfolio_id, update.holding.symbol())
                    .await
            }
        }
    }

    /// Market value of a portfolio: price × quantity summed over holdings
    /// with a positive quantity.
    ///
    /// # Errors
    ///
    /// Returns [`ValuationError::ValuationIncomplete`] if any open holding has
    /// no usable price.
    pub async fn get_portfolio_value(
        &self,
        portfolio_id: &PortfolioId,
    ) -> Result<MoneyAmount, ValuationError> {
        Ok(self
            .get_portfolio_valuation(portfolio_id)
            .await?
            .total_market_value)
    }

    /// Per-holding valuation breakdown with totals.
    ///
    /// # Errors
    ///
    /// Same as [`get_portfolio_value`](Self::get_portfolio_value).
    #[tracing::instrument(skip(self))]
    pub async fn get_portfolio_valuation(
        &self,
        portfolio_id: &PortfolioId,
    ) -> Result<PortfolioValuation, ValuationError> {
        let portfolio = self
            .portfolios
            .load_portfolio(portfolio_id)
            .await?
            .ok_or_else(|| ValuationError::UnknownPortfolio {
                portfolio_id: portfolio_id.clone(),
            })?;
        let holdings: Vec<&Holding> = portfolio.open_holdings().collect();

        let lookups = holdings
            .iter()
            .map(|holding| self.prices.get_price(holding.symbol()));
        let prices = join_all(lookups).await;

        let mut priced: Vec<(&Holding, Price)> = Vec::with_capacity(holdings.len());
        let mut missing = Vec::new();
        for (holding, result) in holdings.iter().copied().zip(prices) {
            match result {
                Ok(price) => priced.push((holding, price)),
                Err(e) => {
                    warn!(symbol = %holding.symbol(), error = %e, "No price for holding");
                    missing.push(holding.symbol().clone());
                }
            }
        }
        if !missing.is_empty() {
            return Err(ValuationError::ValuationIncomplete { symbols: missing });
        }

        let zero = portfolio.zero();
        let mut valuation = PortfolioValuation {
            portfolio_id: portfolio_id.clone(),
            holdings: Vec::with_capacity(priced.len()),
            total_market_value: zero,
            total_cost_value: zero,
            total_unrealized_gain: zero,
        };
        for (holding, price) in priced {
            let line = HoldingValuation::compute(holding, price)?;
            valuation.total_market_value = valuation.total_market_value.checked_add(&line.market_value)?;
            valuation.total_cost_value = valuation.total_cost_value.checked_add(&line.cost_value)?;
            valuation.total_unrealized_gain =
                valuation.total_unrealized_gain.checked_add(&line.unrealized_gain)?;
            valuation.holdings.push(line);
        }
        Ok(valuation)
    }
}
