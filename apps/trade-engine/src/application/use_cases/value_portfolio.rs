//! Value Portfolio Use Case

use std::sync::Arc;

use crate::application::services::{MarketPriceCache, PortfolioAggregator, ValuationError};
use crate::domain::portfolio::{Portfolio, PortfolioRepository, PortfolioValuation};
use crate::domain::shared::{MoneyAmount, OwnerId, PortfolioId, RepositoryError};

/// Read-side portfolio queries. Safe to run concurrently with submissions.
pub struct ValuePortfolioUseCase<P>
where
    P: PortfolioRepository,
{
    portfolios: Arc<P>,
    aggregator: PortfolioAggregator<P>,
}

impl<P> ValuePortfolioUseCase<P>
where
    P: PortfolioRepository,
{
    /// Create a new ValuePortfolioUseCase.
    pub fn new(portfolios: Arc<P>, prices: MarketPriceCache) -> Self {
        Self {
            aggregator: PortfolioAggregator::new(Arc::clone(&portfolios), prices),
            portfolios,
        }
    }

    /// Current market value of a portfolio.
    ///
    /// # Errors
    ///
    /// Returns [`ValuationError::ValuationIncomplete`] naming every open
    /// holding without a usable price.
    pub async fn portfolio_value(&self, id: &PortfolioId) -> Result<MoneyAmount, ValuationError> {
        self.aggregator.get_portfolio_value(id).await
    }

    /// Per-holding breakdown with market value, cost and unrealized gain.
    ///
    /// # Errors
    ///
    /// Same as [`portfolio_value`](Self::portfolio_value).
    pub async fn valuation(&self, id: &PortfolioId) -> Result<PortfolioValuation, ValuationError> {
        self.aggregator.get_portfolio_valuation(id).await
    }

    /// Portfolios owned by a user, in id order.
    ///
    /// # Errors
    ///
    /// Returns error if the repository query fails.
    pub async fn portfolios_for_owner(&self, owner: &OwnerId) -> Result<Vec<Portfolio>, RepositoryError> {
        self.portfolios.portfolios_for_owner(owner).await
    }
}
