//! Portfolio Repository Trait
//!
//! Persistence abstraction for portfolios and their holdings.

use async_trait::async_trait;

use super::{Holding, Portfolio};
use crate::domain::shared::{OwnerId, PortfolioId, RepositoryError, Symbol};

/// Repository trait for portfolios and holdings.
///
/// Writes are durable before returning.
#[async_trait]
pub trait PortfolioRepository: Send + Sync {
    /// Save portfolio metadata and any holdings it carries.
    ///
    /// # Errors
    ///
    /// Returns error if persistence fails.
    async fn save_portfolio(&self, portfolio: &Portfolio) -> Result<(), RepositoryError>;

    /// Load a portfolio with its holdings.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn load_portfolio(&self, id: &PortfolioId) -> Result<Option<Portfolio>, RepositoryError>;

    /// Portfolios owned by a user.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn portfolios_for_owner(&self, owner: &OwnerId) -> Result<Vec<Portfolio>, RepositoryError>;

    /// Insert or replace a holding.
    ///
    /// # Errors
    ///
    /// Returns error if persistence fails.
    async fn save_holding(
        &self,
        portfolio_id: &PortfolioId,
        holding: &Holding,
    ) -> Result<(), RepositoryError>;

    /// Load one holding.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn load_holding(
        &self,
        portfolio_id: &PortfolioId,
        symbol: &Symbol,
    ) -> Result<Option<Holding>, RepositoryError>;

    /// Load all holdings of a portfolio in symbol order.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn load_holdings(&self, portfolio_id: &PortfolioId) -> Result<Vec<Holding>, RepositoryError>;

    /// Remove a holding. Used only to undo a holding write whose transaction
    /// could not be saved.
    ///
    /// # Errors
    ///
    /// Returns error if persistence fails.
    async fn delete_holding(
        &self,
        portfolio_id: &PortfolioId,
        symbol: &Symbol,
    ) -> Result<(), RepositoryError>;
}
