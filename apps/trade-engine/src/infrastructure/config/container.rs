//! Dependency Injection Container
//!
//! Wires repositories, the price cache and the use cases from a [`Config`].

use std::sync::Arc;

use crate::application::ports::PriceSourcePort;
use crate::application::services::MarketPriceCache;
use crate::application::use_cases::{
    ScanAnomaliesUseCase, SubmitTradeUseCase, TransactionHistoryUseCase, ValuePortfolioUseCase,
};
use crate::config::{Config, ConfigError};
use crate::domain::anomaly::AnomalyDetector;
use crate::domain::portfolio::PortfolioRepository;
use crate::domain::transaction::TransactionRepository;
use crate::infrastructure::persistence::{InMemoryPortfolioRepository, InMemoryTransactionRepository};

/// Dependency injection container.
///
/// The submit use case is built once and shared: it owns the per-portfolio
/// and per-key locks, so every submitter must go through the same instance.
pub struct Container<T, P>
where
    T: TransactionRepository + 'static,
    P: PortfolioRepository + 'static,
{
    transactions: Arc<T>,
    portfolios: Arc<P>,
    prices: MarketPriceCache,
    submit: Arc<SubmitTradeUseCase<T, P>>,
    detector: AnomalyDetector,
}

impl<T, P> Container<T, P>
where
    T: TransactionRepository + 'static,
    P: PortfolioRepository + 'static,
{
    /// Create a new container with all dependencies.
    ///
    /// # Errors
    ///
    /// Returns error if the configured fee schedule is invalid.
    pub fn new(
        transactions: Arc<T>,
        portfolios: Arc<P>,
        price_source: Arc<dyn PriceSourcePort>,
        config: &Config,
    ) -> Result<Self, ConfigError> {
        let prices = MarketPriceCache::new(price_source, config.pricing.to_cache_config());
        let submit = SubmitTradeUseCase::new(
            Arc::clone(&transactions),
            Arc::clone(&portfolios),
            prices.clone(),
            config.fee_schedule()?,
            config.validation.to_validator(),
            config.engine.default_submit_timeout(),
        );

        Ok(Self {
            transactions,
            portfolios,
            prices,
            submit: Arc::new(submit),
            detector: AnomalyDetector::new(config.anomaly.to_anomaly_config()),
        })
    }

    /// Get the transaction repository.
    pub fn transactions(&self) -> Arc<T> {
        Arc::clone(&self.transactions)
    }

    /// Get the portfolio repository.
    pub fn portfolios(&self) -> Arc<P> {
        Arc::clone(&self.portfolios)
    }

    /// Get the shared price cache.
    pub fn prices(&self) -> MarketPriceCache {
        self.prices.clone()
    }

    /// The shared `SubmitTradeUseCase`.
    pub fn submit_trade_use_case(&self) -> Arc<SubmitTradeUseCase<T, P>> {
        Arc::clone(&self.submit)
    }

    /// Create a `ValuePortfolioUseCase`.
    pub fn value_portfolio_use_case(&self) -> ValuePortfolioUseCase<P> {
        ValuePortfolioUseCase::new(Arc::clone(&self.portfolios), self.prices.clone())
    }

    /// Create a `TransactionHistoryUseCase`.
    pub fn transaction_history_use_case(&self) -> TransactionHistoryUseCase<T> {
        TransactionHistoryUseCase::new(Arc::clone(&self.transactions))
    }

    /// Create a `ScanAnomaliesUseCase`.
    pub fn scan_anomalies_use_case(&self) -> ScanAnomaliesUseCase<T> {
        ScanAnomaliesUseCase::new(Arc::clone(&self.transactions), self.detector.clone())
    }
}

impl Container<InMemoryTransactionRepository, InMemoryPortfolioRepository> {
    /// A container over fresh in-memory repositories.
    ///
    /// # Errors
    ///
    /// Returns error if the configured fee schedule is invalid.
    pub fn in_memory(price_source: Arc<dyn PriceSourcePort>, config: &Config) -> Result<Self, ConfigError> {
        Self::new(
            Arc::new(InMemoryTransactionRepository::new()),
            Arc::new(InMemoryPortfolioRepository::new()),
            price_source,
            config,
        )
    }
}
