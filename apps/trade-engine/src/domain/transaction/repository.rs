//! Transaction Repository Trait
//!
//! Defines the persistence abstraction for resolved transactions.
//! Implemented by adapters in the infrastructure layer.

use async_trait::async_trait;

use super::aggregate::Transaction;
use super::value_objects::HistoryRange;
use crate::domain::shared::{IdempotencyKey, PortfolioId, RepositoryError};

/// Repository trait for transaction history.
///
/// Only terminal transactions are saved. Writes are durable before returning.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Save a transaction (insert or update by id). The portfolio's
    /// idempotency key index then points at this transaction.
    ///
    /// # Errors
    ///
    /// Returns error if persistence fails.
    async fn save_transaction(&self, transaction: &Transaction) -> Result<(), RepositoryError>;

    /// Load a portfolio's transactions resolved within `range`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn load_history(
        &self,
        portfolio_id: &PortfolioId,
        range: HistoryRange,
    ) -> Result<Vec<Transaction>, RepositoryError>;

    /// Find the transaction a portfolio's idempotency key resolved to.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn find_by_idempotency_key(
        &self,
        portfolio_id: &PortfolioId,
        key: &IdempotencyKey,
    ) -> Result<Option<Transaction>, RepositoryError>;
}
