//! Transaction History Use Case
//!
//! Date-ranged history queries and a structured summary of them.

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::shared::{Currency, PortfolioId, RepositoryError};
use crate::domain::transaction::{
    HistoryRange, TradeSide, Transaction, TransactionRepository, TransactionState,
};

/// Totals for one trade side. Only COMPLETED transactions contribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SideSummary {
    /// Completed transactions on this side.
    pub count: usize,
    /// Summed notional per currency.
    pub notional: BTreeMap<Currency, Decimal>,
    /// Summed fees per currency.
    pub fees: BTreeMap<Currency, Decimal>,
}

/// Summary of a portfolio's history over a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistorySummary {
    /// Portfolio summarised.
    pub portfolio_id: PortfolioId,
    /// Range the history was loaded for.
    pub range: HistoryRange,
    /// Transactions in range.
    pub total: usize,
    /// Transactions that ended COMPLETED.
    pub completed: usize,
    /// Transactions that ended FAILED.
    pub failed: usize,
    /// Transactions that ended CANCELLED.
    pub cancelled: usize,
    /// Completed BUY totals.
    pub buys: SideSummary,
    /// Completed SELL totals.
    pub sells: SideSummary,
}

impl HistorySummary {
    /// Summarise `history`.
    #[must_use]
    pub fn from_history(portfolio_id: PortfolioId, range: HistoryRange, history: &[Transaction]) -> Self {
        let mut summary = Self {
            portfolio_id,
            range,
            total: history.len(),
            completed: 0,
            failed: 0,
            cancelled: 0,
            buys: SideSummary::default(),
            sells: SideSummary::default(),
        };

        for tx in history {
            match tx.state() {
                TransactionState::Completed => summary.completed += 1,
                TransactionState::Failed => summary.failed += 1,
                TransactionState::Cancelled => summary.cancelled += 1,
                _ => continue,
            }
            if tx.state() != TransactionState::Completed {
                continue;
            }

            let side = match tx.side() {
                TradeSide::Buy => &mut summary.buys,
                TradeSide::Sell => &mut summary.sells,
            };
            side.count += 1;
            if let Some(notional) = tx.notional() {
                *side.notional.entry(notional.currency()).or_default() += notional.amount();
            }
            if let Some(fee) = tx.fee() {
                *side.fees.entry(fee.currency()).or_default() += fee.amount();
            }
        }
        summary
    }
}

/// Read access to saved transaction history.
pub struct TransactionHistoryUseCase<T>
where
    T: TransactionRepository,
{
    transactions: Arc<T>,
}

impl<T> TransactionHistoryUseCase<T>
where
    T: TransactionRepository,
{
    /// Create a new TransactionHistoryUseCase.
    pub const fn new(transactions: Arc<T>) -> Self {
        Self { transactions }
    }

    /// Transactions resolved within `range`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns error if the repository query fails.
    pub async fn execute(
        &self,
        portfolio_id: &PortfolioId,
        range: HistoryRange,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        self.transactions.load_history(portfolio_id, range).await
    }

    /// Summary of the transactions resolved within `range`.
    ///
    /// # Errors
    ///
    /// Returns error if the repository query fails.
    pub async fn summary(
        &self,
        portfolio_id: &PortfolioId,
        range: HistoryRange,
    ) -> Result<HistorySummary, RepositoryError> {
        let history = self.execute(portfolio_id, range).await?;
        Ok(HistorySummary::from_history(portfolio_id.clone(), range, &history))
    }
}
