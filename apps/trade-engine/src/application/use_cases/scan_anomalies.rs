//! Scan Anomalies Use Case

use std::sync::Arc;

use tracing::info;

use crate::domain::anomaly::{AnomalyDetector, Flag};
use crate::domain::shared::{PortfolioId, RepositoryError};
use crate::domain::transaction::{HistoryRange, TransactionRepository};
use crate::observability::record_anomaly_flag;

/// Runs the anomaly detector over a portfolio's saved history. Advisory only.
pub struct ScanAnomaliesUseCase<T>
where
    T: TransactionRepository,
{
    transactions: Arc<T>,
    detector: AnomalyDetector,
}

impl<T> ScanAnomaliesUseCase<T>
where
    T: TransactionRepository,
{
    /// Create a new ScanAnomaliesUseCase.
    pub const fn new(transactions: Arc<T>, detector: AnomalyDetector) -> Self {
        Self {
            transactions,
            detector,
        }
    }

    /// Flags for the portfolio's transactions resolved within `window`.
    ///
    /// # Errors
    ///
    /// Returns error if the history cannot be loaded.
    #[tracing::instrument(skip(self))]
    pub async fn execute(
        &self,
        portfolio_id: &PortfolioId,
        window: HistoryRange,
    ) -> Result<Vec<Flag>, RepositoryError> {
        let history = self.transactions.load_history(portfolio_id, window).await?;
        let flags = self.detector.scan(&history);
        for flag in &flags {
            record_anomaly_flag(flag.kind().as_str());
        }
        if !flags.is_empty() {
            info!(flags = flags.len(), scanned = history.len(), "Anomalies flagged");
        }
        Ok(flags)
    }

    /// Returns true if [`execute`](Self::execute) finds anything.
    ///
    /// # Errors
    ///
    /// Returns error if the history cannot be loaded.
    pub async fn is_suspicious(
        &self,
        portfolio_id: &PortfolioId,
        window: HistoryRange,
    ) -> Result<bool, RepositoryError> {
        Ok(!self.execute(portfolio_id, window).await?.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::anomaly::{AnomalyConfig, FlagKind};
    use crate::domain::market_data::Price;
    use crate::domain::shared::{MoneyAmount, Symbol, Timestamp};
    use crate::domain::transaction::{TradeIntent, Transaction};
    use crate::infrastructure::persistence::InMemoryTransactionRepository;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn completed_at(key: &str, at: Timestamp) -> Transaction {
        let mut tx = Transaction::receive(TradeIntent::buy("pf-1", key, "ABC", 1), at).unwrap();
        tx.begin_pricing(at).unwrap();
        let unit = MoneyAmount::usd(dec!(10));
        tx.record_pricing(Price::new(Symbol::new("ABC"), unit, at), unit, MoneyAmount::usd(dec!(1)), at)
            .unwrap();
        tx.complete(at).unwrap();
        tx
    }

    #[tokio::test]
    async fn velocity_burst_is_flagged() {
        let repo = Arc::new(InMemoryTransactionRepository::new());
        let t0 = Timestamp::now();
        for i in 0..5u64 {
            repo.save_transaction(&completed_at(&format!("k-{i}"), t0.plus(Duration::from_secs(2 * i))))
                .await
                .unwrap();
        }
        let use_case = ScanAnomaliesUseCase::new(repo, AnomalyDetector::new(AnomalyConfig::default()));

        let flags = use_case
            .execute(&PortfolioId::new("pf-1"), HistoryRange::all())
            .await
            .unwrap();
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].kind(), FlagKind::Velocity);
        assert!(
            use_case
                .is_suspicious(&PortfolioId::new("pf-1"), HistoryRange::all())
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn quiet_history_is_clean() {
        let repo = Arc::new(InMemoryTransactionRepository::new());
        let t0 = Timestamp::now();
        for i in 0..3u64 {
            repo.save_transaction(&completed_at(&format!("k-{i}"), t0.plus(Duration::from_secs(60 * i))))
                .await
                .unwrap();
        }
        let use_case = ScanAnomaliesUseCase::new(repo, AnomalyDetector::default());
        assert!(
            !use_case
                .is_suspicious(&PortfolioId::new("pf-1"), HistoryRange::all())
                .await
                .unwrap()
        );
    }
}
