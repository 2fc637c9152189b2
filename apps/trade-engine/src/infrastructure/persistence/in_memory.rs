//! In-memory repositories for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::domain::portfolio::{Holding, Portfolio, PortfolioRepository};
use crate::domain::shared::{
    IdempotencyKey, OwnerId, PortfolioId, RepositoryError, Symbol, TransactionId,
};
use crate::domain::transaction::{HistoryRange, Transaction, TransactionRepository};

/// In-memory implementation of `TransactionRepository`.
///
/// Suitable for testing and development. Not for production use.
#[derive(Debug, Default)]
pub struct InMemoryTransactionRepository {
    store: RwLock<TransactionStore>,
    fail_saves: AtomicBool,
}

#[derive(Debug, Default)]
struct TransactionStore {
    transactions: HashMap<TransactionId, Transaction>,
    by_portfolio: HashMap<PortfolioId, Vec<TransactionId>>,
    by_key: HashMap<(PortfolioId, IdempotencyKey), TransactionId>,
}

impl InMemoryTransactionRepository {
    /// Create a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored transactions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .transactions
            .len()
    }

    /// Check if the repository is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make subsequent saves fail with `Unavailable` (for failure-path tests).
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionRepository {
    async fn save_transaction(&self, transaction: &Transaction) -> Result<(), RepositoryError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(RepositoryError::unavailable("transaction store offline"));
        }

        let mut store = self.store.write().unwrap_or_else(PoisonError::into_inner);
        let id = transaction.id().clone();
        let portfolio_id = transaction.portfolio_id().clone();

        if store
            .transactions
            .insert(id.clone(), transaction.clone())
            .is_none()
        {
            store
                .by_portfolio
                .entry(portfolio_id.clone())
                .or_default()
                .push(id.clone());
        }
        store.by_key.insert(
            (portfolio_id, transaction.intent().idempotency_key().clone()),
            id,
        );
        Ok(())
    }

    async fn load_history(
        &self,
        portfolio_id: &PortfolioId,
        range: HistoryRange,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        let store = self.store.read().unwrap_or_else(PoisonError::into_inner);
        let mut history: Vec<Transaction> = store
            .by_portfolio
            .get(portfolio_id)
            .into_iter()
            .flatten()
            .filter_map(|id| store.transactions.get(id))
            .filter(|tx| tx.resolved_at().is_some_and(|at| range.contains(at)))
            .cloned()
            .collect();
        history.sort_by_key(|tx| (tx.resolved_at(), tx.received_at()));
        Ok(history)
    }

    async fn find_by_idempotency_key(
        &self,
        portfolio_id: &PortfolioId,
        key: &IdempotencyKey,
    ) -> Result<Option<Transaction>, RepositoryError> {
        let store = self.store.read().unwrap_or_else(PoisonError::into_inner);
        Ok(store
            .by_key
            .get(&(portfolio_id.clone(), key.clone()))
            .and_then(|id| store.transactions.get(id))
            .cloned())
    }
}

/// In-memory implementation of `PortfolioRepository`.
///
/// Suitable for testing and development. Not for production use.
#[derive(Debug, Default)]
pub struct InMemoryPortfolioRepository {
    portfolios: RwLock<HashMap<PortfolioId, Portfolio>>,
    fail_writes: AtomicBool,
}

impl InMemoryPortfolioRepository {
    /// Create a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail with `Unavailable` (for failure-path tests).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(RepositoryError::unavailable("portfolio store offline"))
        } else {
            Ok(())
        }
    }

    fn unknown(portfolio_id: &PortfolioId) -> RepositoryError {
        RepositoryError::unavailable(format!("no portfolio {portfolio_id}"))
    }
}

#[async_trait]
impl PortfolioRepository for InMemoryPortfolioRepository {
    async fn save_portfolio(&self, portfolio: &Portfolio) -> Result<(), RepositoryError> {
        self.check_writable()?;
        let mut portfolios = self.portfolios.write().unwrap_or_else(PoisonError::into_inner);

        let mut merged = portfolio.clone();
        if let Some(existing) = portfolios.get(portfolio.id()) {
            for holding in existing.holdings() {
                if merged.holding(holding.symbol()).is_none() {
                    merged.upsert_holding(holding.clone());
                }
            }
        }
        portfolios.insert(portfolio.id().clone(), merged);
        Ok(())
    }

    async fn load_portfolio(&self, id: &PortfolioId) -> Result<Option<Portfolio>, RepositoryError> {
        let portfolios = self.portfolios.read().unwrap_or_else(PoisonError::into_inner);
        Ok(portfolios.get(id).cloned())
    }

    async fn portfolios_for_owner(&self, owner: &OwnerId) -> Result<Vec<Portfolio>, RepositoryError> {
        let portfolios = self.portfolios.read().unwrap_or_else(PoisonError::into_inner);
        let mut owned: Vec<Portfolio> = portfolios
            .values()
            .filter(|p| p.owner_id() == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(owned)
    }

    async fn save_holding(
        &self,
        portfolio_id: &PortfolioId,
        holding: &Holding,
    ) -> Result<(), RepositoryError> {
        self.check_writable()?;
        let mut portfolios = self.portfolios.write().unwrap_or_else(PoisonError::into_inner);
        let portfolio = portfolios
            .get_mut(portfolio_id)
            .ok_or_else(|| Self::unknown(portfolio_id))?;
        portfolio.upsert_holding(holding.clone());
        Ok(())
    }

    async fn load_holding(
        &self,
        portfolio_id: &PortfolioId,
        symbol: &Symbol,
    ) -> Result<Option<Holding>, RepositoryError> {
        let portfolios = self.portfolios.read().unwrap_or_else(PoisonError::into_inner);
        Ok(portfolios
            .get(portfolio_id)
            .and_then(|p| p.holding(symbol))
            .cloned())
    }

    async fn load_holdings(&self, portfolio_id: &PortfolioId) -> Result<Vec<Holding>, RepositoryError> {
        let portfolios = self.portfolios.read().unwrap_or_else(PoisonError::into_inner);
        Ok(portfolios
            .get(portfolio_id)
            .map(|p| p.holdings().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete_holding(
        &self,
        portfolio_id: &PortfolioId,
        symbol: &Symbol,
    ) -> Result<(), RepositoryError> {
        self.check_writable()?;
        let mut portfolios = self.portfolios.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(portfolio) = portfolios.get_mut(portfolio_id) {
            portfolio.remove_holding(symbol);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market_data::Price;
    use crate::domain::shared::{Currency, MoneyAmount, Quantity, Timestamp};
    use crate::domain::transaction::{FailureReason, TradeIntent};
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn completed(key: &str, at: Timestamp) -> Transaction {
        let mut tx = Transaction::receive(TradeIntent::buy("pf-1", key, "ABC", 1), at).unwrap();
        tx.begin_pricing(at).unwrap();
        let unit = MoneyAmount::usd(dec!(10));
        tx.record_pricing(
            Price::new(Symbol::new("ABC"), unit, at),
            unit,
            MoneyAmount::usd(dec!(1)),
            at,
        )
        .unwrap();
        tx.complete(at).unwrap();
        tx
    }

    #[tokio::test]
    async fn save_and_find_by_key() {
        let repo = InMemoryTransactionRepository::new();
        let tx = completed("k-1", Timestamp::now());
        repo.save_transaction(&tx).await.unwrap();

        let found = repo
            .find_by_idempotency_key(&PortfolioId::new("pf-1"), &IdempotencyKey::new("k-1"))
            .await
            .unwrap();
        assert_eq!(found.map(|t| t.id().clone()), Some(tx.id().clone()));

        let other_portfolio = repo
            .find_by_idempotency_key(&PortfolioId::new("pf-2"), &IdempotencyKey::new("k-1"))
            .await
            .unwrap();
        assert!(other_portfolio.is_none());
    }

    #[tokio::test]
    async fn newer_transaction_takes_over_the_key() {
        let repo = InMemoryTransactionRepository::new();
        let old = completed("k-1", Timestamp::now());
        let new = completed("k-1", Timestamp::now());
        repo.save_transaction(&old).await.unwrap();
        repo.save_transaction(&new).await.unwrap();

        let found = repo
            .find_by_idempotency_key(&PortfolioId::new("pf-1"), &IdempotencyKey::new("k-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id(), new.id());
        assert_eq!(repo.len(), 2);
    }

    #[tokio::test]
    async fn history_is_filtered_and_ordered() {
        let repo = InMemoryTransactionRepository::new();
        let t0 = Timestamp::now();
        let late = completed("k-2", t0.plus(Duration::from_secs(60)));
        let early = completed("k-1", t0);
        let mut failed =
            Transaction::receive(TradeIntent::buy("pf-1", "k-3", "ABC", 1), t0.plus(Duration::from_secs(30)))
                .unwrap();
        failed
            .fail(FailureReason::Timeout, t0.plus(Duration::from_secs(30)))
            .unwrap();

        for tx in [&late, &early, &failed] {
            repo.save_transaction(tx).await.unwrap();
        }

        let all = repo
            .load_history(&PortfolioId::new("pf-1"), HistoryRange::all())
            .await
            .unwrap();
        let ids: Vec<_> = all.iter().map(|t| t.id().clone()).collect();
        assert_eq!(ids, vec![early.id().clone(), failed.id().clone(), late.id().clone()]);

        let window = repo
            .load_history(
                &PortfolioId::new("pf-1"),
                HistoryRange::between(t0.plus(Duration::from_secs(1)), t0.plus(Duration::from_secs(30))),
            )
            .await
            .unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].id(), failed.id());
    }

    #[tokio::test]
    async fn failing_saves() {
        let repo = InMemoryTransactionRepository::new();
        repo.set_fail_saves(true);
        let err = repo
            .save_transaction(&completed("k", Timestamp::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Unavailable { .. }));
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn holdings_round_trip_through_portfolio() {
        let repo = InMemoryPortfolioRepository::new();
        let pid = PortfolioId::new("pf-1");
        repo.save_portfolio(&Portfolio::new(pid.clone(), OwnerId::new("o"), Currency::USD))
            .await
            .unwrap();
        let holding = Holding::new(Symbol::new("ABC"), Quantity::new(3), MoneyAmount::usd(dec!(7)));
        repo.save_holding(&pid, &holding).await.unwrap();

        // Re-saving metadata keeps holdings written separately.
        repo.save_portfolio(&Portfolio::new(pid.clone(), OwnerId::new("o"), Currency::USD))
            .await
            .unwrap();
        let loaded = repo.load_portfolio(&pid).await.unwrap().unwrap();
        assert_eq!(loaded.holding(&Symbol::new("ABC")), Some(&holding));

        repo.delete_holding(&pid, &Symbol::new("ABC")).await.unwrap();
        assert!(repo.load_holdings(&pid).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn holding_for_unknown_portfolio_is_an_error() {
        let repo = InMemoryPortfolioRepository::new();
        let holding = Holding::empty(Symbol::new("ABC"), Currency::USD);
        assert!(repo.save_holding(&PortfolioId::new("nope"), &holding).await.is_err());
    }

    #[tokio::test]
    async fn portfolios_by_owner() {
        let repo = InMemoryPortfolioRepository::new();
        for (id, owner) in [("pf-b", "alice"), ("pf-a", "alice"), ("pf-c", "bob")] {
            repo.save_portfolio(&Portfolio::new(id.into(), owner.into(), Currency::USD))
                .await
                .unwrap();
        }
        let owned = repo.portfolios_for_owner(&OwnerId::new("alice")).await.unwrap();
        let ids: Vec<_> = owned.iter().map(|p| p.id().as_str()).collect();
        assert_eq!(ids, vec!["pf-a", "pf-b"]);
    }

    #[tokio::test]
    async fn failing_writes() {
        let repo = InMemoryPortfolioRepository::new();
        repo.set_fail_writes(true);
        let err = repo
            .save_portfolio(&Portfolio::new("pf".into(), "o".into(), Currency::USD))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("offline"));
    }
}
