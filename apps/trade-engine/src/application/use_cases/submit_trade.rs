//! Submit Trade Use Case
//!
//! Drives a trade intent through validation, pricing, fees and the holdings
//! commit, saving the terminal transaction.
//!
//! # Concurrency
//!
//! - Submissions sharing `(portfolio, idempotency key)` are serialised, so a
//!   retry of an in-flight intent waits and then replays its outcome.
//! - The holdings commit runs under a per-portfolio lock. The SELL quantity
//!   is re-checked there, in the same critical section as the holding write.
//! - Every submission carries a deadline. Once the portfolio lock is held
//!   the commit runs to completion.

use std::future::pending;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::application::services::{
    AggregationError, KeyedLocks, MarketPriceCache, PortfolioAggregator, PriceError,
};
use crate::domain::fees::{FeeError, FeeSchedule};
use crate::domain::portfolio::{HoldingError, PortfolioRepository};
use crate::domain::shared::{
    IdempotencyKey, MoneyAmount, MoneyError, PortfolioId, RepositoryError, Timestamp,
};
use crate::domain::transaction::{
    FailureReason, TradeIntent, Transaction, TransactionError, TransactionRepository,
};
use crate::domain::validation::{
    IdempotencyCheck, TransactionValidator, ValidationContext, ValidationError,
};
use crate::observability::{
    record_fee, record_replay, record_submit_latency, record_transaction_outcome,
    record_validation_rejection,
};

/// Default deadline for a submission.
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-call options.
#[derive(Debug, Clone, Default)]
pub struct SubmitOptions {
    /// Deadline for the whole submission; the use case default if `None`.
    pub timeout: Option<Duration>,
    /// Cancels the submission while it is RECEIVED or PRICING.
    pub cancellation: Option<CancellationToken>,
}

impl SubmitOptions {
    /// Options with an explicit deadline.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Self::default()
        }
    }

    /// Attach a cancellation token.
    #[must_use]
    pub fn cancellable(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}

/// Outcome of a submission that produced (or replayed) a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// The terminal transaction.
    pub transaction: Transaction,
    /// True if an earlier transaction with the same idempotency key was
    /// returned unchanged.
    pub replayed: bool,
    /// Realized gain of a completed SELL.
    pub realized_gain: Option<MoneyAmount>,
}

/// Submission errors. Business failures after acceptance (no price, timeout
/// while pricing, oversell at commit) are not errors: they come back as a
/// FAILED transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// The intent failed validation; no transaction was created.
    #[error("Trade intent rejected: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Rejected(Vec<ValidationError>),

    /// The deadline passed before the intent was accepted.
    #[error("Deadline exceeded before the intent was accepted")]
    Timeout,

    /// An illegal lifecycle transition was attempted.
    #[error(transparent)]
    Transition(#[from] TransactionError),

    /// Storage failed. Holdings are left as they were before the submission.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl SubmitError {
    /// Validation errors of a rejection.
    #[must_use]
    pub fn rejections(&self) -> &[ValidationError] {
        match self {
            Self::Rejected(errors) => errors,
            _ => &[],
        }
    }
}

/// Use case for submitting trade intents.
pub struct SubmitTradeUseCase<T, P>
where
    T: TransactionRepository,
    P: PortfolioRepository,
{
    transactions: Arc<T>,
    portfolios: Arc<P>,
    prices: MarketPriceCache,
    aggregator: PortfolioAggregator<P>,
    fees: FeeSchedule,
    validator: TransactionValidator,
    default_timeout: Duration,
    intent_locks: KeyedLocks<(PortfolioId, IdempotencyKey)>,
    portfolio_locks: KeyedLocks<PortfolioId>,
}

impl<T, P> SubmitTradeUseCase<T, P>
where
    T: TransactionRepository,
    P: PortfolioRepository,
{
    /// Create a new SubmitTradeUseCase.
    pub fn new(
        transactions: Arc<T>,
        portfolios: Arc<P>,
        prices: MarketPriceCache,
        fees: FeeSchedule,
        validator: TransactionValidator,
        default_timeout: Duration,
    ) -> Self {
        Self {
            aggregator: PortfolioAggregator::new(Arc::clone(&portfolios), prices.clone()),
            transactions,
            portfolios,
            prices,
            fees,
            validator,
            default_timeout,
            intent_locks: KeyedLocks::new(),
            portfolio_locks: KeyedLocks::new(),
        }
    }

    /// Fee schedule applied to trades.
    pub const fn fee_schedule(&self) -> &FeeSchedule {
        &self.fees
    }

    /// Submit a trade intent.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::Rejected`] with every violated rule if validation
    /// fails, [`SubmitError::Timeout`] if the deadline passes before the intent
    /// is accepted, and [`SubmitError::Repository`] if storage fails.
    #[tracing::instrument(
        skip(self, intent, options),
        fields(
            portfolio_id = %intent.portfolio_id(),
            symbol = %intent.symbol(),
            side = %intent.side(),
            quantity = intent.quantity(),
        )
    )]
    pub async fn execute(
        &self,
        intent: TradeIntent,
        options: SubmitOptions,
    ) -> Result<Submission, SubmitError> {
        let started = Instant::now();
        let deadline = tokio::time::Instant::now()
            + options.timeout.unwrap_or(self.default_timeout);

        let result = self
            .run(intent, options.cancellation.as_ref(), deadline)
            .await;

        let outcome = match &result {
            Ok(submission) if submission.replayed => "replayed",
            Ok(submission) => submission.transaction.state().as_str(),
            Err(SubmitError::Rejected(_)) => "rejected",
            Err(SubmitError::Timeout) => "timeout",
            Err(_) => "error",
        };
        record_submit_latency(outcome, started.elapsed().as_secs_f64());
        result
    }

    async fn run(
        &self,
        intent: TradeIntent,
        cancellation: Option<&CancellationToken>,
        deadline: tokio::time::Instant,
    ) -> Result<Submission, SubmitError> {
        let portfolio_id = intent.portfolio_id().clone();
        let lock_key = (portfolio_id.clone(), intent.idempotency_key().clone());
        let _intent_guard = tokio::time::timeout_at(deadline, self.intent_locks.acquire(lock_key))
            .await
            .map_err(|_| SubmitError::Timeout)?;

        // Replay and validation
        let now = Timestamp::now();
        let prior = self
            .transactions
            .find_by_idempotency_key(&portfolio_id, intent.idempotency_key())
            .await?;
        if let IdempotencyCheck::Replay(existing) =
            self.validator.check_idempotency(&intent, prior.as_ref(), now)
        {
            record_replay();
            info!(transaction_id = %existing.id(), state = %existing.state(), "Replaying resolved intent");
            return Ok(Submission {
                transaction: existing.clone(),
                replayed: true,
                realized_gain: None,
            });
        }

        let portfolio = self.portfolios.load_portfolio(&portfolio_id).await?;
        let errors = self.validator.validate(
            &intent,
            &ValidationContext {
                portfolio: portfolio.as_ref(),
                prior: prior.as_ref(),
                now,
            },
        );
        let Some(portfolio) = portfolio.filter(|_| errors.is_empty()) else {
            for e in &errors {
                record_validation_rejection(e.rule());
            }
            warn!(rules = ?errors.iter().map(ValidationError::rule).collect::<Vec<_>>(), "Intent rejected");
            return Err(SubmitError::Rejected(errors));
        };

        let mut tx = Transaction::receive(intent, now)?;
        tx.begin_pricing(Timestamp::now())?;
        info!(transaction_id = %tx.id(), "Transaction accepted");

        // Pricing
        let priced = tokio::select! {
            biased;
            () = cancelled(cancellation) => None,
            result = self.prices.get_price_until(tx.symbol(), deadline) => Some(result),
        };
        let price = match priced {
            None => {
                tx.cancel(Timestamp::now())?;
                info!(transaction_id = %tx.id(), "Transaction cancelled");
                return self.finish(tx, None).await;
            }
            Some(Ok(price)) => price,
            Some(Err(PriceError::Timeout { .. })) => {
                return self.fail(tx, FailureReason::Timeout).await;
            }
            Some(Err(e @ PriceError::PriceUnavailable { .. })) => {
                return self
                    .fail(tx, FailureReason::NoPrice { message: e.to_string() })
                    .await;
            }
        };

        let unit = price.unit();
        if let Err(MoneyError::CurrencyMismatch { left, right }) =
            unit.ensure_currency(portfolio.base_currency())
        {
            return self
                .fail(
                    tx,
                    FailureReason::CurrencyMismatch {
                        expected: right,
                        actual: left,
                    },
                )
                .await;
        }
        let notional = match unit.mul_units(tx.quantity()) {
            Ok(notional) => notional,
            Err(e) => {
                return self
                    .fail(tx, FailureReason::Invariant { message: e.to_string() })
                    .await;
            }
        };
        let fee = match self.fees.compute_fee(&notional) {
            Ok(fee) => fee,
            Err(e) => return self.fail(tx, fee_failure(e)).await,
        };
        tx.record_pricing(price, notional, fee, Timestamp::now())?;
        record_fee(fee.currency().as_str(), fee.amount());

        // Commit
        let Ok(_portfolio_guard) =
            tokio::time::timeout_at(deadline, self.portfolio_locks.acquire(portfolio_id.clone()))
                .await
        else {
            return self.fail(tx, FailureReason::Timeout).await;
        };
        self.commit(&portfolio_id, tx).await
    }

    /// Apply the holding update, complete and save. Runs under the portfolio lock.
    async fn commit(
        &self,
        portfolio_id: &PortfolioId,
        mut tx: Transaction,
    ) -> Result<Submission, SubmitError> {
        let update = match self
            .aggregator
            .apply_completed_transaction(portfolio_id, &tx)
            .await
        {
            Ok(update) => update,
            Err(AggregationError::Repository(e)) => {
                let reason = FailureReason::Repository { message: e.to_string() };
                tx.fail(reason, Timestamp::now())?;
                if let Err(save_err) = self.transactions.save_transaction(&tx).await {
                    error!(transaction_id = %tx.id(), error = %save_err, "Failed to record failed transaction");
                }
                record_transaction_outcome(tx.state().as_str(), tx.side().as_str());
                return Err(SubmitError::Repository(e));
            }
            Err(e) => return self.fail(tx, aggregation_failure(e)).await,
        };

        let completed = tx.complete(Timestamp::now());
        let saved = match completed {
            Ok(()) => self
                .transactions
                .save_transaction(&tx)
                .await
                .map_err(SubmitError::from),
            Err(e) => Err(SubmitError::from(e)),
        };
        if let Err(e) = saved {
            error!(transaction_id = %tx.id(), error = %e, "Commit failed; restoring holding");
            if let Err(revert_err) = self.aggregator.revert(portfolio_id, &update).await {
                error!(
                    transaction_id = %tx.id(),
                    symbol = %update.holding.symbol(),
                    error = %revert_err,
                    "Holding restore failed"
                );
            }
            return Err(e);
        }

        record_transaction_outcome(tx.state().as_str(), tx.side().as_str());
        info!(
            transaction_id = %tx.id(),
            quantity = %update.holding.quantity(),
            "Transaction completed"
        );
        Ok(Submission {
            transaction: tx,
            replayed: false,
            realized_gain: update.realized_gain,
        })
    }

    async fn fail(
        &self,
        mut tx: Transaction,
        reason: FailureReason,
    ) -> Result<Submission, SubmitError> {
        warn!(transaction_id = %tx.id(), reason = reason.as_str(), detail = %reason, "Transaction failed");
        tx.fail(reason, Timestamp::now())?;
        self.finish(tx, None).await
    }

    async fn finish(
        &self,
        tx: Transaction,
        realized_gain: Option<MoneyAmount>,
    ) -> Result<Submission, SubmitError> {
        self.transactions.save_transaction(&tx).await?;
        record_transaction_outcome(tx.state().as_str(), tx.side().as_str());
        Ok(Submission {
            transaction: tx,
            replayed: false,
            realized_gain,
        })
    }
}

async fn cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => pending().await,
    }
}

fn fee_failure(e: FeeError) -> FailureReason {
    match e {
        FeeError::Money(MoneyError::CurrencyMismatch { left, right }) => {
            FailureReason::CurrencyMismatch {
                expected: right,
                actual: left,
            }
        }
        other => FailureReason::Fee {
            message: other.to_string(),
        },
    }
}

fn aggregation_failure(e: AggregationError) -> FailureReason {
    match e {
        AggregationError::Holding(HoldingError::InsufficientHoldings {
            held, requested, ..
        }) => FailureReason::InsufficientHoldings { held, requested },
        AggregationError::Holding(HoldingError::Money(MoneyError::CurrencyMismatch {
            left,
            right,
        })) => FailureReason::CurrencyMismatch {
            expected: left,
            actual: right,
        },
        other => FailureReason::Invariant {
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::{PriceCacheConfig, RetryPolicy};
    use crate::domain::market_data::Price;
    use crate::domain::portfolio::{Holding, Portfolio};
    use crate::domain::shared::{Currency, OwnerId, Quantity, Symbol};
    use crate::domain::transaction::{TradeSide, TransactionState};
    use crate::infrastructure::persistence::{
        InMemoryPortfolioRepository, InMemoryTransactionRepository,
    };
    use crate::infrastructure::price_feed::MockPriceSource;
    use rust_decimal_macros::dec;

    struct Harness {
        source: Arc<MockPriceSource>,
        transactions: Arc<InMemoryTransactionRepository>,
        portfolios: Arc<InMemoryPortfolioRepository>,
        use_case: SubmitTradeUseCase<InMemoryTransactionRepository, InMemoryPortfolioRepository>,
    }

    async fn harness() -> Harness {
        let source = Arc::new(MockPriceSource::new().with_price("ABC", MoneyAmount::usd(dec!(100))));
        let transactions = Arc::new(InMemoryTransactionRepository::new());
        let portfolios = Arc::new(InMemoryPortfolioRepository::new());
        portfolios
            .save_portfolio(&Portfolio::new("pf-1".into(), OwnerId::new("o"), Currency::USD))
            .await
            .unwrap();
        let config = PriceCacheConfig {
            fetch_timeout: Duration::from_millis(200),
            retry: RetryPolicy {
                initial_backoff: Duration::from_millis(1),
                jitter_factor: 0.0,
                ..RetryPolicy::default()
            },
            ..PriceCacheConfig::default()
        };
        let prices = MarketPriceCache::new(source.clone(), config);
        let use_case = SubmitTradeUseCase::new(
            transactions.clone(),
            portfolios.clone(),
            prices,
            FeeSchedule::standard(Currency::USD),
            TransactionValidator::default(),
            DEFAULT_SUBMIT_TIMEOUT,
        );
        Harness {
            source,
            transactions,
            portfolios,
            use_case,
        }
    }

    async fn held(h: &Harness) -> Option<Holding> {
        h.portfolios
            .load_holding(&PortfolioId::new("pf-1"), &Symbol::new("ABC"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn buy_completes_with_fee_and_holding() {
        let h = harness().await;
        let submission = h
            .use_case
            .execute(TradeIntent::buy("pf-1", "k-1", "ABC", 10), SubmitOptions::default())
            .await
            .unwrap();

        let tx = &submission.transaction;
        assert!(!submission.replayed);
        assert_eq!(tx.state(), TransactionState::Completed);
        assert_eq!(tx.notional().unwrap().amount(), dec!(1000));
        assert_eq!(tx.fee().unwrap().amount(), dec!(10.00));
        assert!(tx.executed_at().is_some());
        let states: Vec<_> = tx.history().iter().map(|c| c.state).collect();
        assert_eq!(
            states,
            vec![
                TransactionState::Received,
                TransactionState::Pricing,
                TransactionState::FeeCalculated,
                TransactionState::Completed,
            ]
        );

        let holding = held(&h).await.unwrap();
        assert_eq!(holding.quantity(), Quantity::new(10));
        assert_eq!(holding.average_cost().amount(), dec!(100));
        assert_eq!(h.transactions.len(), 1);
    }

    #[tokio::test]
    async fn sell_without_holding_is_rejected() {
        let h = harness().await;
        let err = h
            .use_case
            .execute(TradeIntent::sell("pf-1", "k-1", "ABC", 10), SubmitOptions::default())
            .await
            .unwrap_err();
        assert_eq!(
            err.rejections(),
            &[ValidationError::InsufficientHoldings {
                held: Quantity::ZERO,
                requested: Quantity::new(10),
            }]
        );
        assert!(h.transactions.is_empty());
    }

    #[tokio::test]
    async fn all_rules_are_reported() {
        let h = harness().await;
        let err = h
            .use_case
            .execute(TradeIntent::buy("nope", "k-1", "1BAD", 0), SubmitOptions::default())
            .await
            .unwrap_err();
        let rules: Vec<_> = err.rejections().iter().map(ValidationError::rule).collect();
        assert_eq!(rules, vec!["INVALID_SYMBOL", "INVALID_QUANTITY", "UNKNOWN_PORTFOLIO"]);
    }

    #[tokio::test]
    async fn replay_returns_same_transaction_without_second_effect() {
        let h = harness().await;
        let intent = TradeIntent::buy("pf-1", "k-1", "ABC", 10);
        let first = h
            .use_case
            .execute(intent.clone(), SubmitOptions::default())
            .await
            .unwrap();
        let second = h
            .use_case
            .execute(intent, SubmitOptions::default())
            .await
            .unwrap();

        assert!(second.replayed);
        assert_eq!(second.transaction, first.transaction);
        assert_eq!(held(&h).await.unwrap().quantity(), Quantity::new(10));
        assert_eq!(h.source.calls(), 1);
    }

    #[tokio::test]
    async fn key_reuse_with_different_trade_is_duplicate() {
        let h = harness().await;
        h.use_case
            .execute(TradeIntent::buy("pf-1", "k-1", "ABC", 10), SubmitOptions::default())
            .await
            .unwrap();
        let err = h
            .use_case
            .execute(TradeIntent::buy("pf-1", "k-1", "ABC", 11), SubmitOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.rejections()[0].rule(), "DUPLICATE_INTENT");
    }

    #[tokio::test]
    async fn no_price_fails_transaction() {
        let h = harness().await;
        h.source.set_fail_always(true);
        let submission = h
            .use_case
            .execute(TradeIntent::buy("pf-1", "k-1", "ABC", 1), SubmitOptions::default())
            .await
            .unwrap();

        let tx = submission.transaction;
        assert_eq!(tx.state(), TransactionState::Failed);
        assert!(matches!(tx.failure(), Some(FailureReason::NoPrice { .. })));
        assert_eq!(h.source.calls(), 3);
        assert!(held(&h).await.is_none());
        assert_eq!(h.transactions.len(), 1);
    }

    #[tokio::test]
    async fn deadline_while_pricing_fails_with_timeout() {
        let h = harness().await;
        h.source.set_latency(Duration::from_millis(150));
        let submission = h
            .use_case
            .execute(
                TradeIntent::buy("pf-1", "k-1", "ABC", 1),
                SubmitOptions::with_timeout(Duration::from_millis(20)),
            )
            .await
            .unwrap();
        let tx = submission.transaction;
        assert_eq!(tx.failure(), Some(&FailureReason::Timeout));
        assert!(tx.failure().unwrap().is_retryable());
    }

    #[tokio::test]
    async fn cancellation_during_pricing() {
        let h = harness().await;
        h.source.set_latency(Duration::from_millis(150));
        let token = CancellationToken::new();
        let cancel = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cancel.cancel();
        });

        let submission = h
            .use_case
            .execute(
                TradeIntent::buy("pf-1", "k-1", "ABC", 1),
                SubmitOptions::default().cancellable(token),
            )
            .await
            .unwrap();
        assert_eq!(submission.transaction.state(), TransactionState::Cancelled);
        assert!(held(&h).await.is_none());
    }

    #[tokio::test]
    async fn cancelled_key_cannot_be_reused_within_retention() {
        let h = harness().await;
        let token = CancellationToken::new();
        token.cancel();
        let intent = TradeIntent::buy("pf-1", "k-1", "ABC", 1);
        let first = h
            .use_case
            .execute(intent.clone(), SubmitOptions::default().cancellable(token))
            .await
            .unwrap();
        assert_eq!(first.transaction.state(), TransactionState::Cancelled);

        let err = h
            .use_case
            .execute(intent, SubmitOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.rejections()[0].rule(), "DUPLICATE_INTENT");
    }

    #[tokio::test]
    async fn sell_reports_realized_gain() {
        let h = harness().await;
        h.use_case
            .execute(TradeIntent::buy("pf-1", "k-1", "ABC", 10), SubmitOptions::default())
            .await
            .unwrap();
        // Seed a new price directly; the cached 100 is still fresh otherwise.
        h.use_case
            .prices
            .prime(Price::new(Symbol::new("ABC"), MoneyAmount::usd(dec!(120)), Timestamp::now()));

        let submission = h
            .use_case
            .execute(TradeIntent::sell("pf-1", "k-2", "ABC", 4), SubmitOptions::default())
            .await
            .unwrap();
        assert_eq!(submission.transaction.side(), TradeSide::Sell);
        assert_eq!(submission.realized_gain.map(|g| g.amount()), Some(dec!(80)));
        assert_eq!(held(&h).await.unwrap().quantity(), Quantity::new(6));
    }

    #[tokio::test]
    async fn failed_transaction_save_restores_holding() {
        let h = harness().await;
        h.use_case
            .execute(TradeIntent::buy("pf-1", "k-1", "ABC", 10), SubmitOptions::default())
            .await
            .unwrap();
        let before = held(&h).await;

        h.transactions.set_fail_saves(true);
        let err = h
            .use_case
            .execute(TradeIntent::buy("pf-1", "k-2", "ABC", 5), SubmitOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Repository(_)));
        assert_eq!(held(&h).await, before);
    }

    #[tokio::test]
    async fn failed_first_buy_save_removes_holding() {
        let h = harness().await;
        h.transactions.set_fail_saves(true);
        let err = h
            .use_case
            .execute(TradeIntent::buy("pf-1", "k-1", "ABC", 5), SubmitOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Repository(_)));
        assert!(held(&h).await.is_none());
    }

    #[tokio::test]
    async fn holding_write_failure_is_recorded() {
        let h = harness().await;
        h.portfolios.set_fail_writes(true);
        let err = h
            .use_case
            .execute(TradeIntent::buy("pf-1", "k-1", "ABC", 5), SubmitOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Repository(_)));

        let recorded = h
            .transactions
            .find_by_idempotency_key(&PortfolioId::new("pf-1"), &IdempotencyKey::new("k-1"))
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(
            recorded.failure(),
            Some(FailureReason::Repository { .. })
        ));
    }

    #[tokio::test]
    async fn price_in_foreign_currency_fails() {
        let h = harness().await;
        h.source.set_price("ABC", MoneyAmount::new(dec!(100), Currency::EUR));
        let submission = h
            .use_case
            .execute(TradeIntent::buy("pf-1", "k-1", "ABC", 1), SubmitOptions::default())
            .await
            .unwrap();
        assert_eq!(
            submission.transaction.failure(),
            Some(&FailureReason::CurrencyMismatch {
                expected: Currency::USD,
                actual: Currency::EUR,
            })
        );
    }
}
