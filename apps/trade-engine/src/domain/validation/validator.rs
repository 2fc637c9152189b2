//! Trade intent validation.

use std::time::Duration;

use super::ValidationError;
use crate::domain::portfolio::Portfolio;
use crate::domain::shared::{DomainError, MAX_IDEMPOTENCY_KEY_LEN, Quantity, Timestamp};
use crate::domain::transaction::{TradeIntent, TradeSide, Transaction, TransactionState};

/// Default idempotency retention window (24 h).
pub const DEFAULT_IDEMPOTENCY_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

/// Snapshot of state an intent is validated against.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    /// Target portfolio with its holdings, if it exists.
    pub portfolio: Option<&'a Portfolio>,
    /// Transaction the intent's idempotency key already resolved to, if any.
    pub prior: Option<&'a Transaction>,
    /// Evaluation time.
    pub now: Timestamp,
}

/// How an intent relates to an earlier use of its idempotency key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdempotencyCheck<'a> {
    /// Key unused, or last used outside the retention window.
    Fresh,
    /// Same trade already resolved to COMPLETED or FAILED; return it unchanged.
    Replay(&'a Transaction),
    /// Key in use within retention and the earlier outcome cannot be replayed.
    Duplicate(ValidationError),
}

/// Structural and business-rule validation of trade intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionValidator {
    idempotency_retention: Duration,
}

impl TransactionValidator {
    /// Create a validator with the given idempotency retention window.
    #[must_use]
    pub const fn new(idempotency_retention: Duration) -> Self {
        Self {
            idempotency_retention,
        }
    }

    /// Retention window for idempotency keys.
    #[must_use]
    pub const fn idempotency_retention(&self) -> Duration {
        self.idempotency_retention
    }

    /// Check every rule and return all violations. Empty means valid.
    #[must_use]
    pub fn validate(&self, intent: &TradeIntent, ctx: &ValidationContext<'_>) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if let Err(e) = intent.symbol().validate() {
            let message = match e {
                DomainError::InvalidValue { message, .. } => message,
                other => other.to_string(),
            };
            errors.push(ValidationError::InvalidSymbol {
                symbol: intent.symbol().to_string(),
                message,
            });
        }

        let quantity = Quantity::from_positive(intent.quantity());
        if quantity.is_none() {
            errors.push(ValidationError::InvalidQuantity {
                quantity: intent.quantity(),
            });
        }

        if !intent.idempotency_key().is_well_formed() {
            errors.push(ValidationError::InvalidIdempotencyKey {
                message: format!("must be non-blank and at most {MAX_IDEMPOTENCY_KEY_LEN} bytes"),
            });
        }

        match ctx.portfolio {
            None => errors.push(ValidationError::UnknownPortfolio {
                portfolio_id: intent.portfolio_id().clone(),
            }),
            Some(portfolio) => {
                if let (TradeSide::Sell, Some(requested)) = (intent.side(), quantity) {
                    let held = portfolio
                        .holding(intent.symbol())
                        .map_or(Quantity::ZERO, |h| h.quantity());
                    if requested > held {
                        errors.push(ValidationError::InsufficientHoldings { held, requested });
                    }
                }
            }
        }

        if let IdempotencyCheck::Duplicate(e) = self.check_idempotency(intent, ctx.prior, ctx.now) {
            errors.push(e);
        }

        errors
    }

    /// Classify an intent against the transaction its key last resolved to.
    #[must_use]
    pub fn check_idempotency<'a>(
        &self,
        intent: &TradeIntent,
        prior: Option<&'a Transaction>,
        now: Timestamp,
    ) -> IdempotencyCheck<'a> {
        let Some(prior) = prior else {
            return IdempotencyCheck::Fresh;
        };
        if prior.portfolio_id() != intent.portfolio_id()
            || now.elapsed_since(prior.received_at()) > self.idempotency_retention
        {
            return IdempotencyCheck::Fresh;
        }

        let duplicate = |message: &str| {
            IdempotencyCheck::Duplicate(ValidationError::DuplicateIntent {
                key: intent.idempotency_key().clone(),
                existing: prior.id().clone(),
                message: message.to_string(),
            })
        };

        if !prior.intent().same_trade_as(intent) {
            return duplicate("key reused with a different symbol, side or quantity");
        }

        match prior.state() {
            TransactionState::Completed | TransactionState::Failed => IdempotencyCheck::Replay(prior),
            TransactionState::Cancelled => duplicate("earlier transaction was cancelled"),
            _ => duplicate("earlier transaction is still in progress"),
        }
    }
}

impl Default for TransactionValidator {
    fn default() -> Self {
        Self::new(DEFAULT_IDEMPOTENCY_RETENTION)
    }
}
