//! Engine-wide error taxonomy.
//!
//! Each bounded context reports its own `thiserror` enum. At the engine
//! boundary they fold into an [`EngineError`] carrying a stable [`ErrorCode`]
//! and one of four categories:
//!
//! | Category | Codes | Effect |
//! |----------|-------|--------|
//! | Rejection | validation rules | returned to the caller, no state created |
//! | Transient | `TIMEOUT`, `PRICE_UNAVAILABLE`, `VALUATION_INCOMPLETE` | FAILED transaction with recorded cause |
//! | Invariant violation | `CURRENCY_MISMATCH`, `INVALID_TRANSITION`, ... | enclosing operation fails, nothing partially applied |
//! | Fatal | `REPOSITORY_UNAVAILABLE`, `INTERNAL_ERROR` | propagated |
//!
//! Only `TIMEOUT` is retryable, and only with a fresh idempotency key.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::services::{AggregationError, PriceError, ValuationError};
use crate::application::use_cases::SubmitError;
use crate::domain::fees::FeeError;
use crate::domain::portfolio::HoldingError;
use crate::domain::shared::{MoneyError, RepositoryError};
use crate::domain::transaction::{FailureReason, TransactionError};
use crate::domain::validation::ValidationError;

/// Error codes for the trade engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Rejections
    /// Symbol empty or malformed.
    InvalidSymbol,
    /// Quantity not a positive integer.
    InvalidQuantity,
    /// Idempotency key blank or too long.
    InvalidIdempotencyKey,
    /// Portfolio not found.
    UnknownPortfolio,
    /// SELL exceeds the held quantity.
    InsufficientHoldings,
    /// Idempotency key reused and not replayable.
    DuplicateIntent,

    // Transient
    /// Deadline exceeded.
    Timeout,
    /// No usable market price.
    PriceUnavailable,
    /// A holding could not be priced during valuation.
    ValuationIncomplete,

    // Invariant violations
    /// Operands in different currencies.
    CurrencyMismatch,
    /// Illegal lifecycle transition.
    InvalidTransition,
    /// Fee could not be computed.
    FeeCalculation,
    /// Decimal overflow or another broken internal invariant.
    InvariantViolation,

    // Fatal
    /// Storage unreachable or write not durable.
    RepositoryUnavailable,
    /// Unexpected internal error.
    InternalError,
}

/// Broad handling class of an [`ErrorCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    /// Input rejected before any state was created.
    Rejection,
    /// Environmental condition; the transaction is FAILED with its cause.
    Transient,
    /// Internal consistency check failed.
    InvariantViolation,
    /// Infrastructure failure.
    Fatal,
}

impl ErrorCode {
    /// Handling class.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidSymbol
            | Self::InvalidQuantity
            | Self::InvalidIdempotencyKey
            | Self::UnknownPortfolio
            | Self::InsufficientHoldings
            | Self::DuplicateIntent => ErrorCategory::Rejection,

            Self::Timeout | Self::PriceUnavailable | Self::ValuationIncomplete => {
                ErrorCategory::Transient
            }

            Self::CurrencyMismatch
            | Self::InvalidTransition
            | Self::FeeCalculation
            | Self::InvariantViolation => ErrorCategory::InvariantViolation,

            Self::RepositoryUnavailable | Self::InternalError => ErrorCategory::Fatal,
        }
    }

    /// Returns true if the caller may retry (with a fresh idempotency key).
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Stable reason string.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidSymbol => "INVALID_SYMBOL",
            Self::InvalidQuantity => "INVALID_QUANTITY",
            Self::InvalidIdempotencyKey => "INVALID_IDEMPOTENCY_KEY",
            Self::UnknownPortfolio => "UNKNOWN_PORTFOLIO",
            Self::InsufficientHoldings => "INSUFFICIENT_HOLDINGS",
            Self::DuplicateIntent => "DUPLICATE_INTENT",
            Self::Timeout => "TIMEOUT",
            Self::PriceUnavailable => "PRICE_UNAVAILABLE",
            Self::ValuationIncomplete => "VALUATION_INCOMPLETE",
            Self::CurrencyMismatch => "CURRENCY_MISMATCH",
            Self::InvalidTransition => "INVALID_TRANSITION",
            Self::FeeCalculation => "FEE_CALCULATION",
            Self::InvariantViolation => "INVARIANT_VIOLATION",
            Self::RepositoryUnavailable => "REPOSITORY_UNAVAILABLE",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// An error with a stable code and context for the trade engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct EngineError {
    code: ErrorCode,
    message: String,
    context: Vec<(String, String)>,
}

impl EngineError {
    /// Create a new engine error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    /// Add context to the error.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.push((key.into(), value.into()));
        self
    }

    /// Get the error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Get the handling class.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// Returns true if the caller may retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }

    /// Get the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the context.
    #[must_use]
    pub fn context(&self) -> &[(String, String)] {
        &self.context
    }

    /// Serializable form for transport layers.
    #[must_use]
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.code,
            category: self.category(),
            message: self.message.clone(),
            retryable: self.is_retryable(),
            details: self.context.iter().cloned().collect(),
        }
    }

    /// Error describing the recorded cause of a FAILED transaction.
    #[must_use]
    pub fn from_failure(reason: &FailureReason) -> Self {
        let code = match reason {
            FailureReason::NoPrice { .. } => ErrorCode::PriceUnavailable,
            FailureReason::Timeout => ErrorCode::Timeout,
            FailureReason::InsufficientHoldings { .. } => ErrorCode::InsufficientHoldings,
            FailureReason::CurrencyMismatch { .. } => ErrorCode::CurrencyMismatch,
            FailureReason::Fee { .. } => ErrorCode::FeeCalculation,
            FailureReason::Repository { .. } => ErrorCode::RepositoryUnavailable,
            FailureReason::Invariant { .. } => ErrorCode::InvariantViolation,
        };
        Self::new(code, reason.to_string())
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.reason(), self.message)
    }
}

/// Serializable error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code.
    pub code: ErrorCode,
    /// Handling class.
    pub category: ErrorCategory,
    /// Human-readable message.
    pub message: String,
    /// Whether a retry may succeed.
    pub retryable: bool,
    /// Additional details.
    pub details: std::collections::BTreeMap<String, String>,
}

impl From<ValidationError> for EngineError {
    fn from(e: ValidationError) -> Self {
        let code = match &e {
            ValidationError::InvalidSymbol { .. } => ErrorCode::InvalidSymbol,
            ValidationError::InvalidQuantity { .. } => ErrorCode::InvalidQuantity,
            ValidationError::InvalidIdempotencyKey { .. } => ErrorCode::InvalidIdempotencyKey,
            ValidationError::UnknownPortfolio { .. } => ErrorCode::UnknownPortfolio,
            ValidationError::InsufficientHoldings { .. } => ErrorCode::InsufficientHoldings,
            ValidationError::DuplicateIntent { .. } => ErrorCode::DuplicateIntent,
        };
        let error = Self::new(code, e.to_string());
        match e {
            ValidationError::DuplicateIntent { existing, .. } => {
                error.with_context("existing_transaction_id", existing.as_str())
            }
            ValidationError::UnknownPortfolio { portfolio_id } => {
                error.with_context("portfolio_id", portfolio_id.as_str())
            }
            _ => error,
        }
    }
}

impl From<SubmitError> for EngineError {
    fn from(e: SubmitError) -> Self {
        match e {
            SubmitError::Rejected(errors) => {
                let message = joined_messages(&errors);
                let mut codes = errors.into_iter().map(Self::from);
                match codes.next() {
                    Some(first) => codes.fold(
                        Self::new(first.code, message).with_context("rule", first.code.reason()),
                        |acc, next| acc.with_context("rule", next.code.reason()),
                    ),
                    None => Self::new(ErrorCode::InternalError, "empty rejection"),
                }
            }
            SubmitError::Timeout => Self::new(ErrorCode::Timeout, "deadline exceeded"),
            SubmitError::Transition(e) => e.into(),
            SubmitError::Repository(e) => e.into(),
        }
    }
}

fn joined_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<TransactionError> for EngineError {
    fn from(e: TransactionError) -> Self {
        let code = match e {
            TransactionError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            TransactionError::InvalidParameters { .. } => ErrorCode::InvalidQuantity,
        };
        Self::new(code, e.to_string())
    }
}

impl From<RepositoryError> for EngineError {
    fn from(e: RepositoryError) -> Self {
        Self::new(ErrorCode::RepositoryUnavailable, e.to_string())
    }
}

impl From<MoneyError> for EngineError {
    fn from(e: MoneyError) -> Self {
        let code = match e {
            MoneyError::CurrencyMismatch { .. } => ErrorCode::CurrencyMismatch,
            MoneyError::InvalidQuantity { .. } | MoneyError::Overflow { .. } => {
                ErrorCode::InvariantViolation
            }
        };
        Self::new(code, e.to_string())
    }
}

impl From<FeeError> for EngineError {
    fn from(e: FeeError) -> Self {
        match e {
            FeeError::Money(m) => m.into(),
            other => Self::new(ErrorCode::FeeCalculation, other.to_string()),
        }
    }
}

impl From<HoldingError> for EngineError {
    fn from(e: HoldingError) -> Self {
        match e {
            HoldingError::InsufficientHoldings { ref symbol, .. } => {
                let symbol = symbol.to_string();
                Self::new(ErrorCode::InsufficientHoldings, e.to_string()).with_context("symbol", symbol)
            }
            HoldingError::QuantityOverflow { .. } => {
                Self::new(ErrorCode::InvariantViolation, e.to_string())
            }
            HoldingError::Money(m) => m.into(),
        }
    }
}

impl From<PriceError> for EngineError {
    fn from(e: PriceError) -> Self {
        let (code, symbol) = match &e {
            PriceError::PriceUnavailable { symbol, .. } => (ErrorCode::PriceUnavailable, symbol),
            PriceError::Timeout { symbol } => (ErrorCode::Timeout, symbol),
        };
        let symbol = symbol.to_string();
        Self::new(code, e.to_string()).with_context("symbol", symbol)
    }
}

impl From<AggregationError> for EngineError {
    fn from(e: AggregationError) -> Self {
        match e {
            AggregationError::NotPriced { transaction_id } => Self::new(
                ErrorCode::InvariantViolation,
                format!("transaction {transaction_id} has not been priced"),
            ),
            AggregationError::UnknownPortfolio { portfolio_id } => Self::new(
                ErrorCode::UnknownPortfolio,
                format!("unknown portfolio {portfolio_id}"),
            ),
            AggregationError::Holding(h) => h.into(),
            AggregationError::Repository(r) => r.into(),
        }
    }
}

impl From<ValuationError> for EngineError {
    fn from(e: ValuationError) -> Self {
        match e {
            ValuationError::ValuationIncomplete { ref symbols } => {
                let symbols: Vec<_> = symbols.iter().map(|s| s.as_str().to_string()).collect();
                Self::new(ErrorCode::ValuationIncomplete, e.to_string())
                    .with_context("symbols", symbols.join(","))
            }
            ValuationError::UnknownPortfolio { portfolio_id } => Self::new(
                ErrorCode::UnknownPortfolio,
                format!("unknown portfolio {portfolio_id}"),
            ),
            ValuationError::Holding(h) => h.into(),
            ValuationError::Money(m) => m.into(),
            ValuationError::Repository(r) => r.into(),
        }
    }
}
