//! Shared Domain Types
//!
//! Value objects and errors shared across bounded contexts.

pub mod errors;
pub mod value_objects;

pub use errors::{DomainError, MoneyError, RepositoryError};
pub use value_objects::{
    CURRENCY_DECIMAL_PLACES, Currency, IdempotencyKey, MAX_IDEMPOTENCY_KEY_LEN, MAX_SYMBOL_LEN,
    MoneyAmount, OwnerId, PortfolioId, Quantity, Symbol, Timestamp, TransactionId,
};
