//! Shared Value Objects
//!
//! Immutable domain types used across bounded contexts.
//! Value objects are compared by value, not identity.

mod identifiers;
mod money;
mod quantity;
mod symbol;
mod timestamp;

pub use identifiers::{IdempotencyKey, MAX_IDEMPOTENCY_KEY_LEN, OwnerId, PortfolioId, TransactionId};
pub use money::{CURRENCY_DECIMAL_PLACES, Currency, MoneyAmount};
pub use quantity::Quantity;
pub use symbol::{MAX_SYMBOL_LEN, Symbol};
pub use timestamp::Timestamp;
