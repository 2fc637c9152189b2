//! Validation Bounded Context
//!
//! Structural and business-rule checks applied to a trade intent before a
//! transaction is created. Every rule is evaluated; a non-empty result is a
//! terminal rejection.

mod errors;
mod validator;

pub use errors::ValidationError;
pub use validator::{
    DEFAULT_IDEMPOTENCY_RETENTION, IdempotencyCheck, TransactionValidator, ValidationContext,
};
