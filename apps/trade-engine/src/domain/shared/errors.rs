//! Domain errors shared across bounded contexts.

use std::fmt;

use thiserror::Error;

use super::value_objects::Currency;

/// Domain-level errors that can occur in business logic.
///
/// These errors are independent of infrastructure concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid value for a field.
    InvalidValue {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },

    /// Business rule violation.
    BusinessRuleViolation {
        /// Rule name or code.
        rule: String,
        /// Description of the violation.
        message: String,
    },

    /// Aggregate invariant violated.
    InvariantViolation {
        /// Aggregate type.
        aggregate: String,
        /// Invariant that was violated.
        invariant: String,
        /// Current state description.
        state: String,
    },
}

impl DomainError {
    /// Shorthand for an [`DomainError::InvalidValue`].
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue { field, message } => {
                write!(f, "Invalid value for '{field}': {message}")
            }
            Self::BusinessRuleViolation { rule, message } => {
                write!(f, "Business rule '{rule}' violated: {message}")
            }
            Self::InvariantViolation {
                aggregate,
                invariant,
                state,
            } => {
                write!(
                    f,
                    "Invariant violation in {aggregate}: {invariant} (state: {state})"
                )
            }
        }
    }
}

impl std::error::Error for DomainError {}

/// Errors raised by [`MoneyAmount`](super::MoneyAmount) arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// The two operands are denominated in different currencies.
    #[error("Currency mismatch: {left} vs {right}")]
    CurrencyMismatch {
        /// Currency of the left operand.
        left: Currency,
        /// Currency of the right operand.
        right: Currency,
    },

    /// A quantity-scaled operation received a negative or zero divisor quantity.
    #[error("Invalid quantity for monetary operation: {quantity}")]
    InvalidQuantity {
        /// The offending quantity.
        quantity: i64,
    },

    /// The result does not fit in a 96-bit decimal.
    #[error("Decimal overflow during {operation}")]
    Overflow {
        /// Operation that overflowed.
        operation: &'static str,
    },
}

/// Errors returned by repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// The store could not be reached or the write was not made durable.
    #[error("Repository unavailable: {message}")]
    Unavailable {
        /// Adapter-specific detail.
        message: String,
    },
}

impl RepositoryError {
    /// Shorthand for [`RepositoryError::Unavailable`].
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_error_display() {
        let err = RepositoryError::unavailable("disk full");
        assert_eq!(err.to_string(), "Repository unavailable: disk full");
    }

    #[test]
    fn domain_error_invalid_value_display() {
        let err = DomainError::invalid_value("quantity", "must be positive");
        let msg = format!("{err}");
        assert!(msg.contains("quantity"));
        assert!(msg.contains("positive"));
    }

    #[test]
    fn domain_error_business_rule_display() {
        let err = DomainError::BusinessRuleViolation {
            rule: "NO_SHORT_SELLING".to_string(),
            message: "Sell exceeds held quantity".to_string(),
        };
        assert!(format!("{err}").contains("NO_SHORT_SELLING"));
    }

    #[test]
    fn domain_error_invariant_display() {
        let err = DomainError::InvariantViolation {
            aggregate: "Holding".to_string(),
            invariant: "quantity >= 0".to_string(),
            state: "quantity=-5".to_string(),
        };
        assert!(format!("{err}").contains("quantity >= 0"));
    }

    #[test]
    fn money_error_mismatch_display() {
        let err = MoneyError::CurrencyMismatch {
            left: Currency::USD,
            right: Currency::EUR,
        };
        let msg = err.to_string();
        assert!(msg.contains("USD"));
        assert!(msg.contains("EUR"));
    }

    #[test]
    fn domain_error_is_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(DomainError::invalid_value("test", "test"));
        assert!(!err.to_string().is_empty());
    }
}
