//! Transaction errors.

use std::fmt;

use super::value_objects::TransactionState;

/// Errors raised by the transaction aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    /// Invalid state transition attempted.
    InvalidTransition {
        /// Current state.
        from: TransactionState,
        /// Attempted state.
        to: TransactionState,
        /// Reason for failure.
        reason: String,
    },

    /// The intent cannot become a transaction.
    InvalidParameters {
        /// Field with invalid value.
        field: String,
        /// Error message.
        message: String,
    },
}

impl fmt::Display for TransactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTransition { from, to, reason } => {
                write!(f, "Invalid transaction transition: {from} -> {to}: {reason}")
            }
            Self::InvalidParameters { field, message } => {
                write!(f, "Invalid transaction parameter '{field}': {message}")
            }
        }
    }
}

impl std::error::Error for TransactionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_display() {
        let err = TransactionError::InvalidTransition {
            from: TransactionState::Completed,
            to: TransactionState::Pricing,
            reason: "terminal".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("COMPLETED -> PRICING"));
        assert!(msg.contains("terminal"));
    }

    #[test]
    fn invalid_parameters_display() {
        let err = TransactionError::InvalidParameters {
            field: "quantity".to_string(),
            message: "must be positive".to_string(),
        };
        assert!(err.to_string().contains("'quantity'"));
    }
}
