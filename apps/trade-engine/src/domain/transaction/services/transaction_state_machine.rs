//! Transaction State Machine Service
//!
//! Validates lifecycle transitions.

use crate::domain::transaction::errors::TransactionError;
use crate::domain::transaction::value_objects::TransactionState;

/// Transaction State Machine for validating transitions.
pub struct TransactionStateMachine;

impl TransactionStateMachine {
    /// Check if a state transition is valid.
    #[must_use]
    pub const fn is_valid_transition(from: TransactionState, to: TransactionState) -> bool {
        matches!(
            (from, to),
            // Happy path
            (TransactionState::Received, TransactionState::Pricing)
                | (TransactionState::Pricing, TransactionState::FeeCalculated)
                | (TransactionState::FeeCalculated, TransactionState::Completed)
                // Failure from any non-terminal state
                | (TransactionState::Received, TransactionState::Failed)
                | (TransactionState::Pricing, TransactionState::Failed)
                | (TransactionState::FeeCalculated, TransactionState::Failed)
                // Cancellation before pricing completes
                | (TransactionState::Received, TransactionState::Cancelled)
                | (TransactionState::Pricing, TransactionState::Cancelled)
        )
    }

    /// Validate a state transition.
    ///
    /// # Errors
    ///
    /// Returns error if the transition is invalid.
    pub fn validate_transition(
        from: TransactionState,
        to: TransactionState,
    ) -> Result<(), TransactionError> {
        if Self::is_valid_transition(from, to) {
            Ok(())
        } else {
            Err(TransactionError::InvalidTransition {
                from,
                to,
                reason: Self::transition_error_reason(from, to),
            })
        }
    }

    /// Get a human-readable reason for an invalid transition.
    #[must_use]
    pub fn transition_error_reason(from: TransactionState, to: TransactionState) -> String {
        match from {
            TransactionState::Completed => {
                format!("Transaction is already completed, cannot transition to {to}")
            }
            TransactionState::Failed => {
                format!("Transaction has failed, cannot transition to {to}")
            }
            TransactionState::Cancelled => {
                format!("Transaction is cancelled, cannot transition to {to}")
            }
            TransactionState::FeeCalculated if to == TransactionState::Cancelled => {
                "Transaction is committing and can no longer be cancelled".to_string()
            }
            _ => format!("Invalid transition from {from} to {to}"),
        }
    }

    /// Get all valid next states from a given state.
    #[must_use]
    pub fn valid_next_states(from: TransactionState) -> Vec<TransactionState> {
        match from {
            TransactionState::Received => vec![
                TransactionState::Pricing,
                TransactionState::Failed,
                TransactionState::Cancelled,
            ],
            TransactionState::Pricing => vec![
                TransactionState::FeeCalculated,
                TransactionState::Failed,
                TransactionState::Cancelled,
            ],
            TransactionState::FeeCalculated => {
                vec![TransactionState::Completed, TransactionState::Failed]
            }
            // Terminal states
            TransactionState::Completed
            | TransactionState::Failed
            | TransactionState::Cancelled => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions() {
        assert!(TransactionStateMachine::is_valid_transition(
            TransactionState::Received,
            TransactionState::Pricing
        ));
        assert!(TransactionStateMachine::is_valid_transition(
            TransactionState::Pricing,
            TransactionState::FeeCalculated
        ));
        assert!(TransactionStateMachine::is_valid_transition(
            TransactionState::FeeCalculated,
            TransactionState::Completed
        ));
    }

    #[test]
    fn no_skipping_states() {
        assert!(!TransactionStateMachine::is_valid_transition(
            TransactionState::Received,
            TransactionState::Completed
        ));
        assert!(!TransactionStateMachine::is_valid_transition(
            TransactionState::Received,
            TransactionState::FeeCalculated
        ));
    }

    #[test]
    fn cancel_only_before_fee_calculated() {
        assert!(TransactionStateMachine::validate_transition(
            TransactionState::Pricing,
            TransactionState::Cancelled
        )
        .is_ok());
        let err = TransactionStateMachine::validate_transition(
            TransactionState::FeeCalculated,
            TransactionState::Cancelled,
        )
        .unwrap_err();
        assert!(err.to_string().contains("no longer be cancelled"));
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for from in TransactionState::ALL.into_iter().filter(|s| s.is_terminal()) {
            assert!(TransactionStateMachine::valid_next_states(from).is_empty());
            for to in TransactionState::ALL {
                assert!(TransactionStateMachine::validate_transition(from, to).is_err());
            }
        }
    }

    #[test]
    fn valid_next_states_agree_with_rules() {
        for from in TransactionState::ALL {
            for to in TransactionState::ALL {
                assert_eq!(
                    TransactionStateMachine::valid_next_states(from).contains(&to),
                    TransactionStateMachine::is_valid_transition(from, to),
                    "{from} -> {to}"
                );
            }
        }
    }
}
