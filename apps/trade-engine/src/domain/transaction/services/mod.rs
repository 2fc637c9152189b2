//! Transaction domain services.

mod transaction_state_machine;

pub use transaction_state_machine::TransactionStateMachine;
