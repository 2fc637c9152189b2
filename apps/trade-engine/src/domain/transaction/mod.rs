//! Transaction Bounded Context
//!
//! Manages the lifecycle of a trade from a received intent to a terminal
//! state.
//!
//! # Key Concepts
//!
//! - **Transaction Aggregate**: the only mutation path is a validated transition
//! - **Status History**: every transition is appended with its timestamp
//! - **Terminal States**: COMPLETED, FAILED and CANCELLED are read-only

pub mod aggregate;
pub mod errors;
pub mod repository;
pub mod services;
pub mod value_objects;

pub use aggregate::{StatusChange, Transaction};
pub use errors::TransactionError;
pub use repository::TransactionRepository;
pub use services::TransactionStateMachine;
pub use value_objects::{FailureReason, HistoryRange, TradeIntent, TradeSide, TransactionState};
