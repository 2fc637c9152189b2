//! Persistence Adapters
//!
//! Implementations of the repository traits.

pub mod in_memory;

pub use in_memory::{InMemoryPortfolioRepository, InMemoryTransactionRepository};
