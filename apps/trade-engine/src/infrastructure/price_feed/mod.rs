//! Price Feed Adapters
//!
//! Implementations of `PriceSourcePort`.

pub mod mock;

pub use mock::MockPriceSource;
