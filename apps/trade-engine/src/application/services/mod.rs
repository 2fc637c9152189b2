//! Application Services
//!
//! Stateful collaborators shared by the use cases.

mod keyed_lock;
mod market_price_cache;
mod portfolio_aggregator;
mod retry;

pub use keyed_lock::{KeyedLockGuard, KeyedLocks};
pub use market_price_cache::{MarketPriceCache, PriceCacheConfig, PriceError};
pub use portfolio_aggregator::{AggregationError, PortfolioAggregator, ValuationError};
pub use retry::{ExponentialBackoffCalculator, RetryPolicy};
