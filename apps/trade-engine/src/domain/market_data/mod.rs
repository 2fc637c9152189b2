//! Market Data Bounded Context
//!
//! Prices observed for a symbol and the per-symbol cache bookkeeping used
//! by the market price cache.

mod price;

pub use price::{Price, PriceCacheEntry, PriceTag};
