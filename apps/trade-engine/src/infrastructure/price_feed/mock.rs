//! Scriptable price source for tests and local runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{PriceSourceError, PriceSourcePort};
use crate::domain::market_data::Price;
use crate::domain::shared::{MoneyAmount, Symbol, Timestamp};

/// Mock price source.
///
/// Quotes the prices it was given, stamped with the fetch time minus a
/// configurable age. Failures, latency and call counts are scriptable.
#[derive(Debug, Default)]
pub struct MockPriceSource {
    prices: RwLock<HashMap<Symbol, MoneyAmount>>,
    fail_next: AtomicUsize,
    fail_always: AtomicBool,
    calls: AtomicUsize,
    latency_ms: AtomicU64,
    observed_age_ms: AtomicU64,
}

impl MockPriceSource {
    /// Create a source that quotes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set_price`](Self::set_price).
    #[must_use]
    pub fn with_price(self, symbol: impl Into<Symbol>, unit: MoneyAmount) -> Self {
        self.set_price(symbol, unit);
        self
    }

    /// Set the unit price quoted for a symbol.
    pub fn set_price(&self, symbol: impl Into<Symbol>, unit: MoneyAmount) {
        self.prices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(symbol.into(), unit);
    }

    /// Stop quoting a symbol.
    pub fn remove_price(&self, symbol: &Symbol) {
        self.prices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(symbol);
    }

    /// Fail the next `n` fetches.
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    /// Fail every fetch until turned off.
    pub fn set_fail_always(&self, fail: bool) {
        self.fail_always.store(fail, Ordering::SeqCst);
    }

    /// Delay every fetch by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(duration_millis(latency), Ordering::SeqCst);
    }

    /// Stamp quotes as observed `age` before the fetch.
    pub fn set_observed_age(&self, age: Duration) {
        self.observed_age_ms
            .store(duration_millis(age), Ordering::SeqCst);
    }

    /// Number of fetches so far, failed ones included.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn should_fail(&self) -> bool {
        self.fail_always.load(Ordering::SeqCst)
            || self
                .fail_next
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
    }
}

fn duration_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[async_trait]
impl PriceSourcePort for MockPriceSource {
    async fn fetch_live_price(&self, symbol: &Symbol) -> Result<Price, PriceSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        if self.should_fail() {
            return Err(PriceSourceError::Unavailable {
                message: "mock failure".to_string(),
            });
        }

        let unit = self
            .prices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(symbol)
            .copied()
            .ok_or_else(|| PriceSourceError::SymbolNotFound {
                symbol: symbol.to_string(),
            })?;

        let age = Duration::from_millis(self.observed_age_ms.load(Ordering::SeqCst));
        Ok(Price::new(symbol.clone(), unit, Timestamp::now().minus(age)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn quotes_configured_price() {
        let source = MockPriceSource::new().with_price("ABC", MoneyAmount::usd(dec!(12.5)));
        let price = source.fetch_live_price(&Symbol::new("ABC")).await.unwrap();
        assert_eq!(price.unit().amount(), dec!(12.5));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn unknown_symbol() {
        let source = MockPriceSource::new();
        let err = source.fetch_live_price(&Symbol::new("ZZZ")).await.unwrap_err();
        assert!(matches!(err, PriceSourceError::SymbolNotFound { .. }));
    }

    #[tokio::test]
    async fn fail_next_counts_down() {
        let source = MockPriceSource::new().with_price("ABC", MoneyAmount::usd(dec!(1)));
        source.fail_next(2);
        let abc = Symbol::new("ABC");
        assert!(source.fetch_live_price(&abc).await.is_err());
        assert!(source.fetch_live_price(&abc).await.is_err());
        assert!(source.fetch_live_price(&abc).await.is_ok());
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn observed_age_backdates_quotes() {
        let source = MockPriceSource::new().with_price("ABC", MoneyAmount::usd(dec!(1)));
        source.set_observed_age(Duration::from_secs(30));
        let price = source.fetch_live_price(&Symbol::new("ABC")).await.unwrap();
        assert!(price.age_at(Timestamp::now()) >= Duration::from_secs(30));
    }
}
