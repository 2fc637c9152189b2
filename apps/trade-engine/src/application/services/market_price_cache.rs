//! Market Price Cache
//!
//! Last-known prices per symbol with a freshness window, bounded retry with
//! exponential backoff, and a stale fallback.
//!
//! # Lookup
//!
//! 1. An entry younger than `freshness_window` (measured from the price's
//!    observation time) is returned as is.
//! 2. Otherwise the price is refreshed from the [`PriceSourcePort`]. At most one
//!    refresh per symbol is outstanding; concurrent callers share its result.
//! 3. If every attempt fails, the last good price is returned tagged `Stale`
//!    when its age is within `max_staleness`, else `PriceUnavailable`.
//!
//! Refreshes run as spawned tasks, so a caller that gives up on its deadline
//! does not abandon the cache bookkeeping.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard};
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt, Shared};
use thiserror::Error;
use tracing::{debug, warn};

use super::retry::{ExponentialBackoffCalculator, RetryPolicy};
use crate::application::ports::PriceSourcePort;
use crate::domain::market_data::{Price, PriceCacheEntry, PriceTag};
use crate::domain::shared::{Symbol, Timestamp};
use crate::observability::{record_price_failures, record_price_fetch, record_price_lookup};

/// Cache policy.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceCacheConfig {
    /// Age below which a cached price is served without refreshing (default: 5s).
    pub freshness_window: Duration,
    /// Oldest last-good price served after a failed refresh (default: 60s).
    pub max_staleness: Duration,
    /// Bound on each individual fetch attempt (default: 1s).
    pub fetch_timeout: Duration,
    /// Attempts and backoff for a refresh.
    pub retry: RetryPolicy,
}

impl Default for PriceCacheConfig {
    fn default() -> Self {
        Self {
            freshness_window: Duration::from_secs(5),
            max_staleness: Duration::from_secs(60),
            fetch_timeout: Duration::from_secs(1),
            retry: RetryPolicy::default(),
        }
    }
}

/// Price lookup errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    /// Refresh failed and no last good price is within `max_staleness`.
    #[error("No price available for {symbol}: {message}")]
    PriceUnavailable {
        /// Symbol requested.
        symbol: Symbol,
        /// Why.
        message: String,
    },

    /// The caller's deadline passed before a price was obtained.
    #[error("Timed out waiting for a price for {symbol}")]
    Timeout {
        /// Symbol requested.
        symbol: Symbol,
    },
}

type RefreshFuture = Shared<BoxFuture<'static, Result<Price, PriceError>>>;

/// Staleness-aware, single-flight market price cache.
///
/// Cloning is cheap and clones share state.
#[derive(Clone)]
pub struct MarketPriceCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    source: Arc<dyn PriceSourcePort>,
    config: PriceCacheConfig,
    entries: RwLock<HashMap<Symbol, PriceCacheEntry>>,
    in_flight: Mutex<HashMap<Symbol, RefreshFuture>>,
}

impl fmt::Debug for MarketPriceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarketPriceCache")
            .field("config", &self.inner.config)
            .field("symbols", &self.inner.read_entries().len())
            .finish_non_exhaustive()
    }
}

impl MarketPriceCache {
    /// Create an empty cache over a price source.
    #[must_use]
    pub fn new(source: Arc<dyn PriceSourcePort>, config: PriceCacheConfig) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                source,
                config,
                entries: RwLock::new(HashMap::new()),
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Cache policy.
    #[must_use]
    pub fn config(&self) -> &PriceCacheConfig {
        &self.inner.config
    }

    /// Get a usable price for `symbol`.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::PriceUnavailable`] if refreshing failed and no last
    /// good price is within `max_staleness`.
    pub async fn get_price(&self, symbol: &Symbol) -> Result<Price, PriceError> {
        if let Some(price) = self.inner.fresh_price(symbol, Timestamp::now()) {
            record_price_lookup("fresh");
            return Ok(price);
        }

        let result = self.refresh_shared(symbol).await;
        record_price_lookup(match &result {
            Ok(price) if price.tag() == PriceTag::Stale => "stale",
            Ok(_) => "refreshed",
            Err(_) => "unavailable",
        });
        result
    }

    /// [`get_price`](Self::get_price) bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Timeout`] if no result arrives in time.
    pub async fn get_price_within(
        &self,
        symbol: &Symbol,
        timeout: Duration,
    ) -> Result<Price, PriceError> {
        tokio::time::timeout(timeout, self.get_price(symbol))
            .await
            .map_err(|_| PriceError::Timeout {
                symbol: symbol.clone(),
            })?
    }

    /// [`get_price`](Self::get_price) bounded by an absolute deadline.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Timeout`] if the deadline passes first.
    pub async fn get_price_until(
        &self,
        symbol: &Symbol,
        deadline: tokio::time::Instant,
    ) -> Result<Price, PriceError> {
        tokio::time::timeout_at(deadline, self.get_price(symbol))
            .await
            .map_err(|_| PriceError::Timeout {
                symbol: symbol.clone(),
            })?
    }

    /// Seed a price obtained out of band (e.g. a prior close). It is stored
    /// tagged `Fallback`; attempt bookkeeping is untouched.
    pub fn prime(&self, price: Price) {
        let symbol = price.symbol().clone();
        self.inner.update_entry(&symbol, |entry| entry.prime(price));
    }

    /// Snapshot of a symbol's cache entry.
    #[must_use]
    pub fn entry(&self, symbol: &Symbol) -> Option<PriceCacheEntry> {
        self.inner.read_entries().get(symbol).cloned()
    }

    /// Drop a symbol's entry. Returns true if one existed.
    pub fn invalidate(&self, symbol: &Symbol) -> bool {
        self.inner
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(symbol)
            .is_some()
    }

    /// Join the outstanding refresh for `symbol`, or start one.
    fn refresh_shared(&self, symbol: &Symbol) -> RefreshFuture {
        let mut in_flight = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = in_flight.get(symbol) {
            debug!(%symbol, "Joining in-flight price refresh");
            return existing.clone();
        }

        let inner = Arc::clone(&self.inner);
        let key = symbol.clone();
        let task = tokio::spawn(async move {
            let result = inner.refresh(&key).await;
            inner
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&key);
            result
        });

        let failed_symbol = symbol.clone();
        let shared = async move {
            task.await.unwrap_or_else(|e| {
                Err(PriceError::PriceUnavailable {
                    symbol: failed_symbol,
                    message: format!("refresh task failed: {e}"),
                })
            })
        }
        .boxed()
        .shared();

        in_flight.insert(symbol.clone(), shared.clone());
        shared
    }
}

impl CacheInner {
    fn read_entries(&self) -> RwLockReadGuard<'_, HashMap<Symbol, PriceCacheEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn update_entry<R>(&self, symbol: &Symbol, f: impl FnOnce(&mut PriceCacheEntry) -> R) -> R {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let entry = entries
            .entry(symbol.clone())
            .or_insert_with(|| PriceCacheEntry::new(symbol.clone()));
        f(entry)
    }

    fn fresh_price(&self, symbol: &Symbol, now: Timestamp) -> Option<Price> {
        self.read_entries()
            .get(symbol)
            .and_then(|entry| entry.fresh_price(now, self.config.freshness_window))
            .cloned()
    }

    async fn refresh(&self, symbol: &Symbol) -> Result<Price, PriceError> {
        let attempts = self.config.retry.max_attempts.max(1);
        let mut backoff = ExponentialBackoffCalculator::new(&self.config.retry);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            let attempted_at = Timestamp::now();
            let started = Instant::now();
            let outcome =
                match tokio::time::timeout(self.config.fetch_timeout, self.source.fetch_live_price(symbol))
                    .await
                {
                    Ok(Ok(price)) => Self::check_fetched(symbol, price),
                    Ok(Err(e)) => Err(("error", e.to_string())),
                    Err(_) => Err((
                        "timeout",
                        format!("fetch exceeded {:?}", self.config.fetch_timeout),
                    )),
                };
            let elapsed = started.elapsed().as_secs_f64();

            match outcome {
                Ok(price) => {
                    record_price_fetch("success", elapsed);
                    record_price_failures(symbol.as_str(), 0);
                    self.update_entry(symbol, |entry| {
                        entry.record_success(price.clone(), attempted_at);
                    });
                    debug!(%symbol, attempt, "Price refreshed");
                    return Ok(price);
                }
                Err((outcome, message)) => {
                    record_price_fetch(outcome, elapsed);
                    let failures = self.update_entry(symbol, |entry| {
                        entry.record_failure(attempted_at);
                        entry.consecutive_failures()
                    });
                    record_price_failures(symbol.as_str(), failures);
                    warn!(%symbol, attempt, failures, error = %message, "Price fetch failed");
                    last_error = message;
                }
            }

            if let Some(wait) = backoff.next_backoff() {
                tokio::time::sleep(wait).await;
            }
        }

        let stale = self
            .read_entries()
            .get(symbol)
            .and_then(|entry| entry.stale_price(Timestamp::now(), self.config.max_staleness));
        match stale {
            Some(price) => {
                warn!(%symbol, observed_at = %price.observed_at(), "Serving stale price");
                Ok(price)
            }
            None => Err(PriceError::PriceUnavailable {
                symbol: symbol.clone(),
                message: format!("{attempts} fetch attempts failed; last error: {last_error}"),
            }),
        }
    }

    fn check_fetched(symbol: &Symbol, price: Price) -> Result<Price, (&'static str, String)> {
        if price.symbol() != symbol {
            return Err((
                "error",
                format!("source returned a price for {} instead", price.symbol()),
            ));
        }
        price
            .validate()
            .map_err(|e| ("error", e.to_string()))?;
        Ok(price.with_tag(PriceTag::Live))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::MoneyAmount;
    use crate::infrastructure::price_feed::MockPriceSource;
    use rust_decimal_macros::dec;

    fn fast_config() -> PriceCacheConfig {
        PriceCacheConfig {
            freshness_window: Duration::from_secs(5),
            max_staleness: Duration::from_secs(60),
            fetch_timeout: Duration::from_millis(200),
            retry: RetryPolicy {
                max_attempts: 3,
                initial_backoff: Duration::from_millis(1),
                max_backoff: Duration::from_millis(5),
                backoff_multiplier: 2.0,
                jitter_factor: 0.0,
            },
        }
    }

    fn abc() -> Symbol {
        Symbol::new("ABC")
    }

    fn setup() -> (Arc<MockPriceSource>, MarketPriceCache) {
        let source = Arc::new(MockPriceSource::new().with_price("ABC", MoneyAmount::usd(dec!(100))));
        let cache = MarketPriceCache::new(source.clone(), fast_config());
        (source, cache)
    }

    #[tokio::test]
    async fn fresh_entry_is_served_without_refetch() {
        let (source, cache) = setup();
        let first = cache.get_price(&abc()).await.unwrap();
        let second = cache.get_price(&abc()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.tag(), PriceTag::Live);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn expired_entry_is_refreshed() {
        let (source, cache) = setup();
        source.set_observed_age(Duration::from_secs(10));
        cache.get_price(&abc()).await.unwrap();
        cache.get_price(&abc()).await.unwrap();
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn all_attempts_failing_without_cache_is_unavailable() {
        let (source, cache) = setup();
        source.set_fail_always(true);
        let err = cache.get_price(&abc()).await.unwrap_err();
        assert!(matches!(err, PriceError::PriceUnavailable { .. }));
        assert_eq!(source.calls(), 3);

        let entry = cache.entry(&abc()).unwrap();
        assert_eq!(entry.consecutive_failures(), 3);
        assert!(entry.last_fetch_attempt().is_some());
        assert!(entry.last_good().is_none());
    }

    #[tokio::test]
    async fn failed_refresh_serves_stale_price_within_limit() {
        let (source, cache) = setup();
        source.set_observed_age(Duration::from_secs(30));
        cache.get_price(&abc()).await.unwrap();

        source.set_fail_always(true);
        let price = cache.get_price(&abc()).await.unwrap();
        assert_eq!(price.tag(), PriceTag::Stale);
        assert_eq!(price.unit().amount(), dec!(100));
    }

    #[tokio::test]
    async fn failed_refresh_beyond_staleness_is_unavailable() {
        let (source, cache) = setup();
        source.set_observed_age(Duration::from_secs(120));
        cache.get_price(&abc()).await.unwrap();

        source.set_fail_always(true);
        assert!(cache.get_price(&abc()).await.is_err());
    }

    #[tokio::test]
    async fn success_after_failures_resets_counter() {
        let (source, cache) = setup();
        source.fail_next(2);
        let price = cache.get_price(&abc()).await.unwrap();
        assert_eq!(price.tag(), PriceTag::Live);
        assert_eq!(source.calls(), 3);
        assert_eq!(cache.entry(&abc()).unwrap().consecutive_failures(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_share_one_refresh() {
        let (source, cache) = setup();
        source.set_latency(Duration::from_millis(50));

        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get_price(&Symbol::new("ABC")).await })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap().is_ok());
        }
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn caller_timeout_is_reported() {
        let (source, cache) = setup();
        source.set_latency(Duration::from_millis(150));
        let err = cache
            .get_price_within(&abc(), Duration::from_millis(10))
            .await
            .unwrap_err();
        assert_eq!(err, PriceError::Timeout { symbol: abc() });
    }

    #[tokio::test]
    async fn slow_source_hits_fetch_timeout() {
        let (source, cache) = setup();
        source.set_latency(Duration::from_millis(300));
        let err = cache.get_price(&abc()).await.unwrap_err();
        assert!(matches!(err, PriceError::PriceUnavailable { .. }));
        assert_eq!(cache.entry(&abc()).unwrap().consecutive_failures(), 3);
    }

    #[tokio::test]
    async fn primed_price_is_fallback_until_stale() {
        let (source, cache) = setup();
        cache.prime(Price::new(abc(), MoneyAmount::usd(dec!(99)), Timestamp::now()));
        let price = cache.get_price(&abc()).await.unwrap();
        assert_eq!(price.tag(), PriceTag::Fallback);
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let (source, cache) = setup();
        cache.get_price(&abc()).await.unwrap();
        assert!(cache.invalidate(&abc()));
        assert!(!cache.invalidate(&abc()));
        cache.get_price(&abc()).await.unwrap();
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn unknown_symbol_is_unavailable() {
        let (_source, cache) = setup();
        let err = cache.get_price(&Symbol::new("ZZZ")).await.unwrap_err();
        assert!(err.to_string().contains("ZZZ"));
    }
}
