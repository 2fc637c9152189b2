//! Price and cache entry value objects.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::shared::{DomainError, MoneyAmount, Symbol, Timestamp};

/// Where a served price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceTag {
    /// Fetched from the live source, or served from a fresh cache entry.
    Live,
    /// Seeded into the cache from an out-of-band source such as a prior close.
    Fallback,
    /// Last good price served after a refresh failed.
    Stale,
}

impl fmt::Display for PriceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live => write!(f, "LIVE"),
            Self::Fallback => write!(f, "FALLBACK"),
            Self::Stale => write!(f, "STALE"),
        }
    }
}

/// A per-unit price for a symbol at an observation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    symbol: Symbol,
    unit: MoneyAmount,
    observed_at: Timestamp,
    tag: PriceTag,
}

impl Price {
    /// Create a live price.
    #[must_use]
    pub const fn new(symbol: Symbol, unit: MoneyAmount, observed_at: Timestamp) -> Self {
        Self {
            symbol,
            unit,
            observed_at,
            tag: PriceTag::Live,
        }
    }

    /// Return a copy carrying a different tag.
    #[must_use]
    pub fn with_tag(mut self, tag: PriceTag) -> Self {
        self.tag = tag;
        self
    }

    /// Symbol priced.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Price per unit.
    #[must_use]
    pub const fn unit(&self) -> MoneyAmount {
        self.unit
    }

    /// When the price was observed at the source.
    #[must_use]
    pub const fn observed_at(&self) -> Timestamp {
        self.observed_at
    }

    /// Provenance tag.
    #[must_use]
    pub const fn tag(&self) -> PriceTag {
        self.tag
    }

    /// Age of the observation at `now`, clamped at zero.
    #[must_use]
    pub fn age_at(&self, now: Timestamp) -> Duration {
        now.elapsed_since(self.observed_at)
    }

    /// Check that the price can be used for trading.
    ///
    /// # Errors
    ///
    /// Returns error if the unit price is not strictly positive.
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.unit.is_positive() {
            return Err(DomainError::invalid_value(
                "price",
                format!("{} price must be positive, got {}", self.symbol, self.unit),
            ));
        }
        Ok(())
    }
}

/// Per-symbol cache bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceCacheEntry {
    symbol: Symbol,
    last_good: Option<Price>,
    last_fetch_attempt: Option<Timestamp>,
    consecutive_failures: u32,
}

impl PriceCacheEntry {
    /// Empty entry for a symbol that has never been fetched.
    #[must_use]
    pub const fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            last_good: None,
            last_fetch_attempt: None,
            consecutive_failures: 0,
        }
    }

    /// Symbol this entry tracks.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Last successfully obtained price.
    #[must_use]
    pub const fn last_good(&self) -> Option<&Price> {
        self.last_good.as_ref()
    }

    /// Time of the most recent fetch attempt, successful or not.
    #[must_use]
    pub const fn last_fetch_attempt(&self) -> Option<Timestamp> {
        self.last_fetch_attempt
    }

    /// Failed attempts since the last success.
    #[must_use]
    pub const fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Record a fetch attempt that produced `price`.
    pub fn record_success(&mut self, price: Price, attempted_at: Timestamp) {
        self.last_good = Some(price);
        self.last_fetch_attempt = Some(attempted_at);
        self.consecutive_failures = 0;
    }

    /// Record a failed fetch attempt.
    pub fn record_failure(&mut self, attempted_at: Timestamp) {
        self.last_fetch_attempt = Some(attempted_at);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }

    /// Seed the entry without touching attempt bookkeeping.
    pub fn prime(&mut self, price: Price) {
        self.last_good = Some(price.with_tag(PriceTag::Fallback));
    }

    /// The cached price if it is younger than `freshness_window` at `now`.
    #[must_use]
    pub fn fresh_price(&self, now: Timestamp, freshness_window: Duration) -> Option<&Price> {
        self.last_good
            .as_ref()
            .filter(|p| p.age_at(now) < freshness_window)
    }

    /// The last good price tagged `Stale` if its age is within `max_staleness`.
    #[must_use]
    pub fn stale_price(&self, now: Timestamp, max_staleness: Duration) -> Option<Price> {
        self.last_good
            .as_ref()
            .filter(|p| p.age_at(now) <= max_staleness)
            .map(|p| p.clone().with_tag(PriceTag::Stale))
    }
}
