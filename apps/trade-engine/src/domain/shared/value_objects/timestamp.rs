//! Timestamp value object for temporal data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A UTC timestamp for domain events, price observations and transaction history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a new Timestamp from a DateTime<Utc>.
    #[must_use]
    pub const fn new(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Get the current timestamp.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Parse from an ISO 8601 string.
    ///
    /// # Errors
    ///
    /// Returns error if the string is not a valid ISO 8601 timestamp.
    pub fn parse(s: &str) -> Result<Self, chrono::ParseError> {
        let dt = DateTime::parse_from_rfc3339(s)?;
        Ok(Self(dt.with_timezone(&Utc)))
    }

    /// Get the inner DateTime<Utc>.
    #[must_use]
    pub const fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Get the Unix timestamp in milliseconds.
    #[must_use]
    pub fn unix_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Calculate duration since another timestamp.
    #[must_use]
    pub fn duration_since(&self, other: Self) -> chrono::Duration {
        self.0 - other.0
    }

    /// Time elapsed from `earlier` to this timestamp, clamped at zero.
    #[must_use]
    pub fn elapsed_since(&self, earlier: Self) -> Duration {
        self.duration_since(earlier).to_std().unwrap_or(Duration::ZERO)
    }

    /// Shift forward by a std duration, saturating at the maximum timestamp.
    #[must_use]
    pub fn plus(&self, by: Duration) -> Self {
        chrono::Duration::from_std(by)
            .ok()
            .and_then(|d| self.0.checked_add_signed(d))
            .map_or(Self(DateTime::<Utc>::MAX_UTC), Self)
    }

    /// Shift backward by a std duration, saturating at the minimum timestamp.
    #[must_use]
    pub fn minus(&self, by: Duration) -> Self {
        chrono::Duration::from_std(by)
            .ok()
            .and_then(|d| self.0.checked_sub_signed(d))
            .map_or(Self(DateTime::<Utc>::MIN_UTC), Self)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_parse_and_display() {
        let ts = Timestamp::parse("2026-01-15T10:30:00Z").unwrap();
        assert!(ts.to_string().starts_with("2026-01-15T10:30:00"));
        assert!(Timestamp::parse("yesterday").is_err());
    }

    #[test]
    fn elapsed_since_clamps_to_zero() {
        let earlier = Timestamp::parse("2026-01-15T10:30:00Z").unwrap();
        let later = earlier.plus(Duration::from_secs(5));
        assert_eq!(later.elapsed_since(earlier), Duration::from_secs(5));
        assert_eq!(earlier.elapsed_since(later), Duration::ZERO);
    }

    #[test]
    fn plus_and_minus_are_inverse() {
        let ts = Timestamp::parse("2026-01-15T10:30:00Z").unwrap();
        let d = Duration::from_millis(1500);
        assert_eq!(ts.plus(d).minus(d), ts);
        assert!(ts.minus(d) < ts);
    }

    #[test]
    fn timestamp_ordering() {
        let a = Timestamp::parse("2026-01-15T10:30:00Z").unwrap();
        let b = Timestamp::parse("2026-01-15T10:30:01Z").unwrap();
        assert!(a < b);
        assert_eq!(b.duration_since(a).num_seconds(), 1);
    }
}
