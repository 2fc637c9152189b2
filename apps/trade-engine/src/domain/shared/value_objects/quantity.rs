//! Quantity value object for held and traded units.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-negative whole number of units.
///
/// Holdings and executed transactions use this type, so a negative
/// position is unrepresentable.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Quantity(u64);

impl Quantity {
    /// Zero quantity.
    pub const ZERO: Self = Self(0);

    /// Create a new Quantity.
    #[must_use]
    pub const fn new(units: u64) -> Self {
        Self(units)
    }

    /// Convert a raw caller quantity. Returns `None` unless strictly positive.
    #[must_use]
    pub fn from_positive(raw: i64) -> Option<Self> {
        u64::try_from(raw).ok().filter(|v| *v > 0).map(Self)
    }

    /// Get the number of units.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Returns true if this quantity is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Add, returning `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Subtract, returning `None` if the result would be negative.
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Quantity {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Quantity> for u64 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_positive_filters_non_positive() {
        assert_eq!(Quantity::from_positive(10), Some(Quantity::new(10)));
        assert_eq!(Quantity::from_positive(0), None);
        assert_eq!(Quantity::from_positive(-3), None);
    }

    #[test]
    fn checked_sub_never_goes_negative() {
        let held = Quantity::new(5);
        assert_eq!(held.checked_sub(Quantity::new(5)), Some(Quantity::ZERO));
        assert_eq!(held.checked_sub(Quantity::new(6)), None);
    }

    #[test]
    fn checked_add_overflow() {
        assert_eq!(Quantity::new(u64::MAX).checked_add(Quantity::new(1)), None);
        assert_eq!(
            Quantity::new(2).checked_add(Quantity::new(3)),
            Some(Quantity::new(5))
        );
    }

    #[test]
    fn quantity_display() {
        assert_eq!(Quantity::new(42).to_string(), "42");
        assert!(Quantity::default().is_zero());
    }
}
