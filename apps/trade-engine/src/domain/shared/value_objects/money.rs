//! Money value objects: ISO currency codes and exact decimal amounts.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Neg;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::Quantity;
use crate::domain::shared::{DomainError, MoneyError};

/// Fractional digits of currency (display) precision.
pub const CURRENCY_DECIMAL_PLACES: u32 = 2;

/// An ISO-4217 alphabetic currency code (three uppercase ASCII letters).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency([u8; 3]);

impl Currency {
    /// US dollar.
    pub const USD: Self = Self(*b"USD");
    /// Euro.
    pub const EUR: Self = Self(*b"EUR");
    /// Pound sterling.
    pub const GBP: Self = Self(*b"GBP");

    /// Parse a currency code. Input is trimmed and uppercased.
    ///
    /// # Errors
    ///
    /// Returns error unless the code is exactly three ASCII letters.
    pub fn new(code: &str) -> Result<Self, DomainError> {
        let code = code.trim().to_ascii_uppercase();
        match code.as_bytes() {
            &[a, b, c] if [a, b, c].iter().all(u8::is_ascii_uppercase) => Ok(Self([a, b, c])),
            _ => Err(DomainError::invalid_value(
                "currency",
                format!("'{code}' is not a three-letter ISO code"),
            )),
        }
    }

    /// Get the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Constructors only admit ASCII uppercase letters.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl fmt::Debug for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Currency({})", self.as_str())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Currency {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.as_str().to_string()
    }
}

/// An exact monetary amount in a specific currency.
///
/// Internal precision is whatever the arithmetic produced; rounding only
/// happens through [`MoneyAmount::round_to_currency`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoneyAmount {
    amount: Decimal,
    currency: Currency,
}

impl MoneyAmount {
    /// Create a new amount.
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Create a USD amount.
    #[must_use]
    pub const fn usd(amount: Decimal) -> Self {
        Self::new(amount, Currency::USD)
    }

    /// Zero in the given currency.
    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    /// Get the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// Get the currency.
    #[must_use]
    pub const fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Returns true if the amount is strictly negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    /// Fail unless `other` shares this amount's currency.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::CurrencyMismatch`] when currencies differ.
    pub const fn ensure_same_currency(&self, other: &Self) -> Result<(), MoneyError> {
        self.ensure_currency(other.currency)
    }

    /// Fail unless this amount is denominated in `currency`.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::CurrencyMismatch`] when currencies differ.
    pub const fn ensure_currency(&self, currency: Currency) -> Result<(), MoneyError> {
        let (a, b) = (self.currency.0, currency.0);
        if a[0] == b[0] && a[1] == b[1] && a[2] == b[2] {
            Ok(())
        } else {
            Err(MoneyError::CurrencyMismatch {
                left: self.currency,
                right: currency,
            })
        }
    }

    /// Add two amounts of the same currency.
    ///
    /// # Errors
    ///
    /// Returns error on currency mismatch or overflow.
    pub fn checked_add(&self, other: &Self) -> Result<Self, MoneyError> {
        self.ensure_same_currency(other)?;
        self.amount
            .checked_add(other.amount)
            .map(|amount| Self::new(amount, self.currency))
            .ok_or(MoneyError::Overflow { operation: "add" })
    }

    /// Subtract `other` from this amount. Negative results are allowed.
    ///
    /// # Errors
    ///
    /// Returns error on currency mismatch or overflow.
    pub fn checked_sub(&self, other: &Self) -> Result<Self, MoneyError> {
        self.ensure_same_currency(other)?;
        self.amount
            .checked_sub(other.amount)
            .map(|amount| Self::new(amount, self.currency))
            .ok_or(MoneyError::Overflow {
                operation: "subtract",
            })
    }

    /// Scale by a whole quantity (e.g. unit price × shares).
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::InvalidQuantity`] for negative quantities.
    pub fn mul_quantity(&self, quantity: i64) -> Result<Self, MoneyError> {
        if quantity < 0 {
            return Err(MoneyError::InvalidQuantity { quantity });
        }
        self.scale(Decimal::from(quantity), "multiply by quantity")
    }

    /// Scale by a held or traded [`Quantity`].
    ///
    /// # Errors
    ///
    /// Returns error on overflow.
    pub fn mul_units(&self, quantity: Quantity) -> Result<Self, MoneyError> {
        self.scale(Decimal::from(quantity.value()), "multiply by quantity")
    }

    /// Scale by a fractional rate such as a fee percentage.
    ///
    /// Full decimal precision is retained.
    ///
    /// # Errors
    ///
    /// Returns error on overflow.
    pub fn mul_rate(&self, rate: Decimal) -> Result<Self, MoneyError> {
        self.scale(rate, "multiply by rate")
    }

    /// Divide by a positive whole quantity (per-unit amounts, averages).
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::InvalidQuantity`] when `quantity` is zero.
    pub fn div_units(&self, quantity: Quantity) -> Result<Self, MoneyError> {
        if quantity.is_zero() {
            return Err(MoneyError::InvalidQuantity { quantity: 0 });
        }
        self.amount
            .checked_div(Decimal::from(quantity.value()))
            .map(|amount| Self::new(amount, self.currency))
            .ok_or(MoneyError::Overflow { operation: "divide" })
    }

    /// Compare two amounts of the same currency.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::CurrencyMismatch`] when currencies differ.
    pub fn try_cmp(&self, other: &Self) -> Result<Ordering, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(self.amount.cmp(&other.amount))
    }

    /// The larger of two amounts of the same currency.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::CurrencyMismatch`] when currencies differ.
    pub fn try_max(self, other: Self) -> Result<Self, MoneyError> {
        Ok(match self.try_cmp(&other)? {
            Ordering::Less => other,
            Ordering::Equal | Ordering::Greater => self,
        })
    }

    /// Round to currency precision using banker's rounding.
    #[must_use]
    pub fn round_to_currency(&self) -> Self {
        Self::new(
            self.amount.round_dp_with_strategy(
                CURRENCY_DECIMAL_PLACES,
                RoundingStrategy::MidpointNearestEven,
            ),
            self.currency,
        )
    }

    fn scale(&self, factor: Decimal, operation: &'static str) -> Result<Self, MoneyError> {
        self.amount
            .checked_mul(factor)
            .map(|amount| Self::new(amount, self.currency))
            .ok_or(MoneyError::Overflow { operation })
    }
}

impl Neg for MoneyAmount {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.amount, self.currency)
    }
}

impl fmt::Display for MoneyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2} {}",
            self.round_to_currency().amount,
            self.currency
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn currency_parses_and_normalizes() {
        assert_eq!(Currency::new("usd").unwrap(), Currency::USD);
        assert_eq!(Currency::new(" EUR ").unwrap().as_str(), "EUR");
    }

    #[test]
    fn currency_rejects_bad_codes() {
        assert!(Currency::new("").is_err());
        assert!(Currency::new("US").is_err());
        assert!(Currency::new("USDX").is_err());
        assert!(Currency::new("U5D").is_err());
    }

    #[test]
    fn currency_serde_as_string() {
        let json = serde_json::to_string(&Currency::GBP).unwrap();
        assert_eq!(json, "\"GBP\"");
        let parsed: Currency = serde_json::from_str("\"gbp\"").unwrap();
        assert_eq!(parsed, Currency::GBP);
        assert!(serde_json::from_str::<Currency>("\"pounds\"").is_err());
    }

    #[test]
    fn add_and_subtract_same_currency() {
        let a = MoneyAmount::usd(dec!(100.10));
        let b = MoneyAmount::usd(dec!(0.90));
        assert_eq!(a.checked_add(&b).unwrap().amount(), dec!(101.00));
        assert_eq!(b.checked_sub(&a).unwrap().amount(), dec!(-99.20));
    }

    #[test]
    fn mismatched_currency_fails_every_binary_operation() {
        let usd = MoneyAmount::usd(dec!(1));
        let eur = MoneyAmount::new(dec!(1), Currency::EUR);
        let mismatch = MoneyError::CurrencyMismatch {
            left: Currency::USD,
            right: Currency::EUR,
        };
        assert_eq!(usd.checked_add(&eur), Err(mismatch));
        assert_eq!(usd.checked_sub(&eur), Err(mismatch));
        assert_eq!(usd.try_cmp(&eur), Err(mismatch));
        assert_eq!(usd.try_max(eur), Err(mismatch));
    }

    #[test]
    fn mul_quantity_rejects_negative() {
        let price = MoneyAmount::usd(dec!(12.5));
        assert_eq!(price.mul_quantity(4).unwrap().amount(), dec!(50.0));
        assert_eq!(
            price.mul_quantity(-1),
            Err(MoneyError::InvalidQuantity { quantity: -1 })
        );
    }

    #[test]
    fn mul_rate_keeps_full_precision() {
        let notional = MoneyAmount::usd(dec!(333.33));
        let fee = notional.mul_rate(dec!(0.0025)).unwrap();
        assert_eq!(fee.amount(), dec!(0.833325));
        assert!(fee.amount().scale() >= 6);
    }

    #[test]
    fn div_units_rejects_zero() {
        let total = MoneyAmount::usd(dec!(10));
        assert!(total.div_units(Quantity::ZERO).is_err());
        assert_eq!(
            total.div_units(Quantity::new(4)).unwrap().amount(),
            dec!(2.5)
        );
    }

    #[test]
    fn round_to_currency_uses_bankers_rounding() {
        assert_eq!(
            MoneyAmount::usd(dec!(2.345)).round_to_currency().amount(),
            dec!(2.34)
        );
        assert_eq!(
            MoneyAmount::usd(dec!(2.355)).round_to_currency().amount(),
            dec!(2.36)
        );
        assert_eq!(
            MoneyAmount::usd(dec!(2.3451)).round_to_currency().amount(),
            dec!(2.35)
        );
    }

    #[test]
    fn negative_results_are_permitted() {
        let loss = MoneyAmount::usd(dec!(5)).checked_sub(&MoneyAmount::usd(dec!(7.5)));
        assert!(loss.unwrap().is_negative());
        assert!((-MoneyAmount::usd(dec!(3))).is_negative());
    }

    #[test]
    fn try_max_picks_larger() {
        let a = MoneyAmount::usd(dec!(1));
        let b = MoneyAmount::usd(dec!(2));
        assert_eq!(a.try_max(b).unwrap(), b);
        assert_eq!(b.try_max(a).unwrap(), b);
    }

    #[test]
    fn display_rounds_for_presentation_only() {
        let m = MoneyAmount::usd(dec!(1000));
        assert_eq!(m.to_string(), "1000.00 USD");
        let precise = MoneyAmount::usd(dec!(0.833325));
        assert_eq!(precise.to_string(), "0.83 USD");
        assert_eq!(precise.amount(), dec!(0.833325));
    }

    #[test]
    fn serde_roundtrip_keeps_decimal_string() {
        let m = MoneyAmount::new(dec!(150.505), Currency::EUR);
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("\"150.505\""));
        let parsed: MoneyAmount = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, m);
    }
}
