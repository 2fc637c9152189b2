//! Symbol value object for instrument tickers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::DomainError;

/// Maximum length of a well-formed symbol.
pub const MAX_SYMBOL_LEN: usize = 10;

/// A ticker symbol such as "AAPL" or "BRK.B".
///
/// Construction only normalizes case; well-formedness is checked by
/// [`Symbol::validate`] so that a malformed symbol can still be carried
/// inside a trade intent and reported by the validator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a new Symbol.
    ///
    /// The symbol is trimmed and normalized to uppercase.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_uppercase())
    }

    /// Create a Symbol and validate it in one step.
    ///
    /// # Errors
    ///
    /// Returns error if the symbol is not well-formed.
    pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
        let symbol = Self::new(value);
        symbol.validate()?;
        Ok(symbol)
    }

    /// Get the symbol string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Validate the symbol.
    ///
    /// # Errors
    ///
    /// Returns error if the symbol is empty, too long, does not start with a
    /// letter, or contains characters other than ASCII alphanumerics, `.` and `-`.
    pub fn validate(&self) -> Result<(), DomainError> {
        let Some(first) = self.0.chars().next() else {
            return Err(DomainError::invalid_value("symbol", "Symbol cannot be empty"));
        };

        if self.0.len() > MAX_SYMBOL_LEN {
            return Err(DomainError::invalid_value(
                "symbol",
                format!("Symbol exceeds maximum length of {MAX_SYMBOL_LEN}"),
            ));
        }

        if !first.is_ascii_alphabetic() {
            return Err(DomainError::invalid_value(
                "symbol",
                "Symbol must start with a letter",
            ));
        }

        if !self
            .0
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return Err(DomainError::invalid_value(
                "symbol",
                "Symbol contains invalid characters",
            ));
        }

        Ok(())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
