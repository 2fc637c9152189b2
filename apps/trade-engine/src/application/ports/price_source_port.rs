//! Price Source Port (Driven Port)
//!
//! Interface for fetching live market prices.

use async_trait::async_trait;

use crate::domain::market_data::Price;
use crate::domain::shared::Symbol;

/// Price source error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceSourceError {
    /// Source could not be reached.
    #[error("Price source unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// Symbol not quoted by the source.
    #[error("Symbol not found: {symbol}")]
    SymbolNotFound {
        /// The unknown symbol.
        symbol: String,
    },
}

/// Port for fetching live prices.
#[async_trait]
pub trait PriceSourcePort: Send + Sync {
    /// Fetch the current price for a symbol.
    ///
    /// # Errors
    ///
    /// Returns error if the source is unreachable or does not quote the symbol.
    async fn fetch_live_price(&self, symbol: &Symbol) -> Result<Price, PriceSourceError>;
}
