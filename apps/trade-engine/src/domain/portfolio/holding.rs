//! Holding entity: a position in one symbol.

use serde::{Deserialize, Serialize};

use super::HoldingError;
use crate::domain::shared::{Currency, MoneyAmount, Quantity, Symbol};

/// A position in one symbol.
///
/// The current market price is never stored here; it is looked up in the
/// price cache when valuing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    symbol: Symbol,
    quantity: Quantity,
    average_cost: MoneyAmount,
}

impl Holding {
    /// Create a holding.
    #[must_use]
    pub const fn new(symbol: Symbol, quantity: Quantity, average_cost: MoneyAmount) -> Self {
        Self {
            symbol,
            quantity,
            average_cost,
        }
    }

    /// A zero-quantity holding with zero cost basis.
    #[must_use]
    pub const fn empty(symbol: Symbol, currency: Currency) -> Self {
        Self::new(symbol, Quantity::ZERO, MoneyAmount::zero(currency))
    }

    /// Symbol held.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Units held.
    #[must_use]
    pub const fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Average cost per unit.
    #[must_use]
    pub const fn average_cost(&self) -> MoneyAmount {
        self.average_cost
    }

    /// Total cost basis: average cost × quantity.
    ///
    /// # Errors
    ///
    /// Returns error on overflow.
    pub fn cost_value(&self) -> Result<MoneyAmount, HoldingError> {
        Ok(self.average_cost.mul_units(self.quantity)?)
    }

    /// Holding after buying `quantity` at `price` per unit.
    ///
    /// New basis = (old basis × old qty + price × qty) / (old qty + qty),
    /// kept at full precision.
    ///
    /// # Errors
    ///
    /// Returns error on currency mismatch or overflow.
    pub fn after_buy(&self, quantity: Quantity, price: MoneyAmount) -> Result<Self, HoldingError> {
        let new_quantity =
            self.quantity
                .checked_add(quantity)
                .ok_or_else(|| HoldingError::QuantityOverflow {
                    symbol: self.symbol.clone(),
                })?;

        let average_cost = if self.quantity.is_zero() {
            price
        } else {
            let total = self
                .cost_value()?
                .checked_add(&price.mul_units(quantity)?)?;
            total.div_units(new_quantity)?
        };
        // Empty holdings are created with a zero basis in the portfolio currency;
        // still reject a price in any other currency.
        self.average_cost.ensure_same_currency(&average_cost)?;

        Ok(Self::new(self.symbol.clone(), new_quantity, average_cost))
    }

    /// Holding after selling `quantity` at `price` per unit, with the realized gain
    /// `(price − basis) × quantity`. The basis is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`HoldingError::InsufficientHoldings`] if `quantity` exceeds the
    /// held quantity, or a money error on currency mismatch or overflow.
    pub fn after_sell(
        &self,
        quantity: Quantity,
        price: MoneyAmount,
    ) -> Result<(Self, MoneyAmount), HoldingError> {
        let remaining =
            self.quantity
                .checked_sub(quantity)
                .ok_or_else(|| HoldingError::InsufficientHoldings {
                    symbol: self.symbol.clone(),
                    held: self.quantity,
                    requested: quantity,
                })?;

        let realized = price.checked_sub(&self.average_cost)?.mul_units(quantity)?;

        Ok((
            Self::new(self.symbol.clone(), remaining, self.average_cost),
            realized,
        ))
    }
}
