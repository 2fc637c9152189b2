//! Read-side valuation types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Holding, HoldingError};
use crate::domain::market_data::Price;
use crate::domain::shared::{MoneyAmount, PortfolioId, Quantity, Symbol};

/// Result of applying a completed transaction to a holding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingUpdate {
    /// Holding after the trade.
    pub holding: Holding,
    /// Holding before the trade; `None` if the symbol was never held.
    pub previous: Option<Holding>,
    /// `(price − basis) × quantity` for a SELL; `None` for a BUY.
    pub realized_gain: Option<MoneyAmount>,
}

/// One holding valued at a market price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingValuation {
    /// Symbol held.
    pub symbol: Symbol,
    /// Units held.
    pub quantity: Quantity,
    /// Average cost per unit.
    pub average_cost: MoneyAmount,
    /// Price used.
    pub price: Price,
    /// Price × quantity.
    pub market_value: MoneyAmount,
    /// Average cost × quantity.
    pub cost_value: MoneyAmount,
    /// Market value − cost value.
    pub unrealized_gain: MoneyAmount,
    /// Unrealized gain as a percentage of cost value; `None` when cost value is zero.
    pub gain_percent: Option<Decimal>,
}

impl HoldingValuation {
    /// Value `holding` at `price`.
    ///
    /// # Errors
    ///
    /// Returns error on currency mismatch or overflow.
    pub fn compute(holding: &Holding, price: Price) -> Result<Self, HoldingError> {
        let market_value = price.unit().mul_units(holding.quantity())?;
        let cost_value = holding.cost_value()?;
        let unrealized_gain = market_value.checked_sub(&cost_value)?;
        let gain_percent = if cost_value.is_zero() {
            None
        } else {
            unrealized_gain
                .amount()
                .checked_div(cost_value.amount())
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        };

        Ok(Self {
            symbol: holding.symbol().clone(),
            quantity: holding.quantity(),
            average_cost: holding.average_cost(),
            price,
            market_value,
            cost_value,
            unrealized_gain,
            gain_percent,
        })
    }
}

/// Per-holding breakdown of a portfolio's value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioValuation {
    /// Portfolio valued.
    pub portfolio_id: PortfolioId,
    /// Holdings with a positive quantity, in symbol order.
    pub holdings: Vec<HoldingValuation>,
    /// Sum of market values.
    pub total_market_value: MoneyAmount,
    /// Sum of cost values.
    pub total_cost_value: MoneyAmount,
    /// Sum of unrealized gains.
    pub total_unrealized_gain: MoneyAmount,
}
