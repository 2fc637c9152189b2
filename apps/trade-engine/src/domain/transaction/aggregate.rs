//! Transaction Aggregate Root
//!
//! A transaction is created from a validated intent and moves through its
//! lifecycle only via the methods below. Each transition is checked against
//! [`TransactionStateMachine`] and appended to the status history.

use serde::{Deserialize, Serialize};

use super::errors::TransactionError;
use super::services::TransactionStateMachine;
use super::value_objects::{FailureReason, TradeIntent, TradeSide, TransactionState};
use crate::domain::market_data::Price;
use crate::domain::shared::{
    MoneyAmount, PortfolioId, Quantity, Symbol, Timestamp, TransactionId,
};

/// One entry of the append-only status history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    /// State entered.
    pub state: TransactionState,
    /// When it was entered.
    pub at: Timestamp,
}

/// Transaction Aggregate Root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    id: TransactionId,
    intent: TradeIntent,
    quantity: Quantity,
    state: TransactionState,
    price: Option<Price>,
    notional: Option<MoneyAmount>,
    fee: Option<MoneyAmount>,
    executed_at: Option<Timestamp>,
    failure: Option<FailureReason>,
    history: Vec<StatusChange>,
}

impl Transaction {
    /// Create a transaction in `RECEIVED` from an intent.
    ///
    /// # Errors
    ///
    /// Returns error if the intent's quantity is not a positive integer.
    pub fn receive(intent: TradeIntent, at: Timestamp) -> Result<Self, TransactionError> {
        let quantity = Quantity::from_positive(intent.quantity()).ok_or_else(|| {
            TransactionError::InvalidParameters {
                field: "quantity".to_string(),
                message: format!("must be a positive integer, got {}", intent.quantity()),
            }
        })?;

        Ok(Self {
            id: TransactionId::generate(),
            intent,
            quantity,
            state: TransactionState::Received,
            price: None,
            notional: None,
            fee: None,
            executed_at: None,
            failure: None,
            history: vec![StatusChange {
                state: TransactionState::Received,
                at,
            }],
        })
    }

    // Lifecycle

    /// `RECEIVED → PRICING`: validation passed.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::InvalidTransition`] from any other state.
    pub fn begin_pricing(&mut self, at: Timestamp) -> Result<(), TransactionError> {
        self.transition(TransactionState::Pricing, at)
    }

    /// `PRICING → FEE_CALCULATED`: record the executed price, notional and fee.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::InvalidTransition`] from any other state.
    pub fn record_pricing(
        &mut self,
        price: Price,
        notional: MoneyAmount,
        fee: MoneyAmount,
        at: Timestamp,
    ) -> Result<(), TransactionError> {
        self.transition(TransactionState::FeeCalculated, at)?;
        self.price = Some(price);
        self.notional = Some(notional);
        self.fee = Some(fee);
        Ok(())
    }

    /// `FEE_CALCULATED → COMPLETED`: the holdings update was applied.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::InvalidTransition`] from any other state.
    pub fn complete(&mut self, at: Timestamp) -> Result<(), TransactionError> {
        self.transition(TransactionState::Completed, at)?;
        self.executed_at = Some(at);
        Ok(())
    }

    /// Any non-terminal state `→ FAILED` with a recorded cause.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::InvalidTransition`] from a terminal state.
    pub fn fail(&mut self, reason: FailureReason, at: Timestamp) -> Result<(), TransactionError> {
        self.transition(TransactionState::Failed, at)?;
        self.failure = Some(reason);
        Ok(())
    }

    /// `RECEIVED | PRICING → CANCELLED`.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::InvalidTransition`] once pricing is recorded.
    pub fn cancel(&mut self, at: Timestamp) -> Result<(), TransactionError> {
        self.transition(TransactionState::Cancelled, at)
    }

    fn transition(&mut self, to: TransactionState, at: Timestamp) -> Result<(), TransactionError> {
        TransactionStateMachine::validate_transition(self.state, to)?;
        self.state = to;
        self.history.push(StatusChange { state: to, at });
        Ok(())
    }

    // Getters

    /// Server-generated id.
    #[must_use]
    pub const fn id(&self) -> &TransactionId {
        &self.id
    }

    /// Originating intent.
    #[must_use]
    pub const fn intent(&self) -> &TradeIntent {
        &self.intent
    }

    /// Portfolio the transaction belongs to.
    #[must_use]
    pub const fn portfolio_id(&self) -> &PortfolioId {
        self.intent.portfolio_id()
    }

    /// Symbol traded.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        self.intent.symbol()
    }

    /// Buy or sell.
    #[must_use]
    pub const fn side(&self) -> TradeSide {
        self.intent.side()
    }

    /// Validated quantity.
    #[must_use]
    pub const fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> TransactionState {
        self.state
    }

    /// Returns true once the transaction is COMPLETED, FAILED or CANCELLED.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Executed price, set on entering FEE_CALCULATED.
    #[must_use]
    pub const fn price(&self) -> Option<&Price> {
        self.price.as_ref()
    }

    /// Price × quantity.
    #[must_use]
    pub const fn notional(&self) -> Option<MoneyAmount> {
        self.notional
    }

    /// Fee charged.
    #[must_use]
    pub const fn fee(&self) -> Option<MoneyAmount> {
        self.fee
    }

    /// When the holdings update was applied.
    #[must_use]
    pub const fn executed_at(&self) -> Option<Timestamp> {
        self.executed_at
    }

    /// Cause of failure, for FAILED transactions.
    #[must_use]
    pub const fn failure(&self) -> Option<&FailureReason> {
        self.failure.as_ref()
    }

    /// Status history, oldest first.
    #[must_use]
    pub fn history(&self) -> &[StatusChange] {
        &self.history
    }

    /// When the transaction was received.
    #[must_use]
    pub fn received_at(&self) -> Timestamp {
        self.history.first().map_or_else(|| self.intent.submitted_at(), |c| c.at)
    }

    /// When the transaction reached its terminal state.
    #[must_use]
    pub fn resolved_at(&self) -> Option<Timestamp> {
        if self.is_terminal() {
            self.history.last().map(|c| c.at)
        } else {
            None
        }
    }

    /// Signed quantity change applied to the holding: `+q` for a completed BUY,
    /// `-q` for a completed SELL, zero otherwise.
    #[must_use]
    pub fn quantity_delta(&self) -> i128 {
        if self.state == TransactionState::Completed {
            i128::from(self.side().sign()) * i128::from(self.quantity.value())
        } else {
            0
        }
    }
}
