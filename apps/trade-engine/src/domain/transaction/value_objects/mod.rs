//! Transaction value objects.

mod failure_reason;
mod history_range;
mod trade_intent;
mod trade_side;
mod transaction_state;

pub use failure_reason::FailureReason;
pub use history_range::HistoryRange;
pub use trade_intent::TradeIntent;
pub use trade_side::TradeSide;
pub use transaction_state::TransactionState;
