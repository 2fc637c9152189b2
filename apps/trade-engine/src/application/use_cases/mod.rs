//! Application Use Cases
//!
//! Entry points that orchestrate the domain through ports and services.

mod scan_anomalies;
mod submit_trade;
mod transaction_history;
mod value_portfolio;

pub use scan_anomalies::ScanAnomaliesUseCase;
pub use submit_trade::{
    DEFAULT_SUBMIT_TIMEOUT, SubmitError, SubmitOptions, SubmitTradeUseCase, Submission,
};
pub use transaction_history::{HistorySummary, SideSummary, TransactionHistoryUseCase};
pub use value_portfolio::ValuePortfolioUseCase;
