//! Portfolio Bounded Context
//!
//! Portfolios, holdings and the read-side valuation types derived from them.

pub mod aggregate;
pub mod errors;
pub mod holding;
pub mod repository;
pub mod valuation;

pub use aggregate::Portfolio;
pub use errors::HoldingError;
pub use holding::Holding;
pub use repository::PortfolioRepository;
pub use valuation::{HoldingUpdate, HoldingValuation, PortfolioValuation};
