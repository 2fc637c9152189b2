//! Domain Layer
//!
//! Pure business logic with no infrastructure dependencies.
//!
//! # Bounded Contexts
//!
//! - `shared`: money, symbols, quantities, identifiers and shared errors
//! - `market_data`: prices and cache bookkeeping
//! - `fees`: tiered fee schedule
//! - `transaction`: transaction aggregate and lifecycle rules
//! - `validation`: trade intent validation
//! - `portfolio`: portfolios, holdings and valuations
//! - `anomaly`: advisory scans of transaction history

pub mod anomaly;
pub mod fees;
pub mod market_data;
pub mod portfolio;
pub mod shared;
pub mod transaction;
pub mod validation;
