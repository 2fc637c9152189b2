//! Application Ports
//!
//! Driven (outbound) ports the application consumes. Repository ports live
//! with their aggregates in the domain layer.

mod price_source_port;

pub use price_source_port::{PriceSourceError, PriceSourcePort};
