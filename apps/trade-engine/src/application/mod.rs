//! Application Layer
//!
//! The application layer orchestrates domain logic through use cases.
//! It defines:
//!
//! - **Ports**: Interfaces for the price source the engine consumes
//! - **Services**: Price cache, portfolio aggregation, keyed locks, retry backoff
//! - **Use Cases**: Trade submission, valuation, history and anomaly scans

pub mod ports;
pub mod services;
pub mod use_cases;

pub use ports::*;
pub use services::*;
pub use use_cases::*;
