//! Infrastructure Layer
//!
//! Adapters for the ports the application defines:
//!
//! - `persistence/`: in-memory transaction and portfolio repositories
//! - `price_feed/`: price source adapters
//! - `config/`: dependency injection container

pub mod config;
pub mod persistence;
pub mod price_feed;
