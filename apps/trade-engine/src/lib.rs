// Allow unwrap/expect in tests - tests should panic on unexpected errors
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Trade Engine - Rust Core Library
//!
//! Transaction processing and portfolio valuation.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Core business logic
//!   - `shared`: `MoneyAmount`, `Currency`, `Symbol`, `Quantity`, identifiers
//!   - `transaction`: Transaction aggregate and its lifecycle
//!   - `validation`: Intent validation and idempotency rules
//!   - `fees`: Tiered fee schedule
//!   - `portfolio`: Portfolio aggregate, holdings, valuations
//!   - `anomaly`: Advisory history scans
//!
//! - **Application**: Use cases and orchestration
//!   - `ports`: `PriceSourcePort`
//!   - `services`: `MarketPriceCache`, `PortfolioAggregator`, `KeyedLocks`
//!   - `use_cases`: `SubmitTrade`, `ValuePortfolio`, `TransactionHistory`, `ScanAnomalies`
//!
//! - **Infrastructure**: Adapters
//!   - `persistence`: In-memory repositories
//!   - `price_feed`: Mock price source
//!   - `config`: Dependency injection container
//!
//! Cross-cutting: [`config`] (YAML loading), [`error`] (stable error codes),
//! [`telemetry`] (tracing setup), [`observability`] (Prometheus metrics).

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and wiring.
pub mod infrastructure;

// =============================================================================
// Cross-cutting
// =============================================================================

pub mod config;
pub mod error;
pub mod observability;
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

// Domain re-exports
pub use domain::anomaly::{AnomalyConfig, AnomalyDetector, Flag, FlagKind};
pub use domain::fees::{FeeSchedule, FeeTier};
pub use domain::market_data::{Price, PriceTag};
pub use domain::portfolio::{Holding, HoldingUpdate, Portfolio, PortfolioValuation};
pub use domain::shared::{
    Currency, IdempotencyKey, MoneyAmount, OwnerId, PortfolioId, Quantity, Symbol, Timestamp,
    TransactionId,
};
pub use domain::transaction::{
    FailureReason, HistoryRange, TradeIntent, TradeSide, Transaction, TransactionState,
};
pub use domain::validation::{TransactionValidator, ValidationError};

// Application re-exports
pub use application::ports::{PriceSourceError, PriceSourcePort};
pub use application::services::{MarketPriceCache, PriceCacheConfig, PriceError, RetryPolicy};
pub use application::use_cases::{
    HistorySummary, ScanAnomaliesUseCase, SubmitError, SubmitOptions, SubmitTradeUseCase,
    Submission, TransactionHistoryUseCase, ValuePortfolioUseCase,
};

// Infrastructure re-exports
pub use infrastructure::config::Container;
pub use infrastructure::persistence::{InMemoryPortfolioRepository, InMemoryTransactionRepository};
pub use infrastructure::price_feed::MockPriceSource;

// Cross-cutting re-exports
pub use config::{Config, ConfigError, load_config, load_config_from_string};
pub use error::{EngineError, ErrorCategory, ErrorCode};
