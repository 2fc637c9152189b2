//! Observability module for metrics.
//!
//! Prometheus metrics export for transaction processing and pricing.
//! Logging setup lives in [`crate::telemetry`].

mod metrics;

pub use metrics::{
    MetricsConfig, MetricsError, init_metrics, record_anomaly_flag, record_fee,
    record_price_failures, record_price_fetch, record_price_lookup, record_replay,
    record_submit_latency, record_transaction_outcome, record_validation_rejection,
};
