//! Prometheus metrics for the trade engine.
//!
//! Covers transaction outcomes, price cache behaviour, validation
//! rejections, fees and anomaly flags.
//!
//! # Example
//!
//! ```ignore
//! use trade_engine::observability::{init_metrics, MetricsConfig};
//!
//! let config = MetricsConfig::default();
//! init_metrics(&config)?;
//!
//! // Record a completed BUY
//! record_transaction_outcome("COMPLETED", "BUY");
//! ```

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::net::{Ipv4Addr, SocketAddr};

/// Configuration for the metrics exporter.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Address to bind the metrics HTTP listener.
    pub listen_addr: SocketAddr,
    /// Histogram buckets for latency measurements (in seconds).
    pub latency_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 9090)),
            // Latency buckets from 100us to 5s
            latency_buckets: vec![
                0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
            ],
        }
    }
}

impl MetricsConfig {
    /// Create a new metrics configuration with custom address.
    #[must_use]
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            listen_addr: addr,
            ..Default::default()
        }
    }
}

/// Initialize the Prometheus metrics exporter.
///
/// This starts an HTTP server that exposes metrics at `/metrics`.
///
/// # Errors
///
/// Returns an error if the metrics exporter fails to start (e.g., port already in use).
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .set_buckets(&config.latency_buckets)
        .map_err(|e| MetricsError::Configuration(e.to_string()))?
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    tracing::info!(
        addr = %config.listen_addr,
        "Prometheus metrics exporter started"
    );

    Ok(())
}

/// Error type for metrics operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Failed to configure metrics exporter.
    #[error("metrics configuration error: {0}")]
    Configuration(String),
    /// Failed to install metrics exporter.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

// ============================================================================
// Transaction Metrics
// ============================================================================

/// Record a transaction reaching a terminal state.
///
/// # Arguments
///
/// * `state` - Terminal state (e.g., "COMPLETED", "FAILED", "CANCELLED")
/// * `side` - Trade side ("BUY" or "SELL")
pub fn record_transaction_outcome(state: &str, side: &str) {
    counter!(
        "transactions_total",
        "state" => state.to_string(),
        "side" => side.to_string()
    )
    .increment(1);
}

/// Record end-to-end submit latency.
///
/// # Arguments
///
/// * `outcome` - "completed", "failed", "cancelled", "replayed", "rejected" or "error"
/// * `latency_seconds` - Time spent in `execute`
pub fn record_submit_latency(outcome: &str, latency_seconds: f64) {
    histogram!(
        "submit_latency_seconds",
        "outcome" => outcome.to_string()
    )
    .record(latency_seconds);
}

/// Record an idempotent replay of an earlier outcome.
pub fn record_replay() {
    counter!("transaction_replays_total").increment(1);
}

/// Record a validation rejection.
///
/// # Arguments
///
/// * `rule` - Rule label (e.g., `"INSUFFICIENT_HOLDINGS"`)
pub fn record_validation_rejection(rule: &str) {
    counter!(
        "validation_rejections_total",
        "rule" => rule.to_string()
    )
    .increment(1);
}

/// Record a computed fee.
///
/// # Arguments
///
/// * `currency` - ISO currency code
/// * `amount` - Fee amount
pub fn record_fee(currency: &str, amount: Decimal) {
    histogram!(
        "transaction_fee",
        "currency" => currency.to_string()
    )
    .record(amount.to_f64().unwrap_or(0.0));
}

// ============================================================================
// Price Cache Metrics
// ============================================================================

/// Record one fetch attempt against the live price source.
///
/// # Arguments
///
/// * `outcome` - "success", "error" or "timeout"
/// * `latency_seconds` - Attempt duration
pub fn record_price_fetch(outcome: &str, latency_seconds: f64) {
    counter!(
        "price_fetch_attempts_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        "price_fetch_latency_seconds",
        "outcome" => outcome.to_string()
    )
    .record(latency_seconds);
}

/// Record how a price lookup was served.
///
/// # Arguments
///
/// * `source` - "fresh", "refreshed", "stale" or "unavailable"
pub fn record_price_lookup(source: &str) {
    counter!(
        "price_lookups_total",
        "source" => source.to_string()
    )
    .increment(1);
}

/// Update the consecutive fetch failure gauge for a symbol.
///
/// # Arguments
///
/// * `symbol` - Symbol (e.g., "AAPL")
/// * `failures` - Failures since the last success
pub fn record_price_failures(symbol: &str, failures: u32) {
    gauge!(
        "price_consecutive_failures",
        "symbol" => symbol.to_string()
    )
    .set(f64::from(failures));
}

// ============================================================================
// Anomaly Metrics
// ============================================================================

/// Record an anomaly flag.
///
/// # Arguments
///
/// * `kind` - Flag kind (e.g., "VELOCITY")
pub fn record_anomaly_flag(kind: &str) {
    counter!(
        "anomaly_flags_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}
