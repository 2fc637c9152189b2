//! Configuration module for the trade engine.
//!
//! YAML loading with environment variable interpolation and validation.
//! Every section is optional and falls back to the runtime defaults.
//!
//! # Usage
//!
//! ```rust,ignore
//! use trade_engine::config::load_config;
//!
//! let config = load_config("config.yaml")?;
//! let cache = config.pricing.to_cache_config();
//! let fees = config.fee_schedule()?;
//! ```
//!
//! # Example
//!
//! ```yaml
//! engine:
//!   base_currency: USD
//!   default_submit_timeout_ms: 5000
//! pricing:
//!   freshness_window_ms: 5000
//!   max_staleness_ms: 60000
//!   retry:
//!     max_attempts: 3
//! fees:
//!   tiers:
//!     - { lower: 0, upper: 1000, rate: 0.01, minimum: 1 }
//!     - { lower: 1000, rate: 0.005, minimum: 10 }
//! observability:
//!   logging:
//!     level: ${LOG_LEVEL:-info}
//!     format: pretty
//! ```

mod anomaly;
mod engine;
mod fees;
mod observability;
mod pricing;
mod validation;

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use anomaly::AnomalySettings;
pub use engine::EngineConfig;
pub use fees::FeesConfig;
pub use observability::{LogFormat, LoggingConfig, MetricsSettings, ObservabilityConfig};
pub use pricing::{PricingConfig, RetryConfig};
pub use validation::ValidationConfig;

use crate::domain::fees::FeeSchedule;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Engine-wide settings.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Market price cache settings.
    #[serde(default)]
    pub pricing: PricingConfig,
    /// Fee schedule.
    #[serde(default)]
    pub fees: FeesConfig,
    /// Intent validation settings.
    #[serde(default)]
    pub validation: ValidationConfig,
    /// Anomaly detection thresholds.
    #[serde(default)]
    pub anomaly: AnomalySettings,
    /// Logging and metrics.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// The fee schedule, charging in the base currency unless `fees.currency` is set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if the tiers are invalid.
    pub fn fee_schedule(&self) -> Result<FeeSchedule, ConfigError> {
        self.fees
            .to_fee_schedule(self.engine.base_currency)
            .map_err(|e| ConfigError::ValidationError(format!("fees: {e}")))
    }
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    load_config_from_string(&contents)
}

/// Load configuration from a YAML string.
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax. Unset or empty
/// variables without a default become the empty string.
#[allow(clippy::expect_used)] // Regex is a literal
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map_or("", |m| m.as_str());
        match std::env::var(&cap[1]) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.to_string(),
        }
    })
    .into_owned()
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let invalid = |msg: &str| -> Result<(), ConfigError> {
        Err(ConfigError::ValidationError(msg.to_string()))
    };

    if config.engine.default_submit_timeout_ms == 0 {
        return invalid("engine.default_submit_timeout_ms must be positive");
    }

    let pricing = &config.pricing;
    if pricing.fetch_timeout_ms == 0 {
        return invalid("pricing.fetch_timeout_ms must be positive");
    }
    if pricing.max_staleness_ms < pricing.freshness_window_ms {
        return invalid("pricing.max_staleness_ms must be at least pricing.freshness_window_ms");
    }
    if pricing.retry.max_attempts == 0 {
        return invalid("pricing.retry.max_attempts must be at least 1");
    }
    if pricing.retry.backoff_multiplier < 1.0 {
        return invalid("pricing.retry.backoff_multiplier must be at least 1.0");
    }
    if !(0.0..=1.0).contains(&pricing.retry.jitter_factor) {
        return invalid("pricing.retry.jitter_factor must be between 0.0 and 1.0");
    }

    config.fee_schedule()?;

    let anomaly = &config.anomaly;
    if anomaly.velocity_max == 0 {
        return invalid("anomaly.velocity_max must be positive");
    }
    if anomaly.size_multiple <= rust_decimal::Decimal::ONE {
        return invalid("anomaly.size_multiple must be greater than 1");
    }

    if config.observability.metrics.enabled && config.observability.metrics.socket_addr().is_err() {
        return Err(ConfigError::ValidationError(format!(
            "observability.metrics.listen_addr '{}' is not a socket address",
            config.observability.metrics.listen_addr
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::PriceCacheConfig;
    use crate::domain::anomaly::AnomalyConfig;
    use crate::domain::shared::{Currency, MoneyAmount};
    use rust_decimal_macros::dec;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn empty_document_yields_defaults() {
        let config = load_config_from_string("{}").unwrap();
        assert_eq!(config.engine.base_currency, Currency::USD);
        assert_eq!(config.engine.default_submit_timeout(), Duration::from_secs(5));
        assert_eq!(config.pricing.to_cache_config(), PriceCacheConfig::default());
        assert_eq!(config.anomaly.to_anomaly_config(), AnomalyConfig::default());
        assert_eq!(config.fee_schedule().unwrap(), FeeSchedule::default());
        assert_eq!(config.observability.logging.format, LogFormat::Json);
        assert!(!config.observability.metrics.enabled);
    }

    #[test]
    fn sections_override_defaults() {
        let yaml = r"
engine:
  base_currency: eur
  default_submit_timeout_ms: 250
pricing:
  freshness_window_ms: 1000
  retry:
    max_attempts: 5
    jitter_factor: 0
validation:
  idempotency_retention_secs: 60
anomaly:
  velocity_max: 10
observability:
  logging:
    level: debug
    format: pretty
";
        let config = load_config_from_string(yaml).unwrap();
        assert_eq!(config.engine.base_currency, Currency::EUR);
        assert_eq!(config.engine.default_submit_timeout(), Duration::from_millis(250));

        let cache = config.pricing.to_cache_config();
        assert_eq!(cache.freshness_window, Duration::from_secs(1));
        assert_eq!(cache.max_staleness, Duration::from_secs(60));
        assert_eq!(cache.retry.max_attempts, 5);

        assert_eq!(
            config.validation.to_validator().idempotency_retention(),
            Duration::from_secs(60)
        );
        assert_eq!(config.anomaly.to_anomaly_config().velocity_max, 10);
        assert_eq!(config.observability.logging.format, LogFormat::Pretty);

        // Fees follow the base currency.
        assert_eq!(config.fee_schedule().unwrap().currency(), Currency::EUR);
    }

    #[test]
    fn custom_fee_tiers() {
        let yaml = r#"
fees:
  currency: GBP
  tiers:
    - { lower: 0, upper: 500, rate: "0.02", minimum: 2 }
    - { lower: 500, rate: "0.01", minimum: 10 }
"#;
        let schedule = load_config_from_string(yaml).unwrap().fee_schedule().unwrap();
        assert_eq!(schedule.currency(), Currency::GBP);
        assert_eq!(schedule.tiers().len(), 2);

        let fee = schedule
            .compute_fee(&MoneyAmount::new(dec!(100), Currency::GBP))
            .unwrap();
        assert_eq!(fee.amount(), dec!(2.00));
    }

    #[test]
    fn gapped_fee_tiers_are_rejected() {
        let yaml = r#"
fees:
  tiers:
    - { lower: 0, upper: 500, rate: "0.02", minimum: 2 }
    - { lower: 600, rate: "0.01", minimum: 10 }
"#;
        let Err(err) = load_config_from_string(yaml) else {
            panic!("expected error for non-contiguous tiers");
        };
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("fees"));
    }

    #[test]
    fn staleness_below_freshness_is_rejected() {
        let yaml = r"
pricing:
  freshness_window_ms: 10000
  max_staleness_ms: 5000
";
        let Err(err) = load_config_from_string(yaml) else {
            panic!("expected validation error");
        };
        assert!(err.to_string().contains("max_staleness_ms"));
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let yaml = r"
pricing:
  retry:
    max_attempts: 0
";
        assert!(load_config_from_string(yaml).is_err());
    }

    #[test]
    fn bad_metrics_address_is_rejected_only_when_enabled() {
        let disabled = "observability:\n  metrics:\n    listen_addr: nowhere\n";
        assert!(load_config_from_string(disabled).is_ok());

        let enabled = "observability:\n  metrics:\n    enabled: true\n    listen_addr: nowhere\n";
        let Err(err) = load_config_from_string(enabled) else {
            panic!("expected validation error");
        };
        assert!(err.to_string().contains("listen_addr"));
    }

    #[test]
    fn env_var_with_default_when_missing() {
        let input = "level: ${TRADE_ENGINE_CONFIG_TEST_NONEXISTENT_VAR:-warn}";
        assert_eq!(interpolate_env_vars(input), "level: warn");
    }

    #[test]
    #[expect(clippy::literal_string_with_formatting_args)] // ${...} is env var syntax
    fn env_var_with_default_uses_existing() {
        let input = "path: ${PATH:-default}";
        let result = interpolate_env_vars(input);
        assert_ne!(result, "path: default");
        assert!(result.starts_with("path: "));
    }

    #[test]
    fn env_var_without_default_becomes_empty() {
        let input = "level: ${TRADE_ENGINE_CONFIG_TEST_UNLIKELY_TO_EXIST}";
        assert_eq!(interpolate_env_vars(input), "level: ");
    }

    #[test]
    fn interpolated_default_reaches_config() {
        let yaml = "engine:\n  default_submit_timeout_ms: ${TRADE_ENGINE_CONFIG_TEST_TIMEOUT:-750}\n";
        let config = load_config_from_string(yaml).unwrap();
        assert_eq!(config.engine.default_submit_timeout_ms, 750);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "engine:\n  base_currency: GBP").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.engine.base_currency, Currency::GBP);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let Err(err) = load_config(dir.path().join("absent.yaml")) else {
            panic!("expected read error");
        };
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let Err(err) = load_config_from_string("engine: [unclosed") else {
            panic!("expected parse error");
        };
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
