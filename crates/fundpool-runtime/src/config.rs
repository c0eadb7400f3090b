//! Service configuration
//!
//! Durations are written as humantime strings (`"1s"`, `"250ms"`).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use fundpool_distribution::PLATFORM_FEE_PERCENT;

use crate::LoggingConfig;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Retry policy for chain reads
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Fixed wait between attempts
    #[serde(with = "humantime_duration")]
    pub backoff: Duration,
    /// Per-attempt deadline
    #[serde(with = "humantime_duration")]
    pub attempt_timeout: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        FetchPolicy {
            max_attempts: 3,
            backoff: Duration::from_secs(1),
            attempt_timeout: Duration::from_secs(10),
        }
    }
}

/// Campaign service configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub fetch: FetchPolicy,
    pub platform_fee_percent: u64,
    /// Phase ticker period
    #[serde(with = "humantime_duration")]
    pub phase_tick: Duration,
    pub logging: LoggingConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            fetch: FetchPolicy::default(),
            platform_fee_percent: PLATFORM_FEE_PERCENT,
            phase_tick: Duration::from_secs(1),
            logging: LoggingConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Short backoff and timeouts for local tooling and tests
    pub fn fast_retry() -> Self {
        ServiceConfig {
            fetch: FetchPolicy {
                max_attempts: 3,
                backoff: Duration::from_millis(10),
                attempt_timeout: Duration::from_millis(500),
            },
            ..ServiceConfig::default()
        }
    }

    /// Parse from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: ServiceConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.max_attempts == 0 {
            return Err(ConfigError::Invalid("fetch.max_attempts must be at least 1".into()));
        }
        if self.phase_tick.is_zero() {
            return Err(ConfigError::Invalid("phase_tick must be non-zero".into()));
        }
        if self.platform_fee_percent > 100 {
            return Err(ConfigError::Invalid(format!(
                "platform_fee_percent {} exceeds 100",
                self.platform_fee_percent
            )));
        }
        Ok(())
    }
}

mod humantime_duration {
    use std::time::Duration;

    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(D::Error::custom)
    }
}
