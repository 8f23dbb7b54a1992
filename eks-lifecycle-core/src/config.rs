//! Lifecycle timing configuration
//!
//! All durations are whole seconds in TOML:
//!
//! ```toml
//! poll_interval_secs = 10
//! retry_delay_secs = 5
//! propagation_timeout_secs = 120
//! not_found_checks = 20
//!
//! [timeouts]
//! create_secs = 1800
//! update_secs = 3600
//! delete_secs = 900
//! ```
//!
//! Missing keys fall back to the defaults above. Every duration must be
//! non-zero (the propagation timeout excepted) and at most one week.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::retry::RetryConfig;
use crate::wait::{WaitSpec, DEFAULT_NOT_FOUND_CHECKS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("invalid config: {field} must be at most {max} seconds, got {value}")]
    TooLarge {
        field: &'static str,
        value: u64,
        max: u64,
    },
}

/// Longest accepted wait or retry window: one week.
pub const MAX_TIMEOUT_SECS: u64 = 7 * 24 * 60 * 60;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Per-operation wait timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Timeouts {
    pub create_secs: u64,
    pub update_secs: u64,
    pub delete_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create_secs: 30 * 60,
            update_secs: 60 * 60,
            delete_secs: 15 * 60,
        }
    }
}

impl Timeouts {
    pub fn create(&self) -> Duration {
        Duration::from_secs(self.create_secs)
    }

    pub fn update(&self) -> Duration {
        Duration::from_secs(self.update_secs)
    }

    pub fn delete(&self) -> Duration {
        Duration::from_secs(self.delete_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LifecycleConfig {
    pub poll_interval_secs: u64,
    pub retry_delay_secs: u64,
    /// How long submissions are retried while IAM changes propagate.
    pub propagation_timeout_secs: u64,
    pub not_found_checks: u32,
    pub timeouts: Timeouts,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            retry_delay_secs: 5,
            propagation_timeout_secs: 2 * 60,
            not_found_checks: DEFAULT_NOT_FOUND_CHECKS,
            timeouts: Timeouts::default(),
        }
    }
}

impl LifecycleConfig {
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or return the defaults when `path` is `None`.
    pub async fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("loaded lifecycle config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let nonzero = [
            ("poll_interval_secs", self.poll_interval_secs),
            ("retry_delay_secs", self.retry_delay_secs),
            ("timeouts.create_secs", self.timeouts.create_secs),
            ("timeouts.update_secs", self.timeouts.update_secs),
            ("timeouts.delete_secs", self.timeouts.delete_secs),
        ];
        for (field, value) in nonzero {
            if value == 0 {
                return Err(ConfigError::Zero { field });
            }
        }

        let bounded = [
            ("poll_interval_secs", self.poll_interval_secs),
            ("retry_delay_secs", self.retry_delay_secs),
            ("propagation_timeout_secs", self.propagation_timeout_secs),
            ("timeouts.create_secs", self.timeouts.create_secs),
            ("timeouts.update_secs", self.timeouts.update_secs),
            ("timeouts.delete_secs", self.timeouts.delete_secs),
        ];
        for (field, value) in bounded {
            if value > MAX_TIMEOUT_SECS {
                return Err(ConfigError::TooLarge {
                    field,
                    value,
                    max: MAX_TIMEOUT_SECS,
                });
            }
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// Retry settings for submissions that race IAM propagation.
    pub fn propagation_retry(&self) -> RetryConfig {
        RetryConfig::new(Duration::from_secs(self.propagation_timeout_secs))
            .with_delay(self.retry_delay())
    }

    /// A wait with this config's poll interval and not-found tolerance.
    pub fn wait_spec(&self, timeout: Duration) -> WaitSpec {
        WaitSpec::new(timeout)
            .poll_interval(self.poll_interval())
            .not_found_checks(self.not_found_checks)
    }
}
