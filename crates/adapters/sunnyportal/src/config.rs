//! Sunny Portal integration configuration.
//!
//! Credentials and the metric list are required; polling knobs fall back to
//! defaults. `SUNNYPORTAL_USERNAME` / `SUNNYPORTAL_PASSWORD` override the
//! file so secrets can stay out of it.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::client::Credentials;
use crate::metric::MetricKind;

const DEFAULT_UPDATE_INTERVAL_SECS: u64 = 15 * 60;
const DEFAULT_SCAN_INTERVAL_SECS: u64 = 30;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration for the Sunny Portal integration.
#[derive(Clone, Deserialize)]
pub struct SunnyPortalConfig {
    /// Sunny Portal account name (usually an e-mail address).
    pub username: String,
    /// Sunny Portal account password.
    pub password: String,
    /// Which metrics to expose for every discovered plant.
    ///
    /// A single identifier is accepted as a one-element list.
    #[serde(deserialize_with = "one_or_many")]
    pub monitored_variables: Vec<MetricKind>,
    /// Minimum time between two portal round-trips, in seconds.
    #[serde(default = "default_update_interval_secs")]
    pub update_interval_secs: u64,
    /// How often sensors refresh from the shared snapshot, in seconds.
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,
    /// Upper bound for a single portal call, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_update_interval_secs() -> u64 {
    DEFAULT_UPDATE_INTERVAL_SECS
}

fn default_scan_interval_secs() -> u64 {
    DEFAULT_SCAN_INTERVAL_SECS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<MetricKind>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(MetricKind),
        Many(Vec<MetricKind>),
    }

    let metrics = match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(metric) => vec![metric],
        OneOrMany::Many(metrics) => metrics,
    };

    let mut unique = Vec::with_capacity(metrics.len());
    for metric in metrics {
        if !unique.contains(&metric) {
            unique.push(metric);
        }
    }
    Ok(unique)
}

impl SunnyPortalConfig {
    /// Load configuration from a TOML file, apply environment overrides and
    /// validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is malformed, or fails
    /// validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse and validate a TOML configuration block.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when a required key is missing, has the
    /// wrong type, or names an unknown metric, and
    /// [`ConfigError::Validation`] when an interval or timeout is zero.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Replace credentials with values found through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("SUNNYPORTAL_USERNAME") {
            self.username = val;
        }
        if let Some(val) = lookup("SUNNYPORTAL_PASSWORD") {
            self.password = val;
        }
    }

    /// Check semantic constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when an interval or timeout is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.update_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "update_interval_secs must be non-zero".to_string(),
            ));
        }
        if self.scan_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "scan_interval_secs must be non-zero".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "request_timeout_secs must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }

    #[must_use]
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    #[must_use]
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl fmt::Debug for SunnyPortalConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SunnyPortalConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("monitored_variables", &self.monitored_variables)
            .field("update_interval_secs", &self.update_interval_secs)
            .field("scan_interval_secs", &self.scan_interval_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse or schema failure.
    #[error("failed to parse Sunny Portal configuration")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read Sunny Portal configuration")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid Sunny Portal configuration: {0}")]
    Validation(String),
}
