//! Configuration for the expvar bridge.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use expvar_common::{Format, KeyExprBuilder, LoggingConfig, ZenohConfig};

use crate::error::ConfigError;

/// Complete bridge configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpvarBridgeConfig {
    /// Zenoh connection settings.
    #[serde(default)]
    pub zenoh: ZenohConfig,

    /// Source polling and forwarding settings.
    #[serde(default)]
    pub expvar: ExpvarConfig,

    /// Publishing settings.
    #[serde(default)]
    pub publish: PublishConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// What a cycle does after a matched metric fails to forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Stop at the first failure; points already pushed stay pushed.
    #[default]
    Abort,
    /// Attempt every matched metric and report all failures together.
    Continue,
}

/// Source polling and forwarding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpvarConfig {
    /// URL of the introspection endpoint.
    #[serde(default = "default_source_url")]
    pub source_url: String,

    /// Poll interval in seconds (default: 60).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Regular expressions selecting the metric names to forward.
    #[serde(default = "default_filters")]
    pub filters: Vec<String>,

    /// Metric namespace (default: "my-service").
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Instance identity to tag data points with.
    /// Use "auto" to look it up from the metadata service (default).
    #[serde(default = "default_instance_id")]
    pub instance_id: String,

    /// Metadata endpoint returning the instance identity as plain text.
    #[serde(default = "default_metadata_url")]
    pub metadata_url: String,

    /// Deadline for reading the source, in seconds (0 = none, default: 10).
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// Failure handling within a cycle.
    #[serde(default)]
    pub on_error: ErrorPolicy,
}

fn default_source_url() -> String {
    "http://localhost:8081/debug/vars".to_string()
}

fn default_poll_interval() -> u64 {
    60
}

fn default_filters() -> Vec<String> {
    vec![r"\.total$".to_string()]
}

fn default_namespace() -> String {
    "my-service".to_string()
}

fn default_instance_id() -> String {
    "auto".to_string()
}

fn default_metadata_url() -> String {
    "http://169.254.169.254/latest/meta-data/instance-id".to_string()
}

fn default_timeout() -> u64 {
    10
}

impl Default for ExpvarConfig {
    fn default() -> Self {
        Self {
            source_url: default_source_url(),
            poll_interval_secs: default_poll_interval(),
            filters: default_filters(),
            namespace: default_namespace(),
            instance_id: default_instance_id(),
            metadata_url: default_metadata_url(),
            request_timeout_secs: default_timeout(),
            on_error: ErrorPolicy::default(),
        }
    }
}

impl ExpvarConfig {
    /// Get poll interval as Duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Get the source deadline, if any.
    pub fn request_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.request_timeout_secs)
    }
}

/// Publishing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Key expression prefix (default: "expvar").
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Payload serialization format.
    #[serde(default)]
    pub format: Format,

    /// Deadline for one publish, in seconds (0 = none, default: 10).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_key_prefix() -> String {
    expvar_common::keyexpr::KEY_PREFIX.to_string()
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
            format: Format::default(),
            timeout_secs: default_timeout(),
        }
    }
}

impl PublishConfig {
    /// Get the publish deadline, if any.
    pub fn timeout(&self) -> Option<Duration> {
        non_zero_secs(self.timeout_secs)
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

impl ExpvarBridgeConfig {
    /// Load configuration from a JSON5 file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: ExpvarBridgeConfig = expvar_common::load_config(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.expvar.poll_interval_secs == 0 {
            return Err(ConfigError::validation("poll_interval_secs must be > 0"));
        }

        if self.expvar.filters.is_empty() {
            return Err(ConfigError::validation(
                "At least one filter pattern is required",
            ));
        }

        if self.expvar.source_url.trim().is_empty() {
            return Err(ConfigError::validation("source_url must not be empty"));
        }

        if self.expvar.namespace.is_empty() {
            return Err(ConfigError::validation("namespace must not be empty"));
        }

        KeyExprBuilder::new(self.publish.key_prefix.as_str())
            .check()
            .map_err(|e| ConfigError::validation(e.to_string()))?;

        Ok(())
    }
}
