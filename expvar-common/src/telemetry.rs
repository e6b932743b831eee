use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Unit attached to every forwarded data point.
pub const UNIT_NONE: &str = "None";

/// Dimension name carrying the instance identity.
pub const INSTANCE_DIMENSION: &str = "InstanceId";

/// A single metric data point pushed to the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Unix epoch milliseconds when the snapshot was read.
    pub timestamp: i64,

    /// Metric namespace (group of metrics, e.g. "my-service").
    pub namespace: String,

    /// Metric name as exposed by the introspection endpoint (e.g. "requests.total").
    pub metric: String,

    /// The measured value.
    pub value: f64,

    /// Unit of the value.
    #[serde(default = "default_unit")]
    pub unit: String,

    /// Dimensions (key/value tags) identifying where the value comes from.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dimensions: BTreeMap<String, String>,
}

fn default_unit() -> String {
    UNIT_NONE.to_string()
}

impl DataPoint {
    /// Create a unitless data point with the current timestamp and no dimensions.
    pub fn new(namespace: impl Into<String>, metric: impl Into<String>, value: f64) -> Self {
        Self {
            timestamp: current_timestamp_millis(),
            namespace: namespace.into(),
            metric: metric.into(),
            value,
            unit: default_unit(),
            dimensions: BTreeMap::new(),
        }
    }

    /// Add a dimension to this data point.
    pub fn with_dimension(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.dimensions.insert(key.into(), value.into());
        self
    }

    /// Tag this data point with the instance identity.
    pub fn with_instance(self, instance_id: impl Into<String>) -> Self {
        self.with_dimension(INSTANCE_DIMENSION, instance_id)
    }

    /// The instance identity, if the point carries one.
    pub fn instance(&self) -> Option<&str> {
        self.dimensions.get(INSTANCE_DIMENSION).map(String::as_str)
    }
}

/// Get the current timestamp in milliseconds since Unix epoch.
///
/// Returns 0 if system time is before Unix epoch.
pub fn current_timestamp_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
