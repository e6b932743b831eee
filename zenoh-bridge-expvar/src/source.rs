//! HTTP client for the introspection endpoint.

use std::time::Duration;

use reqwest::{Client, Url};
use serde_json::{Map, Value};

use crate::error::{ConfigError, TransportError};

/// One decoded read of the introspection endpoint.
///
/// Values keep their JSON kind; only numbers are forwardable.
pub type Snapshot = Map<String, Value>;

/// Reads snapshots from an expvar-style endpoint.
#[derive(Debug, Clone)]
pub struct ExpvarSource {
    client: Client,
    url: Url,
}

impl ExpvarSource {
    /// Create a source for `url`, with an optional deadline per read.
    pub fn new(url: &str, timeout: Option<Duration>) -> Result<Self, ConfigError> {
        let url = Url::parse(url).map_err(|e| ConfigError::InvalidSource {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidSource {
                url: url.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ConfigError::HttpClient)?;

        Ok(Self { client, url })
    }

    /// The endpoint URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Fetch and decode one snapshot.
    pub async fn fetch(&self) -> Result<Snapshot, TransportError> {
        let response = self.client.get(self.url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: self.url.to_string(),
                status,
            });
        }

        let body = response.bytes().await?;
        let snapshot = serde_json::from_slice(&body)?;
        Ok(snapshot)
    }
}

/// Name of a JSON value's kind, for error messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
