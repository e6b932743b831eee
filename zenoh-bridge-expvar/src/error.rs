//! Error taxonomy for the bridge.
//!
//! [`ConfigError`] is fatal and only raised while starting up. The other
//! errors are produced by a single forwarding cycle and are recovered by the
//! scheduler loop.

use std::time::Duration;

use thiserror::Error;

/// Startup configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] expvar_common::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid filter pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid source URL '{url}': {reason}")]
    InvalidSource { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("Failed to initialize sink: {0}")]
    Sink(String),
}

impl ConfigError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Failure to obtain a snapshot from the introspection endpoint.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Unable to read the expvar endpoint: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Malformed expvar body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failure to push a data point to the sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to encode data point: {0}")]
    Encode(String),

    #[error("Failed to publish to {key}: {message}")]
    Publish { key: String, message: String },

    #[error("Publishing to {key} timed out after {timeout:?}")]
    Timeout { key: String, timeout: Duration },
}

/// Outcome of a failed forwarding cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Value isn't numeric: {metric} is {kind}")]
    Type { metric: String, kind: &'static str },

    #[error("Unable to put metric data for {metric}: {source}")]
    Sink {
        metric: String,
        #[source]
        source: SinkError,
    },

    #[error("{} metric(s) failed, {pushed} pushed: {}", .failures.len(), join_errors(.failures))]
    Partial {
        pushed: usize,
        failures: Vec<CycleError>,
    },
}

impl CycleError {
    /// Whether the cycle stopped before any data point could be read.
    pub fn is_transport(&self) -> bool {
        matches!(self, CycleError::Transport(_))
    }
}

fn join_errors(errors: &[CycleError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
