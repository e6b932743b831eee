//! Destinations for forwarded data points.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use expvar_common::{DataPoint, Format, KeyExprBuilder, ZenohConfig, encode};

use crate::config::PublishConfig;
use crate::error::{ConfigError, SinkError};

/// Receives data points, one push per accepted metric.
///
/// Pushes from one forwarder never overlap, so implementations need no
/// internal ordering guarantees.
pub trait MetricSink: Send + Sync {
    /// Push a single data point.
    fn push(&self, point: &DataPoint) -> impl Future<Output = Result<(), SinkError>> + Send;
}

/// Sink publishing every data point to its own Zenoh key.
///
/// Keys follow `<prefix>/<namespace>/<instance>/<metric>`.
#[derive(Clone, Debug)]
pub struct ZenohSink {
    session: Arc<zenoh::Session>,
    keys: KeyExprBuilder,
    format: Format,
    timeout: Option<Duration>,
}

impl ZenohSink {
    /// Wrap an already open session.
    pub fn new(session: Arc<zenoh::Session>, config: &PublishConfig) -> Self {
        Self {
            session,
            keys: KeyExprBuilder::new(config.key_prefix.clone()),
            format: config.format,
            timeout: config.timeout(),
        }
    }

    /// Open a Zenoh session and wrap it.
    pub async fn connect(zenoh: &ZenohConfig, config: &PublishConfig) -> Result<Self, ConfigError> {
        let session = expvar_common::connect(zenoh)
            .await
            .map_err(|e| ConfigError::Sink(e.to_string()))?;

        Ok(Self::new(Arc::new(session), config))
    }

    /// Key a data point is published under.
    pub fn key_for(&self, point: &DataPoint) -> String {
        self.keys.build(
            &point.namespace,
            point.instance().unwrap_or_default(),
            &point.metric,
        )
    }

    /// Close the underlying Zenoh session.
    pub async fn close(&self) {
        if let Err(e) = self.session.close().await {
            tracing::warn!(error = %e, "Error closing Zenoh session");
        }
    }
}

impl MetricSink for ZenohSink {
    async fn push(&self, point: &DataPoint) -> Result<(), SinkError> {
        let key = self.key_for(point);
        let payload = encode(point, self.format).map_err(|e| SinkError::Encode(e.to_string()))?;

        let put = self
            .session
            .put(&key, payload)
            .encoding(self.format.encoding());
        let result = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, put)
                .await
                .map_err(|_| SinkError::Timeout {
                    key: key.clone(),
                    timeout,
                })?,
            None => put.await,
        };

        result.map_err(|e| SinkError::Publish {
            key,
            message: e.to_string(),
        })
    }
}
