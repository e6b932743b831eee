//! One fetch-filter-push pass over the introspection endpoint.

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use tracing::{debug, trace};

use expvar_common::{DataPoint, current_timestamp_millis};

use crate::config::{ErrorPolicy, ExpvarConfig};
use crate::error::CycleError;
use crate::filter::Filter;
use crate::sink::MetricSink;
use crate::source::{ExpvarSource, Snapshot, value_kind};

/// Counts of a successful cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Entries in the snapshot.
    pub fetched: usize,
    /// Entries accepted by the filter.
    pub matched: usize,
    /// Data points pushed to the sink.
    pub pushed: usize,
}

/// Reads the source, filters metric names and pushes numeric values to a sink.
pub struct Forwarder<S> {
    source: ExpvarSource,
    filter: Filter,
    sink: S,
    namespace: String,
    instance_id: String,
    policy: ErrorPolicy,
    stats: ForwarderStats,
}

impl<S> std::fmt::Debug for Forwarder<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forwarder")
            .field("source", &self.source.url().as_str())
            .field("filter", &self.filter)
            .field("namespace", &self.namespace)
            .field("instance_id", &self.instance_id)
            .field("policy", &self.policy)
            .finish()
    }
}

impl<S: MetricSink> Forwarder<S> {
    /// Create a forwarder reading `source` with the namespace and error
    /// policy of `config`.
    pub fn new(
        config: &ExpvarConfig,
        source: ExpvarSource,
        filter: Filter,
        sink: S,
        instance_id: impl Into<String>,
    ) -> Self {
        Self {
            source,
            filter,
            sink,
            namespace: config.namespace.clone(),
            instance_id: instance_id.into(),
            policy: config.on_error,
            stats: ForwarderStats::default(),
        }
    }

    /// Get the sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consume the forwarder, returning its sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Get the instance identity.
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Get the metric namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Get current statistics.
    pub fn stats(&self) -> ForwarderStatsSnapshot {
        self.stats.snapshot()
    }

    /// Run one cycle: fetch a snapshot and push every matching metric.
    ///
    /// Matching metrics are handled in name order. Under
    /// [`ErrorPolicy::Abort`] the first failure ends the cycle and points
    /// pushed before it are not withdrawn.
    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        let result = self.forward().await;
        match &result {
            Ok(report) => {
                self.stats.record_success();
                debug!(
                    fetched = report.fetched,
                    matched = report.matched,
                    pushed = report.pushed,
                    "Cycle complete"
                );
            }
            Err(_) => self.stats.record_failure(),
        }
        result
    }

    async fn forward(&self) -> Result<CycleReport, CycleError> {
        let snapshot = self.source.fetch().await?;
        let timestamp = current_timestamp_millis();

        let matched = self.select(&snapshot);
        let mut report = CycleReport {
            fetched: snapshot.len(),
            matched: matched.len(),
            pushed: 0,
        };
        let mut failures = Vec::new();

        for (name, value) in matched {
            match self.push_one(name, value, timestamp).await {
                Ok(()) => report.pushed += 1,
                Err(e) if self.policy == ErrorPolicy::Abort => return Err(e),
                Err(e) => failures.push(e),
            }
        }

        if failures.is_empty() {
            Ok(report)
        } else {
            Err(CycleError::Partial {
                pushed: report.pushed,
                failures,
            })
        }
    }

    /// Entries accepted by the filter, sorted by name.
    fn select<'a>(&self, snapshot: &'a Snapshot) -> Vec<(&'a str, &'a Value)> {
        let mut matched: Vec<_> = snapshot
            .iter()
            .filter(|(name, _)| self.filter.includes(name))
            .map(|(name, value)| (name.as_str(), value))
            .collect();
        matched.sort_unstable_by(|a, b| a.0.cmp(b.0));
        matched
    }

    async fn push_one(&self, name: &str, value: &Value, timestamp: i64) -> Result<(), CycleError> {
        let number = as_number(name, value)?;

        let mut point = DataPoint::new(self.namespace.as_str(), name, number)
            .with_instance(self.instance_id.as_str());
        point.timestamp = timestamp;

        self.sink
            .push(&point)
            .await
            .map_err(|source| CycleError::Sink {
                metric: name.to_string(),
                source,
            })?;

        self.stats.record_pushed();
        trace!(metric = %name, value = number, "Pushed data point");
        Ok(())
    }
}

/// Convert a snapshot value to a float, rejecting every non-number kind.
pub fn as_number(name: &str, value: &Value) -> Result<f64, CycleError> {
    let type_error = || CycleError::Type {
        metric: name.to_string(),
        kind: value_kind(value),
    };

    match value {
        Value::Number(n) => n.as_f64().ok_or_else(type_error),
        _ => Err(type_error()),
    }
}

/// Forwarder statistics.
#[derive(Debug, Default)]
struct ForwarderStats {
    cycles_succeeded: AtomicU64,
    cycles_failed: AtomicU64,
    points_pushed: AtomicU64,
}

impl ForwarderStats {
    fn record_success(&self) {
        self.cycles_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.cycles_failed.fetch_add(1, Ordering::Relaxed);
    }

    fn record_pushed(&self) {
        self.points_pushed.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ForwarderStatsSnapshot {
        ForwarderStatsSnapshot {
            cycles_succeeded: self.cycles_succeeded.load(Ordering::Relaxed),
            cycles_failed: self.cycles_failed.load(Ordering::Relaxed),
            points_pushed: self.points_pushed.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of forwarder statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ForwarderStatsSnapshot {
    /// Cycles that pushed every matched metric.
    pub cycles_succeeded: u64,
    /// Cycles that ended with an error.
    pub cycles_failed: u64,
    /// Data points pushed over all cycles.
    pub points_pushed: u64,
}
