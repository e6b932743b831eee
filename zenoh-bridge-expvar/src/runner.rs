//! Bridge lifecycle: start up, run the forwarding loop, hand the sink back.

use std::future::Future;

use tokio::sync::watch;
use tracing::info;

use crate::config::ExpvarBridgeConfig;
use crate::error::ConfigError;
use crate::filter::Filter;
use crate::forwarder::{Forwarder, ForwarderStatsSnapshot};
use crate::identity::resolve_instance_id;
use crate::scheduler::{LoopSummary, Scheduler};
use crate::sink::MetricSink;
use crate::source::ExpvarSource;

/// Outcome of a run that reached termination.
#[derive(Debug)]
pub struct BridgeRun<S> {
    /// Cycles run by the loop.
    pub summary: LoopSummary,
    /// Forwarder counters at termination.
    pub stats: ForwarderStatsSnapshot,
    /// The sink, still open.
    pub sink: S,
}

/// Start the bridge and run it until `shutdown` turns `true`.
///
/// Filter patterns and the source URL are checked before `open_sink` is
/// called. A [`ConfigError`] is returned before any cycle runs, so the
/// source is never read with a broken configuration.
pub async fn run<S, F, Fut>(
    config: &ExpvarBridgeConfig,
    open_sink: F,
    shutdown: watch::Receiver<bool>,
) -> Result<BridgeRun<S>, ConfigError>
where
    S: MetricSink,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<S, ConfigError>>,
{
    let expvar = &config.expvar;

    let filter = Filter::new(&expvar.filters)?;
    let source = ExpvarSource::new(&expvar.source_url, expvar.request_timeout())?;
    info!(
        source = %source.url(),
        filters = ?filter.patterns().collect::<Vec<_>>(),
        "Source configured"
    );

    let instance_id = resolve_instance_id(expvar).await;
    info!(instance_id = %instance_id, "Resolved instance identity");

    let sink = open_sink().await?;
    let forwarder = Forwarder::new(expvar, source, filter, sink, instance_id);

    let summary = Scheduler::new(expvar.poll_interval())
        .run(&forwarder, shutdown)
        .await;
    let stats = forwarder.stats();

    Ok(BridgeRun {
        summary,
        stats,
        sink: forwarder.into_sink(),
    })
}
