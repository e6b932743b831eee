//! Periodic driver for the forwarder.
//!
//! The loop runs one cycle immediately, then waits for either the poll
//! interval or a shutdown request. Cycles run inline, so they never overlap;
//! a shutdown request only interrupts the wait, never a running cycle.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::forwarder::Forwarder;
use crate::sink::MetricSink;

/// Lifecycle state of the scheduler loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// About to run the first cycle.
    Starting,
    /// Between cycles, waiting for the interval or a shutdown request.
    Waiting,
    /// Shutdown observed; no further cycle will start.
    Terminated,
}

/// Summary returned once the loop terminates.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    /// Cycles started (successful or not).
    pub cycles: u64,
    /// Cycles that returned an error.
    pub failed: u64,
}

/// Drives a [`Forwarder`] on a fixed interval.
#[derive(Debug, Clone)]
pub struct Scheduler {
    interval: Duration,
}

impl Scheduler {
    /// Create a scheduler with the delay between the end of a cycle and the
    /// start of the next.
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Run until `shutdown` turns `true` (or its sender is dropped).
    pub async fn run<S: MetricSink>(
        &self,
        forwarder: &Forwarder<S>,
        mut shutdown: watch::Receiver<bool>,
    ) -> LoopSummary {
        let mut summary = LoopSummary::default();
        let mut state = LoopState::Starting;

        info!(
            interval_secs = self.interval.as_secs_f64(),
            namespace = %forwarder.namespace(),
            instance_id = %forwarder.instance_id(),
            "Starting forwarding loop"
        );

        while state != LoopState::Terminated {
            state = match state {
                LoopState::Starting => {
                    run_logged(forwarder, &mut summary).await;
                    LoopState::Waiting
                }
                LoopState::Waiting => {
                    tokio::select! {
                        biased;

                        stop = wait_for_shutdown(&mut shutdown) => {
                            if stop {
                                info!("Shutdown requested, stopping forwarding loop");
                            } else {
                                warn!("Shutdown channel closed, stopping forwarding loop");
                            }
                            LoopState::Terminated
                        }

                        _ = tokio::time::sleep(self.interval) => {
                            run_logged(forwarder, &mut summary).await;
                            LoopState::Waiting
                        }
                    }
                }
                LoopState::Terminated => LoopState::Terminated,
            };
        }

        summary
    }
}

/// Resolves with `true` once shutdown is requested, or `false` if the
/// sender went away without requesting it.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) -> bool {
    shutdown.wait_for(|stop| *stop).await.is_ok()
}

async fn run_logged<S: MetricSink>(forwarder: &Forwarder<S>, summary: &mut LoopSummary) {
    summary.cycles += 1;
    match forwarder.run_cycle().await {
        Ok(_) => {}
        Err(e) if e.is_transport() => {
            summary.failed += 1;
            warn!(error = %e, "Unable to read metrics");
        }
        Err(e) => {
            summary.failed += 1;
            warn!(error = %e, "Unable to forward");
        }
    }
}
