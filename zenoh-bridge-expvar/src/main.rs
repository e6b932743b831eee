//! Zenoh bridge for expvar-style introspection endpoints.
//!
//! Reads named counters from a local JSON endpoint and publishes the
//! selected ones to Zenoh.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use zenoh_bridge_expvar::ZenohSink;
use zenoh_bridge_expvar::args::Args;
use zenoh_bridge_expvar::runner;
use zenoh_bridge_expvar::shutdown::spawn_signal_listener;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            expvar_common::init_tracing(&args.logging()).context("Failed to init tracing")?;
            error!(error = %e, "Invalid configuration - terminating");
            return Err(e).context(match &args.config {
                Some(path) => format!("Failed to load config from {:?}", path),
                None => "Invalid command-line configuration".to_string(),
            });
        }
    };

    expvar_common::init_tracing(&config.logging).context("Failed to init tracing")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        source = %config.expvar.source_url,
        "Starting expvar -> zenoh bridge"
    );

    let (shutdown, listener) = spawn_signal_listener();

    let run = runner::run(
        &config,
        || ZenohSink::connect(&config.zenoh, &config.publish),
        shutdown,
    )
    .await
    .inspect_err(|e| error!(error = %e, "Unable to start - terminating"))?;
    listener.abort();

    info!(
        cycles = run.summary.cycles,
        failed_cycles = run.summary.failed,
        points_pushed = run.stats.points_pushed,
        "Final statistics"
    );

    run.sink.close().await;
    info!("Expvar bridge stopped");

    Ok(())
}
