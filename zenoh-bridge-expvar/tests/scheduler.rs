//! Scheduler loop tests: timing, error recovery and shutdown.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use tokio::sync::watch;
use zenoh_bridge_expvar::Scheduler;

use common::{RecordingSink, endpoint, expvar_config, forwarder, wait_until};

const BODY: &str = r#"{"a.total": 5.0, "b.count": 3.0}"#;

#[tokio::test]
async fn test_runs_immediately_then_stops_on_shutdown_during_wait() {
    let server = endpoint(StatusCode::OK, BODY).await;
    let config = expvar_config(&server.vars_url(), &[r"\.total$"]);
    let forwarder = forwarder(&config, RecordingSink::default());
    let scheduler = Scheduler::new(Duration::from_secs(3600));
    let (tx, rx) = watch::channel(false);

    let stop = async {
        wait_until(|| server.hits() == 1).await;
        tx.send(true).unwrap();
    };

    let (summary, ()) = tokio::time::timeout(
        Duration::from_secs(5),
        async { tokio::join!(scheduler.run(&forwarder, rx), stop) },
    )
    .await
    .expect("loop did not stop on shutdown");

    assert_eq!(summary.cycles, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(server.hits(), 1);
    assert_eq!(forwarder.sink().metrics(), vec!["a.total"]);
}

#[tokio::test]
async fn test_repeats_on_interval() {
    let server = endpoint(StatusCode::OK, BODY).await;
    let config = expvar_config(&server.vars_url(), &[r"\.total$"]);
    let forwarder = forwarder(&config, RecordingSink::default());
    let scheduler = Scheduler::new(Duration::from_millis(20));
    let (tx, rx) = watch::channel(false);

    let stop = async {
        wait_until(|| server.hits() >= 3).await;
        tx.send(true).unwrap();
    };

    let (summary, ()) = tokio::join!(scheduler.run(&forwarder, rx), stop);

    assert!(summary.cycles >= 3);
    assert_eq!(summary.cycles as usize, server.hits());
    assert_eq!(forwarder.sink().points().len(), server.hits());
}

#[tokio::test]
async fn test_failed_cycles_do_not_stop_the_loop() {
    let server = endpoint(StatusCode::SERVICE_UNAVAILABLE, "").await;
    let config = expvar_config(&server.vars_url(), &[r"\.total$"]);
    let forwarder = forwarder(&config, RecordingSink::default());
    let scheduler = Scheduler::new(Duration::from_millis(10));
    let (tx, rx) = watch::channel(false);

    let stop = async {
        wait_until(|| server.hits() >= 3).await;
        tx.send(true).unwrap();
    };

    let (summary, ()) = tokio::join!(scheduler.run(&forwarder, rx), stop);

    assert!(summary.cycles >= 3);
    assert_eq!(summary.failed, summary.cycles);
    assert_eq!(forwarder.stats().cycles_failed, summary.cycles);
    assert!(forwarder.sink().points().is_empty());
}

#[tokio::test]
async fn test_pending_shutdown_allows_only_the_first_cycle() {
    let server = endpoint(StatusCode::OK, BODY).await;
    let config = expvar_config(&server.vars_url(), &[r"\.total$"]);
    let forwarder = forwarder(&config, RecordingSink::default());
    let scheduler = Scheduler::new(Duration::ZERO);
    let (tx, rx) = watch::channel(false);
    tx.send(true).unwrap();

    let summary = scheduler.run(&forwarder, rx).await;

    assert_eq!(summary.cycles, 1);
    assert_eq!(server.hits(), 1);
}

#[tokio::test]
async fn test_dropped_shutdown_sender_terminates() {
    let server = endpoint(StatusCode::OK, BODY).await;
    let config = expvar_config(&server.vars_url(), &[r"\.total$"]);
    let forwarder = forwarder(&config, RecordingSink::default());
    let scheduler = Scheduler::new(Duration::from_secs(3600));
    let (tx, rx) = watch::channel(false);
    drop(tx);

    let summary = tokio::time::timeout(Duration::from_secs(5), scheduler.run(&forwarder, rx))
        .await
        .expect("loop did not stop after the sender was dropped");

    assert_eq!(summary.cycles, 1);
}
