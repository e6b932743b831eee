//! Instance identity lookup against a fake metadata service.

mod common;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use zenoh_bridge_expvar::ExpvarConfig;
use zenoh_bridge_expvar::identity::{FALLBACK_INSTANCE_ID, resolve_instance_id};

use common::serve;

async fn metadata(status: StatusCode, body: &'static str) -> String {
    let router = Router::new().route(
        "/latest/meta-data/instance-id",
        get(move || async move { (status, body) }),
    );
    format!("{}/latest/meta-data/instance-id", serve(router).await)
}

#[tokio::test]
async fn test_auto_uses_trimmed_metadata_body() {
    let config = ExpvarConfig {
        metadata_url: metadata(StatusCode::OK, "  i-0123456789abcdef\n").await,
        ..Default::default()
    };

    assert_eq!(resolve_instance_id(&config).await, "i-0123456789abcdef");
}

#[tokio::test]
async fn test_auto_falls_back_on_error_status() {
    let config = ExpvarConfig {
        metadata_url: metadata(StatusCode::NOT_FOUND, "i-should-not-be-used").await,
        ..Default::default()
    };

    assert_eq!(resolve_instance_id(&config).await, FALLBACK_INSTANCE_ID);
}

#[tokio::test]
async fn test_auto_falls_back_on_empty_body() {
    let config = ExpvarConfig {
        metadata_url: metadata(StatusCode::OK, " \n").await,
        ..Default::default()
    };

    assert_eq!(resolve_instance_id(&config).await, FALLBACK_INSTANCE_ID);
}
