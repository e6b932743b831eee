//! Shared helpers: a fake expvar endpoint and an in-memory sink.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::http::{StatusCode, header};
use axum::routing::get;
use expvar_common::DataPoint;
use zenoh_bridge_expvar::{
    ExpvarConfig, ExpvarSource, Filter, Forwarder, MetricSink, SinkError,
};

/// Sink recording every pushed data point, optionally failing on one metric.
#[derive(Debug, Default)]
pub struct RecordingSink {
    points: Mutex<Vec<DataPoint>>,
    fail_on: Option<String>,
}

impl RecordingSink {
    pub fn failing_on(metric: &str) -> Self {
        Self {
            points: Mutex::default(),
            fail_on: Some(metric.to_string()),
        }
    }

    pub fn points(&self) -> Vec<DataPoint> {
        self.points.lock().unwrap().clone()
    }

    pub fn metrics(&self) -> Vec<String> {
        self.points().into_iter().map(|p| p.metric).collect()
    }
}

impl MetricSink for RecordingSink {
    async fn push(&self, point: &DataPoint) -> Result<(), SinkError> {
        if self.fail_on.as_deref() == Some(point.metric.as_str()) {
            return Err(SinkError::Publish {
                key: point.metric.clone(),
                message: "rejected by test sink".to_string(),
            });
        }
        self.points.lock().unwrap().push(point.clone());
        Ok(())
    }
}

/// A running fake endpoint.
pub struct FakeEndpoint {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
}

impl FakeEndpoint {
    pub fn vars_url(&self) -> String {
        format!("{}/debug/vars", self.base_url)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Serve `router` on an ephemeral loopback port.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Endpoint answering `/debug/vars` with `status` and `body`, counting requests.
pub async fn endpoint(status: StatusCode, body: impl Into<String>) -> FakeEndpoint {
    let body = body.into();
    endpoint_with(move |_| (status, body.clone())).await
}

/// Endpoint whose response depends on the request number (starting at 1).
pub async fn endpoint_with<F>(respond: F) -> FakeEndpoint
where
    F: Fn(usize) -> (StatusCode, String) + Clone + Send + Sync + 'static,
{
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    let router = Router::new().route(
        "/debug/vars",
        get(move || {
            let counter = counter.clone();
            let respond = respond.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                let (status, body) = respond(n);
                (status, [(header::CONTENT_TYPE, "application/json")], body)
            }
        }),
    );

    FakeEndpoint {
        base_url: serve(router).await,
        hits,
    }
}

/// Source configuration pointing at `url` with the given filters.
pub fn expvar_config(url: &str, filters: &[&str]) -> ExpvarConfig {
    ExpvarConfig {
        source_url: url.to_string(),
        filters: filters.iter().map(|f| f.to_string()).collect(),
        namespace: "test-service".to_string(),
        request_timeout_secs: 5,
        ..Default::default()
    }
}

/// Forwarder for `config` with a recording sink and instance "i-test".
pub fn forwarder(config: &ExpvarConfig, sink: RecordingSink) -> Forwarder<RecordingSink> {
    let filter = Filter::new(&config.filters).unwrap();
    let source = ExpvarSource::new(&config.source_url, config.request_timeout()).unwrap();
    Forwarder::new(config, source, filter, sink, "i-test")
}

/// Poll `cond` until it holds, panicking after five seconds.
pub async fn wait_until(cond: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
