//! Instance identity resolution.

use std::time::Duration;

use crate::config::ExpvarConfig;

/// Identity used when the metadata service cannot be reached.
pub const FALLBACK_INSTANCE_ID: &str = "local-test";

/// Value of `instance_id` requesting a metadata lookup.
pub const AUTO: &str = "auto";

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

/// Resolve the instance identity, looking it up if configured as "auto".
pub async fn resolve_instance_id(config: &ExpvarConfig) -> String {
    if config.instance_id != AUTO {
        return config.instance_id.clone();
    }

    match lookup(&config.metadata_url).await {
        Some(id) => id,
        None => {
            tracing::warn!(
                metadata_url = %config.metadata_url,
                fallback = FALLBACK_INSTANCE_ID,
                "Instance metadata unavailable, assuming local run"
            );
            FALLBACK_INSTANCE_ID.to_string()
        }
    }
}

/// Query the metadata endpoint; `None` on any failure.
async fn lookup(url: &str) -> Option<String> {
    let client = reqwest::Client::builder()
        .timeout(LOOKUP_TIMEOUT)
        .build()
        .ok()?;

    let response = client.get(url).send().await.ok()?;
    if response.status() != reqwest::StatusCode::OK {
        tracing::debug!(status = %response.status(), "Metadata lookup refused");
        return None;
    }

    let body = response.text().await.ok()?;
    let id = body.trim();
    (!id.is_empty()).then(|| id.to_string())
}
