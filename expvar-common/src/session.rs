use zenoh::Session;

use crate::config::ZenohConfig;
use crate::error::{Error, Result};

impl ZenohConfig {
    /// Translate into a native Zenoh configuration.
    pub fn to_zenoh_config(&self) -> Result<zenoh::Config> {
        let mut zenoh_config = zenoh::Config::default();

        let mode = match self.mode.as_str() {
            "client" | "peer" | "router" => format!("\"{}\"", self.mode),
            other => {
                return Err(Error::Config(format!(
                    "Invalid Zenoh mode: '{}'. Expected 'client', 'peer', or 'router'",
                    other
                )));
            }
        };

        zenoh_config
            .insert_json5("mode", &mode)
            .map_err(|e| Error::Config(format!("Failed to set mode: {}", e)))?;

        for (key, endpoints) in [
            ("connect/endpoints", &self.connect),
            ("listen/endpoints", &self.listen),
        ] {
            if endpoints.is_empty() {
                continue;
            }
            let endpoints_json = serde_json::to_string(endpoints)?;
            zenoh_config
                .insert_json5(key, &endpoints_json)
                .map_err(|e| Error::Config(format!("Failed to set {}: {}", key, e)))?;
        }

        Ok(zenoh_config)
    }
}

/// Connect to Zenoh using the provided configuration.
pub async fn connect(config: &ZenohConfig) -> Result<Session> {
    let zenoh_config = config.to_zenoh_config()?;

    tracing::info!(
        mode = %config.mode,
        connect = ?config.connect,
        listen = ?config.listen,
        "Connecting to Zenoh"
    );

    let session = zenoh::open(zenoh_config).await?;

    tracing::info!(zid = %session.zid(), "Connected to Zenoh");

    Ok(session)
}
