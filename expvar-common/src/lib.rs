//! Expvar bridge common library
//!
//! Shared types and utilities for the expvar to Zenoh bridge:
//!
//! - [`telemetry`] - Forwarded data point model (`DataPoint`)
//! - [`serialization`] - JSON/CBOR encoding and decoding
//! - [`config`] - Zenoh and logging configuration (JSON5 format)
//! - [`session`] - Zenoh session management
//! - [`keyexpr`] - Key expression builder and chunk sanitising
//! - [`error`] - Error types

pub mod config;
pub mod error;
pub mod keyexpr;
pub mod serialization;
pub mod session;
pub mod telemetry;

// Re-export commonly used types at the crate root
pub use config::{LogFormat, LoggingConfig, ZenohConfig, load_config};
pub use error::{Error, Result};
pub use keyexpr::{KeyExprBuilder, sanitize_chunk};
pub use serialization::{Format, decode, decode_auto, encode};
pub use session::connect;
pub use telemetry::{DataPoint, INSTANCE_DIMENSION, UNIT_NONE, current_timestamp_millis};

/// Initialize tracing with the given configuration.
///
/// `RUST_LOG`, when set, takes precedence over the configured level.
///
/// # Example
///
/// ```ignore
/// use expvar_common::{LoggingConfig, LogFormat, init_tracing};
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     format: LogFormat::Json,
/// };
/// init_tracing(&config)?;
/// ```
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.format {
        LogFormat::Text => registry.with(fmt::layer()).try_init(),
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
    };

    installed.map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))
}
