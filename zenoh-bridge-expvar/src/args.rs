//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use expvar_common::{LogFormat, LoggingConfig};

use crate::config::ExpvarBridgeConfig;
use crate::error::ConfigError;
use crate::filter::split_patterns;

/// Forwards expvar counters to Zenoh.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "zenoh-bridge-expvar")]
#[command(about = "Polls an expvar endpoint and publishes selected metrics to Zenoh")]
#[command(version)]
pub struct Args {
    /// Path to configuration file (JSON5 format). Defaults apply when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// The expvar URI to read from.
    #[arg(long)]
    pub expvar_uri: Option<String>,

    /// Interval (in seconds) for the polling process.
    #[arg(long)]
    pub interval: Option<u64>,

    /// Regexp filters for metric names. Separate filters with semicolons.
    #[arg(long)]
    pub filters: Option<String>,

    /// Metric namespace (group of metrics).
    #[arg(long, visible_alias = "namespace")]
    pub metricname: Option<String>,

    /// Instance identity, or "auto" to query the metadata service.
    #[arg(long)]
    pub instance_id: Option<String>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (text, json).
    #[arg(long)]
    pub log_format: Option<LogFormat>,
}

impl Args {
    /// Load the configuration file (if any), apply overrides and validate.
    pub fn load_config(&self) -> Result<ExpvarBridgeConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ExpvarBridgeConfig::load_from_file(path)?,
            None => ExpvarBridgeConfig::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides on top of `config`.
    pub fn apply(&self, config: &mut ExpvarBridgeConfig) {
        if let Some(uri) = &self.expvar_uri {
            config.expvar.source_url = uri.clone();
        }
        if let Some(interval) = self.interval {
            config.expvar.poll_interval_secs = interval;
        }
        if let Some(filters) = &self.filters {
            config.expvar.filters = split_patterns(filters);
        }
        if let Some(namespace) = &self.metricname {
            config.expvar.namespace = namespace.clone();
        }
        if let Some(instance_id) = &self.instance_id {
            config.expvar.instance_id = instance_id.clone();
        }
        self.apply_logging(&mut config.logging);
    }

    /// Logging settings from defaults and command-line overrides alone.
    ///
    /// Used to report errors raised before the configuration file is loaded.
    pub fn logging(&self) -> LoggingConfig {
        let mut logging = LoggingConfig::default();
        self.apply_logging(&mut logging);
        logging
    }

    fn apply_logging(&self, logging: &mut LoggingConfig) {
        if let Some(level) = &self.log_level {
            logging.level = level.clone();
        }
        if let Some(format) = self.log_format {
            logging.format = format;
        }
    }
}
