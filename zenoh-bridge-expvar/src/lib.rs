//! Zenoh bridge for expvar-style introspection endpoints.
//!
//! The bridge periodically reads a flat JSON object of named counters and
//! gauges (such as Go's `/debug/vars`), selects metric names with regular
//! expressions, and publishes each selected numeric value as a data point
//! tagged with the instance identity.
//!
//! # Key Expressions
//!
//! ```text
//! expvar/<namespace>/<instance_id>/<metric>
//! ```
//!
//! # Pipeline
//!
//! ```text
//! ┌──────────────┐   GET    ┌───────────┐  filter  ┌────────────┐  push  ┌───────┐
//! │  /debug/vars │ ───────> │  Snapshot │ ───────> │ DataPoint  │ ─────> │ Zenoh │
//! └──────────────┘          └───────────┘          └────────────┘        └───────┘
//! ```

pub mod args;
pub mod config;
pub mod error;
pub mod filter;
pub mod forwarder;
pub mod identity;
pub mod runner;
pub mod scheduler;
pub mod shutdown;
pub mod sink;
pub mod source;

pub use config::{ErrorPolicy, ExpvarBridgeConfig, ExpvarConfig, PublishConfig};
pub use error::{ConfigError, CycleError, SinkError, TransportError};
pub use filter::Filter;
pub use forwarder::{CycleReport, Forwarder, ForwarderStatsSnapshot};
pub use runner::BridgeRun;
pub use scheduler::{LoopState, LoopSummary, Scheduler};
pub use sink::{MetricSink, ZenohSink};
pub use source::{ExpvarSource, Snapshot};
