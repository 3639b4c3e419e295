//! Monitoring and observability for the transaction tracker.
//!
//! # Components
//!
//! - `metrics`: counters for events, notifications, chain queries and unpins
//! - `tracing`: subscriber setup for pretty or JSON logs

pub mod metrics;
pub mod tracing;

pub use metrics::{MetricsSnapshot, TrackerMetrics};
pub use self::tracing::{init_tracing, LogFormat, TracingConfig};
