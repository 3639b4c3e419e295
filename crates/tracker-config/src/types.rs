//! Configuration types.

use serde::{Deserialize, Serialize};
use tracker_monitoring::LogFormat;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
	#[serde(default)]
	pub tracker: TrackerSettings,
	#[serde(default)]
	pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerSettings {
	#[serde(default = "default_name")]
	pub name: String,
	/// Bound of the channel between event producers and the tracker.
	#[serde(default = "default_event_channel_capacity")]
	pub event_channel_capacity: usize,
}

impl Default for TrackerSettings {
	fn default() -> Self {
		Self {
			name: default_name(),
			event_channel_capacity: default_event_channel_capacity(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
	#[serde(default = "default_log_level")]
	pub level: String,
	#[serde(default)]
	pub format: LogFormat,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: default_log_level(),
			format: LogFormat::default(),
		}
	}
}

fn default_name() -> String {
	"tx-tracker".to_string()
}

fn default_event_channel_capacity() -> usize {
	1024
}

fn default_log_level() -> String {
	"info".to_string()
}
