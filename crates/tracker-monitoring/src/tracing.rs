use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, Level};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt};

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	#[default]
	Pretty,
	Json,
}

impl FromStr for LogFormat {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"pretty" => Ok(LogFormat::Pretty),
			"json" => Ok(LogFormat::Json),
			other => Err(format!("unknown log format '{}'", other)),
		}
	}
}

impl fmt::Display for LogFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			LogFormat::Pretty => f.write_str("pretty"),
			LogFormat::Json => f.write_str("json"),
		}
	}
}

/// Tracing configuration
#[derive(Debug, Clone)]
pub struct TracingConfig {
	pub level: Level,
	pub with_thread_ids: bool,
	pub with_file_and_line: bool,
	pub with_target: bool,
	pub with_span_events: FmtSpan,
	pub format: LogFormat,
}

impl Default for TracingConfig {
	fn default() -> Self {
		Self {
			level: Level::INFO,
			with_thread_ids: false,
			with_file_and_line: false,
			with_target: true,
			with_span_events: FmtSpan::NONE,
			format: LogFormat::Pretty,
		}
	}
}

impl TracingConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_level(mut self, level: Level) -> Self {
		self.level = level;
		self
	}

	pub fn with_format(mut self, format: LogFormat) -> Self {
		self.format = format;
		self
	}

	pub fn debug() -> Self {
		Self {
			level: Level::DEBUG,
			with_thread_ids: true,
			with_file_and_line: true,
			with_span_events: FmtSpan::ENTER | FmtSpan::CLOSE,
			..Self::default()
		}
	}

	pub fn production() -> Self {
		Self {
			level: Level::INFO,
			with_thread_ids: false,
			with_file_and_line: false,
			with_target: false,
			with_span_events: FmtSpan::NONE,
			format: LogFormat::Json,
		}
	}
}

/// Initialize tracing with the given configuration.
///
/// `RUST_LOG` takes precedence over the configured level when set. Logs go
/// to stderr so stdout stays free for notification output.
pub fn init_tracing(config: TracingConfig) -> Result<(), Box<dyn std::error::Error>> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.level.as_str()));

	let subscriber = tracing_subscriber::registry().with(env_filter);

	match config.format {
		LogFormat::Json => {
			let json_layer = tracing_subscriber::fmt::layer()
				.json()
				.with_writer(std::io::stderr)
				.with_span_events(config.with_span_events)
				.with_thread_ids(config.with_thread_ids)
				.with_file(config.with_file_and_line)
				.with_line_number(config.with_file_and_line)
				.with_target(config.with_target);

			subscriber
				.with(json_layer)
				.try_init()
				.map_err(|e| format!("Failed to initialize tracing: {}", e))?;
		}
		LogFormat::Pretty => {
			let fmt_layer = tracing_subscriber::fmt::layer()
				.with_writer(std::io::stderr)
				.with_span_events(config.with_span_events)
				.with_thread_ids(config.with_thread_ids)
				.with_file(config.with_file_and_line)
				.with_line_number(config.with_file_and_line)
				.with_target(config.with_target);

			subscriber
				.with(fmt_layer)
				.try_init()
				.map_err(|e| format!("Failed to initialize tracing: {}", e))?;
		}
	}

	info!("Tracing initialized with level: {:?}", config.level);
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_presets() {
		let production = TracingConfig::production();
		assert_eq!(production.format, LogFormat::Json);
		assert!(!production.with_target);

		let debug = TracingConfig::debug();
		assert_eq!(debug.level, Level::DEBUG);
		assert_eq!(debug.format, LogFormat::Pretty);
	}

	#[test]
	fn test_log_format_parsing() {
		assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
		assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
		assert!("xml".parse::<LogFormat>().is_err());
	}
}
