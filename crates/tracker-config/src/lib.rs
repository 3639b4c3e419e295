//! Configuration loading for the transaction tracker.

pub mod types;

pub use types::{LoggingConfig, TrackerConfig, TrackerSettings};

use regex::Regex;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, Level};
use tracker_monitoring::LogFormat;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
	file_path: Option<String>,
	env_prefix: String,
}

impl Default for ConfigLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "TRACKER_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	/// Loads the configured file, or the defaults when no file is set, then
	/// applies environment overrides and validates the result.
	pub async fn load(&self) -> Result<TrackerConfig, ConfigError> {
		let mut config = match &self.file_path {
			Some(file_path) => self.load_from_file(file_path).await?,
			None => TrackerConfig::default(),
		};

		self.apply_env_overrides(&mut config)?;
		validate_config(&config)?;

		Ok(config)
	}

	async fn load_from_file(&self, file_path: &str) -> Result<TrackerConfig, ConfigError> {
		if !Path::new(file_path).exists() {
			return Err(ConfigError::FileNotFound(file_path.to_string()));
		}
		let content = tokio::fs::read_to_string(file_path).await?;
		debug!("Read configuration from {}", file_path);

		let substituted_content = substitute_env_vars(&content)?;

		toml::from_str(&substituted_content).map_err(|e| ConfigError::ParseError(e.to_string()))
	}

	fn apply_env_overrides(&self, config: &mut TrackerConfig) -> Result<(), ConfigError> {
		if let Ok(level) = env::var(format!("{}LOG_LEVEL", self.env_prefix)) {
			debug!("Overriding log level from environment");
			config.logging.level = level;
		}

		if let Ok(format) = env::var(format!("{}LOG_FORMAT", self.env_prefix)) {
			config.logging.format = format.parse().map_err(ConfigError::ValidationError)?;
		}

		if let Ok(capacity) = env::var(format!("{}EVENT_CHANNEL_CAPACITY", self.env_prefix)) {
			config.tracker.event_channel_capacity = capacity.parse().map_err(|e| {
				ConfigError::ValidationError(format!("Invalid event channel capacity: {}", e))
			})?;
		}

		Ok(())
	}
}

/// Replaces every `${VAR_NAME}` with the variable's value.
fn substitute_env_vars(content: &str) -> Result<String, ConfigError> {
	let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConfigError::ParseError(e.to_string()))?;
	let mut result = content.to_string();

	for cap in re.captures_iter(content) {
		let full_match = &cap[0];
		let var_name = &cap[1];

		let env_value =
			env::var(var_name).map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

		result = result.replace(full_match, &env_value);
	}

	Ok(result)
}

pub fn validate_config(config: &TrackerConfig) -> Result<(), ConfigError> {
	if config.tracker.event_channel_capacity == 0 {
		return Err(ConfigError::ValidationError(
			"event_channel_capacity must be greater than zero".to_string(),
		));
	}

	if config.tracker.name.trim().is_empty() {
		return Err(ConfigError::ValidationError(
			"tracker name must not be empty".to_string(),
		));
	}

	log_level(config)?;
	Ok(())
}

/// Parsed log level of the configuration.
pub fn log_level(config: &TrackerConfig) -> Result<Level, ConfigError> {
	config.logging.level.parse::<Level>().map_err(|_| {
		ConfigError::ValidationError(format!("Unknown log level '{}'", config.logging.level))
	})
}

impl TrackerConfig {
	pub fn log_format(&self) -> LogFormat {
		self.logging.format
	}
}
