//! Configuration module for the retail system.
//!
//! Parses the TOML configuration that selects and parameterizes the storage
//! backend. Backend-specific settings are carried as an opaque TOML table
//! and validated by the backend's own schema at build time.

use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Parse error: {0}")]
	Parse(#[from] toml::de::Error),
	#[error("Validation error: {0}")]
	Validation(String),
}

/// Top-level configuration for the retail system.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	/// Storage backend selection and settings.
	pub storage: StorageConfig,
}

/// Storage section of the configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
	/// Name of the backend to use, e.g. "memory" or "file".
	pub backend: String,
	/// Backend-specific settings, passed through to the backend factory.
	#[serde(default = "empty_table")]
	pub settings: toml::Value,
}

fn empty_table() -> toml::Value {
	toml::Value::Table(toml::Table::new())
}

impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let config: Config = toml::from_str(s)?;
		config.validate()?;
		Ok(config)
	}
}

impl Config {
	/// Loads and validates configuration from a TOML file.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let content = tokio::fs::read_to_string(path.as_ref()).await?;
		content.parse()
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.storage.backend.is_empty() {
			return Err(ConfigError::Validation(
				"storage.backend must not be empty".into(),
			));
		}
		if !self.storage.settings.is_table() {
			return Err(ConfigError::Validation(
				"storage.settings must be a table".into(),
			));
		}
		Ok(())
	}
}
