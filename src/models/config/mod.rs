//! Configuration loading and validation.
//!
//! The monitor is configured from a single JSON document. Every section has
//! defaults, so an empty object (or a missing default file) yields a working
//! mainnet configuration.

use std::path::Path;

mod error;
mod monitor_config;

pub use error::ConfigError;
pub use monitor_config::{
	AggregationConfig, MatcherConfig, MonitorConfig, ReconnectConfig, StreamConfig, WatchdogConfig,
	DEFAULT_CONFIG_PATH,
};

/// Common interface for loading configuration files
pub trait ConfigLoader: Sized {
	/// Loads and validates the configuration at `path`
	fn load_from_path(path: &Path) -> Result<Self, ConfigError>;

	/// Loads the configuration at `path`, or from the default location.
	///
	/// An explicitly given path must exist. A missing default file falls back to
	/// built-in defaults.
	fn load(path: Option<&Path>) -> Result<Self, ConfigError>;

	fn validate(&self) -> Result<(), String>;

	fn is_json_file(path: &Path) -> bool {
		path.extension()
			.map(|ext| ext.to_string_lossy().to_lowercase() == "json")
			.unwrap_or(false)
	}
}
