//! Configuration error types.
//!
//! Errors raised while reading, parsing or validating the monitor configuration.
//! Constructors log the formatted message so that a bad config is visible even
//! when the caller only reports a summary.

use log::error;
use std::{error::Error, fmt, path::Path};

/// Errors that can occur during configuration operations
#[derive(Debug)]
#[allow(clippy::enum_variant_names)]
pub enum ConfigError {
	/// Configuration parsed but failed validation
	ValidationError(String),

	/// Configuration file is not valid JSON or does not match the schema
	ParseError(String),

	/// Configuration file could not be read
	FileError(String),
}

impl ConfigError {
	fn format_message(&self) -> String {
		match self {
			Self::ValidationError(msg) => format!("Invalid configuration: {}", msg),
			Self::ParseError(msg) => format!("Malformed configuration: {}", msg),
			Self::FileError(msg) => format!("Configuration file error: {}", msg),
		}
	}

	/// Create a new validation error and log it
	pub fn validation_error(msg: impl Into<String>) -> Self {
		let error = Self::ValidationError(msg.into());
		error!("{}", error.format_message());
		error
	}

	/// Create a new parse error and log it
	pub fn parse_error(msg: impl Into<String>) -> Self {
		let error = Self::ParseError(msg.into());
		error!("{}", error.format_message());
		error
	}

	/// Create a new file error and log it
	pub fn file_error(msg: impl Into<String>) -> Self {
		let error = Self::FileError(msg.into());
		error!("{}", error.format_message());
		error
	}

	/// File error naming the offending path
	pub fn missing_file(path: &Path) -> Self {
		Self::file_error(format!("{} does not exist", path.display()))
	}
}

impl fmt::Display for ConfigError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.format_message())
	}
}

impl Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
	fn from(err: std::io::Error) -> Self {
		Self::file_error(err.to_string())
	}
}

impl From<serde_json::Error> for ConfigError {
	fn from(err: serde_json::Error) -> Self {
		Self::parse_error(err.to_string())
	}
}
