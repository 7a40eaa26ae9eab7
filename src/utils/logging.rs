//! Logging setup for the application
//!
//! Logging is configured from the environment:
//!
//! - `LOG_MODE`: `stdout` (default) or `file`
//! - `LOG_LEVEL`: default level when `RUST_LOG` is not set (default `info`)
//! - `LOG_DATA_DIR`: directory for log files in file mode (default `logs/`)
//!
//! File mode rotates daily and keeps the five most recent files.

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

const DEFAULT_LOG_DIR: &str = "logs/";
const LOG_FILE_PREFIX: &str = "monitor";
const MAX_LOG_FILES: usize = 5;

/// Where log lines are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogMode {
	Stdout,
	File(PathBuf),
}

/// Logging settings resolved from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
	pub mode: LogMode,
	pub level: String,
}

impl LogSettings {
	/// Resolves settings from a variable lookup
	pub fn from_lookup<F>(lookup: F) -> Self
	where
		F: Fn(&str) -> Option<String>,
	{
		let mode = match lookup("LOG_MODE").as_deref().map(str::to_lowercase) {
			Some(mode) if mode == "file" => LogMode::File(PathBuf::from(
				lookup("LOG_DATA_DIR").unwrap_or_else(|| DEFAULT_LOG_DIR.to_string()),
			)),
			_ => LogMode::Stdout,
		};
		let level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

		Self { mode, level }
	}

	pub fn from_env() -> Self {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	fn filter(&self) -> EnvFilter {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level))
	}
}

/// Setup logging for the application from the environment
pub fn setup_logging() -> Result<(), BoxError> {
	let settings = LogSettings::from_env();

	match &settings.mode {
		LogMode::Stdout => setup_logging_with_writer(settings.filter(), std::io::stdout, true),
		LogMode::File(dir) => {
			std::fs::create_dir_all(dir)?;
			let appender = RollingFileAppender::builder()
				.rotation(Rotation::DAILY)
				.filename_prefix(LOG_FILE_PREFIX)
				.filename_suffix("log")
				.max_log_files(MAX_LOG_FILES)
				.build(dir)?;
			setup_logging_with_writer(settings.filter(), appender, false)
		}
	}
}

/// Setup logging with a custom writer
pub fn setup_logging_with_writer<W>(filter: EnvFilter, writer: W, ansi: bool) -> Result<(), BoxError>
where
	W: for<'writer> fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
	tracing_subscriber::registry()
		.with(filter)
		.with(
			fmt::layer()
				.with_writer(writer)
				.with_ansi(ansi)
				.with_target(true)
				.compact(),
		)
		.try_init()?;
	Ok(())
}
