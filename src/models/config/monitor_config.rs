use bigdecimal::{num_bigint::Sign, BigDecimal};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use url::Url;

use crate::models::{ConfigLoader, EndpointConfig};

use super::error::ConfigError;

/// Location of the configuration file when none is given
pub const DEFAULT_CONFIG_PATH: &str = "config/monitor.json";

/// Stream connector timeouts
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StreamConfig {
	/// How long to wait for the WebSocket handshake
	pub connection_timeout_ms: u64,
	/// Deadline for fetching one ledger's transaction list
	pub fetch_timeout_ms: u64,
}

impl Default for StreamConfig {
	fn default() -> Self {
		Self {
			connection_timeout_ms: 10_000,
			fetch_timeout_ms: 10_000,
		}
	}
}

impl StreamConfig {
	pub fn connection_timeout(&self) -> Duration {
		Duration::from_millis(self.connection_timeout_ms)
	}

	pub fn fetch_timeout(&self) -> Duration {
		Duration::from_millis(self.fetch_timeout_ms)
	}
}

/// Backoff and failover policy of the reconnect supervisor
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconnectConfig {
	pub initial_delay_ms: u64,
	pub max_delay_ms: u64,
	/// Consecutive failures tolerated on one endpoint before moving to the next
	pub max_failures_per_endpoint: u32,
}

impl Default for ReconnectConfig {
	fn default() -> Self {
		Self {
			initial_delay_ms: 1_000,
			max_delay_ms: 60_000,
			max_failures_per_endpoint: 3,
		}
	}
}

impl ReconnectConfig {
	pub fn initial_delay(&self) -> Duration {
		Duration::from_millis(self.initial_delay_ms)
	}

	pub fn max_delay(&self) -> Duration {
		Duration::from_millis(self.max_delay_ms)
	}
}

/// Stall detection of the watchdog
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchdogConfig {
	pub poll_interval_ms: u64,
	/// Idle time after which the connector is considered stalled
	pub stall_threshold_ms: u64,
	/// Minimum time between two forced restarts
	pub cooldown_ms: u64,
}

impl Default for WatchdogConfig {
	fn default() -> Self {
		Self {
			poll_interval_ms: 5_000,
			stall_threshold_ms: 60_000,
			cooldown_ms: 30_000,
		}
	}
}

impl WatchdogConfig {
	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms)
	}

	pub fn stall_threshold(&self) -> Duration {
		Duration::from_millis(self.stall_threshold_ms)
	}

	pub fn cooldown(&self) -> Duration {
		Duration::from_millis(self.cooldown_ms)
	}
}

/// Bounds applied while folding a block
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AggregationConfig {
	/// Number of records retained verbatim per block
	pub sample_size: usize,
	/// Number of ranked accounts reported per block
	pub top_accounts: usize,
	/// Capacity of the per-block active accounts table
	pub max_tracked_accounts: usize,
}

impl Default for AggregationConfig {
	fn default() -> Self {
		Self {
			sample_size: 10,
			top_accounts: 5,
			max_tracked_accounts: 10_000,
		}
	}
}

/// A destination matcher rule
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MatcherConfig {
	pub name: String,
	pub destination: String,
	/// Only payments in this currency match; any currency when absent
	#[serde(default)]
	pub currency: Option<String>,
	/// Amount to flag as an exact hit, in whole currency units
	#[serde(default)]
	pub exact_amount: Option<BigDecimal>,
	/// Accepted distance from `exact_amount`; exact equality when absent
	#[serde(default)]
	pub tolerance: Option<BigDecimal>,
}

/// Root configuration document
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
	pub endpoints: Vec<EndpointConfig>,
	pub stream: StreamConfig,
	pub reconnect: ReconnectConfig,
	pub watchdog: WatchdogConfig,
	pub aggregation: AggregationConfig,
	pub matchers: Vec<MatcherConfig>,
	pub shutdown_grace_ms: u64,
}

impl Default for MonitorConfig {
	fn default() -> Self {
		Self {
			endpoints: [
				("wss://xrplcluster.com/", 100),
				("wss://s1.ripple.com/", 90),
				("wss://s2.ripple.com/", 80),
			]
			.into_iter()
			.map(|(url, weight)| EndpointConfig {
				url: url.to_string(),
				weight,
			})
			.collect(),
			stream: StreamConfig::default(),
			reconnect: ReconnectConfig::default(),
			watchdog: WatchdogConfig::default(),
			aggregation: AggregationConfig::default(),
			matchers: Vec::new(),
			shutdown_grace_ms: 5_000,
		}
	}
}

impl MonitorConfig {
	/// Enabled endpoint urls, highest weight first
	pub fn endpoint_urls(&self) -> Vec<String> {
		let mut endpoints: Vec<_> = self.endpoints.iter().filter(|e| e.weight > 0).collect();
		endpoints.sort_by(|a, b| b.weight.cmp(&a.weight));
		endpoints.into_iter().map(|e| e.url.clone()).collect()
	}

	pub fn shutdown_grace(&self) -> Duration {
		Duration::from_millis(self.shutdown_grace_ms)
	}
}

impl ConfigLoader for MonitorConfig {
	fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
		if !Self::is_json_file(path) {
			return Err(ConfigError::file_error(format!(
				"{} is not a .json file",
				path.display()
			)));
		}
		let file = std::fs::File::open(path)?;
		let config: MonitorConfig = serde_json::from_reader(file)?;

		if let Err(validation_error) = config.validate() {
			return Err(ConfigError::validation_error(validation_error));
		}

		Ok(config)
	}

	fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
		match path {
			Some(path) if !path.exists() => Err(ConfigError::missing_file(path)),
			Some(path) => Self::load_from_path(path),
			None => {
				let default_path = Path::new(DEFAULT_CONFIG_PATH);
				if default_path.exists() {
					Self::load_from_path(default_path)
				} else {
					tracing::info!(
						path = DEFAULT_CONFIG_PATH,
						"No configuration file found, using built-in defaults"
					);
					Ok(Self::default())
				}
			}
		}
	}

	fn validate(&self) -> Result<(), String> {
		if self.endpoint_urls().is_empty() {
			return Err("At least one endpoint with a non-zero weight is required".to_string());
		}

		for endpoint in &self.endpoints {
			let url = Url::parse(&endpoint.url)
				.map_err(|e| format!("Invalid endpoint url '{}': {}", endpoint.url, e))?;
			if !matches!(url.scheme(), "ws" | "wss") {
				return Err(format!(
					"Endpoint url '{}' must start with ws:// or wss://",
					endpoint.url
				));
			}
			if endpoint.weight > 100 {
				return Err("All endpoint weights must be between 0 and 100".to_string());
			}
		}

		if self.stream.connection_timeout_ms == 0 || self.stream.fetch_timeout_ms == 0 {
			return Err("Stream timeouts must be greater than 0".to_string());
		}

		if self.reconnect.initial_delay_ms == 0 {
			return Err("reconnect.initial_delay_ms must be greater than 0".to_string());
		}
		if self.reconnect.initial_delay_ms > self.reconnect.max_delay_ms {
			return Err(
				"reconnect.initial_delay_ms must not exceed reconnect.max_delay_ms".to_string(),
			);
		}
		if self.reconnect.max_failures_per_endpoint == 0 {
			return Err("reconnect.max_failures_per_endpoint must be greater than 0".to_string());
		}

		if self.watchdog.poll_interval_ms == 0
			|| self.watchdog.stall_threshold_ms == 0
			|| self.watchdog.cooldown_ms == 0
		{
			return Err("Watchdog intervals must be greater than 0".to_string());
		}

		if self.aggregation.sample_size == 0 {
			return Err("aggregation.sample_size must be greater than 0".to_string());
		}

		for matcher in &self.matchers {
			if matcher.name.trim().is_empty() {
				return Err("Matcher name must not be empty".to_string());
			}
			if matcher.destination.trim().is_empty() {
				return Err(format!(
					"Matcher '{}' requires a destination address",
					matcher.name
				));
			}
			if matcher.tolerance.as_ref().is_some_and(|t| t.sign() == Sign::Minus) {
				return Err(format!(
					"Matcher '{}' tolerance must not be negative",
					matcher.name
				));
			}
		}

		Ok(())
	}
}
