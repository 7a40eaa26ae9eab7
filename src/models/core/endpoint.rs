use serde::{Deserialize, Serialize};

/// A configured stream endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EndpointConfig {
	pub url: String,
	#[serde(default = "default_weight")]
	pub weight: u32,
}

fn default_weight() -> u32 {
	100
}

/// A pool member: the endpoint address plus its health counter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
	pub url: String,
	pub consecutive_failures: u32,
}

impl Endpoint {
	pub fn new(url: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			consecutive_failures: 0,
		}
	}
}

/// Connector session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
	#[default]
	Disconnected,
	Connecting,
	Subscribed,
	/// Subscribed, but the last block could not be fully fetched
	Degraded,
}

impl ConnectionState {
	pub fn as_gauge(&self) -> f64 {
		match self {
			Self::Disconnected => 0.0,
			Self::Connecting => 1.0,
			Self::Subscribed => 2.0,
			Self::Degraded => 3.0,
		}
	}

	/// True while a subscription is active, degraded or not
	pub fn is_streaming(&self) -> bool {
		matches!(self, Self::Subscribed | Self::Degraded)
	}
}
