use std::time::Duration;
use thiserror::Error;

/// Failures of the stream transport.
///
/// All variants are recoverable: the supervisor backs off and may fail over to
/// another endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
	#[error("Failed to connect to {endpoint}: {reason}")]
	Connect { endpoint: String, reason: String },

	#[error("Failed to send request: {0}")]
	Send(String),

	#[error("Failed to read from stream: {0}")]
	Receive(String),

	#[error("Stream closed by remote")]
	Closed,

	#[error("{operation} timed out after {}ms", .after.as_millis())]
	Timeout {
		operation: &'static str,
		after: Duration,
	},

	#[error("Unexpected response: {0}")]
	Protocol(String),
}

impl TransportError {
	pub fn connect(endpoint: impl Into<String>, reason: impl ToString) -> Self {
		Self::Connect {
			endpoint: endpoint.into(),
			reason: reason.to_string(),
		}
	}
}
