//! Exponential reconnect backoff.

use std::time::Duration;

use crate::models::ReconnectConfig;

/// Delay doubling on each consecutive failure, capped at `max`
#[derive(Debug, Clone)]
pub struct Backoff {
	initial: Duration,
	max: Duration,
	current: Duration,
}

impl Backoff {
	pub fn new(initial: Duration, max: Duration) -> Self {
		Self {
			initial,
			max,
			current: initial.min(max),
		}
	}

	/// Returns the delay for this failure and doubles the next one
	pub fn next_delay(&mut self) -> Duration {
		let delay = self.current;
		self.current = self.current.saturating_mul(2).min(self.max);
		delay
	}

	/// Delay that the next failure would get
	pub fn peek(&self) -> Duration {
		self.current
	}

	pub fn reset(&mut self) {
		self.current = self.initial.min(self.max);
	}
}

impl From<&ReconnectConfig> for Backoff {
	fn from(config: &ReconnectConfig) -> Self {
		Self::new(config.initial_delay(), config.max_delay())
	}
}
