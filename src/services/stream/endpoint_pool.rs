//! Ordered endpoint pool with failure counting and wrap-around failover.

use crate::models::Endpoint;

/// Endpoints in priority order, one of which is active.
///
/// Only the reconnect supervisor mutates the pool.
#[derive(Debug, Clone)]
pub struct EndpointPool {
	endpoints: Vec<Endpoint>,
	active: usize,
	max_failures: u32,
}

impl EndpointPool {
	/// Builds a pool from urls already sorted by priority.
	///
	/// Returns `None` for an empty list.
	pub fn new(urls: Vec<String>, max_failures: u32) -> Option<Self> {
		if urls.is_empty() {
			return None;
		}
		Some(Self {
			endpoints: urls.into_iter().map(Endpoint::new).collect(),
			active: 0,
			max_failures: max_failures.max(1),
		})
	}

	pub fn active(&self) -> &Endpoint {
		&self.endpoints[self.active]
	}

	pub fn active_index(&self) -> usize {
		self.active
	}

	pub fn endpoints(&self) -> &[Endpoint] {
		&self.endpoints
	}

	/// Counts a failure against the active endpoint.
	///
	/// Returns `true` when the failure limit was reached and the pool moved on to
	/// the next endpoint, whose counter starts from zero.
	pub fn record_failure(&mut self) -> bool {
		let endpoint = &mut self.endpoints[self.active];
		endpoint.consecutive_failures += 1;
		if endpoint.consecutive_failures < self.max_failures {
			return false;
		}
		endpoint.consecutive_failures = 0;
		self.active = (self.active + 1) % self.endpoints.len();
		self.endpoints[self.active].consecutive_failures = 0;
		true
	}

	pub fn record_success(&mut self) {
		self.endpoints[self.active].consecutive_failures = 0;
	}
}
