//! Connector state shared with the supervisor and the watchdog.

use std::{
	sync::atomic::{AtomicU64, Ordering},
	time::{Duration, Instant},
};
use tokio::sync::watch;
use tracing::info;

use crate::{models::ConnectionState, utils::metrics::record_connection_state};

/// Connection state plus the liveness timestamp.
///
/// The connector is the only writer. The state is published through a `watch`
/// channel; liveness is an atomic offset from a fixed origin so readers never
/// take a lock.
#[derive(Debug)]
pub struct LinkState {
	state: watch::Sender<ConnectionState>,
	origin: Instant,
	last_activity_ms: AtomicU64,
	/// Entries into a streaming state, including ones nobody saw through `watch`
	subscriptions: AtomicU64,
}

impl LinkState {
	pub fn new() -> Self {
		let (state, _) = watch::channel(ConnectionState::Disconnected);
		Self {
			state,
			origin: Instant::now(),
			last_activity_ms: AtomicU64::new(0),
			subscriptions: AtomicU64::new(0),
		}
	}

	pub fn state(&self) -> ConnectionState {
		*self.state.borrow()
	}

	/// Receiver notified on every state change
	pub fn watch(&self) -> watch::Receiver<ConnectionState> {
		self.state.subscribe()
	}

	/// Moves to `next`, logging the transition when it changes the state
	pub fn set_state(&self, endpoint: &str, next: ConnectionState) {
		let mut previous = next;
		let changed = self.state.send_if_modified(|current| {
			previous = *current;
			if *current == next {
				return false;
			}
			*current = next;
			true
		});
		if changed {
			if next.is_streaming() && !previous.is_streaming() {
				self.subscriptions.fetch_add(1, Ordering::AcqRel);
			}
			info!(endpoint, from = ?previous, to = ?next, "Connection state changed");
			record_connection_state(next);
		}
	}

	/// How many times the link has started streaming
	pub fn subscriptions(&self) -> u64 {
		self.subscriptions.load(Ordering::Acquire)
	}

	/// Marks the connector as alive now
	pub fn touch(&self) {
		let elapsed = self.origin.elapsed().as_millis() as u64;
		self.last_activity_ms.store(elapsed, Ordering::Release);
	}

	/// Time since the last `touch`, or since creation when never touched
	pub fn idle_for(&self) -> Duration {
		let last = self.last_activity_ms.load(Ordering::Acquire);
		self.origin
			.elapsed()
			.saturating_sub(Duration::from_millis(last))
	}
}

impl Default for LinkState {
	fn default() -> Self {
		Self::new()
	}
}
