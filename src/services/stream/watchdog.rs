//! Connector liveness watchdog.

use std::{
	sync::Arc,
	time::{Duration, Instant},
};
use tokio::{sync::watch, time::MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{models::WatchdogConfig, utils::metrics::WATCHDOG_RESTARTS};

/// What the watchdog observes and restarts
pub trait Supervised: Send + Sync {
	/// False once the ingestion task has exited
	fn is_alive(&self) -> bool;

	/// Time since the connector last saw traffic
	fn idle_for(&self) -> Duration;

	fn request_restart(&self);
}

/// Outcome of one liveness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogDecision {
	Healthy,
	/// Stalled or dead, and a restart was due
	Restart,
	/// Stalled or dead, but the last restart is still within the cooldown
	Suppressed,
}

/// Cooldown-gated stall detector
#[derive(Debug, Clone)]
pub struct Watchdog {
	poll_interval: Duration,
	stall_threshold: Duration,
	cooldown: Duration,
	last_restart: Option<Instant>,
}

impl Watchdog {
	pub fn new(config: &WatchdogConfig) -> Self {
		Self {
			poll_interval: config.poll_interval(),
			stall_threshold: config.stall_threshold(),
			cooldown: config.cooldown(),
			last_restart: None,
		}
	}

	/// Decides on one check. A `Restart` decision starts a new cooldown window.
	pub fn evaluate(&mut self, now: Instant, alive: bool, idle: Duration) -> WatchdogDecision {
		if alive && idle <= self.stall_threshold {
			return WatchdogDecision::Healthy;
		}
		let cooled_down = self
			.last_restart
			.is_none_or(|last| now.saturating_duration_since(last) > self.cooldown);
		if !cooled_down {
			return WatchdogDecision::Suppressed;
		}
		self.last_restart = Some(now);
		WatchdogDecision::Restart
	}

	/// Polls `target` until `stop` is raised or its sender is dropped
	pub async fn run(mut self, target: Arc<dyn Supervised>, mut stop: watch::Receiver<bool>) {
		let mut ticker = tokio::time::interval(self.poll_interval);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
		// The first tick completes immediately
		ticker.tick().await;

		loop {
			tokio::select! {
				_ = ticker.tick() => {}
				changed = stop.changed() => {
					if changed.is_err() || *stop.borrow() {
						break;
					}
					continue;
				}
			}

			let alive = target.is_alive();
			let idle = target.idle_for();
			match self.evaluate(Instant::now(), alive, idle) {
				WatchdogDecision::Healthy => {}
				WatchdogDecision::Restart => {
					warn!(
						alive,
						idle_ms = idle.as_millis() as u64,
						"Ledger stream stalled, requesting restart"
					);
					WATCHDOG_RESTARTS.inc();
					target.request_restart();
				}
				WatchdogDecision::Suppressed => {
					debug!(
						alive,
						idle_ms = idle.as_millis() as u64,
						"Ledger stream stalled, restart suppressed by cooldown"
					);
				}
			}
		}
		info!("Watchdog stopped");
	}
}
