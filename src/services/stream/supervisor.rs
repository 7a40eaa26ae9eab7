//! Reconnect supervisor.
//!
//! Drives connector sessions against the endpoint pool until the stop signal is
//! raised. Endpoint failures only ever lead to a backoff and, after enough of
//! them in a row, a move to the next endpoint.

use std::{
	sync::{Arc, Mutex},
	time::Duration,
};
use tokio::{
	sync::{watch, Notify, RwLock},
	task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
	models::{ConnectionState, ConnectionStatusEvent, LinkStatus, PublishedEvent, ReconnectConfig},
	services::{
		publisher::EventPublisher,
		stream::{
			backoff::Backoff,
			connector::{BlockHandler, ConnectorOutcome, LedgerConnector},
			endpoint_pool::EndpointPool,
			link::LinkState,
			watchdog::Supervised,
		},
	},
	utils::metrics::{ENDPOINT_FAILOVERS, RECONNECT_ATTEMPTS},
};

/// How one connector attempt ended, from the supervisor's point of view
enum Attempt {
	Stopped,
	Restart,
	Ended(ConnectorOutcome),
}

/// Retry loop around a [`LedgerConnector`]
pub struct ReconnectSupervisor {
	connector: Arc<dyn LedgerConnector>,
	handler: BlockHandler,
	publisher: Arc<EventPublisher>,
	link: Arc<LinkState>,
	pool: RwLock<EndpointPool>,
	reconnect: ReconnectConfig,
	restart: Notify,
}

impl ReconnectSupervisor {
	pub fn new(
		connector: Arc<dyn LedgerConnector>,
		handler: BlockHandler,
		publisher: Arc<EventPublisher>,
		link: Arc<LinkState>,
		pool: EndpointPool,
		reconnect: ReconnectConfig,
	) -> Self {
		Self {
			connector,
			handler,
			publisher,
			link,
			pool: RwLock::new(pool),
			reconnect,
			restart: Notify::new(),
		}
	}

	pub fn link(&self) -> &Arc<LinkState> {
		&self.link
	}

	/// Copy of the endpoint pool as it stands
	pub async fn pool(&self) -> EndpointPool {
		self.pool.read().await.clone()
	}

	/// Abandons the current session, or skips the pending backoff wait
	pub fn request_restart(&self) {
		self.restart.notify_one();
	}

	/// Runs sessions until `stop` is raised or its sender is dropped.
	pub async fn run(&self, mut stop: watch::Receiver<bool>) {
		let mut backoff = Backoff::from(&self.reconnect);

		while !*stop.borrow() {
			let endpoint = self.pool.read().await.active().url.clone();

			match self.attempt(&endpoint, &mut backoff, &mut stop).await {
				Attempt::Stopped => break,
				Attempt::Restart => {
					RECONNECT_ATTEMPTS.inc();
					self.publish(ConnectionStatusEvent::new(LinkStatus::Restarted, &endpoint))
						.await;
					info!(endpoint = %endpoint, "Restarting ledger stream session");
				}
				Attempt::Ended(ConnectorOutcome::Cancelled) => {}
				Attempt::Ended(outcome) => {
					let error = match outcome {
						ConnectorOutcome::Failed(e) => e.to_string(),
						_ => "connection closed by remote".to_string(),
					};
					let delay = self.record_failure(&endpoint, &mut backoff).await;
					RECONNECT_ATTEMPTS.inc();
					warn!(
						endpoint = %endpoint,
						error = %error,
						retry_in_ms = delay.as_millis() as u64,
						"Ledger stream session ended"
					);
					self.publish(
						ConnectionStatusEvent::new(LinkStatus::Disconnected, &endpoint)
							.with_error(error)
							.with_next_retry_delay(delay),
					)
					.await;

					if self.wait(delay, &mut stop).await {
						break;
					}
				}
			}
		}

		info!("Reconnect supervisor stopped");
	}

	/// Runs one connector session, watching for stop, restart and subscription
	async fn attempt(
		&self,
		endpoint: &str,
		backoff: &mut Backoff,
		stop: &mut watch::Receiver<bool>,
	) -> Attempt {
		let (cancel_tx, cancel_rx) = watch::channel(false);
		// An abandoned session may have left the link looking subscribed
		self.link.set_state(endpoint, ConnectionState::Disconnected);
		let mut state = self.link.watch();
		let subscriptions = self.link.subscriptions();
		let mut connected = false;

		let session = self.connector.run(
			endpoint,
			self.handler.clone(),
			cancel_rx,
			self.link.clone(),
		);
		tokio::pin!(session);

		loop {
			tokio::select! {
				outcome = &mut session => {
					// The session may subscribe and end before the state branch runs
					if !connected && self.link.subscriptions() > subscriptions {
						self.mark_connected(endpoint, backoff).await;
					}
					return Attempt::Ended(outcome);
				}
				changed = stop.changed() => {
					if changed.is_err() || *stop.borrow() {
						let _ = cancel_tx.send(true);
						// Let the session close its transport before returning
						let outcome = session.await;
						debug!(endpoint, ?outcome, "Session stopped");
						return Attempt::Stopped;
					}
				}
				_ = self.restart.notified() => {
					let _ = cancel_tx.send(true);
					self.link.set_state(endpoint, ConnectionState::Disconnected);
					return Attempt::Restart;
				}
				changed = state.changed(), if !connected => {
					if changed.is_ok() && state.borrow_and_update().is_streaming() {
						connected = true;
						self.mark_connected(endpoint, backoff).await;
					}
				}
			}
		}
	}

	async fn mark_connected(&self, endpoint: &str, backoff: &mut Backoff) {
		backoff.reset();
		self.pool.write().await.record_success();
		self.publish(ConnectionStatusEvent::new(LinkStatus::Connected, endpoint))
			.await;
	}

	/// Counts a failed session and returns the delay before the next one
	async fn record_failure(&self, endpoint: &str, backoff: &mut Backoff) -> Duration {
		let mut pool = self.pool.write().await;
		if pool.record_failure() {
			ENDPOINT_FAILOVERS.inc();
			backoff.reset();
			warn!(
				from = endpoint,
				to = %pool.active().url,
				"Too many consecutive failures, switching endpoint"
			);
		}
		backoff.next_delay()
	}

	/// Sleeps for `delay`; returns `true` when stopped meanwhile
	async fn wait(&self, delay: Duration, stop: &mut watch::Receiver<bool>) -> bool {
		tokio::select! {
			_ = tokio::time::sleep(delay) => false,
			_ = self.restart.notified() => false,
			changed = stop.changed() => changed.is_err() || *stop.borrow(),
		}
	}

	async fn publish(&self, status: ConnectionStatusEvent) {
		if let Err(e) = self
			.publisher
			.publish(PublishedEvent::ConnectionStatus(status))
			.await
		{
			debug!(error = %e, "Connection status not published");
		}
	}
}

/// A running supervisor task, restartable by the watchdog
pub struct SupervisorHandle {
	supervisor: Arc<ReconnectSupervisor>,
	stop: watch::Receiver<bool>,
	task: Mutex<Option<JoinHandle<()>>>,
}

impl SupervisorHandle {
	pub fn spawn(supervisor: Arc<ReconnectSupervisor>, stop: watch::Receiver<bool>) -> Self {
		let task = Self::spawn_task(&supervisor, &stop);
		Self {
			supervisor,
			stop,
			task: Mutex::new(Some(task)),
		}
	}

	fn spawn_task(
		supervisor: &Arc<ReconnectSupervisor>,
		stop: &watch::Receiver<bool>,
	) -> JoinHandle<()> {
		let supervisor = supervisor.clone();
		let stop = stop.clone();
		tokio::spawn(async move { supervisor.run(stop).await })
	}

	pub fn supervisor(&self) -> &Arc<ReconnectSupervisor> {
		&self.supervisor
	}

	/// Takes the task handle so shutdown can await it
	pub fn take_task(&self) -> Option<JoinHandle<()>> {
		self.task.lock().unwrap_or_else(|e| e.into_inner()).take()
	}
}

impl Supervised for SupervisorHandle {
	fn is_alive(&self) -> bool {
		self.task
			.lock()
			.unwrap_or_else(|e| e.into_inner())
			.as_ref()
			.is_some_and(|task| !task.is_finished())
	}

	/// Silence only counts while subscribed; connect and backoff are bounded
	/// on their own.
	fn idle_for(&self) -> Duration {
		let link = self.supervisor.link();
		if link.state().is_streaming() {
			link.idle_for()
		} else {
			Duration::ZERO
		}
	}

	fn request_restart(&self) {
		if *self.stop.borrow() {
			return;
		}
		let mut task = self.task.lock().unwrap_or_else(|e| e.into_inner());
		if task.as_ref().is_some_and(|task| !task.is_finished()) {
			self.supervisor.request_restart();
		} else {
			warn!("Supervisor task is gone, spawning a new one");
			*task = Some(Self::spawn_task(&self.supervisor, &self.stop));
		}
	}
}
