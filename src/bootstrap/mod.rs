//! Bootstrap module for wiring the services together and owning their lifecycle.
//!
//! # Handlers
//! - `create_block_handler`: turns each closed ledger into a published block
//!
//! # Lifecycle
//! - `MonitorContext`: owns configuration, publisher, pipeline and the running
//!   supervisor and watchdog tasks, with explicit `start` and `stop`

use futures::future::BoxFuture;
use serde_json::Value;
use std::{error::Error, sync::Arc};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{info, warn};

use crate::{
	models::{LedgerClosed, MonitorConfig, PublishedBlock, PublishedEvent},
	services::{
		aggregator::{BlockAggregator, BlockPipeline, DestinationMatcher, Matcher},
		publisher::EventPublisher,
		stream::{
			BlockHandler, ConnectorConfig, EndpointPool, LedgerConnector, LinkState,
			ReconnectSupervisor, Supervised, SupervisorHandle, Watchdog, WsLedgerConnector,
		},
	},
	utils::metrics::record_block,
};

/// Type alias for handling ServiceResult
pub type Result<T> = std::result::Result<T, Box<dyn Error>>;

/// Builds the configured matchers
pub fn build_matchers(config: &MonitorConfig) -> Vec<Arc<dyn Matcher>> {
	config
		.matchers
		.iter()
		.map(|matcher| Arc::new(DestinationMatcher::from(matcher)) as Arc<dyn Matcher>)
		.collect()
}

/// Creates a block handler that aggregates each closed ledger and publishes it.
///
/// # Arguments
/// * `pipeline` - Normalization and aggregation for one block
/// * `publisher` - Where the enriched block is delivered
///
/// # Returns
/// Returns a function that handles incoming ledgers
pub fn create_block_handler(pipeline: BlockPipeline, publisher: Arc<EventPublisher>) -> BlockHandler {
	Arc::new(
		move |ledger: LedgerClosed, transactions: Vec<Value>| -> BoxFuture<'static, ()> {
			let pipeline = pipeline.clone();
			let publisher = publisher.clone();
			Box::pin(async move {
				let stats = pipeline.process(&transactions);
				record_block(&stats);

				let block = PublishedBlock::new(&ledger, stats);
				match publisher.publish(PublishedEvent::NewBlock(block)).await {
					Ok(delivered) => info!(
						ledger_index = ledger.ledger_index,
						delivered,
						"Published block"
					),
					Err(e) => warn!(
						ledger_index = ledger.ledger_index,
						error = %e,
						"Block not published"
					),
				}
			})
		},
	)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
	Idle,
	Running,
	Stopped,
}

/// Running ingestion tasks
struct Tasks {
	shutdown_tx: watch::Sender<bool>,
	supervisor: Arc<SupervisorHandle>,
	watchdog: JoinHandle<()>,
}

/// Owned runtime context of the monitor
pub struct MonitorContext {
	config: MonitorConfig,
	publisher: Arc<EventPublisher>,
	pipeline: BlockPipeline,
	link: Arc<LinkState>,
	connector: Arc<dyn LedgerConnector>,
	lifecycle: Lifecycle,
	tasks: Option<Tasks>,
}

impl MonitorContext {
	/// Creates a context streaming over WebSocket
	pub fn new(config: MonitorConfig) -> Self {
		let connector = Arc::new(WsLedgerConnector::new(ConnectorConfig::from(&config.stream)));
		Self::with_connector(config, connector)
	}

	/// Creates a context around any connector implementation
	pub fn with_connector(config: MonitorConfig, connector: Arc<dyn LedgerConnector>) -> Self {
		let aggregator = BlockAggregator::new(config.aggregation.clone(), build_matchers(&config));
		Self {
			publisher: Arc::new(EventPublisher::new()),
			pipeline: BlockPipeline::new(aggregator),
			link: Arc::new(LinkState::new()),
			connector,
			lifecycle: Lifecycle::Idle,
			tasks: None,
			config,
		}
	}

	pub fn config(&self) -> &MonitorConfig {
		&self.config
	}

	pub fn publisher(&self) -> Arc<EventPublisher> {
		self.publisher.clone()
	}

	pub fn link(&self) -> Arc<LinkState> {
		self.link.clone()
	}

	pub fn is_running(&self) -> bool {
		self.lifecycle == Lifecycle::Running
	}

	/// Spawns the supervisor and the watchdog. Must run inside a tokio runtime.
	pub fn start(&mut self) -> Result<()> {
		match self.lifecycle {
			Lifecycle::Running => return Err("monitor is already running".into()),
			Lifecycle::Stopped => return Err("monitor was stopped and cannot be restarted".into()),
			Lifecycle::Idle => {}
		}
		let pool = EndpointPool::new(
			self.config.endpoint_urls(),
			self.config.reconnect.max_failures_per_endpoint,
		)
		.ok_or("no enabled endpoints configured")?;

		let (shutdown_tx, shutdown_rx) = watch::channel(false);
		let handler = create_block_handler(self.pipeline.clone(), self.publisher.clone());
		let supervisor = Arc::new(ReconnectSupervisor::new(
			self.connector.clone(),
			handler,
			self.publisher.clone(),
			self.link.clone(),
			pool,
			self.config.reconnect.clone(),
		));
		let supervisor = Arc::new(SupervisorHandle::spawn(supervisor, shutdown_rx.clone()));

		let watchdog = Watchdog::new(&self.config.watchdog);
		let target: Arc<dyn Supervised> = supervisor.clone();
		let watchdog = tokio::spawn(watchdog.run(target, shutdown_rx));

		info!(
			endpoints = self.config.endpoint_urls().len(),
			matchers = self.config.matchers.len(),
			"Monitor started"
		);
		self.tasks = Some(Tasks {
			shutdown_tx,
			supervisor,
			watchdog,
		});
		self.lifecycle = Lifecycle::Running;
		Ok(())
	}

	/// Raises the stop signal and waits up to the grace period for ingestion to
	/// wind down, then closes the publisher.
	///
	/// Returns `true` when every task finished within the grace period.
	pub async fn stop(&mut self) -> bool {
		self.lifecycle = Lifecycle::Stopped;
		let Some(tasks) = self.tasks.take() else {
			self.publisher.close().await;
			return true;
		};

		let _ = tasks.shutdown_tx.send(true);
		let grace = self.config.shutdown_grace();
		let supervisor_task = tasks.supervisor.take_task();
		let mut watchdog = tasks.watchdog;

		let finished = match supervisor_task {
			Some(mut supervisor_task) => {
				let joined = tokio::time::timeout(grace, async {
					let _ = (&mut supervisor_task).await;
					let _ = (&mut watchdog).await;
				})
				.await;
				if joined.is_err() {
					supervisor_task.abort();
				}
				joined.is_ok()
			}
			None => tokio::time::timeout(grace, &mut watchdog).await.is_ok(),
		};
		if !finished {
			watchdog.abort();
			warn!(
				grace_ms = grace.as_millis() as u64,
				"Ingestion did not stop within the grace period, proceeding"
			);
		}

		self.publisher.close().await;
		info!("Monitor stopped");
		finished
	}
}
