use std::{sync::Arc, time::Duration};
use tokio::sync::watch;

use xrpl_ledger_monitor::{
	models::{ConnectionStatusEvent, LinkStatus, PublishedEvent, ReconnectConfig},
	services::{
		publisher::{EventPublisher, Subscription},
		stream::{EndpointPool, LinkState, ReconnectSupervisor, Supervised, SupervisorHandle},
	},
};

use crate::integration::mocks::ScriptedConnector;

fn reconnect_config() -> ReconnectConfig {
	ReconnectConfig {
		initial_delay_ms: 10,
		max_delay_ms: 1_000,
		max_failures_per_endpoint: 3,
	}
}

async fn next_status(subscription: &mut Subscription) -> ConnectionStatusEvent {
	let event = tokio::time::timeout(Duration::from_secs(5), subscription.recv())
		.await
		.expect("no status event in time")
		.expect("publisher closed");
	match &*event {
		PublishedEvent::ConnectionStatus(status) => status.clone(),
		other => panic!("unexpected event: {:?}", other),
	}
}

fn build(
	connector: Arc<ScriptedConnector>,
	publisher: Arc<EventPublisher>,
) -> Arc<ReconnectSupervisor> {
	let pool = EndpointPool::new(
		vec!["ws://endpoint-one".to_string(), "ws://endpoint-two".to_string()],
		3,
	)
	.unwrap();
	Arc::new(ReconnectSupervisor::new(
		connector,
		Arc::new(|_, _| Box::pin(async {})),
		publisher,
		Arc::new(LinkState::new()),
		pool,
		reconnect_config(),
	))
}

#[tokio::test]
async fn test_three_failures_advance_to_next_endpoint() {
	let connector = Arc::new(ScriptedConnector::new("one"));
	let publisher = Arc::new(EventPublisher::new());
	let mut subscription = publisher.subscribe().await.unwrap();
	let supervisor = build(connector.clone(), publisher.clone());

	let (stop_tx, stop_rx) = watch::channel(false);
	let handle = SupervisorHandle::spawn(supervisor.clone(), stop_rx);

	// Backoff doubles on the failing endpoint, then resets with the failover
	let mut delays = Vec::new();
	for _ in 0..3 {
		let status = next_status(&mut subscription).await;
		assert_eq!(status.status, LinkStatus::Disconnected);
		assert_eq!(status.endpoint, "ws://endpoint-one");
		assert!(status.error.unwrap().contains("connection refused"));
		delays.push(status.next_retry_delay.unwrap());
	}
	assert_eq!(delays, vec![10, 20, 10]);

	let connected = next_status(&mut subscription).await;
	assert_eq!(connected.status, LinkStatus::Connected);
	assert_eq!(connected.endpoint, "ws://endpoint-two");

	let pool = supervisor.pool().await;
	assert_eq!(pool.active_index(), 1);
	assert!(pool.endpoints().iter().all(|e| e.consecutive_failures == 0));
	assert_eq!(
		connector.calls(),
		vec![
			"ws://endpoint-one",
			"ws://endpoint-one",
			"ws://endpoint-one",
			"ws://endpoint-two"
		]
	);

	stop_tx.send(true).unwrap();
	let task = handle.take_task().unwrap();
	tokio::time::timeout(Duration::from_secs(1), task)
		.await
		.unwrap()
		.unwrap();
}

#[tokio::test]
async fn test_restart_request_starts_a_fresh_session() {
	let connector = Arc::new(ScriptedConnector::new("never-fails"));
	let publisher = Arc::new(EventPublisher::new());
	let mut subscription = publisher.subscribe().await.unwrap();
	let supervisor = build(connector.clone(), publisher.clone());

	let (stop_tx, stop_rx) = watch::channel(false);
	let handle = SupervisorHandle::spawn(supervisor.clone(), stop_rx);

	assert_eq!(next_status(&mut subscription).await.status, LinkStatus::Connected);

	handle.request_restart();
	let restarted = next_status(&mut subscription).await;
	assert_eq!(restarted.status, LinkStatus::Restarted);
	assert_eq!(restarted.endpoint, "ws://endpoint-one");

	let reconnected = next_status(&mut subscription).await;
	assert_eq!(reconnected.status, LinkStatus::Connected);
	assert_eq!(reconnected.endpoint, "ws://endpoint-one");
	assert_eq!(connector.calls().len(), 2);

	stop_tx.send(true).unwrap();
	let task = handle.take_task().unwrap();
	tokio::time::timeout(Duration::from_secs(1), task)
		.await
		.unwrap()
		.unwrap();
}

#[tokio::test]
async fn test_finished_supervisor_is_respawned() {
	let connector = Arc::new(ScriptedConnector::new("never-fails"));
	let publisher = Arc::new(EventPublisher::new());
	let mut subscription = publisher.subscribe().await.unwrap();
	let supervisor = build(connector.clone(), publisher.clone());

	let (_stop_tx, stop_rx) = watch::channel(false);
	let handle = SupervisorHandle::spawn(supervisor.clone(), stop_rx);
	assert_eq!(next_status(&mut subscription).await.status, LinkStatus::Connected);

	handle.take_task().unwrap().abort();
	tokio::time::sleep(Duration::from_millis(20)).await;
	assert!(!handle.is_alive());

	handle.request_restart();
	assert!(handle.is_alive());
	assert_eq!(next_status(&mut subscription).await.status, LinkStatus::Connected);
}
