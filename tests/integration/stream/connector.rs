use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};
use tokio::sync::{mpsc, watch};

use xrpl_ledger_monitor::{
	models::{ConnectionState, LedgerClosed},
	services::stream::{
		BlockHandler, ConnectorConfig, ConnectorOutcome, LedgerConnector, LinkState,
		WsLedgerConnector,
	},
};

use crate::integration::mocks::{
	drain, ledger_closed, ledger_response, recv_json, send_json, spawn_ledger_server,
};

type Delivered = (LedgerClosed, Vec<Value>, ConnectionState);

/// Handler forwarding every block, with the link state seen at delivery
fn channel_handler(link: Arc<LinkState>) -> (BlockHandler, mpsc::UnboundedReceiver<Delivered>) {
	let (tx, rx) = mpsc::unbounded_channel();
	let handler: BlockHandler = Arc::new(move |ledger, transactions| {
		let tx = tx.clone();
		let state = link.state();
		Box::pin(async move {
			let _ = tx.send((ledger, transactions, state));
		})
	});
	(handler, rx)
}

fn connector() -> WsLedgerConnector {
	WsLedgerConnector::new(
		ConnectorConfig::default()
			.with_connection_timeout(Duration::from_secs(2))
			.with_fetch_timeout(Duration::from_millis(300)),
	)
}

async fn next_block(rx: &mut mpsc::UnboundedReceiver<Delivered>) -> Delivered {
	tokio::time::timeout(Duration::from_secs(5), rx.recv())
		.await
		.expect("block not delivered in time")
		.expect("handler channel closed")
}

#[tokio::test]
async fn test_fetches_transactions_and_buffers_interleaved_messages() {
	let (url, server) = spawn_ledger_server(|mut ws| async move {
		let subscribe = recv_json(&mut ws).await.unwrap();
		assert_eq!(subscribe["command"], "subscribe");
		assert_eq!(subscribe["streams"], json!(["ledger"]));
		send_json(&mut ws, json!({"id": subscribe["id"], "status": "success", "type": "response", "result": {}})).await;

		send_json(&mut ws, ledger_closed(100, "HASH100", 2)).await;
		let request = recv_json(&mut ws).await.unwrap();
		assert_eq!(request["command"], "ledger");
		assert_eq!(request["ledger_hash"], "HASH100");
		assert_eq!(request["transactions"], true);
		assert_eq!(request["expand"], true);

		// The next ledger closes before the fetch is answered
		send_json(&mut ws, ledger_closed(101, "HASH101", 0)).await;
		send_json(
			&mut ws,
			ledger_response(
				request["id"].as_u64().unwrap(),
				vec![json!({"hash": "T1"}), json!({"hash": "T2"})],
			),
		)
		.await;
		drain(&mut ws).await;
	})
	.await;

	let link = Arc::new(LinkState::new());
	let (handler, mut rx) = channel_handler(link.clone());
	let (cancel_tx, cancel_rx) = watch::channel(false);
	let run = tokio::spawn({
		let link = link.clone();
		async move { connector().run(&url, handler, cancel_rx, link).await }
	});

	let (first, transactions, state) = next_block(&mut rx).await;
	assert_eq!(first.ledger_index, 100);
	assert_eq!(transactions.len(), 2);
	assert_eq!(state, ConnectionState::Subscribed);

	let (second, transactions, _) = next_block(&mut rx).await;
	assert_eq!(second.ledger_index, 101);
	assert!(transactions.is_empty());
	assert!(link.idle_for() < Duration::from_secs(5));

	cancel_tx.send(true).unwrap();
	let outcome = tokio::time::timeout(Duration::from_secs(2), run)
		.await
		.unwrap()
		.unwrap();
	assert_eq!(outcome, ConnectorOutcome::Cancelled);
	assert_eq!(link.state(), ConnectionState::Disconnected);
	server.await.unwrap();
}

#[tokio::test]
async fn test_fetch_failures_forward_empty_blocks() {
	let (url, _server) = spawn_ledger_server(|mut ws| async move {
		recv_json(&mut ws).await.unwrap();

		// Error response
		send_json(&mut ws, ledger_closed(200, "HASH200", 3)).await;
		let request = recv_json(&mut ws).await.unwrap();
		send_json(
			&mut ws,
			json!({"id": request["id"], "status": "error", "error": "lgrNotFound", "type": "response"}),
		)
		.await;

		// No response at all
		send_json(&mut ws, ledger_closed(201, "HASH201", 1)).await;
		recv_json(&mut ws).await.unwrap();

		drain(&mut ws).await;
	})
	.await;

	let link = Arc::new(LinkState::new());
	let (handler, mut rx) = channel_handler(link.clone());
	let (cancel_tx, cancel_rx) = watch::channel(false);
	let run = tokio::spawn({
		let link = link.clone();
		async move { connector().run(&url, handler, cancel_rx, link).await }
	});

	let (ledger, transactions, state) = next_block(&mut rx).await;
	assert_eq!(ledger.ledger_index, 200);
	assert!(transactions.is_empty());
	assert_eq!(state, ConnectionState::Degraded);

	let (ledger, transactions, state) = next_block(&mut rx).await;
	assert_eq!(ledger.ledger_index, 201);
	assert!(transactions.is_empty());
	assert_eq!(state, ConnectionState::Degraded);

	cancel_tx.send(true).unwrap();
	let outcome = tokio::time::timeout(Duration::from_secs(2), run)
		.await
		.unwrap()
		.unwrap();
	assert_eq!(outcome, ConnectorOutcome::Cancelled);
}

#[tokio::test]
async fn test_remote_close_ends_session() {
	let (url, _server) = spawn_ledger_server(|mut ws| async move {
		recv_json(&mut ws).await.unwrap();
		send_json(&mut ws, ledger_closed(300, "HASH300", 0)).await;
		let _ = futures_util::SinkExt::close(&mut ws).await;
	})
	.await;

	let link = Arc::new(LinkState::new());
	let (handler, mut rx) = channel_handler(link.clone());
	let (_cancel_tx, cancel_rx) = watch::channel(false);

	let outcome = tokio::time::timeout(
		Duration::from_secs(5),
		connector().run(&url, handler, cancel_rx, link.clone()),
	)
	.await
	.unwrap();

	assert_eq!(outcome, ConnectorOutcome::Closed);
	assert_eq!(next_block(&mut rx).await.0.ledger_index, 300);
	assert_eq!(link.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_cancel_interrupts_pending_fetch() {
	let (requested_tx, requested_rx) = tokio::sync::oneshot::channel();
	let (url, server) = spawn_ledger_server(|mut ws| async move {
		recv_json(&mut ws).await.unwrap();
		send_json(&mut ws, ledger_closed(400, "HASH400", 5)).await;
		let request = recv_json(&mut ws).await.unwrap();
		assert_eq!(request["ledger_hash"], "HASH400");
		let _ = requested_tx.send(());
		// Never answered
		drain(&mut ws).await;
	})
	.await;

	let link = Arc::new(LinkState::new());
	let (handler, mut rx) = channel_handler(link.clone());
	let (cancel_tx, cancel_rx) = watch::channel(false);
	let slow_fetch = WsLedgerConnector::new(
		ConnectorConfig::default()
			.with_connection_timeout(Duration::from_secs(2))
			.with_fetch_timeout(Duration::from_secs(10)),
	);
	let run = tokio::spawn({
		let link = link.clone();
		async move { slow_fetch.run(&url, handler, cancel_rx, link).await }
	});

	tokio::time::timeout(Duration::from_secs(5), requested_rx)
		.await
		.unwrap()
		.unwrap();
	cancel_tx.send(true).unwrap();

	let outcome = tokio::time::timeout(Duration::from_secs(2), run)
		.await
		.expect("cancel not observed during fetch")
		.unwrap();
	assert_eq!(outcome, ConnectorOutcome::Cancelled);
	assert_eq!(link.state(), ConnectionState::Disconnected);
	assert!(rx.try_recv().is_err());
	tokio::time::timeout(Duration::from_secs(2), server)
		.await
		.unwrap()
		.unwrap();
}
