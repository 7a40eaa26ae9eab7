//! Test doubles: a scripted ledger WebSocket server, a scripted connector and a
//! mock watchdog target.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use mockall::mock;
use serde_json::Value;
use std::{
	future::Future,
	sync::{Arc, Mutex},
	time::Duration,
};
use tokio::{
	net::{TcpListener, TcpStream},
	sync::watch,
	task::JoinHandle,
};
use tokio_tungstenite::{accept_async, tungstenite::Message, WebSocketStream};

use xrpl_ledger_monitor::{
	models::ConnectionState,
	services::stream::{BlockHandler, ConnectorOutcome, LedgerConnector, LinkState, Supervised, TransportError},
};

pub type ServerStream = WebSocketStream<TcpStream>;

/// Starts a one-connection WebSocket server running `script` and returns its url
pub async fn spawn_ledger_server<F, Fut>(script: F) -> (String, JoinHandle<()>)
where
	F: FnOnce(ServerStream) -> Fut + Send + 'static,
	Fut: Future<Output = ()> + Send + 'static,
{
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let url = format!("ws://{}", listener.local_addr().unwrap());
	let task = tokio::spawn(async move {
		let (stream, _) = listener.accept().await.unwrap();
		let ws = accept_async(stream).await.unwrap();
		script(ws).await;
	});
	(url, task)
}

pub async fn send_json(ws: &mut ServerStream, value: Value) {
	ws.send(Message::Text(value.to_string().into())).await.unwrap();
}

/// Next JSON text frame, or `None` once the client went away
pub async fn recv_json(ws: &mut ServerStream) -> Option<Value> {
	while let Some(Ok(frame)) = ws.next().await {
		if let Message::Text(text) = frame {
			return serde_json::from_str(text.as_str()).ok();
		}
	}
	None
}

/// Reads until the client disconnects
pub async fn drain(ws: &mut ServerStream) {
	while recv_json(ws).await.is_some() {}
}

pub fn ledger_closed(ledger_index: u64, ledger_hash: &str, txn_count: u64) -> Value {
	serde_json::json!({
		"type": "ledgerClosed",
		"fee_base": 10,
		"ledger_hash": ledger_hash,
		"ledger_index": ledger_index,
		"ledger_time": 800_000_000u64,
		"reserve_base": 1_000_000,
		"reserve_inc": 200_000,
		"txn_count": txn_count,
		"validated_ledgers": "1-100"
	})
}

pub fn ledger_response(id: u64, transactions: Vec<Value>) -> Value {
	serde_json::json!({
		"id": id,
		"status": "success",
		"type": "response",
		"result": {"ledger": {"transactions": transactions}, "validated": true}
	})
}

/// Connector that fails on endpoints containing `failing` and otherwise stays
/// subscribed until cancelled
pub struct ScriptedConnector {
	pub failing: &'static str,
	pub calls: Mutex<Vec<String>>,
}

impl ScriptedConnector {
	pub fn new(failing: &'static str) -> Self {
		Self {
			failing,
			calls: Mutex::new(Vec::new()),
		}
	}

	pub fn calls(&self) -> Vec<String> {
		self.calls.lock().unwrap().clone()
	}
}

#[async_trait]
impl LedgerConnector for ScriptedConnector {
	async fn run(
		&self,
		endpoint: &str,
		_handler: BlockHandler,
		mut cancel: watch::Receiver<bool>,
		link: Arc<LinkState>,
	) -> ConnectorOutcome {
		self.calls.lock().unwrap().push(endpoint.to_string());
		if endpoint.contains(self.failing) {
			return ConnectorOutcome::Failed(TransportError::connect(endpoint, "connection refused"));
		}
		link.set_state(endpoint, ConnectionState::Subscribed);
		link.touch();
		let _ = cancel.wait_for(|cancelled| *cancelled).await;
		link.set_state(endpoint, ConnectionState::Disconnected);
		ConnectorOutcome::Cancelled
	}
}

// Mock implementation of a watchdog target.
// Used for testing stall detection and restart gating.
mock! {
	pub Target {}

	impl Supervised for Target {
		fn is_alive(&self) -> bool;
		fn idle_for(&self) -> Duration;
		fn request_restart(&self);
	}
}
