//! Ledger stream connector.
//!
//! One call to [`LedgerConnector::run`] is one session against one endpoint:
//! connect, subscribe to the ledger stream, then read until cancelled or the
//! transport fails. For every closed ledger with transactions the connector
//! fetches the full transaction list before handing the block on.

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::{collections::VecDeque, sync::Arc, time::Duration};
use tokio::{net::TcpStream, sync::watch, time::timeout};
use tokio_tungstenite::{
	connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, warn};

use crate::{
	models::{ConnectionState, LedgerClosed, StreamConfig},
	services::stream::{error::TransportError, link::LinkState},
	utils::metrics::FETCH_FAILURES,
};

/// Callback invoked with each closed ledger and its raw transactions
pub type BlockHandler = Arc<dyn Fn(LedgerClosed, Vec<Value>) -> BoxFuture<'static, ()> + Send + Sync>;

/// How a connector session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectorOutcome {
	/// The stop signal was raised
	Cancelled,
	/// The remote closed the stream cleanly
	Closed,
	Failed(TransportError),
}

/// A session runner against one endpoint
#[async_trait]
pub trait LedgerConnector: Send + Sync {
	async fn run(
		&self,
		endpoint: &str,
		handler: BlockHandler,
		cancel: watch::Receiver<bool>,
		link: Arc<LinkState>,
	) -> ConnectorOutcome;
}

/// Connector timeouts
#[derive(Debug, Clone)]
pub struct ConnectorConfig {
	/// How long to wait for the WebSocket handshake
	pub connection_timeout: Duration,
	/// Deadline for one ledger transaction fetch
	pub fetch_timeout: Duration,
}

impl Default for ConnectorConfig {
	fn default() -> Self {
		Self::from(&StreamConfig::default())
	}
}

impl From<&StreamConfig> for ConnectorConfig {
	fn from(config: &StreamConfig) -> Self {
		Self {
			connection_timeout: config.connection_timeout(),
			fetch_timeout: config.fetch_timeout(),
		}
	}
}

impl ConnectorConfig {
	pub fn with_connection_timeout(mut self, connection_timeout: Duration) -> Self {
		self.connection_timeout = connection_timeout;
		self
	}

	pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
		self.fetch_timeout = fetch_timeout;
		self
	}
}

/// Subscription request for ledger-closed notifications
pub fn subscribe_request(id: u64) -> Value {
	json!({"id": id, "command": "subscribe", "streams": ["ledger"]})
}

/// Request for one ledger with its expanded transactions
pub fn ledger_request(id: u64, ledger_hash: &str) -> Value {
	json!({
		"id": id,
		"command": "ledger",
		"ledger_hash": ledger_hash,
		"transactions": true,
		"expand": true
	})
}

/// Extracts the transaction list from a `ledger` response
pub fn transactions_from_response(response: &Value) -> Result<Vec<Value>, TransportError> {
	if response.get("status").and_then(Value::as_str) == Some("error") {
		let reason = response
			.get("error_message")
			.or_else(|| response.get("error"))
			.and_then(Value::as_str)
			.unwrap_or("unknown error");
		return Err(TransportError::Protocol(reason.to_string()));
	}
	response
		.pointer("/result/ledger/transactions")
		.and_then(Value::as_array)
		.cloned()
		.ok_or_else(|| TransportError::Protocol("ledger response has no transactions".to_string()))
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Resolves once the stop signal is raised or its sender is gone
async fn stop_requested(cancel: &mut watch::Receiver<bool>) {
	let _ = cancel.wait_for(|stop| *stop).await;
}

/// WebSocket connector for the ledger stream
#[derive(Debug, Clone, Default)]
pub struct WsLedgerConnector {
	config: ConnectorConfig,
}

impl WsLedgerConnector {
	pub fn new(config: ConnectorConfig) -> Self {
		Self { config }
	}
}

#[async_trait]
impl LedgerConnector for WsLedgerConnector {
	async fn run(
		&self,
		endpoint: &str,
		handler: BlockHandler,
		mut cancel: watch::Receiver<bool>,
		link: Arc<LinkState>,
	) -> ConnectorOutcome {
		link.set_state(endpoint, ConnectionState::Connecting);

		let stream = match timeout(self.config.connection_timeout, connect_async(endpoint)).await {
			Ok(Ok((stream, _))) => stream,
			Ok(Err(e)) => {
				link.set_state(endpoint, ConnectionState::Disconnected);
				return ConnectorOutcome::Failed(TransportError::connect(endpoint, e));
			}
			Err(_) => {
				link.set_state(endpoint, ConnectionState::Disconnected);
				return ConnectorOutcome::Failed(TransportError::Timeout {
					operation: "connect",
					after: self.config.connection_timeout,
				});
			}
		};

		let mut session = Session {
			stream,
			endpoint,
			link: &link,
			next_id: 1,
			pending: VecDeque::new(),
			fetch_timeout: self.config.fetch_timeout,
		};
		let outcome = session.stream_ledgers(&handler, &mut cancel).await;

		if outcome == ConnectorOutcome::Cancelled {
			let _ = session.stream.close(None).await;
		}
		link.set_state(endpoint, ConnectionState::Disconnected);
		outcome
	}
}

/// One open WebSocket session
struct Session<'a> {
	stream: WsStream,
	endpoint: &'a str,
	link: &'a LinkState,
	next_id: u64,
	/// Stream messages that arrived while waiting for a fetch response
	pending: VecDeque<Value>,
	fetch_timeout: Duration,
}

impl Session<'_> {
	async fn stream_ledgers(
		&mut self,
		handler: &BlockHandler,
		cancel: &mut watch::Receiver<bool>,
	) -> ConnectorOutcome {
		let id = self.request_id();
		if let Err(e) = self.send(subscribe_request(id)).await {
			return ConnectorOutcome::Failed(e);
		}
		self.link.set_state(self.endpoint, ConnectionState::Subscribed);
		self.link.touch();
		info!(endpoint = self.endpoint, "Subscribed to ledger stream");

		loop {
			if *cancel.borrow() {
				return ConnectorOutcome::Cancelled;
			}

			let message = match self.pending.pop_front() {
				Some(message) => message,
				None => tokio::select! {
					changed = cancel.changed() => {
						if changed.is_err() || *cancel.borrow() {
							return ConnectorOutcome::Cancelled;
						}
						continue;
					}
					message = self.read() => match message {
						Ok(Some(message)) => message,
						Ok(None) => continue,
						Err(TransportError::Closed) => return ConnectorOutcome::Closed,
						Err(e) => return ConnectorOutcome::Failed(e),
					},
				},
			};

			let Some(ledger) = LedgerClosed::from_message(&message) else {
				continue;
			};
			debug!(
				endpoint = self.endpoint,
				ledger_index = ledger.ledger_index,
				txn_count = ledger.txn_count,
				"Ledger closed"
			);

			let transactions = if ledger.txn_count == 0 {
				Vec::new()
			} else {
				let fetched = tokio::select! {
					fetched = self.fetch_transactions(&ledger.ledger_hash) => fetched,
					_ = stop_requested(cancel) => return ConnectorOutcome::Cancelled,
				};
				match fetched {
					Ok(transactions) => {
						if self.link.state() == ConnectionState::Degraded {
							self.link.set_state(self.endpoint, ConnectionState::Subscribed);
						}
						transactions
					}
					Err(e) => {
						warn!(
							endpoint = self.endpoint,
							ledger_index = ledger.ledger_index,
							error = %e,
							"Failed to fetch ledger transactions, forwarding without them"
						);
						FETCH_FAILURES.inc();
						self.link.set_state(self.endpoint, ConnectionState::Degraded);
						Vec::new()
					}
				}
			};

			handler(ledger, transactions).await;
		}
	}

	fn request_id(&mut self) -> u64 {
		let id = self.next_id;
		self.next_id += 1;
		id
	}

	async fn send(&mut self, request: Value) -> Result<(), TransportError> {
		self.stream
			.send(Message::Text(request.to_string().into()))
			.await
			.map_err(|e| TransportError::Send(e.to_string()))
	}

	/// Reads the next JSON message; `Ok(None)` for frames that carry none
	async fn read(&mut self) -> Result<Option<Value>, TransportError> {
		let frame = match self.stream.next().await {
			None => return Err(TransportError::Closed),
			Some(Err(e)) => return Err(TransportError::Receive(e.to_string())),
			Some(Ok(frame)) => frame,
		};
		self.link.touch();

		match frame {
			Message::Text(text) => match serde_json::from_str(text.as_str()) {
				Ok(value) => Ok(Some(value)),
				Err(e) => {
					debug!(endpoint = self.endpoint, error = %e, "Ignoring non-JSON message");
					Ok(None)
				}
			},
			Message::Close(_) => Err(TransportError::Closed),
			_ => Ok(None),
		}
	}

	/// Fetches a ledger's transactions, buffering unrelated messages meanwhile
	async fn fetch_transactions(&mut self, ledger_hash: &str) -> Result<Vec<Value>, TransportError> {
		let id = self.request_id();
		self.send(ledger_request(id, ledger_hash)).await?;

		let fetch_timeout = self.fetch_timeout;
		let response = timeout(fetch_timeout, async {
			loop {
				let Some(message) = self.read().await? else {
					continue;
				};
				if message.get("id").and_then(Value::as_u64) == Some(id) {
					return Ok::<_, TransportError>(message);
				}
				self.pending.push_back(message);
			}
		})
		.await
		.map_err(|_| TransportError::Timeout {
			operation: "ledger fetch",
			after: fetch_timeout,
		})??;

		transactions_from_response(&response)
	}
}
