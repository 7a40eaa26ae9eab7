//! Ledger stream messages and the payloads published to subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::{
	models::BlockStats,
	utils::parsing::{format_network_time, value_as_u64},
};

/// Message tag of a ledger-closed notification on the ledger stream
pub const LEDGER_CLOSED_TYPE: &str = "ledgerClosed";

/// Ledger-closed notification as received from the stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerClosed {
	pub ledger_hash: String,
	pub ledger_index: u64,
	/// Close time in seconds since the network epoch
	pub ledger_time: Option<u64>,
	pub txn_count: u64,
	pub reserve_base: Option<u64>,
	pub reserve_inc: Option<u64>,
	pub fee_base: Option<u64>,
}

impl LedgerClosed {
	/// Extracts a ledger-closed notification from a stream message.
	///
	/// Returns `None` for messages with any other tag and for notifications that
	/// lack a ledger hash or index.
	pub fn from_message(message: &Value) -> Option<Self> {
		if message.get("type").and_then(Value::as_str) != Some(LEDGER_CLOSED_TYPE) {
			return None;
		}
		let field = |name: &str| message.get(name).and_then(value_as_u64);

		Some(Self {
			ledger_hash: message.get("ledger_hash")?.as_str()?.to_string(),
			ledger_index: field("ledger_index")?,
			ledger_time: field("ledger_time"),
			txn_count: field("txn_count").unwrap_or(0),
			reserve_base: field("reserve_base"),
			reserve_inc: field("reserve_inc"),
			fee_base: field("fee_base"),
		})
	}

	/// Close time formatted for display, `"N/A"` when unknown
	pub fn close_time_formatted(&self) -> String {
		self.ledger_time
			.and_then(format_network_time)
			.unwrap_or_else(|| "N/A".to_string())
	}
}

/// Enriched block as delivered to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedBlock {
	pub ledger_hash: String,
	pub ledger_index: u64,
	pub close_time_formatted: String,
	pub base_reserve: Option<u64>,
	pub incremental_reserve: Option<u64>,
	pub base_fee: Option<u64>,
	pub transaction_count: u64,
	pub stats: BlockStats,
}

impl PublishedBlock {
	pub fn new(ledger: &LedgerClosed, stats: BlockStats) -> Self {
		Self {
			ledger_hash: ledger.ledger_hash.clone(),
			ledger_index: ledger.ledger_index,
			close_time_formatted: ledger.close_time_formatted(),
			base_reserve: ledger.reserve_base,
			incremental_reserve: ledger.reserve_inc,
			base_fee: ledger.fee_base,
			transaction_count: ledger.txn_count,
			stats,
		}
	}
}

/// Link health reported to subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
	Connected,
	Disconnected,
	Restarted,
}

/// Connection status change as delivered to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatusEvent {
	pub status: LinkStatus,
	pub endpoint: String,
	pub timestamp: DateTime<Utc>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	/// Delay before the next attempt, in milliseconds
	#[serde(skip_serializing_if = "Option::is_none")]
	pub next_retry_delay: Option<u64>,
}

impl ConnectionStatusEvent {
	pub fn new(status: LinkStatus, endpoint: impl Into<String>) -> Self {
		Self {
			status,
			endpoint: endpoint.into(),
			timestamp: Utc::now(),
			error: None,
			next_retry_delay: None,
		}
	}

	pub fn with_error(mut self, error: impl Into<String>) -> Self {
		self.error = Some(error.into());
		self
	}

	pub fn with_next_retry_delay(mut self, delay: Duration) -> Self {
		self.next_retry_delay = Some(delay.as_millis() as u64);
		self
	}
}

/// Everything the publisher fans out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum PublishedEvent {
	NewBlock(PublishedBlock),
	ConnectionStatus(ConnectionStatusEvent),
}
