//! Parsing utilities
//!
//! Helpers for the loosely-typed values the ledger network emits: integers that may
//! arrive as JSON numbers or strings, network-epoch timestamps and hex memo payloads.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Seconds between the Unix epoch and the ledger network epoch (2000-01-01T00:00:00Z)
pub const NETWORK_EPOCH_OFFSET_SECS: i64 = 946_684_800;

/// Reads an unsigned integer that may be encoded as a JSON number or a decimal string.
///
/// Negative, fractional and non-numeric values yield `None`.
pub fn value_as_u64(value: &Value) -> Option<u64> {
	match value {
		Value::Number(n) => n.as_u64(),
		Value::String(s) => s.trim().parse::<u64>().ok(),
		_ => None,
	}
}

/// Converts seconds since the network epoch into a UTC timestamp
pub fn network_time_to_utc(seconds: u64) -> Option<DateTime<Utc>> {
	let seconds = i64::try_from(seconds).ok()?;
	DateTime::from_timestamp(seconds.checked_add(NETWORK_EPOCH_OFFSET_SECS)?, 0)
}

/// Formats a network-epoch timestamp as `%Y-%m-%d %H:%M:%S` (UTC)
pub fn format_network_time(seconds: u64) -> Option<String> {
	network_time_to_utc(seconds).map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// Decodes a hex string into UTF-8 text.
///
/// Returns `None` when the input is not valid hex or the decoded bytes are not UTF-8.
pub fn decode_hex_text(input: &str) -> Option<String> {
	let bytes = hex::decode(input).ok()?;
	String::from_utf8(bytes).ok()
}
