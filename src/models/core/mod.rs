//! Core domain models for the ledger monitor.
//!
//! This module contains the fundamental data structures that represent:
//! - Endpoints: stream endpoints and connector session state
//! - Transactions: the canonical transaction record
//! - Stats: per-block aggregate statistics
//! - Ledger: stream notifications and the payloads published to subscribers

mod endpoint;
mod ledger;
mod stats;
mod transaction;

pub use endpoint::{ConnectionState, Endpoint, EndpointConfig};
pub use ledger::{
	ConnectionStatusEvent, LedgerClosed, LinkStatus, PublishedBlock, PublishedEvent,
	LEDGER_CLOSED_TYPE,
};
pub use stats::{AccountActivity, BlockStats, LargestPayment, MatchResult};
pub use transaction::{Amount, Memo, TxKind, TxRecord, NATIVE_CURRENCY, SUCCESS_RESULT_CODE};
