//! Domain models and data structures for ledger monitoring.
//!
//! - `config`: Configuration loading and validation
//! - `core`: Core domain models (transaction records, block statistics, stream events)

mod config;
mod core;

// Re-export core types
pub use core::{
	AccountActivity, Amount, BlockStats, ConnectionState, ConnectionStatusEvent, Endpoint,
	EndpointConfig, LargestPayment, LedgerClosed, LinkStatus, MatchResult, Memo, PublishedBlock,
	PublishedEvent, TxKind, TxRecord, LEDGER_CLOSED_TYPE, NATIVE_CURRENCY, SUCCESS_RESULT_CODE,
};

// Re-export config types
pub use config::{
	AggregationConfig, ConfigError, ConfigLoader, MatcherConfig, MonitorConfig, ReconnectConfig,
	StreamConfig, WatchdogConfig, DEFAULT_CONFIG_PATH,
};
