//! Core services of the ledger monitor.
//!
//! - `stream`: WebSocket ingestion, reconnects and the watchdog
//! - `normalizer`: raw transaction payloads to canonical records
//! - `aggregator`: per-block statistics and matchers
//! - `publisher`: fan-out of blocks and link status to subscribers

pub mod aggregator;
pub mod normalizer;
pub mod publisher;
pub mod stream;
