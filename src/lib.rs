//! XRP Ledger stream monitor.
//!
//! Ingests ledger-closed notifications from a pool of XRPL WebSocket endpoints,
//! normalizes the transactions of each closed ledger, folds them into per-block
//! statistics and fans the enriched block out to any number of subscribers.
//!
//! # Architecture
//! - `models`: canonical records, statistics, published payloads and configuration
//! - `services`: normalizer, aggregator, stream connector/supervisor/watchdog and publisher
//! - `bootstrap`: wires the services together and owns the runtime lifecycle
//! - `utils`: logging, metrics and small parsing helpers

pub mod bootstrap;
pub mod models;
pub mod services;
pub mod utils;
