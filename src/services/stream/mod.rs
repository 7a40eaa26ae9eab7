//! Ledger stream ingestion.
//!
//! - `connector`: one WebSocket session against one endpoint
//! - `supervisor`: retry loop with backoff and endpoint failover
//! - `watchdog`: stall detection and forced restarts
//! - `link`: connection state and liveness shared between them

mod backoff;
mod connector;
mod endpoint_pool;
mod error;
mod link;
mod supervisor;
mod watchdog;

pub use backoff::Backoff;
pub use connector::{
	ledger_request, subscribe_request, transactions_from_response, BlockHandler,
	ConnectorConfig, ConnectorOutcome, LedgerConnector, WsLedgerConnector,
};
pub use endpoint_pool::EndpointPool;
pub use error::TransportError;
pub use link::LinkState;
pub use supervisor::{ReconnectSupervisor, SupervisorHandle};
pub use watchdog::{Supervised, Watchdog, WatchdogDecision};
