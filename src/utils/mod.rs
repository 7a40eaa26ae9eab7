//! Utility modules for common functionality.
//!
//! - logging: Logging setup
//! - metrics: Prometheus metrics and the metrics HTTP server
//! - parsing: Helpers for loosely typed wire values

pub mod logging;
pub mod metrics;
pub mod parsing;

pub use parsing::*;
