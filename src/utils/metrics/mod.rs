//! Metrics module for the application.
//!
//! - This module contains the global Prometheus registry.
//! - Defines ingestion metrics for the ledger stream and the block pipeline.
//! - Defines host metrics refreshed on every scrape.

pub mod server;
use lazy_static::lazy_static;
use prometheus::{
	Encoder, Gauge, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use sysinfo::{Disks, System};

use crate::models::{BlockStats, ConnectionState};

lazy_static! {
	// Global Prometheus registry.
	pub static ref REGISTRY: Registry = Registry::new();

	// Gauge for CPU usage percentage.
	pub static ref CPU_USAGE: Gauge = {
		let gauge = Gauge::new("cpu_usage_percentage", "Current CPU usage percentage").unwrap();
		REGISTRY.register(Box::new(gauge.clone())).unwrap();
		gauge
	};

	// Gauge for memory usage percentage.
	pub static ref MEMORY_USAGE_PERCENT: Gauge = {
		let gauge = Gauge::new("memory_usage_percentage", "Memory usage percentage").unwrap();
		REGISTRY.register(Box::new(gauge.clone())).unwrap();
		gauge
	};

	// Gauge for memory usage in bytes.
	pub static ref MEMORY_USAGE: Gauge = {
		let gauge = Gauge::new("memory_usage_bytes", "Memory usage in bytes").unwrap();
		REGISTRY.register(Box::new(gauge.clone())).unwrap();
		gauge
	};

	// Gauge for used disk space in bytes.
	pub static ref DISK_USAGE: Gauge = {
		let gauge = Gauge::new("disk_usage_bytes", "Used disk space in bytes").unwrap();
		REGISTRY.register(Box::new(gauge.clone())).unwrap();
		gauge
	};

	// Closed ledgers that went through the pipeline.
	pub static ref LEDGERS_PROCESSED: IntCounter = {
		let counter = IntCounter::new("ledgers_processed_total", "Closed ledgers processed").unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	pub static ref TRANSACTIONS_NORMALIZED: IntCounterVec = {
		let counter = IntCounterVec::new(
			Opts::new("transactions_normalized_total", "Transactions normalized, by type"),
			&["tx_type"]
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	pub static ref NORMALIZATION_FAILURES: IntCounter = {
		let counter = IntCounter::new(
			"normalization_failures_total",
			"Raw transactions dropped by the normalizer"
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	pub static ref MATCHES: IntCounterVec = {
		let counter = IntCounterVec::new(
			Opts::new("matcher_hits_total", "Transactions flagged by each matcher"),
			&["matcher"]
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	pub static ref MATCHER_FAILURES: IntCounter = {
		let counter = IntCounter::new("matcher_failures_total", "Matcher evaluation errors").unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	// Ledgers whose transaction list could not be fetched in time.
	pub static ref FETCH_FAILURES: IntCounter = {
		let counter = IntCounter::new("ledger_fetch_failures_total", "Failed ledger fetches").unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	pub static ref RECONNECT_ATTEMPTS: IntCounter = {
		let counter = IntCounter::new("reconnect_attempts_total", "Stream reconnect attempts").unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	pub static ref ENDPOINT_FAILOVERS: IntCounter = {
		let counter = IntCounter::new("endpoint_failovers_total", "Moves to the next endpoint").unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	pub static ref WATCHDOG_RESTARTS: IntCounter = {
		let counter = IntCounter::new("watchdog_restarts_total", "Restarts forced by the watchdog").unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	pub static ref SUBSCRIBERS: IntGauge = {
		let gauge = IntGauge::new("event_subscribers", "Registered event subscribers").unwrap();
		REGISTRY.register(Box::new(gauge.clone())).unwrap();
		gauge
	};

	// 0 disconnected, 1 connecting, 2 subscribed, 3 degraded
	pub static ref CONNECTION_STATE: Gauge = {
		let gauge = Gauge::new("stream_connection_state", "Current stream connection state").unwrap();
		REGISTRY.register(Box::new(gauge.clone())).unwrap();
		gauge
	};
}

/// Gather all metrics and encode into the provided format.
pub fn gather_metrics() -> Result<Vec<u8>, Box<dyn std::error::Error>> {
	let encoder = TextEncoder::new();
	let metric_families = REGISTRY.gather();
	let mut buffer = Vec::new();
	encoder.encode(&metric_families, &mut buffer)?;
	Ok(buffer)
}

/// Updates the system metrics for CPU, memory and disk usage.
pub fn update_system_metrics() {
	let mut sys = System::new_all();
	sys.refresh_all();

	CPU_USAGE.set(sys.global_cpu_usage() as f64);

	let total_memory = sys.total_memory();
	let memory_usage = sys.used_memory();
	MEMORY_USAGE.set(memory_usage as f64);
	MEMORY_USAGE_PERCENT.set(if total_memory > 0 {
		(memory_usage as f64 / total_memory as f64) * 100.0
	} else {
		0.0
	});

	let disks = Disks::new_with_refreshed_list();
	let used_disk_space: u64 = disks
		.list()
		.iter()
		.map(|disk| disk.total_space().saturating_sub(disk.available_space()))
		.sum();
	DISK_USAGE.set(used_disk_space as f64);
}

/// Records the outcome of one processed block.
pub fn record_block(stats: &BlockStats) {
	LEDGERS_PROCESSED.inc();
	for (kind, count) in &stats.counts_by_type {
		TRANSACTIONS_NORMALIZED
			.with_label_values(&[kind.as_str()])
			.inc_by(*count);
	}
	NORMALIZATION_FAILURES.inc_by(stats.parse_failures);
	MATCHER_FAILURES.inc_by(stats.matcher_failures);
	for matched in &stats.matched_events {
		MATCHES.with_label_values(&[matched.matcher.as_str()]).inc();
	}
}

pub fn record_connection_state(state: ConnectionState) {
	CONNECTION_STATE.set(state.as_gauge());
}
