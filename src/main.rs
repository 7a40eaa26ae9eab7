//! XRP Ledger stream monitor entry point.
//!
//! This binary loads the configuration, starts ledger ingestion and keeps it
//! running until interrupted.
//!
//! # Flow
//! 1. Loads configuration from `--config`, `MONITOR_CONFIG_PATH` or the default file
//! 2. Starts the reconnect supervisor and the watchdog
//! 3. Logs a summary of every published block and connection change
//! 4. Optionally serves Prometheus metrics
//! 5. Handles graceful shutdown on Ctrl+C

use xrpl_ledger_monitor::{
	bootstrap::{MonitorContext, Result},
	models::{ConfigLoader, LinkStatus, MonitorConfig, PublishedEvent},
	utils::{logging::setup_logging, metrics::server::create_metrics_server},
};

use clap::{Arg, Command};
use dotenvy::dotenv;
use std::env::{set_var, var};
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Logs one published event the way an operator wants to read it
fn log_event(event: &PublishedEvent) {
	match event {
		PublishedEvent::NewBlock(block) => {
			let stats = &block.stats;
			let largest = stats
				.largest_payment
				.as_ref()
				.map(|p| format!("{} {} ({} {})", p.value, p.currency, p.kind, p.tx_hash))
				.unwrap_or_else(|| "none".to_string());
			info!(
				ledger_index = block.ledger_index,
				close_time = %block.close_time_formatted,
				tx_count = stats.tx_count,
				succeeded = stats.success_count,
				failed = stats.failure_count,
				total_fees = %stats.total_fees,
				most_active_currency = stats.most_active_currency.as_deref().unwrap_or("none"),
				largest_payment = %largest,
				"Ledger summary"
			);
			for matched in &stats.matched_events {
				warn!(
					matcher = %matched.matcher,
					tx_hash = %matched.tx_hash,
					value = ?matched.value,
					exact_amount = matched.exact_amount,
					"Matched transaction"
				);
			}
		}
		PublishedEvent::ConnectionStatus(status) => match status.status {
			LinkStatus::Connected => info!(endpoint = %status.endpoint, "Connected"),
			LinkStatus::Restarted => warn!(endpoint = %status.endpoint, "Connection restarted"),
			LinkStatus::Disconnected => warn!(
				endpoint = %status.endpoint,
				error = status.error.as_deref().unwrap_or_default(),
				retry_in_ms = status.next_retry_delay.unwrap_or_default(),
				"Disconnected"
			),
		},
	}
}

/// Main entry point for the ledger monitor.
///
/// # Errors
/// Returns an error if the configuration cannot be loaded or ingestion cannot start.
#[tokio::main]
async fn main() -> Result<()> {
	// Initialize command-line interface
	let matches = Command::new("xrpl-ledger-monitor")
		.version(env!("CARGO_PKG_VERSION"))
		.about(
			"Streams closed ledgers from the XRP Ledger, aggregates their transactions and \
			 publishes per-block statistics.",
		)
		.arg(
			Arg::new("config")
				.long("config")
				.help("Path to the JSON configuration file (default: config/monitor.json)")
				.value_name("PATH"),
		)
		.arg(
			Arg::new("log-file")
				.long("log-file")
				.help("Write logs to file instead of stdout")
				.action(clap::ArgAction::SetTrue),
		)
		.arg(
			Arg::new("log-level")
				.long("log-level")
				.help("Set log level (trace, debug, info, warn, error)")
				.value_name("LEVEL"),
		)
		.arg(
			Arg::new("log-path")
				.long("log-path")
				.help("Path to store log files (default: logs/)")
				.value_name("PATH"),
		)
		.arg(
			Arg::new("metrics-address")
				.long("metrics-address")
				.help("Address to start the metrics server on (default: 127.0.0.1:8081)")
				.value_name("HOST:PORT"),
		)
		.arg(
			Arg::new("metrics")
				.long("metrics")
				.help("Enable metrics server")
				.action(clap::ArgAction::SetTrue),
		)
		.get_matches();

	// Load environment variables from .env file
	dotenv().ok();

	// Only apply CLI options if the corresponding environment variables are NOT already set
	if matches.get_flag("log-file") && var("LOG_MODE").is_err() {
		set_var("LOG_MODE", "file");
	}

	if let Some(level) = matches.get_one::<String>("log-level") {
		if var("LOG_LEVEL").is_err() {
			set_var("LOG_LEVEL", level);
		}
	}

	if let Some(path) = matches.get_one::<String>("log-path") {
		if var("LOG_DATA_DIR").is_err() {
			set_var("LOG_DATA_DIR", path);
		}
	}

	setup_logging().unwrap_or_else(|e| {
		error!("Failed to setup logging: {}", e);
	});

	let config_path = matches
		.get_one::<String>("config")
		.cloned()
		.or_else(|| var("MONITOR_CONFIG_PATH").ok())
		.map(PathBuf::from);
	let config = MonitorConfig::load(config_path.as_deref())
		.map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

	let mut context = MonitorContext::new(config);
	context.publisher().subscribe_fn(|event| log_event(&event)).await?;

	// Check if metrics should be enabled from either CLI flag or env var
	let metrics_enabled =
		matches.get_flag("metrics") || var("METRICS_ENABLED").map(|v| v == "true").unwrap_or(false);

	let metrics_address = if var("IN_DOCKER").unwrap_or_default() == "true" {
		// For Docker, use METRICS_PORT env var if available
		var("METRICS_PORT")
			.map(|port| format!("0.0.0.0:{}", port))
			.unwrap_or_else(|_| "0.0.0.0:8081".to_string())
	} else {
		matches
			.get_one::<String>("metrics-address")
			.map(|s| s.to_string())
			.unwrap_or_else(|| "127.0.0.1:8081".to_string())
	};

	let metrics_server = if metrics_enabled {
		info!("Metrics server enabled, starting on {}", metrics_address);
		match create_metrics_server(metrics_address, context.publisher()) {
			Ok(server) => Some(server),
			Err(e) => {
				error!("Failed to create metrics server: {}", e);
				None
			}
		}
	} else {
		info!("Metrics server disabled. Use --metrics flag or METRICS_ENABLED=true to enable");
		None
	};

	context.start()?;
	info!("Service started. Press Ctrl+C to shutdown");

	let ctrl_c = tokio::signal::ctrl_c();

	if let Some(metrics_future) = metrics_server {
		tokio::select! {
			result = ctrl_c => {
				if let Err(e) = result {
					error!("Error waiting for Ctrl+C: {}", e);
				}
				info!("Shutdown signal received, stopping services...");
			}
			result = metrics_future => {
				if let Err(e) = result {
					error!("Metrics server error: {}", e);
				}
				info!("Metrics server stopped, shutting down services...");
			}
		}
	} else {
		let _ = ctrl_c.await;
		info!("Shutdown signal received, stopping services...");
	}

	if !context.stop().await {
		warn!("Shutdown grace period elapsed before ingestion stopped");
	}

	info!("Shutdown complete");
	Ok(())
}
