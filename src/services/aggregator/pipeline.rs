//! Normalize-then-aggregate pipeline for one block.

use serde_json::Value;
use tracing::{debug, info};

use crate::{
	models::BlockStats,
	services::{aggregator::service::BlockAggregator, normalizer::normalize},
};

/// Turns a block's raw transaction list into statistics.
///
/// Raw transactions that fail normalization are dropped and counted in
/// `parse_failures`; they contribute nothing else to the result.
#[derive(Clone, Default)]
pub struct BlockPipeline {
	aggregator: BlockAggregator,
}

impl BlockPipeline {
	pub fn new(aggregator: BlockAggregator) -> Self {
		Self { aggregator }
	}

	pub fn process(&self, raw_transactions: &[Value]) -> BlockStats {
		let mut parse_failures = 0u64;
		let records: Vec<_> = raw_transactions
			.iter()
			.filter_map(|raw| match normalize(raw) {
				Ok(record) => Some(record),
				Err(e) => {
					let hash = raw.get("hash").and_then(Value::as_str).unwrap_or_default();
					debug!(error = %e, hash, "Dropping transaction that could not be normalized");
					parse_failures += 1;
					None
				}
			})
			.collect();

		let mut stats = self.aggregator.aggregate(&records);
		stats.parse_failures = parse_failures;

		info!(
			tx_count = stats.tx_count,
			parse_failures = stats.parse_failures,
			matched = stats.matched_events.len(),
			total_fees = %stats.total_fees,
			"Aggregated block"
		);
		stats
	}
}
