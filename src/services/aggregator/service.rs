//! Block aggregation.
//!
//! Folds the canonical records of one block into [`BlockStats`] in a single pass.

use bigdecimal::{BigDecimal, Zero};
use std::{collections::BTreeMap, sync::Arc};
use tracing::warn;

use crate::{
	models::{AggregationConfig, BlockStats, LargestPayment, TxRecord},
	services::{
		aggregator::{accounts::ActiveAccounts, matcher::Matcher},
		normalizer::drops_to_native,
	},
};

/// Folds records into block statistics and runs the configured matchers
#[derive(Clone)]
pub struct BlockAggregator {
	config: AggregationConfig,
	matchers: Vec<Arc<dyn Matcher>>,
}

impl BlockAggregator {
	pub fn new(config: AggregationConfig, matchers: Vec<Arc<dyn Matcher>>) -> Self {
		Self { config, matchers }
	}

	pub fn matchers(&self) -> &[Arc<dyn Matcher>] {
		&self.matchers
	}

	/// Aggregates one block's records.
	///
	/// Payments with a positive resolved amount feed the currency tables whatever
	/// their outcome. `counts_by_type` always sums to `tx_count`.
	pub fn aggregate(&self, records: &[TxRecord]) -> BlockStats {
		let mut stats = BlockStats::default();
		let mut accounts = ActiveAccounts::new(self.config.max_tracked_accounts);

		for record in records {
			stats.tx_count += 1;
			*stats.counts_by_type.entry(record.kind.clone()).or_insert(0) += 1;
			if record.succeeded {
				stats.success_count += 1;
			} else {
				stats.failure_count += 1;
			}

			stats.total_fee_drops = stats.total_fee_drops.saturating_add(record.fee_drops);
			stats.total_fees += drops_to_native(record.fee_drops);

			if record.kind.is_payment() {
				if let Some(amount) = record.amount.as_ref().filter(|a| a.value > BigDecimal::zero()) {
					*stats
						.counts_by_currency
						.entry(amount.currency.clone())
						.or_insert(0) += 1;
					*stats
						.total_value_transferred
						.entry(amount.currency.clone())
						.or_default() += &amount.value;

					let candidate = LargestPayment {
						currency: amount.currency.clone(),
						value: amount.value.clone(),
						tx_hash: record.hash.clone(),
						kind: record.kind.clone(),
					};
					if stats
						.largest_by_currency
						.get(&amount.currency)
						.is_none_or(|current| amount.value > current.value)
					{
						stats
							.largest_by_currency
							.insert(amount.currency.clone(), candidate.clone());
					}
					if stats
						.largest_payment
						.as_ref()
						.is_none_or(|current| amount.value > current.value)
					{
						stats.largest_payment = Some(candidate);
					}
				}
			}

			accounts.record(&record.sender);
			if let Some(receiver) = &record.receiver {
				accounts.record(receiver);
			}

			if stats.sample_records.len() < self.config.sample_size {
				stats.sample_records.push(record.clone());
			}

			for matcher in &self.matchers {
				match matcher.evaluate(record) {
					Ok(Some(result)) => stats.matched_events.push(result),
					Ok(None) => {}
					Err(e) => {
						warn!(
							matcher = matcher.name(),
							tx_hash = %record.hash,
							error = %e,
							"Matcher failed, skipping record"
						);
						stats.matcher_failures += 1;
					}
				}
			}
		}

		stats.most_active_currency = most_active_currency(&stats.total_value_transferred);
		stats.top_accounts = accounts.top(self.config.top_accounts);
		stats
	}
}

impl Default for BlockAggregator {
	fn default() -> Self {
		Self::new(AggregationConfig::default(), Vec::new())
	}
}

/// Aggregates records with default bounds and no matchers
pub fn aggregate(records: &[TxRecord]) -> BlockStats {
	BlockAggregator::default().aggregate(records)
}

/// Currency with the highest transferred volume; the first code in order wins a tie
fn most_active_currency(totals: &BTreeMap<String, BigDecimal>) -> Option<String> {
	totals
		.iter()
		.fold(None::<(&String, &BigDecimal)>, |best, (currency, total)| match best {
			Some((_, highest)) if total <= highest => best,
			_ => Some((currency, total)),
		})
		.map(|(currency, _)| currency.clone())
}
