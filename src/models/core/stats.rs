//! Per-block statistics produced by the aggregator.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{TxKind, TxRecord};

/// The largest positive payment observed in a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LargestPayment {
	pub currency: String,
	pub value: BigDecimal,
	pub tx_hash: String,
	pub kind: TxKind,
}

/// How often an account appeared as sender or receiver in a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountActivity {
	pub address: String,
	pub count: u64,
}

/// Result reported by a matcher for one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
	/// Name of the matcher that produced this result
	pub matcher: String,
	pub tx_hash: String,
	pub receiver: Option<String>,
	pub currency: Option<String>,
	pub value: Option<BigDecimal>,
	/// Whether the configured exact amount (if any) was hit
	pub exact_amount: bool,
}

/// Summary statistics for one closed ledger.
///
/// Built once per block and never mutated after the aggregator returns it.
/// `counts_by_type` always sums to `tx_count`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockStats {
	pub tx_count: u64,
	pub success_count: u64,
	pub failure_count: u64,
	pub counts_by_type: BTreeMap<TxKind, u64>,
	pub counts_by_currency: BTreeMap<String, u64>,
	pub total_value_transferred: BTreeMap<String, BigDecimal>,
	/// Currency with the highest transferred volume; ties go to the lowest code
	pub most_active_currency: Option<String>,
	/// Single running maximum compared across all currencies
	pub largest_payment: Option<LargestPayment>,
	pub largest_by_currency: BTreeMap<String, LargestPayment>,
	/// Total fees in native units
	pub total_fees: BigDecimal,
	pub total_fee_drops: u64,
	pub sample_records: Vec<TxRecord>,
	pub top_accounts: Vec<AccountActivity>,
	pub matched_events: Vec<MatchResult>,
	/// Raw transactions dropped because they could not be normalized
	pub parse_failures: u64,
	/// Records for which a matcher returned an error
	pub matcher_failures: u64,
}

impl BlockStats {
	pub fn is_empty(&self) -> bool {
		self.tx_count == 0
	}
}
