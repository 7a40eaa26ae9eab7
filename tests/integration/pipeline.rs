use bigdecimal::BigDecimal;
use serde_json::json;
use std::{str::FromStr, sync::Arc};

use xrpl_ledger_monitor::{
	models::{AggregationConfig, TxKind},
	services::aggregator::{BlockAggregator, BlockPipeline, DestinationMatcher},
};

#[test]
fn test_single_native_payment_block() {
	let raw = vec![json!({
		"hash": "A1B2",
		"TransactionType": "Payment",
		"Fee": "10",
		"Amount": "1000000",
		"Account": "A",
		"Destination": "B",
		"meta": {"TransactionResult": "tesSUCCESS"}
	})];

	let stats = BlockPipeline::default().process(&raw);

	assert_eq!(stats.tx_count, 1);
	assert_eq!(stats.counts_by_type.len(), 1);
	assert_eq!(stats.counts_by_type[&TxKind::Payment], 1);
	assert_eq!(stats.total_fees, BigDecimal::from_str("0.00001").unwrap());
	assert_eq!(stats.total_value_transferred.len(), 1);
	assert_eq!(stats.total_value_transferred["XRP"], BigDecimal::from(1));

	let largest = stats.largest_payment.unwrap();
	assert_eq!(largest.currency, "XRP");
	assert_eq!(largest.value, BigDecimal::from(1));
	assert_eq!(largest.tx_hash, "A1B2");
	assert_eq!(largest.kind, TxKind::Payment);
	assert_eq!(stats.most_active_currency.as_deref(), Some("XRP"));
}

#[test]
fn test_issued_amounts_at_the_ledger_extremes() {
	let issued = |hash: &str, value: &str| {
		json!({
			"hash": hash,
			"Account": "rAlice",
			"TransactionType": "Payment",
			"Destination": "rBob",
			"Amount": {"currency": "USD", "value": value, "issuer": "rIssuer"},
			"Fee": "10",
			"meta": {"TransactionResult": "tesSUCCESS"}
		})
	};
	let raw = vec![
		issued("H1", "1e40"),
		issued("H2", "9999999999999999e80"),
		issued("H3", "1e-40"),
		issued("H4", "1234567890123456e-40"),
		issued("H5", "0.0000000000000000000000000001234567890123456"),
	];

	let stats = BlockPipeline::default().process(&raw);

	assert_eq!(stats.parse_failures, 0);
	assert_eq!(stats.counts_by_currency["USD"], 5);
	let values: Vec<_> = stats
		.sample_records
		.iter()
		.map(|record| record.amount.as_ref().unwrap().value.clone())
		.collect();
	let expected: Vec<_> = [
		"1e40",
		"9999999999999999e80",
		"1e-40",
		"1234567890123456e-40",
		"1234567890123456e-43",
	]
	.iter()
	.map(|v| BigDecimal::from_str(v).unwrap())
	.collect();
	assert_eq!(values, expected);

	let total: BigDecimal = expected.iter().sum();
	assert_eq!(stats.total_value_transferred["USD"], total);
	assert_eq!(
		&stats.total_value_transferred["USD"] - BigDecimal::from_str("9999999999999999e80").unwrap(),
		BigDecimal::from_str("1e40").unwrap()
			+ BigDecimal::from_str("1234567890123457e-40").unwrap()
			+ BigDecimal::from_str("1234567890123456e-43").unwrap()
	);
	assert_eq!(stats.largest_payment.unwrap().tx_hash, "H2");
	assert_eq!(stats.most_active_currency.as_deref(), Some("USD"));
}

#[test]
fn test_mixed_block_shapes() {
	let raw = vec![
		// Nested body with an issued-currency amount in scientific notation
		json!({
			"hash": "H1",
			"tx_json": {
				"Account": "rAlice",
				"TransactionType": "Payment",
				"Destination": "rBob",
				"Amount": {"currency": "USD", "value": "1.5e3", "issuer": "rIssuer"},
				"Fee": "12"
			},
			"meta": {"TransactionResult": "tesSUCCESS"}
		}),
		// Delivered amount only in the metadata
		json!({
			"hash": "H2",
			"Account": "rBob",
			"TransactionType": "Payment",
			"Destination": "rCarol",
			"Fee": "10",
			"meta": {"TransactionResult": "tesSUCCESS", "delivered_amount": "2500000"}
		}),
		json!({
			"hash": "H3",
			"Account": "rCarol",
			"TransactionType": "OfferCreate",
			"Fee": "10",
			"metaData": {"TransactionResult": "tesSUCCESS"}
		}),
		json!({"hash": "H4", "Account": "rDave", "Fee": "10"}),
		json!(["not", "a", "transaction"]),
	];

	let aggregator = BlockAggregator::new(
		AggregationConfig {
			sample_size: 2,
			..AggregationConfig::default()
		},
		vec![Arc::new(DestinationMatcher::new("carol", "rCarol"))],
	);
	let stats = BlockPipeline::new(aggregator).process(&raw);

	assert_eq!(stats.tx_count, 4);
	assert_eq!(stats.parse_failures, 1);
	assert_eq!(stats.counts_by_type[&TxKind::Payment], 2);
	assert_eq!(stats.counts_by_type[&TxKind::OfferCreate], 1);
	assert_eq!(stats.counts_by_type[&TxKind::Unknown], 1);
	assert_eq!(stats.total_value_transferred["USD"], BigDecimal::from(1500));
	assert_eq!(
		stats.total_value_transferred["XRP"],
		BigDecimal::from_str("2.5").unwrap()
	);
	// Cross-currency maximum, with per-currency maxima alongside
	assert_eq!(stats.largest_payment.as_ref().unwrap().tx_hash, "H1");
	assert_eq!(stats.largest_by_currency["XRP"].tx_hash, "H2");
	assert_eq!(stats.sample_records.len(), 2);
	assert_eq!(stats.matched_events.len(), 1);
	assert_eq!(stats.matched_events[0].tx_hash, "H2");
	assert_eq!(stats.top_accounts[0].address, "rBob");
	assert_eq!(stats.top_accounts[0].count, 2);
	assert_eq!(stats.total_fee_drops, 42);
}
