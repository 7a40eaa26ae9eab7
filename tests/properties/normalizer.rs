use proptest::{prelude::*, test_runner::Config};
use bigdecimal::{num_bigint::BigInt, BigDecimal};
use serde_json::{json, Map, Value};

use xrpl_ledger_monitor::services::{
	aggregator::BlockPipeline,
	normalizer::{drops_to_native, normalize, NormalizationError},
};

use crate::properties::strategies::{address_strategy, drops_strategy};

fn payment(drops: u64, memo_data: Option<&str>) -> Value {
	let mut raw = json!({
		"hash": "ABCD",
		"Account": "rSender",
		"TransactionType": "Payment",
		"Destination": "rReceiver",
		"Amount": drops.to_string(),
		"Fee": "10",
		"meta": {"TransactionResult": "tesSUCCESS"}
	});
	if let Some(data) = memo_data {
		raw["Memos"] = json!([{"Memo": {"MemoData": data}}]);
	}
	raw
}

proptest! {
	#![proptest_config(Config {
		failure_persistence: None,
		..Config::default()
	})]

	#[test]
	fn test_native_amount_is_exact(drops in drops_strategy()) {
		let record = normalize(&payment(drops, None)).unwrap();
		let amount = record.amount.unwrap();

		prop_assert_eq!(amount.currency, "XRP");
		prop_assert_eq!(&amount.value, &BigDecimal::new(BigInt::from(drops), 6));
		prop_assert_eq!(&amount.value, &drops_to_native(drops));
		prop_assert_eq!(&amount.value * BigDecimal::from(1_000_000u64), BigDecimal::from(drops));
	}

	#[test]
	fn test_issued_value_keeps_every_digit(
		mantissa in 1u64..=9_999_999_999_999_999,
		exponent in -96i64..=80,
		negative in any::<bool>(),
	) {
		let mut raw = payment(1, None);
		let sign = if negative { "-" } else { "" };
		raw["Amount"] = json!({
			"currency": "USD",
			"issuer": "rIssuer",
			"value": format!("{}{}e{}", sign, mantissa, exponent),
		});
		let amount = normalize(&raw).unwrap().amount.unwrap();

		let magnitude = BigDecimal::new(BigInt::from(mantissa), -exponent);
		let expected = if negative { -magnitude } else { magnitude };
		prop_assert_eq!(amount.value, expected);
	}

	#[test]
	fn test_numeric_drops_match_string_drops(drops in drops_strategy()) {
		let mut raw = payment(drops, None);
		raw["Amount"] = json!(drops);
		let from_number = normalize(&raw).unwrap().amount.unwrap();
		let from_string = normalize(&payment(drops, None)).unwrap().amount.unwrap();
		prop_assert_eq!(from_number.value, from_string.value);
	}

	#[test]
	fn test_hex_memo_round_trip(text in "[ -~]{1,64}", uppercase in any::<bool>()) {
		let encoded = hex::encode(&text);
		let encoded = if uppercase { encoded.to_uppercase() } else { encoded };

		let record = normalize(&payment(1, Some(&encoded))).unwrap();
		prop_assert_eq!(record.memos.len(), 1);
		prop_assert_eq!(record.memos[0].data.as_deref(), Some(text.as_str()));
	}

	#[test]
	fn test_non_hex_memo_passes_through(text in "[g-z ]{1,64}") {
		let record = normalize(&payment(1, Some(&text))).unwrap();
		prop_assert_eq!(record.memos[0].data.as_deref(), Some(text.as_str()));
	}

	#[test]
	fn test_missing_sender_is_rejected(
		destination in address_strategy(),
		drops in drops_strategy(),
		nested in any::<bool>(),
	) {
		let mut body = Map::new();
		body.insert("TransactionType".to_string(), json!("Payment"));
		body.insert("Destination".to_string(), json!(destination));
		body.insert("Amount".to_string(), json!(drops.to_string()));
		body.insert("Fee".to_string(), json!("10"));
		let raw = if nested {
			json!({"hash": "H", "tx_json": body})
		} else {
			Value::Object(body)
		};

		prop_assert_eq!(normalize(&raw), Err(NormalizationError::MissingSender));

		// Contributes nothing to the block besides the failure count
		let valid = payment(drops, None);
		let pipeline = BlockPipeline::default();
		let with_invalid = pipeline.process(&[valid.clone(), raw]);
		let mut without_invalid = pipeline.process(&[valid]);
		without_invalid.parse_failures = 1;
		prop_assert_eq!(with_invalid, without_invalid);
	}
}
