//! Raw transaction normalization.
//!
//! Maps one raw transaction document into a canonical [`TxRecord`]. Only a
//! non-object payload or a missing sender is an error; every other absent or
//! malformed field degrades to a default.

use bigdecimal::{num_bigint::BigInt, BigDecimal, Zero};
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::{
	models::{Amount, Memo, TxKind, TxRecord, NATIVE_CURRENCY, SUCCESS_RESULT_CODE},
	services::normalizer::{
		error::NormalizationError,
		resolvers::{self, resolve, TxView},
	},
	utils::parsing::{decode_hex_text, network_time_to_utc, value_as_u64},
};

/// Decimal places between drops and whole native units
const DROPS_SCALE: i64 = 6;

/// Integer digit counts an issued-currency value may have, negative when the first
/// significant digit sits after the decimal point. The ledger keeps a 16-digit mantissa
/// with an exponent in `-96..=80`, which spans `1e-96` up to `9999999999999999e80`.
const ISSUED_MAGNITUDE: std::ops::RangeInclusive<i64> = -95..=96;

/// Result code reported when no outcome field is present
const UNKNOWN_RESULT_CODE: &str = "Unknown";

/// Normalizes one raw transaction into a canonical record
pub fn normalize(raw: &Value) -> Result<TxRecord, NormalizationError> {
	let root = raw
		.as_object()
		.ok_or(NormalizationError::NotAStructuredPayload)?;
	let view = TxView::new(root);

	let sender = view
		.body_field("Account")
		.and_then(Value::as_str)
		.filter(|account| !account.is_empty())
		.ok_or(NormalizationError::MissingSender)?
		.to_string();

	let kind = resolve(view, resolvers::KIND)
		.and_then(Value::as_str)
		.map(TxKind::from_wire)
		.unwrap_or(TxKind::Unknown);

	let result_code = resolve(view, resolvers::OUTCOME)
		.and_then(Value::as_str)
		.unwrap_or(UNKNOWN_RESULT_CODE)
		.to_string();

	let (receiver, amount) = if kind.is_payment_shaped() {
		(
			view.body_field("Destination")
				.and_then(Value::as_str)
				.map(str::to_string),
			resolvers::AMOUNT
				.iter()
				.find_map(|resolver| resolver(view).and_then(parse_amount)),
		)
	} else {
		(None, None)
	};

	Ok(TxRecord {
		hash: resolve(view, resolvers::HASH)
			.and_then(Value::as_str)
			.unwrap_or_default()
			.to_string(),
		succeeded: result_code == SUCCESS_RESULT_CODE,
		result_code,
		fee_drops: resolve(view, resolvers::FEE)
			.and_then(value_as_u64)
			.unwrap_or(0),
		timestamp: resolve(view, resolvers::DATE)
			.and_then(value_as_u64)
			.and_then(network_time_to_utc),
		kind,
		sender,
		receiver,
		amount,
		memos: parse_memos(view.body),
		flags: view.body_field("Flags").and_then(value_as_u64).unwrap_or(0),
	})
}

/// Converts an integer drops count into whole native units
pub fn drops_to_native(drops: u64) -> BigDecimal {
	BigDecimal::new(BigInt::from(drops), DROPS_SCALE)
}

/// Parses a delivered amount: a drops string or number, or an issued-currency object
fn parse_amount(value: &Value) -> Option<Amount> {
	match value {
		Value::String(_) | Value::Number(_) => Some(Amount {
			currency: NATIVE_CURRENCY.to_string(),
			value: drops_to_native(value_as_u64(value)?),
			issuer: None,
		}),
		Value::Object(fields) => {
			let currency = fields.get("currency")?.as_str()?;
			let value = match fields.get("value")? {
				Value::String(s) => parse_decimal(s)?,
				Value::Number(n) => parse_decimal(&n.to_string())?,
				_ => return None,
			};
			Some(Amount {
				currency: currency.to_string(),
				value,
				issuer: fields
					.get("issuer")
					.and_then(Value::as_str)
					.map(str::to_string),
			})
		}
		_ => None,
	}
}

/// Parses an issued-currency value in plain or scientific notation without rounding.
///
/// Values whose magnitude falls outside what the ledger can hold yield `None`.
fn parse_decimal(input: &str) -> Option<BigDecimal> {
	let value = BigDecimal::from_str(&input.trim().to_ascii_lowercase()).ok()?;
	if value.is_zero() {
		return Some(BigDecimal::zero());
	}
	let (_, scale) = value.as_bigint_and_exponent();
	let integer_digits = i64::try_from(value.digits()).ok()? - scale;
	ISSUED_MAGNITUDE
		.contains(&integer_digits)
		.then_some(value)
}

fn parse_memos(body: &Map<String, Value>) -> Vec<Memo> {
	let Some(entries) = body.get("Memos").and_then(Value::as_array) else {
		return Vec::new();
	};

	entries
		.iter()
		.filter_map(|entry| {
			let memo = entry.get("Memo").unwrap_or(entry).as_object()?;
			let text = |key: &str| memo.get(key).and_then(Value::as_str).map(str::to_string);
			Some(Memo {
				memo_type: text("MemoType"),
				memo_format: text("MemoFormat"),
				data: memo
					.get("MemoData")
					.and_then(Value::as_str)
					.map(|data| decode_hex_text(data).unwrap_or_else(|| data.to_string())),
			})
		})
		.collect()
}
