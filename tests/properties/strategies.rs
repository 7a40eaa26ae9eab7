use proptest::{option, prelude::*};
use bigdecimal::{num_bigint::BigInt, BigDecimal};

use xrpl_ledger_monitor::models::{Amount, TxKind, TxRecord, NATIVE_CURRENCY};

const MAX_BLOCK_SIZE: usize = 40;
/// Total supply of the native currency, in drops
pub const MAX_DROPS: u64 = 100_000_000_000_000_000;

const KINDS: [&str; 8] = [
	"Payment",
	"OfferCreate",
	"OfferCancel",
	"TrustSet",
	"EscrowCreate",
	"AccountSet",
	"NFTokenMint",
	"SomeFutureType",
];

pub fn drops_strategy() -> impl Strategy<Value = u64> {
	prop_oneof![0u64..1_000_000, 0u64..=MAX_DROPS]
}

pub fn address_strategy() -> impl Strategy<Value = String> {
	"r[1-9A-HJ-NP-Za-km-z]{24,33}".prop_map(|s| s.to_string())
}

pub fn kind_strategy() -> impl Strategy<Value = TxKind> {
	prop::sample::select(KINDS.to_vec()).prop_map(TxKind::from_wire)
}

pub fn amount_strategy() -> impl Strategy<Value = Amount> {
	(
		prop::sample::select(vec![NATIVE_CURRENCY, "USD", "EUR"]),
		-1_000i64..10_000_000_000_000_000,
		prop_oneof![0i64..=6, -80i64..=96],
	)
		.prop_map(|(currency, mantissa, scale)| Amount {
			currency: currency.to_string(),
			value: BigDecimal::new(BigInt::from(mantissa), scale),
			issuer: None,
		})
}

pub fn record_strategy() -> impl Strategy<Value = TxRecord> {
	(
		"[0-9A-F]{8}",
		kind_strategy(),
		any::<bool>(),
		0u64..10_000_000,
		address_strategy(),
		option::of(address_strategy()),
		option::of(amount_strategy()),
	)
		.prop_map(
			|(hash, kind, succeeded, fee_drops, sender, receiver, amount)| TxRecord {
				hash,
				kind,
				result_code: if succeeded { "tesSUCCESS" } else { "tecPATH_DRY" }.to_string(),
				succeeded,
				fee_drops,
				timestamp: None,
				sender,
				receiver,
				amount,
				memos: vec![],
				flags: 0,
			},
		)
}

pub fn block_strategy() -> impl Strategy<Value = Vec<TxRecord>> {
	prop::collection::vec(record_strategy(), 0..MAX_BLOCK_SIZE)
}
