//! Field resolvers for raw transaction payloads.
//!
//! The network places the same logical field under different paths depending on
//! the API and the payload vintage. Each field has an ordered list of resolvers;
//! the first one that yields a value wins.

use serde_json::{Map, Value};

/// Keys that may wrap the authoritative transaction fields, checked in order
pub const BODY_KEYS: [&str; 2] = ["tx_json", "result"];

/// A raw transaction split into its root and its resolved body.
///
/// The body is the nested transaction object when one is present, otherwise the
/// root itself. Outcome metadata is always looked up relative to the root.
#[derive(Debug, Clone, Copy)]
pub struct TxView<'a> {
	pub root: &'a Map<String, Value>,
	pub body: &'a Map<String, Value>,
}

impl<'a> TxView<'a> {
	pub fn new(root: &'a Map<String, Value>) -> Self {
		let body = BODY_KEYS
			.iter()
			.find_map(|key| root.get(*key).and_then(Value::as_object))
			.unwrap_or(root);
		Self { root, body }
	}

	pub fn body_field(self, key: &str) -> Option<&'a Value> {
		self.body.get(key)
	}

	pub fn root_field(self, key: &str) -> Option<&'a Value> {
		self.root.get(key)
	}

	/// Looks up `key` inside the root-level object stored under `parent`
	pub fn nested(self, parent: &str, key: &str) -> Option<&'a Value> {
		self.root.get(parent)?.as_object()?.get(key)
	}
}

pub type Resolver = for<'a> fn(TxView<'a>) -> Option<&'a Value>;

/// Tries each resolver in order and returns the first hit
pub fn resolve<'a>(view: TxView<'a>, resolvers: &[Resolver]) -> Option<&'a Value> {
	resolvers.iter().find_map(|resolver| resolver(view))
}

pub const HASH: &[Resolver] = &[|v| v.root_field("hash"), |v| v.body_field("hash")];

pub const KIND: &[Resolver] = &[
	|v| v.body_field("TransactionType"),
	|v| v.root_field("TransactionType"),
	|v| v.nested("tx", "TransactionType"),
	|v| v.nested("transaction", "TransactionType"),
	|v| v.nested("meta", "TransactionType"),
];

pub const OUTCOME: &[Resolver] = &[
	|v| v.nested("meta", "TransactionResult"),
	|v| v.nested("metaData", "TransactionResult"),
	|v| v.nested("metadata", "TransactionResult"),
	|v| {
		v.body_field("meta")?
			.as_object()?
			.get("TransactionResult")
	},
	|v| v.root_field("TransactionResult"),
];

pub const FEE: &[Resolver] = &[|v| v.body_field("Fee"), |v| v.root_field("Fee")];

pub const DATE: &[Resolver] = &[|v| v.root_field("date"), |v| v.body_field("date")];

pub const AMOUNT: &[Resolver] = &[
	|v| v.body_field("Amount"),
	|v| v.body_field("DeliverMax"),
	|v| v.nested("meta", "delivered_amount"),
	|v| v.nested("metaData", "delivered_amount"),
];
