//! Canonical transaction records.
//!
//! A [`TxRecord`] is the shape-independent form of one ledger transaction. Every
//! downstream consumer (aggregator, matchers, publisher) works on this type only.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Currency code used for the network's native asset.
pub const NATIVE_CURRENCY: &str = "XRP";

/// Result code the network reports for an applied transaction.
pub const SUCCESS_RESULT_CODE: &str = "tesSUCCESS";

/// Kind of a ledger transaction.
///
/// Serialized as the wire name (`"Payment"`, `"OfferCreate"`, ...). Names that are not
/// known to this crate are kept verbatim in [`TxKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TxKind {
	Payment,
	OfferCreate,
	OfferCancel,
	TrustSet,
	EscrowCreate,
	EscrowFinish,
	EscrowCancel,
	PaymentChannelCreate,
	PaymentChannelFund,
	PaymentChannelClaim,
	CheckCreate,
	CheckCash,
	CheckCancel,
	AccountSet,
	AccountDelete,
	SetRegularKey,
	SignerListSet,
	TicketCreate,
	NFTokenMint,
	NFTokenBurn,
	NFTokenCreateOffer,
	NFTokenCancelOffer,
	NFTokenAcceptOffer,
	/// A kind name the network sent that is not in the list above
	Other(String),
	/// The kind could not be located in the payload
	Unknown,
}

impl TxKind {
	/// Parses a wire name into a kind. Never fails; unknown names become [`TxKind::Other`].
	pub fn from_wire(name: &str) -> Self {
		match name {
			"Payment" => Self::Payment,
			"OfferCreate" => Self::OfferCreate,
			"OfferCancel" => Self::OfferCancel,
			"TrustSet" => Self::TrustSet,
			"EscrowCreate" => Self::EscrowCreate,
			"EscrowFinish" => Self::EscrowFinish,
			"EscrowCancel" => Self::EscrowCancel,
			"PaymentChannelCreate" => Self::PaymentChannelCreate,
			"PaymentChannelFund" => Self::PaymentChannelFund,
			"PaymentChannelClaim" => Self::PaymentChannelClaim,
			"CheckCreate" => Self::CheckCreate,
			"CheckCash" => Self::CheckCash,
			"CheckCancel" => Self::CheckCancel,
			"AccountSet" => Self::AccountSet,
			"AccountDelete" => Self::AccountDelete,
			"SetRegularKey" => Self::SetRegularKey,
			"SignerListSet" => Self::SignerListSet,
			"TicketCreate" => Self::TicketCreate,
			"NFTokenMint" => Self::NFTokenMint,
			"NFTokenBurn" => Self::NFTokenBurn,
			"NFTokenCreateOffer" => Self::NFTokenCreateOffer,
			"NFTokenCancelOffer" => Self::NFTokenCancelOffer,
			"NFTokenAcceptOffer" => Self::NFTokenAcceptOffer,
			"Unknown" | "" => Self::Unknown,
			other => Self::Other(other.to_string()),
		}
	}

	/// Wire name of the kind
	pub fn as_str(&self) -> &str {
		match self {
			Self::Payment => "Payment",
			Self::OfferCreate => "OfferCreate",
			Self::OfferCancel => "OfferCancel",
			Self::TrustSet => "TrustSet",
			Self::EscrowCreate => "EscrowCreate",
			Self::EscrowFinish => "EscrowFinish",
			Self::EscrowCancel => "EscrowCancel",
			Self::PaymentChannelCreate => "PaymentChannelCreate",
			Self::PaymentChannelFund => "PaymentChannelFund",
			Self::PaymentChannelClaim => "PaymentChannelClaim",
			Self::CheckCreate => "CheckCreate",
			Self::CheckCash => "CheckCash",
			Self::CheckCancel => "CheckCancel",
			Self::AccountSet => "AccountSet",
			Self::AccountDelete => "AccountDelete",
			Self::SetRegularKey => "SetRegularKey",
			Self::SignerListSet => "SignerListSet",
			Self::TicketCreate => "TicketCreate",
			Self::NFTokenMint => "NFTokenMint",
			Self::NFTokenBurn => "NFTokenBurn",
			Self::NFTokenCreateOffer => "NFTokenCreateOffer",
			Self::NFTokenCancelOffer => "NFTokenCancelOffer",
			Self::NFTokenAcceptOffer => "NFTokenAcceptOffer",
			Self::Other(name) => name.as_str(),
			Self::Unknown => "Unknown",
		}
	}

	/// Human-readable label, used for log summaries
	pub fn label(&self) -> &str {
		match self {
			Self::OfferCreate => "Offer Create (DEX)",
			Self::OfferCancel => "Offer Cancel (DEX)",
			Self::TrustSet => "Trust Line Set",
			Self::EscrowCreate => "Escrow Create",
			Self::EscrowFinish => "Escrow Finish",
			Self::EscrowCancel => "Escrow Cancel",
			Self::PaymentChannelCreate => "Payment Channel Create",
			Self::PaymentChannelFund => "Payment Channel Fund",
			Self::PaymentChannelClaim => "Payment Channel Claim",
			Self::CheckCreate => "Check Create",
			Self::CheckCash => "Check Cash",
			Self::CheckCancel => "Check Cancel",
			Self::AccountSet => "Account Settings",
			Self::AccountDelete => "Account Delete",
			Self::SetRegularKey => "Set Regular Key",
			Self::SignerListSet => "Signer List Set",
			Self::TicketCreate => "Ticket Create",
			Self::NFTokenMint => "NFT Mint",
			Self::NFTokenBurn => "NFT Burn",
			Self::NFTokenCreateOffer => "NFT Create Offer",
			Self::NFTokenCancelOffer => "NFT Cancel Offer",
			Self::NFTokenAcceptOffer => "NFT Accept Offer",
			other => other.as_str(),
		}
	}

	pub fn is_payment(&self) -> bool {
		matches!(self, Self::Payment)
	}

	/// Kinds that name a counterparty in their `Destination` field
	pub fn is_payment_shaped(&self) -> bool {
		matches!(
			self,
			Self::Payment
				| Self::CheckCreate
				| Self::EscrowCreate
				| Self::PaymentChannelCreate
				| Self::AccountDelete
		)
	}
}

impl From<String> for TxKind {
	fn from(value: String) -> Self {
		Self::from_wire(&value)
	}
}

impl From<TxKind> for String {
	fn from(kind: TxKind) -> Self {
		kind.as_str().to_string()
	}
}

impl fmt::Display for TxKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A resolved transfer amount.
///
/// `value` is always expressed in whole units of `currency`; native amounts delivered
/// in drops are already divided by 1,000,000.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
	pub currency: String,
	pub value: BigDecimal,
	/// Issuing account; `None` for the native currency
	pub issuer: Option<String>,
}

impl Amount {
	pub fn is_native(&self) -> bool {
		self.currency == NATIVE_CURRENCY && self.issuer.is_none()
	}
}

/// One memo attached to a transaction.
///
/// `memo_type` and `memo_format` are kept as delivered (hex). `data` is the hex-decoded
/// text when the delivered value was valid hex, otherwise the delivered value itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memo {
	pub memo_type: Option<String>,
	pub memo_format: Option<String>,
	pub data: Option<String>,
}

/// Canonical transaction record, immutable once built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRecord {
	pub hash: String,
	pub kind: TxKind,
	pub result_code: String,
	pub succeeded: bool,
	pub fee_drops: u64,
	pub timestamp: Option<DateTime<Utc>>,
	pub sender: String,
	pub receiver: Option<String>,
	pub amount: Option<Amount>,
	pub memos: Vec<Memo>,
	pub flags: u64,
}
