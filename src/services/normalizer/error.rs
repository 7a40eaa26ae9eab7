use thiserror::Error;

/// Reasons a raw transaction cannot become a [`crate::models::TxRecord`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationError {
	#[error("Transaction payload is not a JSON object")]
	NotAStructuredPayload,

	#[error("Transaction has no sender account")]
	MissingSender,
}
