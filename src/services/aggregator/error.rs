use thiserror::Error;

/// Failure of a single matcher on a single record.
///
/// The aggregator logs and counts these; they never abort a block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatcherError {
	#[error("Matcher '{matcher}' failed: {reason}")]
	Evaluation { matcher: String, reason: String },
}
