//! Pluggable per-record matchers.
//!
//! A matcher inspects each canonical record of a block and may flag it. The
//! aggregator collects the results without interpreting them.

use bigdecimal::BigDecimal;

use crate::{
	models::{MatcherConfig, MatchResult, TxRecord},
	services::aggregator::error::MatcherError,
};

/// A rule evaluated once per normalized record
pub trait Matcher: Send + Sync {
	fn name(&self) -> &str;

	/// Returns a result when the record is of interest.
	///
	/// Errors are logged and counted by the caller; they do not stop aggregation.
	fn evaluate(&self, record: &TxRecord) -> Result<Option<MatchResult>, MatcherError>;
}

/// Flags successful payments delivered to one destination address.
///
/// Optionally restricted to a currency, and optionally checking for an exact
/// amount. Without a tolerance the amount must be equal as a decimal; with one,
/// the absolute difference must not exceed it.
#[derive(Debug, Clone)]
pub struct DestinationMatcher {
	name: String,
	destination: String,
	currency: Option<String>,
	exact_amount: Option<BigDecimal>,
	tolerance: Option<BigDecimal>,
}

impl DestinationMatcher {
	pub fn new(name: impl Into<String>, destination: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			destination: destination.into(),
			currency: None,
			exact_amount: None,
			tolerance: None,
		}
	}

	pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
		self.currency = Some(currency.into());
		self
	}

	pub fn with_exact_amount(mut self, amount: BigDecimal, tolerance: Option<BigDecimal>) -> Self {
		self.exact_amount = Some(amount);
		self.tolerance = tolerance;
		self
	}

	fn is_exact(&self, value: &BigDecimal) -> bool {
		let Some(expected) = &self.exact_amount else {
			return false;
		};
		match &self.tolerance {
			None => value == expected,
			Some(tolerance) => (value - expected).abs() <= *tolerance,
		}
	}
}

impl From<&MatcherConfig> for DestinationMatcher {
	fn from(config: &MatcherConfig) -> Self {
		let mut matcher = Self::new(&config.name, &config.destination);
		matcher.currency = config.currency.clone();
		matcher.exact_amount = config.exact_amount.clone();
		matcher.tolerance = config.tolerance.clone();
		matcher
	}
}

impl Matcher for DestinationMatcher {
	fn name(&self) -> &str {
		&self.name
	}

	fn evaluate(&self, record: &TxRecord) -> Result<Option<MatchResult>, MatcherError> {
		if !record.kind.is_payment() || !record.succeeded {
			return Ok(None);
		}
		if record.receiver.as_deref() != Some(self.destination.as_str()) {
			return Ok(None);
		}
		if let Some(currency) = &self.currency {
			if record.amount.as_ref().map(|a| &a.currency) != Some(currency) {
				return Ok(None);
			}
		}

		let value = record.amount.as_ref().map(|a| a.value.clone());
		let exact_amount = value.as_ref().is_some_and(|value| self.is_exact(value));

		Ok(Some(MatchResult {
			matcher: self.name.clone(),
			tx_hash: record.hash.clone(),
			receiver: record.receiver.clone(),
			currency: record.amount.as_ref().map(|a| a.currency.clone()),
			value,
			exact_amount,
		}))
	}
}
