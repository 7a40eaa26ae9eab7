use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublisherError {
	#[error("Event publisher is closed")]
	Closed,

	#[error("Unknown subscriber {0}")]
	UnknownSubscriber(u64),
}
