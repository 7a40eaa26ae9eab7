//! Event publication to live subscribers.

mod error;
mod service;

pub use error::PublisherError;
pub use service::{EventPublisher, SubscriberId, Subscription};
