//! Fan-out of published events to subscribers.
//!
//! Every subscriber owns an unbounded queue, so `publish` never waits on a slow
//! consumer. Per-subscriber order matches publish order.

use std::{
	collections::HashMap,
	sync::{
		atomic::{AtomicBool, AtomicU64, Ordering},
		Arc,
	},
};
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

use crate::{
	models::PublishedEvent, services::publisher::error::PublisherError,
	utils::metrics::SUBSCRIBERS,
};

pub type SubscriberId = u64;

type EventSender = mpsc::UnboundedSender<Arc<PublishedEvent>>;

/// A queue subscriber's receiving end
#[derive(Debug)]
pub struct Subscription {
	id: SubscriberId,
	receiver: mpsc::UnboundedReceiver<Arc<PublishedEvent>>,
}

impl Subscription {
	pub fn id(&self) -> SubscriberId {
		self.id
	}

	/// Waits for the next event; `None` once unsubscribed or the publisher closed
	pub async fn recv(&mut self) -> Option<Arc<PublishedEvent>> {
		self.receiver.recv().await
	}

	pub fn try_recv(&mut self) -> Option<Arc<PublishedEvent>> {
		self.receiver.try_recv().ok()
	}
}

/// Subscriber registry plus non-blocking fan-out
#[derive(Debug, Default)]
pub struct EventPublisher {
	subscribers: RwLock<HashMap<SubscriberId, EventSender>>,
	next_id: AtomicU64,
	closed: AtomicBool,
}

impl EventPublisher {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a queue subscriber
	pub async fn subscribe(&self) -> Result<Subscription, PublisherError> {
		let (sender, receiver) = mpsc::unbounded_channel();
		let id = self.register(sender).await?;
		Ok(Subscription { id, receiver })
	}

	/// Registers a callback subscriber.
	///
	/// The callback runs on its own task, so a slow callback only delays its own
	/// events.
	pub async fn subscribe_fn<F>(&self, callback: F) -> Result<SubscriberId, PublisherError>
	where
		F: Fn(Arc<PublishedEvent>) + Send + 'static,
	{
		let mut subscription = self.subscribe().await?;
		let id = subscription.id;
		tokio::spawn(async move {
			while let Some(event) = subscription.recv().await {
				callback(event);
			}
			debug!(subscriber = id, "Callback subscriber finished");
		});
		Ok(id)
	}

	pub async fn unsubscribe(&self, id: SubscriberId) -> Result<(), PublisherError> {
		let mut subscribers = self.subscribers.write().await;
		subscribers
			.remove(&id)
			.ok_or(PublisherError::UnknownSubscriber(id))?;
		SUBSCRIBERS.set(subscribers.len() as i64);
		Ok(())
	}

	/// Delivers `event` to every live subscriber and returns how many received it.
	///
	/// Subscribers whose receiving end is gone are pruned.
	pub async fn publish(&self, event: PublishedEvent) -> Result<usize, PublisherError> {
		if self.closed.load(Ordering::Acquire) {
			return Err(PublisherError::Closed);
		}
		let event = Arc::new(event);

		let mut delivered = 0;
		let mut dead = Vec::new();
		{
			let subscribers = self.subscribers.read().await;
			for (id, sender) in subscribers.iter() {
				if sender.send(event.clone()).is_ok() {
					delivered += 1;
				} else {
					dead.push(*id);
				}
			}
		}

		if !dead.is_empty() {
			let mut subscribers = self.subscribers.write().await;
			for id in dead {
				subscribers.remove(&id);
				debug!(subscriber = id, "Pruned closed subscriber");
			}
			SUBSCRIBERS.set(subscribers.len() as i64);
		}

		Ok(delivered)
	}

	pub async fn subscriber_count(&self) -> usize {
		self.subscribers.read().await.len()
	}

	/// Rejects further subscriptions and publishes and ends every subscription
	pub async fn close(&self) {
		self.closed.store(true, Ordering::Release);
		self.subscribers.write().await.clear();
		SUBSCRIBERS.set(0);
	}

	async fn register(&self, sender: EventSender) -> Result<SubscriberId, PublisherError> {
		if self.closed.load(Ordering::Acquire) {
			return Err(PublisherError::Closed);
		}
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		let mut subscribers = self.subscribers.write().await;
		subscribers.insert(id, sender);
		SUBSCRIBERS.set(subscribers.len() as i64);
		Ok(id)
	}
}
