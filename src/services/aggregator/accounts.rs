//! Bounded per-block account activity table.

use std::collections::HashMap;

use crate::models::AccountActivity;

/// Counts sender and receiver appearances within one block.
///
/// Once `capacity` distinct addresses are tracked, new addresses are ignored while
/// known ones keep counting.
#[derive(Debug)]
pub struct ActiveAccounts {
	counts: HashMap<String, u64>,
	capacity: usize,
}

impl ActiveAccounts {
	pub fn new(capacity: usize) -> Self {
		Self {
			counts: HashMap::new(),
			capacity,
		}
	}

	pub fn record(&mut self, address: &str) {
		if address.is_empty() {
			return;
		}
		if let Some(count) = self.counts.get_mut(address) {
			*count += 1;
		} else if self.counts.len() < self.capacity {
			self.counts.insert(address.to_string(), 1);
		}
	}

	pub fn len(&self) -> usize {
		self.counts.len()
	}

	pub fn is_empty(&self) -> bool {
		self.counts.is_empty()
	}

	/// The `limit` most active addresses, ties broken by address
	pub fn top(&self, limit: usize) -> Vec<AccountActivity> {
		let mut ranked: Vec<_> = self.counts.iter().collect();
		ranked.sort_by(|(a_addr, a_count), (b_addr, b_count)| {
			b_count.cmp(a_count).then_with(|| a_addr.cmp(b_addr))
		});
		ranked
			.into_iter()
			.take(limit)
			.map(|(address, count)| AccountActivity {
				address: address.clone(),
				count: *count,
			})
			.collect()
	}
}
