//! Process-wide call id counter.

use std::sync::atomic::{AtomicU64, Ordering};

use wvb_protocol::BINDINGS_CALL_ID;

/// Monotonic call id source shared by both channels.
///
/// Ids are rendered as decimal strings. `0` is reserved for the schema fetch, so the counter
/// starts at 1 and skips 0 if it ever wraps.
#[derive(Debug)]
pub struct CallCounter {
	next: AtomicU64,
}

impl Default for CallCounter {
	fn default() -> Self {
		Self::new()
	}
}

impl CallCounter {
	pub fn new() -> Self {
		Self::starting_at(1)
	}

	fn starting_at(first: u64) -> Self {
		Self {
			next: AtomicU64::new(first),
		}
	}

	/// Returns the next call id.
	pub fn next_id(&self) -> String {
		loop {
			// fetch_add wraps on overflow
			let id = self.next.fetch_add(1, Ordering::Relaxed).to_string();
			if id != BINDINGS_CALL_ID {
				return id;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;
	use std::sync::Arc;

	use super::*;

	#[test]
	fn starts_at_one() {
		let counter = CallCounter::new();
		assert_eq!(counter.next_id(), "1");
		assert_eq!(counter.next_id(), "2");
	}

	#[test]
	fn skips_reserved_id_on_wrap() {
		let counter = CallCounter::starting_at(u64::MAX);
		assert_eq!(counter.next_id(), u64::MAX.to_string());
		assert_eq!(counter.next_id(), "1");
	}

	#[test]
	fn concurrent_ids_are_unique() {
		let counter = Arc::new(CallCounter::new());
		let handles: Vec<_> = (0..4)
			.map(|_| {
				let counter = Arc::clone(&counter);
				std::thread::spawn(move || (0..250).map(|_| counter.next_id()).collect::<Vec<_>>())
			})
			.collect();

		let mut seen = HashSet::new();
		for handle in handles {
			for id in handle.join().unwrap() {
				assert!(seen.insert(id));
			}
		}
		assert_eq!(seen.len(), 1000);
	}
}
