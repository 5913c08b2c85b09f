//! FIFO of unsent async requests plus the single in-flight slot.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::watch;

use super::correlation::Continuation;
use crate::context::{ContextId, ResetScope};

/// A request waiting to be written on the async channel.
#[derive(Debug)]
pub struct PendingRequest {
	/// Serialized frame, newline included.
	pub line: String,
	pub continuation: Continuation,
}

#[derive(Debug, Clone)]
struct InFlight {
	context: ContextId,
	call_id: String,
}

/// Proof that the holder owns the in-flight slot of one queue generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
	generation: u64,
}

#[derive(Debug, Default)]
struct QueueState {
	pending: VecDeque<PendingRequest>,
	in_flight: Option<InFlight>,
	generation: u64,
}

/// Async call queue. The lock is held only to inspect or mutate state, never across I/O.
#[derive(Debug)]
pub struct AsyncQueue {
	state: Mutex<QueueState>,
	/// Latest generation, published whenever a reset releases the in-flight slot.
	resets: watch::Sender<u64>,
}

impl Default for AsyncQueue {
	fn default() -> Self {
		Self::new()
	}
}

impl AsyncQueue {
	pub fn new() -> Self {
		let (resets, _) = watch::channel(0);
		Self {
			state: Mutex::new(QueueState::default()),
			resets,
		}
	}

	/// Appends a request. Returns true when nothing is in flight and a drain should start.
	pub fn push(&self, request: PendingRequest) -> bool {
		let mut state = self.state.lock();
		state.pending.push_back(request);
		state.in_flight.is_none()
	}

	/// Pops the head and marks it in flight.
	///
	/// Returns `None` if a request is already in flight or the queue is empty.
	pub fn begin_next(&self) -> Option<(PendingRequest, Ticket)> {
		let mut state = self.state.lock();
		if state.in_flight.is_some() {
			return None;
		}
		let request = state.pending.pop_front()?;
		state.in_flight = Some(InFlight {
			context: request.continuation.context(),
			call_id: request.continuation.call_id().to_string(),
		});
		Some((request, Ticket { generation: state.generation }))
	}

	/// Releases the in-flight slot held by `ticket`.
	///
	/// Returns false when a reset already released it; the caller must stop draining.
	pub fn finish(&self, ticket: Ticket) -> bool {
		let mut state = self.state.lock();
		if state.generation != ticket.generation {
			return false;
		}
		state.in_flight = None;
		true
	}

	/// Resolves once a reset has released the slot `ticket` was issued for.
	///
	/// Resolves immediately if that already happened.
	pub async fn abandoned(&self, ticket: Ticket) {
		let mut resets = self.resets.subscribe();
		// the sender lives as long as `self`, so this only returns once the generation moved on
		let _ = resets.wait_for(|generation| *generation != ticket.generation).await;
	}

	/// Drops queued requests in `scope` without settling them and releases the in-flight slot
	/// if its owner is in scope.
	///
	/// Returns the number of dropped requests and whether the in-flight slot was released.
	pub fn discard(&self, scope: ResetScope) -> (usize, bool) {
		let mut state = self.state.lock();
		let before = state.pending.len();
		state.pending.retain(|r| !scope.covers(r.continuation.context()));
		let dropped = before - state.pending.len();

		let cleared = match &state.in_flight {
			Some(in_flight) if scope.covers(in_flight.context) => {
				state.in_flight = None;
				state.generation = state.generation.wrapping_add(1);
				self.resets.send_replace(state.generation);
				true
			}
			_ => false,
		};
		(dropped, cleared)
	}

	pub fn is_in_flight(&self) -> bool {
		self.state.lock().in_flight.is_some()
	}

	/// Call id of the request currently in flight.
	pub fn in_flight_call(&self) -> Option<String> {
		self.state.lock().in_flight.as_ref().map(|f| f.call_id.clone())
	}

	/// Number of requests not yet written.
	pub fn len(&self) -> usize {
		self.state.lock().pending.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
