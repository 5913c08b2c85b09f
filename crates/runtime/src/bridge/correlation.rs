//! Call id -> continuation table consulted by the reply reader.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::warn;
use wvb_protocol::ScriptValue;

use crate::context::{ContextId, ResetScope};
use crate::error::{Error, Result};
use crate::pending::PendingCall;

/// Settling side of one async call, tagged with the context that issued it.
#[derive(Debug)]
pub struct Continuation {
	context: ContextId,
	call_id: String,
	tx: oneshot::Sender<Result<ScriptValue>>,
}

impl Continuation {
	/// Creates a continuation and the future its caller waits on.
	pub fn pair(context: ContextId, call_id: String) -> (Self, PendingCall) {
		let (tx, rx) = oneshot::channel();
		let pending = PendingCall::new(context, call_id.clone(), rx);
		(Self { context, call_id, tx }, pending)
	}

	pub fn context(&self) -> ContextId {
		self.context
	}

	pub fn call_id(&self) -> &str {
		&self.call_id
	}

	pub fn resolve(self, value: ScriptValue) {
		// receiver may already be gone; nobody is left to observe the value
		let _ = self.tx.send(Ok(value));
	}

	pub fn reject(self, error: Error) {
		let _ = self.tx.send(Err(error));
	}
}

/// Pending continuations keyed by call id.
#[derive(Debug, Default)]
pub struct CorrelationTable {
	entries: Mutex<HashMap<String, Continuation>>,
}

impl CorrelationTable {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&self, continuation: Continuation) {
		let call_id = continuation.call_id.clone();
		if let Some(previous) = self.entries.lock().insert(call_id, continuation) {
			warn!(target: "wvb.queue", call_id = %previous.call_id, "replaced duplicate correlation entry");
		}
	}

	/// Removes and returns the entry for `call_id`.
	pub fn take(&self, call_id: &str) -> Option<Continuation> {
		self.entries.lock().remove(call_id)
	}

	/// Drops every entry in `scope` without settling it. Returns how many were dropped.
	pub fn discard(&self, scope: ResetScope) -> usize {
		let mut entries = self.entries.lock();
		let before = entries.len();
		match scope {
			ResetScope::All => entries.clear(),
			ResetScope::Context(_) => entries.retain(|_, c| !scope.covers(c.context)),
		}
		before - entries.len()
	}

	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
