//! Scripting context identity.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one scripting context (one page load).
///
/// Every continuation is tagged with the context that created it so a reset can discard
/// exactly the state that context owned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl ContextId {
	/// Returns a new process-unique context id.
	pub fn next() -> Self {
		Self(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
	}

	pub fn get(self) -> u64 {
		self.0
	}
}

impl fmt::Display for ContextId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "ctx-{}", self.0)
	}
}

/// Which async state a context reset discards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetScope {
	/// Everything: all correlations, all queued requests, the in-flight slot.
	All,
	/// Only state owned by one context.
	Context(ContextId),
}

impl ResetScope {
	pub fn covers(self, context: ContextId) -> bool {
		match self {
			ResetScope::All => true,
			ResetScope::Context(id) => id == context,
		}
	}
}
