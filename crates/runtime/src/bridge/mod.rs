//! The bridge object: both channels, the async queue and the correlation table.
//!
//! Method calls go through [`Bridge::call_async`], which enqueues the request and returns a
//! [`PendingCall`] immediately. A drain task spawned on the runtime handle writes one request,
//! reads exactly one reply line, settles the matching continuation and only then writes the
//! next request. Field access and schema discovery use the blocking [`SyncChannel`] and bypass
//! the queue.

mod correlation;
mod queue;

use std::sync::Arc;

use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};
use wvb_protocol::{BindingSchema, Reply, Request, ScriptValue};

pub use correlation::{Continuation, CorrelationTable};
pub use queue::{AsyncQueue, PendingRequest, Ticket};

use crate::config::BridgeConfig;
use crate::context::{ContextId, ResetScope};
use crate::counter::CallCounter;
use crate::decoder::{self, Outcome};
use crate::error::{Error, Result};
use crate::pending::PendingCall;
use crate::sync_channel::SyncChannel;
use crate::transport::{AsyncConnection, ChannelRole, ensure_async};

/// What a context reset discarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetSummary {
	/// Correlation entries dropped without settling.
	pub correlations: usize,
	/// Queued requests dropped before being written.
	pub queued: usize,
	/// Whether the in-flight slot was released.
	pub in_flight_cleared: bool,
}

/// Process-wide bridge to one backend socket. Construct once and share the `Arc`.
pub struct Bridge {
	config: BridgeConfig,
	counter: CallCounter,
	sync: SyncChannel,
	async_link: AsyncMutex<Option<AsyncConnection>>,
	queue: AsyncQueue,
	correlation: CorrelationTable,
	runtime: Handle,
}

impl Bridge {
	/// Creates a bridge whose drain tasks run on `runtime`. No connection is opened yet.
	pub fn new(config: BridgeConfig, runtime: Handle) -> Arc<Self> {
		Arc::new(Self {
			sync: SyncChannel::new(config.socket_path.clone()),
			config,
			counter: CallCounter::new(),
			async_link: AsyncMutex::new(None),
			queue: AsyncQueue::new(),
			correlation: CorrelationTable::new(),
			runtime,
		})
	}

	pub fn config(&self) -> &BridgeConfig {
		&self.config
	}

	pub fn sync_channel(&self) -> &SyncChannel {
		&self.sync
	}

	/// Allocates the next call id.
	pub fn next_call_id(&self) -> String {
		self.counter.next_id()
	}

	/// Performs one blocking exchange and returns the raw reply line.
	pub fn call_sync(&self, request: &Request) -> Result<String> {
		self.sync.call(request)
	}

	/// Reads a field of the backend's bound struct. Every call is a fresh round trip.
	pub fn get_field(&self, name: &str) -> Result<ScriptValue> {
		let request = Request::get_field(self.next_call_id(), name);
		decoder::into_result(self.sync.call_reply(&request)?)
	}

	/// Writes a field of the backend's bound struct.
	///
	/// The reply is discarded. Failures, whether a transport error or an `error` reply, are
	/// logged and never reach the caller.
	pub fn set_field(&self, name: &str, value: Value) {
		let request = Request::set_field(self.next_call_id(), name, value);
		match self.sync.call_reply(&request) {
			Ok(Reply::Result(_)) => {}
			Ok(Reply::Error(message)) => {
				warn!(target: "wvb.decoder", call_id = %request.id, field = %name, error = %message, "field write rejected");
			}
			Err(err) => {
				warn!(target: "wvb.transport", channel = "sync", call_id = %request.id, field = %name, error = %err, "field write dropped");
			}
		}
	}

	/// Fetches the binding schema with the fixed schema call id.
	pub fn fetch_schema(&self, reserved_key: &str) -> Result<BindingSchema> {
		let reply = self.sync.call_reply(&Request::get_bindings())?;
		let value = match reply {
			Reply::Result(value) => value,
			Reply::Error(message) => return Err(Error::Remote(message)),
		};
		let schema = BindingSchema::from_value(value, reserved_key)?;
		debug!(
			target: "wvb.bindings",
			namespaces = schema.namespaces.len(),
			reserved = schema.reserved.len(),
			"fetched schema"
		);
		Ok(schema)
	}

	/// Queues a method call on behalf of `context` and returns without blocking.
	pub fn call_async(self: &Arc<Self>, context: ContextId, method: impl Into<String>, params: Vec<Value>) -> PendingCall {
		let call_id = self.next_call_id();
		let request = Request::call(call_id.clone(), method, params);
		let (continuation, pending) = Continuation::pair(context, call_id);

		let line = match request.to_line() {
			Ok(line) => line,
			Err(err) => {
				continuation.reject(err.into());
				return pending;
			}
		};

		debug!(target: "wvb.queue", call_id = %request.id, method = %request.method, %context, "enqueued");
		if self.queue.push(PendingRequest { line, continuation }) {
			self.start_next();
		}
		pending
	}

	/// Discards async state owned by `scope` without settling it.
	///
	/// Must run before bindings are reinstalled for a new context.
	pub fn on_context_reset(&self, scope: ResetScope) -> ResetSummary {
		let in_flight_call = self.queue.in_flight_call();
		let (queued, in_flight_cleared) = self.queue.discard(scope);
		let abandoned = in_flight_call.filter(|_| in_flight_cleared);
		let correlations = self.correlation.discard(scope);
		let summary = ResetSummary {
			correlations,
			queued,
			in_flight_cleared,
		};
		info!(
			target: "wvb.lifecycle",
			?scope,
			correlations,
			queued,
			in_flight_cleared,
			abandoned = ?abandoned,
			"context reset"
		);
		summary
	}

	pub fn in_flight(&self) -> bool {
		self.queue.is_in_flight()
	}

	pub fn queued(&self) -> usize {
		self.queue.len()
	}

	pub fn pending_correlations(&self) -> usize {
		self.correlation.len()
	}

	fn start_next(self: &Arc<Self>) {
		let bridge = Arc::clone(self);
		self.runtime.spawn(async move { bridge.drain().await });
	}

	async fn drain(self: Arc<Self>) {
		while let Some((request, ticket)) = self.queue.begin_next() {
			self.dispatch(request, ticket).await;
			if !self.queue.finish(ticket) {
				debug!(target: "wvb.queue", "slot released by a reset, leaving drain");
				return;
			}
		}
	}

	/// Runs one exchange unless a reset abandons it first.
	///
	/// An abandoned exchange drops the async connection, so the next generation reconnects and
	/// never reads a reply meant for a discarded call.
	async fn dispatch(&self, request: PendingRequest, ticket: Ticket) {
		let call_id = request.continuation.call_id().to_string();
		let mut link = self.async_link.lock().await;

		let abandoned = tokio::select! {
			biased;
			_ = self.queue.abandoned(ticket) => true,
			_ = self.exchange(&mut link, request) => false,
		};
		if abandoned {
			*link = None;
			// registered after the reset swept the table
			drop(self.correlation.take(&call_id));
			debug!(target: "wvb.queue", call_id = %call_id, "exchange abandoned by a context reset");
		}
	}

	/// Writes one request and settles it from exactly one reply line.
	async fn exchange(&self, link: &mut Option<AsyncConnection>, request: PendingRequest) {
		let PendingRequest { line, continuation } = request;
		let call_id = continuation.call_id().to_string();

		let conn = match ensure_async(link, &self.config.socket_path).await {
			Ok(conn) => conn,
			Err(err) => {
				debug!(target: "wvb.queue", call_id = %call_id, error = %err, "rejecting, endpoint unreachable");
				continuation.reject(err);
				return;
			}
		};

		// registered before the write so a reset during the exchange drops it
		self.correlation.insert(continuation);

		if let Err(err) = conn.write_frame(line.as_bytes()).await {
			*link = None;
			warn!(target: "wvb.transport", channel = "async", call_id = %call_id, error = %err, "write failed");
			self.reject(&call_id, Error::transport(ChannelRole::Async, err));
			return;
		}

		let read = match self.config.call_timeout {
			Some(after) => match tokio::time::timeout(after, conn.read_frame()).await {
				Ok(read) => read,
				Err(_) => {
					*link = None;
					warn!(target: "wvb.transport", channel = "async", call_id = %call_id, ?after, "reply timed out");
					self.reject(&call_id, Error::Timeout { call_id: call_id.clone(), after });
					return;
				}
			},
			None => conn.read_frame().await,
		};

		let reply = match read {
			Ok(reply) => reply,
			Err(err) => {
				*link = None;
				warn!(target: "wvb.transport", channel = "async", call_id = %call_id, error = %err, "read failed");
				self.reject(&call_id, Error::transport(ChannelRole::Async, err));
				return;
			}
		};

		if decoder::settle(&reply, &call_id, &self.correlation) == Outcome::Violation {
			debug!(target: "wvb.queue", call_id = %call_id, "advancing past unsettled call");
		}
	}

	fn reject(&self, call_id: &str, err: Error) {
		if let Some(continuation) = self.correlation.take(call_id) {
			continuation.reject(err);
		}
	}
}

impl std::fmt::Debug for Bridge {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Bridge")
			.field("socket_path", &self.config.socket_path)
			.field("in_flight", &self.in_flight())
			.field("queued", &self.queued())
			.field("pending_correlations", &self.pending_correlations())
			.finish()
	}
}

#[cfg(test)]
mod tests;
