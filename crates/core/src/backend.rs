//! The capability surface generated objects need from the bridge.

use std::sync::Arc;

use serde_json::Value;
use wvb_protocol::{BindingSchema, ScriptValue};
use wvb_runtime::{Bridge, ContextId, PendingCall, ResetScope, ResetSummary};

/// Remote operations behind stubs and field accessors.
///
/// Implemented for `Arc<Bridge>`; tests substitute an in-memory backend.
pub trait RemoteBackend: Send + Sync {
	/// Queues a method call and returns without blocking.
	fn call(&self, context: ContextId, method: &str, params: Vec<Value>) -> PendingCall;

	/// Blocking `__getField` round trip.
	fn get_field(&self, name: &str) -> wvb_runtime::Result<ScriptValue>;

	/// Blocking `__setField` round trip. The reply is discarded and failures are only logged.
	fn set_field(&self, name: &str, value: Value);

	/// Blocking schema fetch.
	fn fetch_schema(&self, reserved_key: &str) -> wvb_runtime::Result<BindingSchema>;

	/// Drops async state owned by `scope` without settling it.
	fn reset_context(&self, scope: ResetScope) -> ResetSummary;
}

impl RemoteBackend for Arc<Bridge> {
	fn call(&self, context: ContextId, method: &str, params: Vec<Value>) -> PendingCall {
		self.call_async(context, method, params)
	}

	fn get_field(&self, name: &str) -> wvb_runtime::Result<ScriptValue> {
		Bridge::get_field(self, name)
	}

	fn set_field(&self, name: &str, value: Value) {
		Bridge::set_field(self, name, value)
	}

	fn fetch_schema(&self, reserved_key: &str) -> wvb_runtime::Result<BindingSchema> {
		Bridge::fetch_schema(self, reserved_key)
	}

	fn reset_context(&self, scope: ResetScope) -> ResetSummary {
		self.on_context_reset(scope)
	}
}
