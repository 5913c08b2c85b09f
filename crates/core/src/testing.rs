//! In-memory [`RemoteBackend`] for exercising generated objects without a socket.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde_json::Value;
use wvb_protocol::{BindingSchema, GET_BINDINGS, GET_FIELD, SET_FIELD, ScriptValue};
use wvb_runtime::bridge::Continuation;
use wvb_runtime::{CallCounter, ContextId, Error, PendingCall, ResetScope, ResetSummary};

use crate::backend::RemoteBackend;

type CallHandler = dyn Fn(&str, &[Value]) -> wvb_runtime::Result<ScriptValue> + Send + Sync;

/// Records every request and answers from in-memory state.
///
/// Method calls resolve immediately with the method name unless a handler is set with
/// [`on_call`](Self::on_call) or calls are held with [`hold_calls`](Self::hold_calls).
pub struct FakeBackend {
	counter: CallCounter,
	schema: Mutex<Result<Value, String>>,
	fields: Mutex<BTreeMap<String, ScriptValue>>,
	requests: Mutex<Vec<(String, Vec<Value>)>>,
	resets: Mutex<Vec<ResetScope>>,
	handler: Mutex<Option<Arc<CallHandler>>>,
	hold: AtomicBool,
	held: Mutex<Vec<Continuation>>,
}

impl FakeBackend {
	pub fn new() -> Arc<Self> {
		Self::with_schema(Value::Object(Default::default()))
	}

	pub fn with_schema(schema: Value) -> Arc<Self> {
		Arc::new(Self {
			counter: CallCounter::new(),
			schema: Mutex::new(Ok(schema)),
			fields: Mutex::new(BTreeMap::new()),
			requests: Mutex::new(Vec::new()),
			resets: Mutex::new(Vec::new()),
			handler: Mutex::new(None),
			hold: AtomicBool::new(false),
			held: Mutex::new(Vec::new()),
		})
	}

	/// Makes the next schema fetches fail with a remote error.
	pub fn fail_schema(&self, message: &str) {
		*self.schema.lock() = Err(message.to_string());
	}

	pub fn put_field(&self, name: &str, value: ScriptValue) {
		self.fields.lock().insert(name.to_string(), value);
	}

	pub fn field(&self, name: &str) -> Option<ScriptValue> {
		self.fields.lock().get(name).cloned()
	}

	pub fn on_call<F>(&self, handler: F)
	where
		F: Fn(&str, &[Value]) -> wvb_runtime::Result<ScriptValue> + Send + Sync + 'static,
	{
		*self.handler.lock() = Some(Arc::new(handler));
	}

	/// Leaves method calls unsettled until a reset drops them.
	pub fn hold_calls(&self) {
		self.hold.store(true, Ordering::SeqCst);
	}

	/// `(method, params)` of every request, in order.
	pub fn requests(&self) -> Vec<(String, Vec<Value>)> {
		self.requests.lock().clone()
	}

	pub fn methods(&self) -> Vec<String> {
		self.requests.lock().iter().map(|(m, _)| m.clone()).collect()
	}

	pub fn resets(&self) -> Vec<ResetScope> {
		self.resets.lock().clone()
	}

	fn record(&self, method: &str, params: Vec<Value>) {
		self.requests.lock().push((method.to_string(), params));
	}
}

impl RemoteBackend for FakeBackend {
	fn call(&self, context: ContextId, method: &str, params: Vec<Value>) -> PendingCall {
		self.record(method, params.clone());
		let (continuation, pending) = Continuation::pair(context, self.counter.next_id());

		if self.hold.load(Ordering::SeqCst) {
			self.held.lock().push(continuation);
			return pending;
		}

		let handler = self.handler.lock().clone();
		match handler {
			Some(handler) => match handler(method, &params) {
				Ok(value) => continuation.resolve(value),
				Err(err) => continuation.reject(err),
			},
			None => continuation.resolve(ScriptValue::from(method)),
		}
		pending
	}

	fn get_field(&self, name: &str) -> wvb_runtime::Result<ScriptValue> {
		self.record(GET_FIELD, vec![Value::from(name)]);
		self.field(name)
			.ok_or_else(|| Error::Remote(format!("unknown field '{name}'")))
	}

	fn set_field(&self, name: &str, value: Value) {
		self.record(SET_FIELD, vec![Value::from(name), value.clone()]);
		self.put_field(name, ScriptValue::from_json(value));
	}

	fn fetch_schema(&self, reserved_key: &str) -> wvb_runtime::Result<BindingSchema> {
		self.record(GET_BINDINGS, Vec::new());
		match &*self.schema.lock() {
			Ok(value) => Ok(BindingSchema::from_value(value.clone(), reserved_key)?),
			Err(message) => Err(Error::Remote(message.clone())),
		}
	}

	fn reset_context(&self, scope: ResetScope) -> ResetSummary {
		self.resets.lock().push(scope);
		let mut held = self.held.lock();
		let before = held.len();
		held.retain(|c| !scope.covers(c.context()));
		ResetSummary {
			correlations: before - held.len(),
			..ResetSummary::default()
		}
	}
}
