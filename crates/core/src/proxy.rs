//! Generated object graph.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use wvb_protocol::{MethodSchema, ScriptValue};
use wvb_runtime::{ContextId, PendingCall};

use crate::backend::RemoteBackend;
use crate::field::FieldAccessor;

/// One property of a [`ProxyObject`].
#[derive(Debug, Clone)]
pub enum Member {
	Object(ProxyObject),
	Method(MethodStub),
	Field(FieldAccessor),
}

impl Member {
	pub fn as_object(&self) -> Option<&ProxyObject> {
		match self {
			Member::Object(object) => Some(object),
			_ => None,
		}
	}

	pub fn as_method(&self) -> Option<&MethodStub> {
		match self {
			Member::Method(stub) => Some(stub),
			_ => None,
		}
	}

	pub fn as_field(&self) -> Option<&FieldAccessor> {
		match self {
			Member::Field(field) => Some(field),
			_ => None,
		}
	}
}

/// A namespace, struct or global object in the generated graph.
#[derive(Debug, Clone, Default)]
pub struct ProxyObject {
	members: BTreeMap<String, Member>,
}

impl ProxyObject {
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets a property, returning the member it replaced.
	pub fn insert(&mut self, name: impl Into<String>, member: Member) -> Option<Member> {
		self.members.insert(name.into(), member)
	}

	/// Builder-style [`insert`](Self::insert).
	pub fn with(mut self, name: impl Into<String>, member: Member) -> Self {
		self.insert(name, member);
		self
	}

	pub fn get(&self, name: &str) -> Option<&Member> {
		self.members.get(name)
	}

	pub fn remove(&mut self, name: &str) -> Option<Member> {
		self.members.remove(name)
	}

	/// Follows `path` through nested objects.
	pub fn resolve<'a, I>(&self, path: I) -> Option<&Member>
	where
		I: IntoIterator<Item = &'a str>,
	{
		let mut segments = path.into_iter();
		let mut member = self.members.get(segments.next()?)?;
		for segment in segments {
			member = member.as_object()?.members.get(segment)?;
		}
		Some(member)
	}

	pub fn members(&self) -> impl Iterator<Item = (&str, &Member)> {
		self.members.iter().map(|(name, member)| (name.as_str(), member))
	}

	pub fn method_names(&self) -> Vec<&str> {
		self.names_where(|m| matches!(m, Member::Method(_)))
	}

	pub fn field_names(&self) -> Vec<&str> {
		self.names_where(|m| matches!(m, Member::Field(_)))
	}

	pub fn object_names(&self) -> Vec<&str> {
		self.names_where(|m| matches!(m, Member::Object(_)))
	}

	fn names_where(&self, pred: impl Fn(&Member) -> bool) -> Vec<&str> {
		self.members
			.iter()
			.filter(|(_, member)| pred(member))
			.map(|(name, _)| name.as_str())
			.collect()
	}

	pub fn len(&self) -> usize {
		self.members.len()
	}

	pub fn is_empty(&self) -> bool {
		self.members.is_empty()
	}
}

/// Variadic callable bound to one remote method.
#[derive(Clone)]
pub struct MethodStub {
	remote_name: String,
	schema: MethodSchema,
	context: ContextId,
	backend: Arc<dyn RemoteBackend>,
}

impl MethodStub {
	pub fn new(remote_name: String, schema: MethodSchema, context: ContextId, backend: Arc<dyn RemoteBackend>) -> Self {
		Self {
			remote_name,
			schema,
			context,
			backend,
		}
	}

	/// Fully qualified name sent as the request method.
	pub fn remote_name(&self) -> &str {
		&self.remote_name
	}

	pub fn schema(&self) -> &MethodSchema {
		&self.schema
	}

	pub fn context(&self) -> ContextId {
		self.context
	}

	/// Queues the call and returns its future immediately.
	///
	/// Strings, numbers and booleans are sent as-is; any other argument is sent as `null`.
	pub fn call(&self, args: &[ScriptValue]) -> PendingCall {
		let params = args.iter().map(ScriptValue::to_param).collect();
		self.backend.call(self.context, &self.remote_name, params)
	}
}

impl fmt::Debug for MethodStub {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MethodStub")
			.field("remote_name", &self.remote_name)
			.field("context", &self.context)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;
	use wvb_protocol::FieldSchema;

	use super::*;
	use crate::testing::FakeBackend;

	#[tokio::test]
	async fn stub_sends_scalars_and_nulls_the_rest() {
		let backend = FakeBackend::new();
		let stub = MethodStub::new(
			"main.App.Save".into(),
			MethodSchema::named("Save"),
			ContextId::next(),
			backend.clone(),
		);

		let args = [
			ScriptValue::from("a"),
			ScriptValue::Number(1.5),
			ScriptValue::Bool(true),
			ScriptValue::Array(vec![ScriptValue::Null]),
			ScriptValue::Undefined,
		];
		stub.call(&args).await.unwrap();

		let (method, params) = backend.requests().pop().unwrap();
		assert_eq!(method, "main.App.Save");
		assert_eq!(params, vec![json!("a"), json!(1.5), json!(true), json!(null), json!(null)]);
	}

	#[test]
	fn resolve_walks_nested_objects() {
		let backend = FakeBackend::new();
		let count = FieldAccessor::new(&FieldSchema::new("Count", "int"), backend.clone());
		let app = ProxyObject::new().with("Count", Member::Field(count));
		let main = ProxyObject::new().with("App", Member::Object(app));
		let root = ProxyObject::new().with("go", Member::Object(ProxyObject::new().with("main", Member::Object(main))));

		assert!(root.resolve(["go", "main", "App", "Count"]).unwrap().as_field().is_some());
		assert!(root.resolve(["go", "main", "Nope"]).is_none());
		assert!(root.resolve(["go", "main", "App", "Count", "deeper"]).is_none());
		assert!(root.resolve(std::iter::empty()).is_none());
	}
}
