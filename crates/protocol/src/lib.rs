//! Wire types for the webview bridge.
//!
//! Every message on either channel is one line of UTF-8 JSON terminated by `\n`.
//!
//! - [`envelope`] - request and reply envelopes plus the reserved method names
//! - [`schema`] - the binding schema returned by `__getBindings`
//! - [`value`] - [`ScriptValue`], the native value type exposed to scripting code

pub mod envelope;
pub mod schema;
pub mod value;

pub use envelope::{
	BINDINGS_CALL_ID, GET_BINDINGS, GET_FIELD, ProtocolError, Reply, Request, SET_FIELD,
};
pub use schema::{
	BindingSchema, DEFAULT_RESERVED_NAMESPACE, FieldSchema, MethodSchema, ReservedNamespaceSchema,
	StructSchema, TypeFamily,
};
pub use value::{ScriptValue, ValueKind};
