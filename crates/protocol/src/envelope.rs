//! Request and reply envelopes.
//!
//! Requests carry a decimal-string id, a method name and positional params:
//!
//! ```text
//! {"id": "7", "method": "main.App.Greet", "params": ["world"]}
//! {"id": "0", "method": "__getBindings", "params": null}
//! ```
//!
//! Replies carry exactly one of `result` or `error`. The id is not echoed back in a way the
//! client relies on; correlation comes from the channel discipline (one reply per request).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Reads one field of the backend's bound struct.
pub const GET_FIELD: &str = "__getField";
/// Writes one field of the backend's bound struct.
pub const SET_FIELD: &str = "__setField";
/// Fetches the binding schema.
pub const GET_BINDINGS: &str = "__getBindings";
/// Fixed call id used for the schema fetch. Never produced by the call counter.
pub const BINDINGS_CALL_ID: &str = "0";

/// Errors raised while decoding a reply line.
#[derive(Debug, Error)]
pub enum ProtocolError {
	/// The line is not valid JSON.
	#[error("malformed reply: {0}")]
	Malformed(#[from] serde_json::Error),

	/// The line is valid JSON but not an object.
	#[error("reply is not a JSON object")]
	NotAnObject,

	/// The object has neither a `result` nor an `error` member.
	#[error("reply has neither 'result' nor 'error'")]
	MissingMembers,
}

/// Request envelope written to either channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
	/// Decimal call id.
	pub id: String,
	/// Dotted remote name, or one of the reserved `__` methods.
	pub method: String,
	/// Positional parameters; `null` on the wire when absent.
	pub params: Option<Vec<Value>>,
}

impl Request {
	/// Builds a method invocation.
	pub fn call(id: impl Into<String>, method: impl Into<String>, params: Vec<Value>) -> Self {
		Self {
			id: id.into(),
			method: method.into(),
			params: Some(params),
		}
	}

	/// Builds a `__getField [name]` request.
	pub fn get_field(id: impl Into<String>, field: &str) -> Self {
		Self::call(id, GET_FIELD, vec![Value::String(field.to_string())])
	}

	/// Builds a `__setField [name, value]` request.
	pub fn set_field(id: impl Into<String>, field: &str, value: Value) -> Self {
		Self::call(id, SET_FIELD, vec![Value::String(field.to_string()), value])
	}

	/// Builds the fixed-id schema request.
	pub fn get_bindings() -> Self {
		Self {
			id: BINDINGS_CALL_ID.to_string(),
			method: GET_BINDINGS.to_string(),
			params: None,
		}
	}

	/// Serializes the request as one newline-terminated frame.
	///
	/// JSON string escaping guarantees the payload itself holds no raw newline.
	pub fn to_line(&self) -> Result<String, serde_json::Error> {
		let mut line = serde_json::to_string(self)?;
		line.push('\n');
		Ok(line)
	}
}

/// Decoded reply envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
	/// `{"result": ...}`
	Result(Value),
	/// `{"error": "..."}`
	Error(String),
}

impl Reply {
	/// Parses one reply line (without its trailing newline).
	///
	/// `error` wins when both members are present. A `null` error counts as absent.
	pub fn parse(line: &[u8]) -> Result<Self, ProtocolError> {
		let value: Value = serde_json::from_slice(line)?;
		let Value::Object(mut members) = value else {
			return Err(ProtocolError::NotAnObject);
		};

		match members.remove("error") {
			Some(Value::String(message)) => return Ok(Reply::Error(message)),
			Some(Value::Null) | None => {}
			Some(other) => return Ok(Reply::Error(other.to_string())),
		}

		members
			.remove("result")
			.map(Reply::Result)
			.ok_or(ProtocolError::MissingMembers)
	}

	/// Serializes the reply as one newline-terminated frame.
	pub fn to_line(&self) -> String {
		let body = match self {
			Reply::Result(value) => serde_json::json!({ "result": value }),
			Reply::Error(message) => serde_json::json!({ "error": message }),
		};
		format!("{body}\n")
	}
}
