//! Native value type handed to scripting code.
//!
//! [`ScriptValue`] is the structural stand-in for the scripting environment's own values.
//! Replies are converted into it directly from JSON; there is no intermediate re-parse.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Number, Value};

/// A value as seen by scripting code.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScriptValue {
	#[default]
	Undefined,
	Null,
	Bool(bool),
	Number(f64),
	String(String),
	Array(Vec<ScriptValue>),
	Object(BTreeMap<String, ScriptValue>),
}

/// Runtime kind of a [`ScriptValue`], used in type-validation messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
	Undefined,
	Null,
	Boolean,
	Number,
	String,
	Array,
	Object,
}

impl ValueKind {
	pub fn as_str(self) -> &'static str {
		match self {
			ValueKind::Undefined => "undefined",
			ValueKind::Null => "null",
			ValueKind::Boolean => "boolean",
			ValueKind::Number => "number",
			ValueKind::String => "string",
			ValueKind::Array => "array",
			ValueKind::Object => "object",
		}
	}
}

impl fmt::Display for ValueKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl ScriptValue {
	/// Returns the runtime kind of this value.
	pub fn kind(&self) -> ValueKind {
		match self {
			ScriptValue::Undefined => ValueKind::Undefined,
			ScriptValue::Null => ValueKind::Null,
			ScriptValue::Bool(_) => ValueKind::Boolean,
			ScriptValue::Number(_) => ValueKind::Number,
			ScriptValue::String(_) => ValueKind::String,
			ScriptValue::Array(_) => ValueKind::Array,
			ScriptValue::Object(_) => ValueKind::Object,
		}
	}

	/// Converts a reply result into a native value.
	///
	/// Numbers always become `f64`; integers beyond 2^53 lose precision.
	pub fn from_json(value: Value) -> Self {
		match value {
			Value::Null => ScriptValue::Null,
			Value::Bool(b) => ScriptValue::Bool(b),
			Value::Number(n) => n.as_f64().map_or(ScriptValue::Null, ScriptValue::Number),
			Value::String(s) => ScriptValue::String(s),
			Value::Array(items) => {
				ScriptValue::Array(items.into_iter().map(ScriptValue::from_json).collect())
			}
			Value::Object(members) => ScriptValue::Object(
				members
					.into_iter()
					.map(|(k, v)| (k, ScriptValue::from_json(v)))
					.collect(),
			),
		}
	}

	/// Encodes a positional method argument.
	///
	/// Strings, numbers and booleans pass through; everything else becomes `null`.
	pub fn to_param(&self) -> Value {
		match self {
			ScriptValue::String(s) => Value::String(s.clone()),
			ScriptValue::Number(n) => number_to_json(*n),
			ScriptValue::Bool(b) => Value::Bool(*b),
			_ => Value::Null,
		}
	}

	/// Encodes the full structure, mapping `undefined` to `null`.
	pub fn to_json(&self) -> Value {
		match self {
			ScriptValue::Undefined | ScriptValue::Null => Value::Null,
			ScriptValue::Bool(b) => Value::Bool(*b),
			ScriptValue::Number(n) => number_to_json(*n),
			ScriptValue::String(s) => Value::String(s.clone()),
			ScriptValue::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
			ScriptValue::Object(members) => Value::Object(
				members
					.iter()
					.map(|(k, v)| (k.clone(), v.to_json()))
					.collect(),
			),
		}
	}
}

/// Integral doubles are written without a fractional part so typed integer params decode on
/// the backend; non-finite values have no JSON form and become `null`.
fn number_to_json(n: f64) -> Value {
	if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
		return Value::Number(Number::from(n as i64));
	}
	Number::from_f64(n).map_or(Value::Null, Value::Number)
}

impl From<Value> for ScriptValue {
	fn from(value: Value) -> Self {
		ScriptValue::from_json(value)
	}
}

impl From<&str> for ScriptValue {
	fn from(s: &str) -> Self {
		ScriptValue::String(s.to_string())
	}
}

impl From<String> for ScriptValue {
	fn from(s: String) -> Self {
		ScriptValue::String(s)
	}
}

impl From<f64> for ScriptValue {
	fn from(n: f64) -> Self {
		ScriptValue::Number(n)
	}
}

impl From<bool> for ScriptValue {
	fn from(b: bool) -> Self {
		ScriptValue::Bool(b)
	}
}
