//! Binding schema returned by `__getBindings`.
//!
//! ```text
//! {
//!   "main":  { "App":  { "methods": [{"name": "Greet"}], "fields": [{"name": "Title", "type": "string"}] } },
//!   "strux": { "boot": { "methods": [{"name": "HideSplash"}] } }
//! }
//! ```
//!
//! Every top-level key is an application namespace except the reserved one, whose children are
//! framework sub-namespaces holding methods only.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Schema key (and exposed object name) of the framework namespace.
pub const DEFAULT_RESERVED_NAMESPACE: &str = "strux";

/// One exported method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSchema {
	pub name: String,
	/// Declared parameter count, when the backend reports it.
	#[serde(default, rename = "paramCount", skip_serializing_if = "Option::is_none")]
	pub param_count: Option<usize>,
	/// Declared parameter type tags, when the backend reports them.
	#[serde(default, rename = "paramTypes", skip_serializing_if = "Vec::is_empty")]
	pub param_types: Vec<String>,
}

impl MethodSchema {
	pub fn named(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			param_count: None,
			param_types: Vec::new(),
		}
	}
}

/// One exported field and its declared type tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
	pub name: String,
	#[serde(rename = "type")]
	pub type_tag: String,
}

impl FieldSchema {
	pub fn new(name: impl Into<String>, type_tag: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			type_tag: type_tag.into(),
		}
	}

	pub fn family(&self) -> TypeFamily {
		TypeFamily::from_tag(&self.type_tag)
	}
}

/// Methods and fields of one struct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructSchema {
	#[serde(default)]
	pub methods: Vec<MethodSchema>,
	#[serde(default)]
	pub fields: Vec<FieldSchema>,
}

/// Methods of one reserved sub-namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservedNamespaceSchema {
	#[serde(default)]
	pub methods: Vec<MethodSchema>,
}

/// Type family a field tag belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFamily {
	String,
	Int,
	Uint,
	Float,
	Bool,
	/// Anything else: structs, slices, maps, pointers.
	Other,
}

impl TypeFamily {
	pub fn from_tag(tag: &str) -> Self {
		match tag {
			"string" => TypeFamily::String,
			"int" | "int8" | "int16" | "int32" | "int64" => TypeFamily::Int,
			"uint" | "uint8" | "uint16" | "uint32" | "uint64" => TypeFamily::Uint,
			"float32" | "float64" => TypeFamily::Float,
			"bool" => TypeFamily::Bool,
			_ => TypeFamily::Other,
		}
	}

	pub fn is_numeric(self) -> bool {
		matches!(self, TypeFamily::Int | TypeFamily::Uint | TypeFamily::Float)
	}
}

/// Typed view of the whole schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingSchema {
	/// namespace -> struct -> members
	pub namespaces: BTreeMap<String, BTreeMap<String, StructSchema>>,
	/// reserved sub-namespace -> methods
	pub reserved: BTreeMap<String, ReservedNamespaceSchema>,
}

impl BindingSchema {
	/// Splits a raw `__getBindings` result into application and reserved namespaces.
	pub fn from_value(value: Value, reserved_key: &str) -> Result<Self, serde_json::Error> {
		let Value::Object(entries) = value else {
			return Err(serde_json::Error::custom("binding schema is not a JSON object"));
		};

		let mut schema = BindingSchema::default();
		for (key, node) in entries {
			if key == reserved_key {
				schema.reserved = serde_json::from_value(node)?;
			} else {
				schema.namespaces.insert(key, serde_json::from_value(node)?);
			}
		}
		Ok(schema)
	}

	/// Total number of methods, reserved ones included.
	pub fn method_count(&self) -> usize {
		let app: usize = self
			.namespaces
			.values()
			.flat_map(|structs| structs.values())
			.map(|s| s.methods.len())
			.sum();
		app + self.reserved.values().map(|ns| ns.methods.len()).sum::<usize>()
	}

	pub fn field_count(&self) -> usize {
		self.namespaces
			.values()
			.flat_map(|structs| structs.values())
			.map(|s| s.fields.len())
			.sum()
	}
}
