//! Typed getter/setter pairs for backend struct fields.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use wvb_protocol::{FieldSchema, ScriptValue, TypeFamily, ValueKind};

use crate::backend::RemoteBackend;
use crate::error::{Error, Result};

/// Accessor pair for one field. Reads are never cached.
#[derive(Clone)]
pub struct FieldAccessor {
	name: String,
	declared: String,
	family: TypeFamily,
	backend: Arc<dyn RemoteBackend>,
}

impl FieldAccessor {
	pub fn new(schema: &FieldSchema, backend: Arc<dyn RemoteBackend>) -> Self {
		Self {
			name: schema.name.clone(),
			declared: schema.type_tag.clone(),
			family: schema.family(),
			backend,
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Type tag as declared by the backend, e.g. `int32`.
	pub fn declared_type(&self) -> &str {
		&self.declared
	}

	pub fn family(&self) -> TypeFamily {
		self.family
	}

	/// Reads the current value with a fresh sync round trip.
	pub fn get(&self) -> Result<ScriptValue> {
		Ok(self.backend.get_field(&self.name)?)
	}

	/// Validates `value` against the declared type, then writes it.
	///
	/// A mismatch fails before anything is sent and is the only error a write reports; the
	/// backend's reply is discarded.
	pub fn set(&self, value: &ScriptValue) -> Result<()> {
		self.check(value)?;
		debug!(target: "wvb.bindings", field = %self.name, kind = %value.kind(), "set field");
		self.backend.set_field(&self.name, encode(value));
		Ok(())
	}

	/// Checks that `value` may be assigned to this field.
	pub fn check(&self, value: &ScriptValue) -> Result<()> {
		if accepts(self.family, value.kind()) {
			return Ok(());
		}
		Err(Error::TypeMismatch {
			field: self.name.clone(),
			expected: self.declared.clone(),
			observed: value.kind(),
		})
	}
}

impl fmt::Debug for FieldAccessor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FieldAccessor")
			.field("name", &self.name)
			.field("declared", &self.declared)
			.finish()
	}
}

fn accepts(family: TypeFamily, kind: ValueKind) -> bool {
	match family {
		TypeFamily::String => kind == ValueKind::String,
		TypeFamily::Bool => kind == ValueKind::Boolean,
		TypeFamily::Other => matches!(kind, ValueKind::Object | ValueKind::Array),
		numeric => numeric.is_numeric() && kind == ValueKind::Number,
	}
}

// scalars go through the same encoding as method arguments; structures are kept whole
fn encode(value: &ScriptValue) -> Value {
	match value {
		ScriptValue::Array(_) | ScriptValue::Object(_) => value.to_json(),
		_ => value.to_param(),
	}
}
