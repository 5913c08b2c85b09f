//! Rendering of settled values and generated object trees.

use std::io::Write;

use colored::Colorize;
use serde_json::{Map, Value, json};
use wvb::{Member, ProxyObject, ScriptValue};

use crate::error::Result;

/// Prints a value as pretty JSON. `undefined` prints as `null`.
pub fn print_value(out: &mut dyn Write, value: &ScriptValue) -> Result<()> {
	writeln!(out, "{}", serde_json::to_string_pretty(&value.to_json())?)?;
	Ok(())
}

/// Prints the generated tree, one member per line, indented by depth.
pub fn print_tree(out: &mut dyn Write, root: &ProxyObject) -> Result<()> {
	write_level(out, root, 0)
}

fn write_level(out: &mut dyn Write, object: &ProxyObject, depth: usize) -> Result<()> {
	let indent = "  ".repeat(depth);
	for (name, member) in object.members() {
		match member {
			Member::Object(child) => {
				writeln!(out, "{indent}{}", name.bold())?;
				write_level(out, child, depth + 1)?;
			}
			Member::Method(stub) => {
				let params = stub.schema().param_types.join(", ");
				writeln!(out, "{indent}{}({params})  {}", name.cyan(), stub.remote_name().dimmed())?;
			}
			Member::Field(field) => {
				writeln!(out, "{indent}{}: {}", name.green(), field.declared_type())?;
			}
		}
	}
	Ok(())
}

/// JSON description of the generated tree.
pub fn tree_json(object: &ProxyObject) -> Value {
	let mut map = Map::new();
	for (name, member) in object.members() {
		let node = match member {
			Member::Object(child) => tree_json(child),
			Member::Method(stub) => json!({
				"kind": "method",
				"remote": stub.remote_name(),
				"paramCount": stub.schema().param_count,
				"paramTypes": stub.schema().param_types,
			}),
			Member::Field(field) => json!({
				"kind": "field",
				"type": field.declared_type(),
			}),
		};
		map.insert(name.to_string(), node);
	}
	Value::Object(map)
}
