//! Console and uncaught-error forwarding from a scripting context to `tracing`.
//!
//! Everything here is observational: forwarding never fails and never feeds back into the
//! bridge.

use std::fmt::Write as _;

use tracing::{error, info, warn};
use wvb_protocol::ScriptValue;
use wvb_runtime::ContextId;

/// Details of an uncaught script error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptError {
	pub message: String,
	pub source: String,
	pub line: u32,
	pub column: u32,
	pub stack: Option<String>,
}

/// Forwards `console.*` output of one context to the `wvb.js` target.
#[derive(Debug, Clone, Copy)]
pub struct Console {
	context: ContextId,
}

impl Console {
	pub fn new(context: ContextId) -> Self {
		Self { context }
	}

	pub fn log(&self, args: &[ScriptValue]) {
		info!(target: "wvb.js", context = %self.context, "{}", join_args(args));
	}

	pub fn warn(&self, args: &[ScriptValue]) {
		warn!(target: "wvb.js", context = %self.context, "{}", join_args(args));
	}

	pub fn error(&self, args: &[ScriptValue]) {
		error!(target: "wvb.js", context = %self.context, "{}", join_args(args));
	}

	pub fn uncaught_error(&self, err: &ScriptError) {
		let at = format!("{}:{}:{}", err.source, err.line, err.column);
		match err.stack.as_deref().filter(|s| !s.is_empty()) {
			Some(stack) => {
				error!(target: "wvb.js", context = %self.context, %at, stack, "Uncaught Error: {}", err.message)
			}
			None => error!(target: "wvb.js", context = %self.context, %at, "Uncaught Error: {}", err.message),
		}
	}

	pub fn unhandled_rejection(&self, reason: &ScriptValue) {
		error!(target: "wvb.js", context = %self.context, "Unhandled Promise Rejection: {}", rejection_reason(reason));
	}
}

/// Renders console arguments the way a browser console joins them.
pub fn join_args(args: &[ScriptValue]) -> String {
	let mut line = String::new();
	for (i, arg) in args.iter().enumerate() {
		if i > 0 {
			line.push(' ');
		}
		write_arg(&mut line, arg);
	}
	line
}

fn write_arg(out: &mut String, value: &ScriptValue) {
	match value {
		ScriptValue::String(s) => out.push_str(s),
		ScriptValue::Undefined => out.push_str("undefined"),
		ScriptValue::Null => out.push_str("null"),
		ScriptValue::Bool(b) => {
			let _ = write!(out, "{b}");
		}
		ScriptValue::Number(n) => write_number(out, *n),
		ScriptValue::Array(_) | ScriptValue::Object(_) => {
			let _ = write!(out, "{}", value.to_json());
		}
	}
}

fn write_number(out: &mut String, n: f64) {
	if n.is_nan() {
		out.push_str("NaN");
	} else if n.is_infinite() {
		out.push_str(if n > 0.0 { "Infinity" } else { "-Infinity" });
	} else if n.fract() == 0.0 && n.abs() < 1e21 {
		let _ = write!(out, "{n:.0}");
	} else {
		let _ = write!(out, "{n}");
	}
}

fn rejection_reason(reason: &ScriptValue) -> String {
	match reason {
		ScriptValue::Undefined | ScriptValue::Null => "Unknown rejection reason".to_string(),
		ScriptValue::String(s) if s.is_empty() => "Unknown rejection reason".to_string(),
		other => join_args(std::slice::from_ref(other)),
	}
}
