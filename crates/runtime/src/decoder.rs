//! Reply decoding: one line in, at most one continuation settled.

use tracing::{debug, warn};
use wvb_protocol::{Reply, ScriptValue};

use crate::bridge::CorrelationTable;
use crate::error::{Error, Result};

/// What happened to a reply line read for `call_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
	/// The success side ran.
	Resolved,
	/// The failure side ran with the backend's message.
	Rejected,
	/// No entry for this call id; a reset dropped it.
	Stale,
	/// The line was not a valid reply. Any matching entry stays unsettled.
	Violation,
}

/// Converts a decoded reply into the value or error handed to a caller.
pub fn into_result(reply: Reply) -> Result<ScriptValue> {
	match reply {
		Reply::Result(value) => Ok(ScriptValue::from_json(value)),
		Reply::Error(message) => Err(Error::Remote(message)),
	}
}

/// Decodes `line` and settles the continuation registered for `call_id`.
///
/// The call id comes from the dispatch that read the line, not from the line itself.
pub fn settle(line: &[u8], call_id: &str, table: &CorrelationTable) -> Outcome {
	let reply = match Reply::parse(line) {
		Ok(reply) => reply,
		Err(err) => {
			warn!(
				target: "wvb.decoder",
				call_id,
				error = %err,
				line = %String::from_utf8_lossy(line),
				"protocol violation, continuation left unsettled"
			);
			return Outcome::Violation;
		}
	};

	let Some(continuation) = table.take(call_id) else {
		debug!(target: "wvb.decoder", call_id, "dropping stale reply");
		return Outcome::Stale;
	};

	match into_result(reply) {
		Ok(value) => {
			continuation.resolve(value);
			Outcome::Resolved
		}
		Err(err) => {
			debug!(target: "wvb.decoder", call_id, error = %err, "remote error");
			continuation.reject(err);
			Outcome::Rejected
		}
	}
}
