//! Error types for the bridge runtime.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::transport::ChannelRole;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the backend.
#[derive(Debug, Error)]
pub enum Error {
	/// The backend socket could not be reached.
	#[error("Failed to connect {channel} channel to {}: {source}", path.display())]
	ConnectionFailed {
		channel: ChannelRole,
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// A write or read on an established connection failed.
	#[error("Transport error on {channel} channel: {message}")]
	Transport { channel: ChannelRole, message: String },

	/// The backend answered with an `error` member. Carries the message verbatim.
	#[error("{0}")]
	Remote(String),

	/// The backend answered with something that is not a valid reply.
	#[error("Protocol error: {0}")]
	Protocol(String),

	/// The continuation was dropped by a context reset before it settled.
	#[error("Call {call_id} was discarded by a context reset")]
	Discarded { call_id: String },

	/// No reply arrived within the configured call timeout.
	#[error("Call {call_id} timed out after {}ms", after.as_millis())]
	Timeout { call_id: String, after: Duration },

	/// Invalid configuration value.
	#[error("Invalid configuration: {0}")]
	InvalidConfig(String),

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	pub(crate) fn transport(channel: ChannelRole, err: impl std::fmt::Display) -> Self {
		Error::Transport {
			channel,
			message: err.to_string(),
		}
	}

	/// Returns the backend's message if this is a remote error.
	pub fn remote_message(&self) -> Option<&str> {
		match self {
			Error::Remote(message) => Some(message),
			_ => None,
		}
	}

	/// Returns true for connect, write and read failures.
	pub fn is_transport(&self) -> bool {
		matches!(self, Error::ConnectionFailed { .. } | Error::Transport { .. } | Error::Io(_))
	}

	pub fn is_remote(&self) -> bool {
		matches!(self, Error::Remote(_))
	}

	pub fn is_discarded(&self) -> bool {
		matches!(self, Error::Discarded { .. })
	}

	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::Timeout { .. })
	}
}

impl From<wvb_protocol::ProtocolError> for Error {
	fn from(err: wvb_protocol::ProtocolError) -> Self {
		Error::Protocol(err.to_string())
	}
}
