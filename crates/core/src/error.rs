//! Error types for proxy objects.

use thiserror::Error;
use wvb_protocol::ValueKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	/// A field setter received a value of the wrong kind. No request was sent.
	#[error("TypeError: Cannot assign to field '{field}': expected {expected} but got {observed}")]
	TypeMismatch {
		field: String,
		expected: String,
		observed: ValueKind,
	},

	#[error("No member at '{0}'")]
	UnknownMember(String),

	#[error("'{0}' is not a method")]
	NotCallable(String),

	#[error("'{0}' is not a field")]
	NotAField(String),

	#[error(transparent)]
	Runtime(#[from] wvb_runtime::Error),
}

impl Error {
	pub fn is_type_mismatch(&self) -> bool {
		matches!(self, Error::TypeMismatch { .. })
	}

	/// Returns the underlying runtime error, if any.
	pub fn runtime(&self) -> Option<&wvb_runtime::Error> {
		match self {
			Error::Runtime(err) => Some(err),
			_ => None,
		}
	}
}
