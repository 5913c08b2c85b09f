use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("invalid JSON value '{input}': {source}")]
	InvalidValue {
		input: String,
		#[source]
		source: serde_json::Error,
	},

	/// The call settled with a rejection.
	#[error("{path} rejected: {source}")]
	Rejected {
		path: String,
		#[source]
		source: wvb_runtime::Error,
	},

	#[error(transparent)]
	Bindings(#[from] wvb::Error),

	#[error(transparent)]
	Runtime(#[from] wvb_runtime::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}
