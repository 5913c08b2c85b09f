//! Runtime configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Rendezvous socket the backend listens on.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/strux-ipc.sock";

/// Overrides [`BridgeConfig::socket_path`].
pub const SOCKET_ENV: &str = "WVB_SOCKET";
/// Overrides [`BridgeConfig::call_timeout`], in milliseconds.
pub const CALL_TIMEOUT_ENV: &str = "WVB_CALL_TIMEOUT_MS";

/// Bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
	/// Unix socket shared by both channels.
	pub socket_path: PathBuf,
	/// Upper bound on waiting for an async reply. `None` waits forever.
	#[serde(rename = "call_timeout_ms", with = "millis")]
	pub call_timeout: Option<Duration>,
}

impl Default for BridgeConfig {
	fn default() -> Self {
		Self {
			socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
			call_timeout: None,
		}
	}
}

impl BridgeConfig {
	pub fn new(socket_path: impl Into<PathBuf>) -> Self {
		Self {
			socket_path: socket_path.into(),
			..Self::default()
		}
	}

	pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
		self.call_timeout = Some(timeout);
		self
	}

	/// Defaults overlaid with `WVB_SOCKET` and `WVB_CALL_TIMEOUT_MS`.
	pub fn from_env() -> Result<Self> {
		Self::from_vars(|key| std::env::var(key).ok())
	}

	fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
		let mut config = Self::default();
		if let Some(path) = var(SOCKET_ENV).filter(|p| !p.is_empty()) {
			config.socket_path = PathBuf::from(path);
		}
		if let Some(raw) = var(CALL_TIMEOUT_ENV) {
			let ms: u64 = raw
				.trim()
				.parse()
				.map_err(|_| Error::InvalidConfig(format!("{CALL_TIMEOUT_ENV}={raw:?} is not a number of milliseconds")))?;
			config.call_timeout = (ms > 0).then(|| Duration::from_millis(ms));
		}
		Ok(config)
	}
}

mod millis {
	use std::time::Duration;

	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
		match value {
			Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
			None => serializer.serialize_none(),
		}
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
		Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
	}
}
