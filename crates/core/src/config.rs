//! Where generated objects are installed.

use serde::{Deserialize, Serialize};
use wvb_protocol::DEFAULT_RESERVED_NAMESPACE;

/// Default name of the global object holding application namespaces.
pub const DEFAULT_APP_ROOT: &str = "go";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
	/// Global object that receives one child per application namespace.
	pub app_root: String,
	/// Schema key of the framework namespace, also used as its global object name and as
	/// the prefix of its remote method names.
	pub reserved_namespace: String,
}

impl Default for BindingConfig {
	fn default() -> Self {
		Self {
			app_root: DEFAULT_APP_ROOT.to_string(),
			reserved_namespace: DEFAULT_RESERVED_NAMESPACE.to_string(),
		}
	}
}
