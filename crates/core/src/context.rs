//! One scripting context: its globals and console.

use wvb_protocol::ScriptValue;
use wvb_runtime::{ContextId, PendingCall};

use crate::console::Console;
use crate::error::{Error, Result};
use crate::proxy::{Member, ProxyObject};

/// State of one page load. Dropped when the page goes away.
#[derive(Debug)]
pub struct ScriptContext {
	id: ContextId,
	globals: ProxyObject,
	console: Option<Console>,
}

impl ScriptContext {
	/// Creates an empty context with a new id.
	pub fn new() -> Self {
		Self::with_id(ContextId::next())
	}

	pub fn with_id(id: ContextId) -> Self {
		Self {
			id,
			globals: ProxyObject::new(),
			console: None,
		}
	}

	pub fn id(&self) -> ContextId {
		self.id
	}

	pub fn globals(&self) -> &ProxyObject {
		&self.globals
	}

	pub fn globals_mut(&mut self) -> &mut ProxyObject {
		&mut self.globals
	}

	/// Installs console forwarding for this context.
	pub fn install_console(&mut self) -> Console {
		*self.console.insert(Console::new(self.id))
	}

	/// The console, once installed.
	pub fn console(&self) -> Option<&Console> {
		self.console.as_ref()
	}

	/// Resolves a dotted path such as `go.main.App.Greet`.
	pub fn lookup(&self, path: &str) -> Result<&Member> {
		if path.is_empty() {
			return Err(Error::UnknownMember(path.to_string()));
		}
		self.globals
			.resolve(path.split('.'))
			.ok_or_else(|| Error::UnknownMember(path.to_string()))
	}

	/// Invokes the method at `path`.
	pub fn call(&self, path: &str, args: &[ScriptValue]) -> Result<PendingCall> {
		match self.lookup(path)? {
			Member::Method(stub) => Ok(stub.call(args)),
			_ => Err(Error::NotCallable(path.to_string())),
		}
	}

	/// Reads the field at `path`.
	pub fn get(&self, path: &str) -> Result<ScriptValue> {
		match self.lookup(path)? {
			Member::Field(field) => field.get(),
			_ => Err(Error::NotAField(path.to_string())),
		}
	}

	/// Assigns the field at `path`.
	pub fn set(&self, path: &str, value: ScriptValue) -> Result<()> {
		match self.lookup(path)? {
			Member::Field(field) => field.set(&value),
			_ => Err(Error::NotAField(path.to_string())),
		}
	}
}

impl Default for ScriptContext {
	fn default() -> Self {
		Self::new()
	}
}
