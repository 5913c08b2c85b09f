//! Page lifecycle hooks.
//!
//! The browser engine calls [`ExtensionHost::on_context_created`] when a page's global object
//! is ready and [`ExtensionHost::on_context_cleared`] right before it is torn down.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};
use wvb_runtime::{ContextId, ResetScope, ResetSummary};

use crate::backend::RemoteBackend;
use crate::bindings::{BindingGenerator, InstallReport};
use crate::config::BindingConfig;
use crate::context::ScriptContext;
use crate::error::Result;

pub struct ExtensionHost {
	backend: Arc<dyn RemoteBackend>,
	generator: BindingGenerator,
	current: Mutex<Option<ContextId>>,
}

impl ExtensionHost {
	pub fn new(backend: Arc<dyn RemoteBackend>, config: BindingConfig) -> Self {
		Self {
			generator: BindingGenerator::new(Arc::clone(&backend), config),
			backend,
			current: Mutex::new(None),
		}
	}

	pub fn generator(&self) -> &BindingGenerator {
		&self.generator
	}

	/// Id of the most recently created context that has not been cleared.
	pub fn current_context(&self) -> Option<ContextId> {
		*self.current.lock()
	}

	/// Creates a context, installs console forwarding, then fetches and installs bindings.
	///
	/// If the schema fetch fails the context is still returned without bindings; the error is
	/// logged.
	pub fn on_context_created(&self) -> ScriptContext {
		let mut context = ScriptContext::new();
		context.install_console();
		*self.current.lock() = Some(context.id());

		if let Err(err) = self.install(&mut context) {
			warn!(target: "wvb.lifecycle", context = %context.id(), error = %err, "bindings unavailable");
		}
		context
	}

	/// Like [`on_context_created`](Self::on_context_created) but surfaces a failed schema fetch.
	pub fn try_context_created(&self) -> Result<(ScriptContext, InstallReport)> {
		let mut context = ScriptContext::new();
		context.install_console();
		*self.current.lock() = Some(context.id());

		let report = self.install(&mut context)?;
		Ok((context, report))
	}

	/// Discards every queued and in-flight async call. Runs before the next context installs
	/// its bindings.
	pub fn on_context_cleared(&self, context: &ScriptContext) -> ResetSummary {
		let mut current = self.current.lock();
		if *current == Some(context.id()) {
			*current = None;
		}
		drop(current);

		let summary = self.backend.reset_context(ResetScope::All);
		info!(
			target: "wvb.lifecycle",
			context = %context.id(),
			correlations = summary.correlations,
			queued = summary.queued,
			"cleared pending calls from previous page"
		);
		summary
	}

	fn install(&self, context: &mut ScriptContext) -> Result<InstallReport> {
		self.generator.fetch_and_install(context)
	}
}
