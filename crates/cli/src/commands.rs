//! Subcommand execution.
//!
//! Every subcommand opens a bridge, creates one context with bindings installed, runs, then
//! clears the context. Sync field calls run on the calling thread; async calls are awaited
//! with `block_on` on the bridge's runtime.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use tokio::runtime::Runtime;
use tracing::debug;
use wvb::{BindingConfig, ExtensionHost, RemoteBackend, ScriptContext, ScriptValue};
use wvb_runtime::{Bridge, BridgeConfig};

use crate::cli::{BindingsArgs, CallArgs, Cli, Commands, ConnectionArgs, GetArgs, SetArgs};
use crate::error::{CliError, Result};
use crate::output;

/// Runs `cli`, writing results to stdout.
pub fn run(cli: Cli) -> Result<()> {
	let stdout = std::io::stdout();
	let mut out = stdout.lock();
	run_with(cli, &mut out)
}

/// Runs `cli`, writing results to `out`.
pub fn run_with(cli: Cli, out: &mut dyn Write) -> Result<()> {
	let runtime = tokio::runtime::Builder::new_multi_thread()
		.worker_threads(1)
		.enable_all()
		.build()
		.context("failed to start async runtime")?;

	let session = Session::open(&cli.connection, &runtime)?;
	let result = match cli.command {
		Commands::Bindings(args) => bindings(&session, args, out),
		Commands::Call(args) => call(&session, &runtime, args, out),
		Commands::Get(args) => get(&session, args, out),
		Commands::Set(args) => set(&session, args),
	};
	session.close();
	result
}

struct Session {
	host: ExtensionHost,
	context: ScriptContext,
}

impl Session {
	fn open(args: &ConnectionArgs, runtime: &Runtime) -> Result<Self> {
		let config = bridge_config(args)?;
		debug!(socket = %config.socket_path.display(), timeout = ?config.call_timeout, "opening bridge");

		let bridge = Bridge::new(config, runtime.handle().clone());
		let backend: Arc<dyn RemoteBackend> = Arc::new(bridge);
		let bindings = BindingConfig {
			app_root: args.app_root.clone(),
			reserved_namespace: args.reserved.clone(),
		};
		let host = ExtensionHost::new(backend, bindings);
		let (context, _) = host.try_context_created()?;
		Ok(Self { host, context })
	}

	fn close(self) {
		self.host.on_context_cleared(&self.context);
	}
}

fn bridge_config(args: &ConnectionArgs) -> Result<BridgeConfig> {
	let mut config = BridgeConfig::from_env()?;
	if let Some(socket) = &args.socket {
		config.socket_path = socket.clone();
	}
	if let Some(ms) = args.timeout_ms {
		config.call_timeout = (ms > 0).then(|| Duration::from_millis(ms));
	}
	Ok(config)
}

fn bindings(session: &Session, args: BindingsArgs, out: &mut dyn Write) -> Result<()> {
	let globals = session.context.globals();
	if args.json {
		writeln!(out, "{}", serde_json::to_string_pretty(&output::tree_json(globals))?)?;
		return Ok(());
	}
	output::print_tree(out, globals)
}

fn call(session: &Session, runtime: &Runtime, args: CallArgs, out: &mut dyn Write) -> Result<()> {
	let params: Vec<ScriptValue> = args.args.iter().map(|a| parse_arg(a)).collect();
	let pending = session.context.call(&args.path, &params)?;
	let value = runtime
		.block_on(pending)
		.map_err(|source| CliError::Rejected {
			path: args.path.clone(),
			source,
		})?;
	output::print_value(out, &value)
}

fn get(session: &Session, args: GetArgs, out: &mut dyn Write) -> Result<()> {
	let value = session.context.get(&args.path)?;
	output::print_value(out, &value)
}

fn set(session: &Session, args: SetArgs) -> Result<()> {
	let value = parse_value(&args.value)?;
	session.context.set(&args.path, value)?;
	Ok(())
}

/// Parses a call argument as JSON, falling back to a plain string.
pub fn parse_arg(input: &str) -> ScriptValue {
	serde_json::from_str(input)
		.map(ScriptValue::from_json)
		.unwrap_or_else(|_| ScriptValue::String(input.to_string()))
}

/// Parses a field value, which must be valid JSON.
pub fn parse_value(input: &str) -> Result<ScriptValue> {
	serde_json::from_str(input)
		.map(ScriptValue::from_json)
		.map_err(|source| CliError::InvalidValue {
			input: input.to_string(),
			source,
		})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bare_words_are_strings() {
		assert_eq!(parse_arg("world"), ScriptValue::from("world"));
		assert_eq!(parse_arg("\"world\""), ScriptValue::from("world"));
		assert_eq!(parse_arg("3"), ScriptValue::Number(3.0));
		assert_eq!(parse_arg("true"), ScriptValue::Bool(true));
	}

	#[test]
	fn field_values_must_be_json() {
		assert!(matches!(parse_value("world"), Err(CliError::InvalidValue { .. })));
		assert_eq!(parse_value("[1]").unwrap(), ScriptValue::Array(vec![ScriptValue::Number(1.0)]));
	}

	#[test]
	fn zero_timeout_disables_it() {
		let args = ConnectionArgs {
			socket: Some("/tmp/x.sock".into()),
			timeout_ms: Some(0),
			..Default::default()
		};
		let config = bridge_config(&args).unwrap();
		assert_eq!(config.socket_path, std::path::PathBuf::from("/tmp/x.sock"));
		assert_eq!(config.call_timeout, None);
	}
}
