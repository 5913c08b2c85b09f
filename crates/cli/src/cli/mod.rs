
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Probe a webview bridge backend over its IPC socket.
#[derive(Parser, Debug)]
#[command(name = "wvb")]
#[command(about = "Inspect and call a webview bridge backend")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	#[command(flatten)]
	pub connection: ConnectionArgs,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
	/// Backend socket path (defaults to $WVB_SOCKET, then /tmp/strux-ipc.sock)
	#[arg(long, global = true, value_name = "PATH")]
	pub socket: Option<PathBuf>,

	/// Reject async calls whose reply takes longer than this
	#[arg(long, global = true, value_name = "MS")]
	pub timeout_ms: Option<u64>,

	/// Global object holding application namespaces
	#[arg(long, global = true, value_name = "NAME", default_value = "go")]
	pub app_root: String,

	/// Schema key of the framework namespace
	#[arg(long, global = true, value_name = "NAME", default_value = "strux")]
	pub reserved: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Fetch the schema and print the generated object tree.
	Bindings(BindingsArgs),
	/// Call a method and print its settled value.
	Call(CallArgs),
	/// Read a field.
	Get(GetArgs),
	/// Assign a field, validating the value against its declared type.
	Set(SetArgs),
}

#[derive(Args, Debug, Clone)]
pub struct BindingsArgs {
	/// Print the tree as JSON instead of text.
	#[arg(long)]
	pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CallArgs {
	/// Dotted path, e.g. go.main.App.Greet
	#[arg(value_name = "PATH")]
	pub path: String,

	/// Positional arguments as JSON; anything that is not valid JSON is sent as a string
	#[arg(value_name = "ARG_JSON")]
	pub args: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct GetArgs {
	/// Dotted path, e.g. go.main.App.Count
	#[arg(value_name = "PATH")]
	pub path: String,
}

#[derive(Args, Debug, Clone)]
pub struct SetArgs {
	/// Dotted path, e.g. go.main.App.Count
	#[arg(value_name = "PATH")]
	pub path: String,

	/// New value as JSON
	#[arg(value_name = "VALUE_JSON")]
	pub value: String,
}
