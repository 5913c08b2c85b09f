//! End-to-end runs of the `wvb` binary against a mock backend socket.

use std::path::PathBuf;
use std::process::{Command, Output};

use serde_json::{Value, json};
use wvb_protocol::{Reply, Request};
use wvb_runtime::testing::{MockBackend, MockResponse};

fn wvb_binary() -> PathBuf {
	PathBuf::from(env!("CARGO_BIN_EXE_wvb"))
}

fn backend() -> MockBackend {
	MockBackend::start(|request: &Request| {
		let params = request.params.clone().unwrap_or_default();
		let reply = match request.method.as_str() {
			"__getBindings" => Reply::Result(json!({
				"main": {
					"App": {
						"methods": [{ "name": "Add", "paramCount": 2, "paramTypes": ["int", "int"] }],
						"fields": [{ "name": "Count", "type": "int" }]
					}
				}
			})),
			"__getField" => Reply::Result(json!(41)),
			"__setField" => Reply::Result(Value::Null),
			"main.App.Add" => {
				let sum: f64 = params.iter().filter_map(Value::as_f64).sum();
				Reply::Result(json!(sum))
			}
			_ => Reply::Error("nope".into()),
		};
		MockResponse::Reply(reply)
	})
}

fn run(backend: &MockBackend, args: &[&str]) -> Output {
	Command::new(wvb_binary())
		.arg("--socket")
		.arg(backend.socket_path())
		.args(args)
		.env("NO_COLOR", "1")
		.env_remove("RUST_LOG")
		.output()
		.expect("failed to run wvb")
}

#[test]
fn call_prints_the_settled_value() {
	let backend = backend();
	let output = run(&backend, &["call", "go.main.App.Add", "2", "3"]);

	assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
	let value: Value = serde_json::from_slice(&output.stdout).unwrap();
	assert_eq!(value, json!(5));
}

#[test]
fn bindings_json_lists_methods_and_fields() {
	let backend = backend();
	let output = run(&backend, &["bindings", "--json"]);

	assert!(output.status.success());
	let tree: Value = serde_json::from_slice(&output.stdout).unwrap();
	assert_eq!(tree["go"]["main"]["App"]["Add"]["remote"], "main.App.Add");
	assert_eq!(tree["go"]["main"]["App"]["Count"]["type"], "int");
}

#[test]
fn set_with_wrong_type_fails_without_a_request() {
	let backend = backend();
	let output = run(&backend, &["set", "go.main.App.Count", "true"]);

	assert!(!output.status.success());
	let stderr = String::from_utf8_lossy(&output.stderr);
	assert!(stderr.contains("expected int but got boolean"), "stderr: {stderr}");
	assert!(!backend.methods().iter().any(|m| m == "__setField"));
}

#[test]
fn unreachable_socket_exits_nonzero() {
	let dir = tempfile::tempdir().unwrap();
	let output = Command::new(wvb_binary())
		.arg("--socket")
		.arg(dir.path().join("missing.sock"))
		.arg("bindings")
		.output()
		.expect("failed to run wvb");

	assert!(!output.status.success());
	assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to connect sync channel"));
}
