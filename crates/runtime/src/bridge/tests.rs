use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::runtime::Handle;
use wvb_protocol::{BINDINGS_CALL_ID, GET_BINDINGS, GET_FIELD, Reply, Request, SET_FIELD, ScriptValue};

use super::*;
use crate::testing::{MockBackend, MockResponse, eventually};

const WAIT: Duration = Duration::from_secs(5);

fn echo_method(request: &Request) -> MockResponse {
	Reply::Result(json!(request.method)).into()
}

fn bridge_for(backend: &MockBackend) -> Arc<Bridge> {
	Bridge::new(backend.config(), Handle::current())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_calls_are_serialized_and_settle_in_order() {
	let (backend, gate) = MockBackend::gated(echo_method);
	let bridge = bridge_for(&backend);
	let ctx = ContextId::next();

	let calls: Vec<_> = ["a", "b", "c"]
		.into_iter()
		.map(|m| bridge.call_async(ctx, m, vec![]))
		.collect();

	assert!(eventually(WAIT, || backend.requests().len() == 1).await);
	tokio::time::sleep(Duration::from_millis(50)).await;
	// later requests are not written while the first reply is outstanding
	assert_eq!(backend.methods(), vec!["a"]);
	assert!(bridge.in_flight());
	assert_eq!(bridge.queued(), 2);

	gate.release(1);
	assert!(eventually(WAIT, || backend.requests().len() == 2).await);
	assert_eq!(backend.methods(), vec!["a", "b"]);

	gate.release(1);
	let mut results = Vec::new();
	for call in calls {
		results.push(call.await.unwrap());
	}
	assert_eq!(
		results,
		vec![ScriptValue::from("a"), ScriptValue::from("b"), ScriptValue::from("c")]
	);
	assert!(eventually(WAIT, || !bridge.in_flight()).await);
	assert_eq!(bridge.pending_correlations(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unreachable_endpoint_rejects_every_queued_call() {
	let dir = tempfile::tempdir().unwrap();
	let bridge = Bridge::new(BridgeConfig::new(dir.path().join("nobody.sock")), Handle::current());
	let ctx = ContextId::next();

	let calls: Vec<_> = (0..5).map(|i| bridge.call_async(ctx, format!("m{i}"), vec![])).collect();

	for call in calls {
		let err = tokio::time::timeout(WAIT, call).await.unwrap().unwrap_err();
		assert!(err.is_transport(), "unexpected error: {err}");
	}
	assert!(!bridge.in_flight());
	assert_eq!(bridge.queued(), 0);
	assert_eq!(bridge.pending_correlations(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_remote_error_rejects_only_that_call() {
	let backend = MockBackend::start(|request| match request.method.as_str() {
		"fail" => Reply::Error("boom".into()).into(),
		_ => echo_method(request),
	});
	let bridge = bridge_for(&backend);
	let ctx = ContextId::next();

	let failing = bridge.call_async(ctx, "fail", vec![json!(1)]);
	let ok = bridge.call_async(ctx, "ok", vec![]);

	let err = failing.await.unwrap_err();
	assert_eq!(err.remote_message(), Some("boom"));
	assert_eq!(ok.await.unwrap(), ScriptValue::from("ok"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_params_are_sent_positionally() {
	let backend = MockBackend::start(echo_method);
	let bridge = bridge_for(&backend);

	bridge
		.call_async(ContextId::next(), "main.App.Greet", vec![json!("world"), json!(2), json!(null)])
		.await
		.unwrap();

	let request = &backend.requests()[0];
	assert_eq!(request.method, "main.App.Greet");
	assert_eq!(request.params, Some(vec![json!("world"), json!(2), json!(null)]));
	assert_ne!(request.id, BINDINGS_CALL_ID);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_context_reset_discards_queued_and_in_flight_calls() {
	let (backend, gate) = MockBackend::gated(echo_method);
	let bridge = bridge_for(&backend);
	let old = ContextId::next();

	let mut a = bridge.call_async(old, "A", vec![]);
	let b = bridge.call_async(old, "B", vec![]);
	let c = bridge.call_async(old, "C", vec![]);
	assert!(eventually(WAIT, || backend.requests().len() == 1).await);

	let summary = bridge.on_context_reset(ResetScope::All);
	assert_eq!(
		summary,
		ResetSummary {
			correlations: 1,
			queued: 2,
			in_flight_cleared: true,
		}
	);
	assert!(!bridge.in_flight());
	assert_eq!(bridge.queued(), 0);
	assert_eq!(bridge.pending_correlations(), 0);

	for discarded in [b, c] {
		assert!(discarded.await.unwrap_err().is_discarded());
	}

	let fresh = ContextId::next();
	let d = bridge.call_async(fresh, "D", vec![]);
	// A's reply is never read: the reset dropped the connection it was pending on
	gate.release(2);
	assert_eq!(tokio::time::timeout(WAIT, d).await.unwrap().unwrap(), ScriptValue::from("D"));

	assert!(a.try_settled().unwrap().unwrap_err().is_discarded());
	assert_eq!(backend.methods(), vec!["A", "D"]);
	assert!(eventually(WAIT, || !bridge.in_flight()).await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reset_abandons_a_reply_that_never_comes() {
	let backend = MockBackend::start(|request| match request.method.as_str() {
		"A" => MockResponse::Silent,
		_ => echo_method(request),
	});
	let bridge = bridge_for(&backend);

	let a = bridge.call_async(ContextId::next(), "A", vec![]);
	assert!(eventually(WAIT, || backend.requests().len() == 1).await);

	let summary = bridge.on_context_reset(ResetScope::All);
	assert!(summary.in_flight_cleared);
	assert!(a.await.unwrap_err().is_discarded());

	let d = bridge.call_async(ContextId::next(), "D", vec![]);
	assert_eq!(tokio::time::timeout(WAIT, d).await.unwrap().unwrap(), ScriptValue::from("D"));
	assert_eq!(backend.methods(), vec!["A", "D"]);
	assert!(eventually(WAIT, || !bridge.in_flight()).await);
	assert_eq!(bridge.pending_correlations(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_closed_stream_rejects_in_flight_call_and_next_call_reconnects() {
	let backend = MockBackend::start(|request| match request.method.as_str() {
		"drop" => MockResponse::Close,
		_ => echo_method(request),
	});
	let bridge = bridge_for(&backend);
	let ctx = ContextId::next();

	let dropped = bridge.call_async(ctx, "drop", vec![]);
	let after = bridge.call_async(ctx, "after", vec![]);

	let err = tokio::time::timeout(WAIT, dropped).await.unwrap().unwrap_err();
	assert!(err.is_transport(), "unexpected error: {err}");
	assert_eq!(tokio::time::timeout(WAIT, after).await.unwrap().unwrap(), ScriptValue::from("after"));
	assert_eq!(backend.methods(), vec!["drop", "after"]);
	assert!(eventually(WAIT, || !bridge.in_flight()).await);
	assert_eq!(bridge.queued(), 0);
	assert_eq!(bridge.pending_correlations(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_scoped_reset_leaves_other_contexts_alone() {
	let (backend, gate) = MockBackend::gated(echo_method);
	let bridge = bridge_for(&backend);
	let keep = ContextId::next();
	let drop_ctx = ContextId::next();

	let first = bridge.call_async(keep, "first", vec![]);
	let doomed = bridge.call_async(drop_ctx, "doomed", vec![]);
	let second = bridge.call_async(keep, "second", vec![]);
	assert!(eventually(WAIT, || backend.requests().len() == 1).await);

	let summary = bridge.on_context_reset(ResetScope::Context(drop_ctx));
	assert_eq!(summary.queued, 1);
	assert!(!summary.in_flight_cleared);
	assert!(bridge.in_flight());

	gate.release(2);
	assert_eq!(first.await.unwrap(), ScriptValue::from("first"));
	assert_eq!(second.await.unwrap(), ScriptValue::from("second"));
	assert!(doomed.await.unwrap_err().is_discarded());
	assert_eq!(backend.methods(), vec!["first", "second"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_malformed_reply_leaves_call_unsettled_and_queue_moves_on() {
	let backend = MockBackend::start(|request| match request.method.as_str() {
		"bad" => MockResponse::Raw("{\"id\":\"x\"}".into()),
		_ => echo_method(request),
	});
	let bridge = bridge_for(&backend);
	let ctx = ContextId::next();

	let mut bad = bridge.call_async(ctx, "bad", vec![]);
	let good = bridge.call_async(ctx, "good", vec![]);

	assert_eq!(good.await.unwrap(), ScriptValue::from("good"));
	assert!(bad.try_settled().is_none());
	assert_eq!(bridge.pending_correlations(), 1);

	bridge.on_context_reset(ResetScope::All);
	assert!(bad.await.unwrap_err().is_discarded());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_timeout_rejects_and_next_call_reconnects() {
	let backend = MockBackend::start(|request| match request.method.as_str() {
		"hang" => MockResponse::Silent,
		_ => echo_method(request),
	});
	let config = backend.config().with_call_timeout(Duration::from_millis(100));
	let bridge = Bridge::new(config, Handle::current());
	let ctx = ContextId::next();

	let hang = bridge.call_async(ctx, "hang", vec![]);
	let after = bridge.call_async(ctx, "after", vec![]);

	let err = hang.await.unwrap_err();
	assert!(err.is_timeout(), "unexpected error: {err}");
	assert_eq!(after.await.unwrap(), ScriptValue::from("after"));
	assert_eq!(bridge.pending_correlations(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_get_field_converts_reply() {
	let backend = MockBackend::start(|request| {
		let name = request.params.as_ref().and_then(|p| p.first()).and_then(|v| v.as_str());
		match name {
			Some("Count") => Reply::Result(json!(42)).into(),
			Some("Shape") => Reply::Result(json!({ "a": [1, 2] })).into(),
			_ => Reply::Error("boom".into()).into(),
		}
	});
	let bridge = bridge_for(&backend);

	assert_eq!(bridge.get_field("Count").unwrap(), ScriptValue::Number(42.0));
	assert_eq!(
		bridge.get_field("Shape").unwrap(),
		ScriptValue::from_json(json!({ "a": [1.0, 2.0] }))
	);
	let err = bridge.get_field("Missing").unwrap_err();
	assert_eq!(err.to_string(), "boom");

	assert!(backend.methods().iter().all(|m| m == GET_FIELD));
	assert_eq!(backend.requests().len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_set_field_is_one_round_trip() {
	let backend = MockBackend::start(|_| Reply::Result(json!(null)).into());
	let bridge = bridge_for(&backend);

	bridge.set_field("Count", json!(7));

	let requests = backend.requests();
	assert_eq!(requests.len(), 1);
	assert_eq!(requests[0].method, SET_FIELD);
	assert_eq!(requests[0].params, Some(vec![json!("Count"), json!(7)]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_set_field_discards_error_replies_and_transport_failures() {
	let backend = MockBackend::start(|_| Reply::Error("read-only".into()).into());
	let bridge = bridge_for(&backend);

	bridge.set_field("Count", json!(3));
	assert_eq!(backend.methods(), vec![SET_FIELD]);
	assert!(bridge.sync_channel().is_connected());

	let dir = tempfile::tempdir().unwrap();
	let offline = Bridge::new(BridgeConfig::new(dir.path().join("gone.sock")), Handle::current());
	offline.set_field("Count", json!(3));
	assert!(!offline.sync_channel().is_connected());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sync_callers_get_their_own_replies() {
	let backend = MockBackend::start(|request| {
		let name = request.params.as_ref().and_then(|p| p.first()).cloned().unwrap_or_default();
		Reply::Result(name).into()
	});
	let bridge = bridge_for(&backend);

	let workers: Vec<_> = (0..4)
		.map(|worker| {
			let bridge = Arc::clone(&bridge);
			std::thread::spawn(move || {
				for i in 0..25 {
					let field = format!("f{worker}-{i}");
					let value = bridge.get_field(&field).unwrap();
					assert_eq!(value, ScriptValue::from(field.as_str()));
				}
			})
		})
		.collect();

	for worker in workers {
		worker.join().unwrap();
	}
	assert_eq!(backend.requests().len(), 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_fetch_schema_uses_fixed_id_and_null_params() {
	let backend = MockBackend::start(|_| {
		Reply::Result(json!({
			"main": { "App": { "methods": [{ "name": "Greet" }], "fields": [{ "name": "Count", "type": "int" }] } },
			"strux": { "boot": { "methods": [{ "name": "Ready" }] } }
		}))
		.into()
	});
	let bridge = bridge_for(&backend);

	let schema = bridge.fetch_schema("strux").unwrap();
	assert_eq!(schema.method_count(), 2);
	assert_eq!(schema.field_count(), 1);

	let request = &backend.requests()[0];
	assert_eq!(request.id, BINDINGS_CALL_ID);
	assert_eq!(request.method, GET_BINDINGS);
	assert_eq!(request.params, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_sync_failure_drops_connection_for_next_attempt() {
	let dir = tempfile::tempdir().unwrap();
	let bridge = Bridge::new(BridgeConfig::new(dir.path().join("late.sock")), Handle::current());

	assert!(bridge.get_field("Count").unwrap_err().is_transport());
	assert!(!bridge.sync_channel().is_connected());
}
