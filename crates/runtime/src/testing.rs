//! In-process backend for tests.
//!
//! [`MockBackend`] binds a Unix socket in a temporary directory and answers every request line
//! through a handler closure. It records what it receives so tests can assert on ordering and on
//! how many round trips happened.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tempfile::TempDir;
use wvb_protocol::{Reply, Request};

use crate::config::BridgeConfig;

/// How the mock answers one request.
#[derive(Debug, Clone)]
pub enum MockResponse {
	Reply(Reply),
	/// Written as-is; a newline is appended when missing.
	Raw(String),
	/// Nothing is written.
	Silent,
	/// The connection is closed without a reply.
	Close,
}

impl From<Reply> for MockResponse {
	fn from(reply: Reply) -> Self {
		MockResponse::Reply(reply)
	}
}

type Handler = dyn Fn(&Request) -> MockResponse + Send + Sync;

/// Holds replies back until the test releases them.
#[derive(Clone, Default)]
pub struct Gate {
	inner: Arc<(Mutex<usize>, Condvar)>,
}

impl Gate {
	fn open() -> Self {
		let gate = Self::default();
		gate.release(usize::MAX);
		gate
	}

	/// Lets `n` more replies through.
	pub fn release(&self, n: usize) {
		let (permits, cond) = &*self.inner;
		let mut permits = permits.lock();
		*permits = permits.saturating_add(n);
		cond.notify_all();
	}

	fn wait(&self) {
		let (permits, cond) = &*self.inner;
		let mut permits = permits.lock();
		while *permits == 0 {
			cond.wait(&mut permits);
		}
		*permits -= 1;
	}
}

/// Line-delimited JSON server driven by a handler closure.
pub struct MockBackend {
	_dir: TempDir,
	path: PathBuf,
	requests: Arc<Mutex<Vec<Request>>>,
	shutdown: Arc<AtomicBool>,
	gate: Gate,
	accept: Option<JoinHandle<()>>,
}

impl MockBackend {
	/// Starts a backend that answers immediately.
	pub fn start<F>(handler: F) -> Self
	where
		F: Fn(&Request) -> MockResponse + Send + Sync + 'static,
	{
		Self::with_gate(Arc::new(handler), Gate::open())
	}

	/// Starts a backend whose replies wait for [`Gate::release`]. Requests are still recorded
	/// as soon as they arrive.
	pub fn gated<F>(handler: F) -> (Self, Gate)
	where
		F: Fn(&Request) -> MockResponse + Send + Sync + 'static,
	{
		let gate = Gate::default();
		(Self::with_gate(Arc::new(handler), gate.clone()), gate)
	}

	fn with_gate(handler: Arc<Handler>, gate: Gate) -> Self {
		let dir = tempfile::tempdir().expect("create socket dir");
		let path = dir.path().join("backend.sock");
		let listener = UnixListener::bind(&path).expect("bind mock socket");
		let requests = Arc::new(Mutex::new(Vec::new()));
		let shutdown = Arc::new(AtomicBool::new(false));

		let accept = {
			let requests = Arc::clone(&requests);
			let shutdown = Arc::clone(&shutdown);
			let gate = gate.clone();
			std::thread::spawn(move || {
				for stream in listener.incoming() {
					if shutdown.load(Ordering::SeqCst) {
						break;
					}
					let Ok(stream) = stream else { continue };
					let handler = Arc::clone(&handler);
					let requests = Arc::clone(&requests);
					let shutdown = Arc::clone(&shutdown);
					let gate = gate.clone();
					std::thread::spawn(move || serve(stream, &*handler, &requests, &shutdown, &gate));
				}
			})
		};

		Self {
			_dir: dir,
			path,
			requests,
			shutdown,
			gate,
			accept: Some(accept),
		}
	}

	pub fn socket_path(&self) -> &Path {
		&self.path
	}

	pub fn config(&self) -> BridgeConfig {
		BridgeConfig::new(&self.path)
	}

	/// Every request received so far, in arrival order.
	pub fn requests(&self) -> Vec<Request> {
		self.requests.lock().clone()
	}

	pub fn methods(&self) -> Vec<String> {
		self.requests.lock().iter().map(|r| r.method.clone()).collect()
	}
}

impl Drop for MockBackend {
	fn drop(&mut self) {
		self.shutdown.store(true, Ordering::SeqCst);
		self.gate.release(usize::MAX);
		// wake the accept loop so it observes the flag
		let _ = UnixStream::connect(&self.path);
		if let Some(accept) = self.accept.take() {
			let _ = accept.join();
		}
	}
}

fn serve(stream: UnixStream, handler: &Handler, requests: &Mutex<Vec<Request>>, shutdown: &AtomicBool, gate: &Gate) {
	let Ok(mut writer) = stream.try_clone() else { return };
	let mut reader = BufReader::new(stream);
	let mut line = String::new();

	loop {
		line.clear();
		match reader.read_line(&mut line) {
			Ok(0) | Err(_) => return,
			Ok(_) => {}
		}
		if shutdown.load(Ordering::SeqCst) {
			return;
		}
		let Ok(request) = serde_json::from_str::<Request>(line.trim_end()) else {
			continue;
		};
		requests.lock().push(request.clone());

		let frame = match handler(&request) {
			MockResponse::Reply(reply) => reply.to_line(),
			MockResponse::Raw(mut raw) => {
				if !raw.ends_with('\n') {
					raw.push('\n');
				}
				raw
			}
			MockResponse::Silent => continue,
			MockResponse::Close => return,
		};
		gate.wait();
		if writer.write_all(frame.as_bytes()).is_err() {
			return;
		}
	}
}

/// Polls `condition` until it holds or `timeout` elapses.
pub async fn eventually(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
	let deadline = tokio::time::Instant::now() + timeout;
	loop {
		if condition() {
			return true;
		}
		if tokio::time::Instant::now() >= deadline {
			return false;
		}
		tokio::time::sleep(Duration::from_millis(5)).await;
	}
}
