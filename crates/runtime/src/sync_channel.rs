//! Blocking request/response channel.
//!
//! One exclusive lock serializes every sync exchange, schema fetch included, and is held
//! across the blocking write and read so frames from different callers never interleave.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, warn};
use wvb_protocol::{Reply, Request};

use crate::error::{Error, Result};
use crate::transport::{ChannelRole, SyncConnection, ensure_sync};

pub struct SyncChannel {
	socket_path: PathBuf,
	link: Mutex<Option<SyncConnection>>,
}

impl SyncChannel {
	pub fn new(socket_path: impl Into<PathBuf>) -> Self {
		Self {
			socket_path: socket_path.into(),
			link: Mutex::new(None),
		}
	}

	pub fn socket_path(&self) -> &Path {
		&self.socket_path
	}

	pub fn is_connected(&self) -> bool {
		self.link.lock().is_some()
	}

	/// Sends `request` and returns the raw reply line without its delimiter.
	///
	/// Blocks the calling thread. Any I/O failure drops the connection and returns an error;
	/// there is no retry inside the call.
	pub fn call(&self, request: &Request) -> Result<String> {
		let frame = request.to_line()?;

		let mut link = self.link.lock();
		let conn = ensure_sync(&mut link, &self.socket_path)?;

		debug!(target: "wvb.transport", call_id = %request.id, method = %request.method, "sync call");
		let line = match conn.exchange(frame.as_bytes()) {
			Ok(line) => line,
			Err(err) => {
				*link = None;
				warn!(target: "wvb.transport", channel = "sync", method = %request.method, error = %err, "exchange failed");
				return Err(Error::transport(ChannelRole::Sync, err));
			}
		};
		drop(link);

		String::from_utf8(line).map_err(|err| Error::Protocol(format!("reply is not UTF-8: {err}")))
	}

	/// Sends `request` and decodes the reply envelope.
	pub fn call_reply(&self, request: &Request) -> Result<Reply> {
		let line = self.call(request)?;
		Reply::parse(line.as_bytes()).map_err(|err| {
			warn!(target: "wvb.decoder", call_id = %request.id, method = %request.method, error = %err, "invalid sync reply");
			Error::from(err)
		})
	}
}
