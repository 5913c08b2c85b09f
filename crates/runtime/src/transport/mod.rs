//! Line-delimited JSON transport over the backend's Unix socket.
//!
//! Each channel role owns its own connection to the same socket path. A frame is the JSON
//! payload followed by one `\n`; there is no length prefix and no upper bound on line length.
//! Connections are opened lazily by the first call on their channel and dropped after an I/O
//! failure, so the next call reconnects.

use std::fmt;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream as StdUnixStream;
use std::path::Path;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader as AsyncBufReader};
use tokio::net::UnixStream;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Which of the two independent connections a frame travels on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelRole {
	/// Blocking exchanges: fields and schema discovery.
	Sync,
	/// Queued method calls.
	Async,
}

impl ChannelRole {
	pub fn as_str(self) -> &'static str {
		match self {
			ChannelRole::Sync => "sync",
			ChannelRole::Async => "async",
		}
	}
}

impl fmt::Display for ChannelRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

const FRAME_DELIMITER: u8 = b'\n';

/// Reads one frame, returning the bytes before the delimiter.
///
/// EOF before a delimiter is an error: a partial line is never handed to the decoder.
pub fn read_frame<R: BufRead>(reader: &mut R) -> std::io::Result<Vec<u8>> {
	let mut line = Vec::new();
	reader.read_until(FRAME_DELIMITER, &mut line)?;
	finish_frame(line)
}

/// Async counterpart of [`read_frame`].
pub async fn read_frame_async<R: AsyncBufRead + Unpin>(reader: &mut R) -> std::io::Result<Vec<u8>> {
	let mut line = Vec::new();
	reader.read_until(FRAME_DELIMITER, &mut line).await?;
	finish_frame(line)
}

fn finish_frame(mut line: Vec<u8>) -> std::io::Result<Vec<u8>> {
	if line.pop() != Some(FRAME_DELIMITER) {
		return Err(std::io::Error::new(
			std::io::ErrorKind::UnexpectedEof,
			"connection closed before end of line",
		));
	}
	Ok(line)
}

/// Blocking connection for the sync channel.
pub struct SyncConnection {
	reader: BufReader<StdUnixStream>,
	writer: StdUnixStream,
}

impl SyncConnection {
	pub fn connect(path: &Path) -> Result<Self> {
		let stream = StdUnixStream::connect(path).map_err(|source| connect_failed(ChannelRole::Sync, path, source))?;
		let writer = stream.try_clone()?;
		info!(target: "wvb.transport", channel = "sync", path = %path.display(), "connected");
		Ok(Self {
			reader: BufReader::new(stream),
			writer,
		})
	}

	/// Writes one frame and blocks until one reply line arrives.
	pub fn exchange(&mut self, frame: &[u8]) -> std::io::Result<Vec<u8>> {
		self.writer.write_all(frame)?;
		self.writer.flush()?;
		read_frame(&mut self.reader)
	}
}

/// Non-blocking connection for the async channel.
pub struct AsyncConnection {
	reader: AsyncBufReader<OwnedReadHalf>,
	writer: OwnedWriteHalf,
}

impl AsyncConnection {
	pub async fn connect(path: &Path) -> Result<Self> {
		let stream = UnixStream::connect(path)
			.await
			.map_err(|source| connect_failed(ChannelRole::Async, path, source))?;
		let (read_half, write_half) = stream.into_split();
		info!(target: "wvb.transport", channel = "async", path = %path.display(), "connected");
		Ok(Self {
			reader: AsyncBufReader::new(read_half),
			writer: write_half,
		})
	}

	pub async fn write_frame(&mut self, frame: &[u8]) -> std::io::Result<()> {
		self.writer.write_all(frame).await?;
		self.writer.flush().await
	}

	pub async fn read_frame(&mut self) -> std::io::Result<Vec<u8>> {
		read_frame_async(&mut self.reader).await
	}
}

fn connect_failed(channel: ChannelRole, path: &Path, source: std::io::Error) -> Error {
	warn!(target: "wvb.transport", %channel, path = %path.display(), error = %source, "connect failed");
	Error::ConnectionFailed {
		channel,
		path: path.to_path_buf(),
		source,
	}
}

/// Returns the sync connection in `slot`, connecting first if the slot is empty.
pub fn ensure_sync<'a>(slot: &'a mut Option<SyncConnection>, path: &Path) -> Result<&'a mut SyncConnection> {
	let conn = match slot.take() {
		Some(conn) => conn,
		None => SyncConnection::connect(path)?,
	};
	Ok(slot.insert(conn))
}

/// Returns the async connection in `slot`, connecting first if the slot is empty.
pub async fn ensure_async<'a>(slot: &'a mut Option<AsyncConnection>, path: &Path) -> Result<&'a mut AsyncConnection> {
	let conn = match slot.take() {
		Some(conn) => conn,
		None => AsyncConnection::connect(path).await?,
	};
	Ok(slot.insert(conn))
}
