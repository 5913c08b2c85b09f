//! Caller-side handle of an async call.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use wvb_protocol::ScriptValue;

use crate::context::ContextId;
use crate::error::{Error, Result};

/// Future returned by every generated method stub.
///
/// Resolves with the converted result, rejects with the backend's error, or reports
/// [`Error::Discarded`] if a context reset dropped the continuation first.
#[derive(Debug)]
pub struct PendingCall {
	context: ContextId,
	call_id: String,
	rx: oneshot::Receiver<Result<ScriptValue>>,
}

impl PendingCall {
	pub(crate) fn new(context: ContextId, call_id: String, rx: oneshot::Receiver<Result<ScriptValue>>) -> Self {
		Self { context, call_id, rx }
	}

	pub fn context(&self) -> ContextId {
		self.context
	}

	pub fn call_id(&self) -> &str {
		&self.call_id
	}

	/// Returns the outcome if the call has already settled, without waiting.
	pub fn try_settled(&mut self) -> Option<Result<ScriptValue>> {
		match self.rx.try_recv() {
			Ok(result) => Some(result),
			Err(TryRecvError::Empty) => None,
			Err(TryRecvError::Closed) => Some(Err(self.discarded())),
		}
	}

	fn discarded(&self) -> Error {
		Error::Discarded {
			call_id: self.call_id.clone(),
		}
	}
}

impl Future for PendingCall {
	type Output = Result<ScriptValue>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match Pin::new(&mut self.rx).poll(cx) {
			Poll::Ready(Ok(result)) => Poll::Ready(result),
			Poll::Ready(Err(_)) => Poll::Ready(Err(self.discarded())),
			Poll::Pending => Poll::Pending,
		}
	}
}
