//! UI-side end of the bridge

use serde_json::Value;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::error::BridgeError;
use crate::host::Envelope;
use crate::request::{Request, Response};
use crate::result::CommandResult;
use crate::Result;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct StorageBridge {
    sender: Option<mpsc::Sender<Envelope>>,
    timeout: Duration,
}

impl StorageBridge {
    pub(crate) fn connected(sender: mpsc::Sender<Envelope>) -> Self {
        Self {
            sender: Some(sender),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// A bridge with no host behind it. Every call gets a placeholder.
    pub fn detached() -> Self {
        Self {
            sender: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether a live storage host is behind this bridge.
    pub fn is_connected(&self) -> bool {
        self.sender.as_ref().is_some_and(|s| !s.is_closed())
    }

    /// Relay `request` to the storage host and wait for its answer.
    ///
    /// An unreachable host is not an error: the caller gets
    /// [`Request::placeholder`] instead.
    ///
    /// The timeout bounds queueing for every request but only bounds the
    /// answer for reads. Once a write is queued it runs to completion on the
    /// host, so the caller waits for its real outcome.
    pub async fn invoke(&self, request: Request) -> Result<Response> {
        let op = request.op();
        let is_write = request.is_write();
        let fallback = request.placeholder();

        let Some(sender) = &self.sender else {
            tracing::debug!(op, "No storage host, answering with placeholder");
            return Ok(fallback);
        };

        let deadline = Instant::now() + self.timeout;
        let (reply_tx, reply_rx) = oneshot::channel();
        let envelope = Envelope {
            request,
            reply: reply_tx,
        };

        match tokio::time::timeout_at(deadline, sender.send(envelope)).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => return Ok(self.unreachable(op, fallback)),
            Err(_) => return Err(self.timed_out(op)),
        }

        let reply = if is_write {
            reply_rx.await
        } else {
            match tokio::time::timeout_at(deadline, reply_rx).await {
                Ok(reply) => reply,
                Err(_) => return Err(self.timed_out(op)),
            }
        };

        match reply {
            Ok(result) => result,
            Err(_) => Ok(self.unreachable(op, fallback)),
        }
    }

    fn unreachable(&self, op: &'static str, fallback: Response) -> Response {
        tracing::warn!(op, "Storage host unreachable, answering with placeholder");
        fallback
    }

    fn timed_out(&self, op: &'static str) -> BridgeError {
        let ms = self.timeout.as_millis() as u64;
        tracing::error!(op, timeout_ms = ms, "Storage request timed out");
        BridgeError::Timeout(ms)
    }

    /// Entry point for untyped UI payloads. Never fails; errors are folded
    /// into the returned envelope.
    pub async fn invoke_value(&self, payload: Value) -> CommandResult<Response> {
        match Request::from_value(payload) {
            Ok(request) => self.invoke(request).await.into(),
            Err(e) => {
                tracing::warn!(error = %e, "Rejected bridge payload");
                CommandResult::err(e.to_string())
            }
        }
    }
}
