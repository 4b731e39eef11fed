//! Request context for a single unit of conversation work.
//!
//! `RequestContext` flows through every port call made while serving one
//! request: repository reads and writes, reply generation, and tool calls.
//! It carries the request id used to correlate logs and events, a
//! cancellation token, and an optional deadline. The `child()` method derives
//! a context whose token is cancelled with the parent but not vice versa.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Span;
use uuid::Uuid;

/// Cancellation scope and correlation id for one request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique identifier for this request (shared with child contexts).
    pub request_id: Uuid,
    /// Cancellation token -- child tokens are derived from the parent.
    pub cancellation: CancellationToken,
    /// Point in time after which in-flight work is abandoned.
    pub deadline: Option<Instant>,
}

impl RequestContext {
    /// Create a root context with a fresh request id and no deadline.
    pub fn new() -> Self {
        Self::with_request_id(Uuid::now_v7())
    }

    /// Create a root context for an existing request id.
    pub fn with_request_id(request_id: Uuid) -> Self {
        Self {
            request_id,
            cancellation: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Set a deadline `timeout` from now. An earlier existing deadline wins.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        });
        self
    }

    /// Derive a child context with the same id and deadline.
    ///
    /// Cancelling the parent cancels the child; cancelling the child leaves
    /// the parent running.
    pub fn child(&self) -> Self {
        Self {
            request_id: self.request_id,
            cancellation: self.cancellation.child_token(),
            deadline: self.deadline,
        }
    }

    /// Whether this context was cancelled or its deadline has passed.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Cancel this context (and all child contexts derived from it).
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Span that scopes all logs emitted while serving this request.
    pub fn span(&self) -> Span {
        tracing::info_span!("request", request_id = %self.request_id)
    }

    /// Drive `fut` to completion unless the context is cancelled first.
    ///
    /// Returns `None` when cancellation or the deadline wins the race; the
    /// future is dropped at that point.
    pub async fn guard<F: Future>(&self, fut: F) -> Option<F::Output> {
        if self.is_cancelled() {
            return None;
        }
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => None,
                _ = tokio::time::sleep_until(deadline) => None,
                out = fut => Some(out),
            },
            None => tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => None,
                out = fut => Some(out),
            },
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
