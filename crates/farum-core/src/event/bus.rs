//! Broadcast bus for `PipelineEvent`s.
//!
//! Stages publish without knowing who listens; the server mirrors events into
//! the log and tests subscribe to assert stage order and journal outcomes.
//! Publishing with nobody subscribed drops the event.

use farum_types::event::PipelineEvent;
use farum_types::session::SessionId;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::trace;

/// Default channel capacity.
pub const DEFAULT_CAPACITY: usize = 256;

/// Cheaply cloneable handle to one broadcast channel of pipeline events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PipelineEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Receive every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.sender.subscribe()
    }

    /// Receive only the events of one session.
    pub fn subscribe_session(&self, session_id: SessionId) -> SessionEvents {
        SessionEvents {
            session_id,
            receiver: self.sender.subscribe(),
        }
    }

    pub fn publish(&self, event: PipelineEvent) {
        if self.sender.send(event).is_err() {
            trace!("pipeline event dropped: no subscribers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

/// A subscription filtered to a single session.
#[derive(Debug)]
pub struct SessionEvents {
    session_id: SessionId,
    receiver: broadcast::Receiver<PipelineEvent>,
}

impl SessionEvents {
    /// Wait for the next event of this session.
    ///
    /// Returns `None` once every bus handle is gone. Events lost to lag are
    /// skipped.
    pub async fn next(&mut self) -> Option<PipelineEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.session_id() == self.session_id => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    trace!(skipped, session_id = %self.session_id, "session subscription lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Everything already buffered for this session, without waiting.
    pub fn drain(&mut self) -> Vec<PipelineEvent> {
        let mut events = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(event) if event.session_id() == self.session_id => events.push(event),
                Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty | TryRecvError::Closed) => return events,
            }
        }
    }
}
