//! Event types for the Farum pipeline event bus.
//!
//! `PipelineEvent` is broadcast while a reply is being produced. All variants
//! are Clone + Send + Sync for use with tokio broadcast channels.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::journal::JournalEntryId;
use crate::session::SessionId;

/// Events emitted while the reply pipeline runs.
///
/// Subscribers (logging, tests, UI) use these to observe stage progress and
/// journal side effects that do not show up in the reply itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// A pipeline stage has started.
    StageStarted {
        request_id: Uuid,
        session_id: SessionId,
        stage: String,
    },

    /// A pipeline stage produced its output.
    StageCompleted {
        request_id: Uuid,
        session_id: SessionId,
        stage: String,
        duration_ms: u64,
    },

    /// A pipeline stage failed and aborted the run.
    StageFailed {
        request_id: Uuid,
        session_id: SessionId,
        stage: String,
        error: String,
    },

    /// The reflector stored a journal entry.
    JournalRecorded {
        request_id: Uuid,
        session_id: SessionId,
        /// Id reported by the tool, when it reports one.
        entry_id: Option<JournalEntryId>,
    },

    /// The reflector's journal write failed. The reply is unaffected.
    JournalFailed {
        request_id: Uuid,
        session_id: SessionId,
        error: String,
    },
}

impl PipelineEvent {
    /// The session every event belongs to.
    pub fn session_id(&self) -> SessionId {
        match self {
            PipelineEvent::StageStarted { session_id, .. }
            | PipelineEvent::StageCompleted { session_id, .. }
            | PipelineEvent::StageFailed { session_id, .. }
            | PipelineEvent::JournalRecorded { session_id, .. }
            | PipelineEvent::JournalFailed { session_id, .. } => *session_id,
        }
    }

    /// Stage name for stage lifecycle events.
    pub fn stage(&self) -> Option<&str> {
        match self {
            PipelineEvent::StageStarted { stage, .. }
            | PipelineEvent::StageCompleted { stage, .. }
            | PipelineEvent::StageFailed { stage, .. } => Some(stage),
            PipelineEvent::JournalRecorded { .. } | PipelineEvent::JournalFailed { .. } => None,
        }
    }
}
