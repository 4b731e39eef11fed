//! Conversation context and timeline views.

use serde::{Deserialize, Serialize};

use crate::message::{Message, Role};
use crate::session::{InteractionMode, Session, SessionId, UserId};

/// Working memory handed to every pipeline stage and to the generator.
///
/// Never persisted. `history` is the bounded tail of the session timeline,
/// oldest first and newest last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub mode: InteractionMode,
    pub history: Vec<Message>,
}

impl ConversationContext {
    /// Build a context for `session` from its recent messages.
    pub fn for_session(session: &Session, history: Vec<Message>) -> Self {
        Self {
            session_id: session.id,
            user_id: session.user_id.clone(),
            mode: session.preferred_mode,
            history,
        }
    }

    /// The newest message in the window, if any.
    pub fn latest(&self) -> Option<&Message> {
        self.history.last()
    }
}

/// A session together with (part of) its message history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeline {
    pub session: Session,
    pub messages: Vec<Message>,
}

impl Timeline {
    /// Whether the newest message is a user turn that never got a reply.
    ///
    /// Sending a message is not atomic: the user turn is written before the
    /// reply is generated, so a failed generation or reply write leaves the
    /// user message on its own at the end of the timeline.
    pub fn has_dangling_user_turn(&self) -> bool {
        self.messages
            .last()
            .is_some_and(|m| m.author == Role::User)
    }
}
