//! Timeline message types for Farum.
//!
//! Messages are the turns of a session: append-only, time-ordered, and never
//! mutated once written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::session::{InteractionMode, SessionId};

/// Unique identifier for a message, wrapping a UUID v7 (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MessageId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Agent => write!(f, "agent"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "agent" => Ok(Role::Agent),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// Content-type label for plain conversational text.
pub const CONTENT_TYPE_TEXT: &str = "text";

/// One turn in a session's timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub session_id: SessionId,
    pub author: Role,
    pub text: String,
    /// Interaction mode in effect when the message was produced.
    pub mode: InteractionMode,
    pub created_at: DateTime<Utc>,
    /// Earlier message this one answers, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<MessageId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Free-form label, e.g. "text", "reflection", "task_list".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl Message {
    /// Build a plain-text message with a fresh id.
    pub fn new(
        session_id: SessionId,
        author: Role,
        text: impl Into<String>,
        mode: InteractionMode,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MessageId::new(),
            session_id,
            author,
            text: text.into(),
            mode,
            created_at,
            reply_to: None,
            tags: Vec::new(),
            content_type: Some(CONTENT_TYPE_TEXT.to_string()),
        }
    }

    /// Mark this message as a reply to `id`.
    pub fn in_reply_to(mut self, id: MessageId) -> Self {
        self.reply_to = Some(id);
        self
    }

    pub fn is_from_user(&self) -> bool {
        self.author == Role::User
    }
}
