//! Journal types for Farum.
//!
//! A journal entry is a structured record of a user's reflection: the
//! problem they brought, an action plan, and how they felt before and after.
//! Entries are written only by the journal tool and are append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::session::{SessionId, UserId};

/// Unique identifier for a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JournalEntryId(pub Uuid);

impl JournalEntryId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for JournalEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JournalEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JournalEntryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Progress of a single planned action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Pending,
    Done,
}

impl Default for ActionStatus {
    fn default() -> Self {
        ActionStatus::Pending
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionStatus::Pending => write!(f, "pending"),
            ActionStatus::Done => write!(f, "done"),
        }
    }
}

impl FromStr for ActionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(ActionStatus::Pending),
            "done" => Ok(ActionStatus::Done),
            other => Err(format!("invalid action status: '{other}'")),
        }
    }
}

/// One step of a journal entry's action plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalAction {
    pub id: Uuid,
    pub description: String,
    pub status: ActionStatus,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A structured reflection record tied to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: JournalEntryId,
    pub session_id: SessionId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub problem_summary: String,
    /// Planned actions in submission order.
    #[serde(default)]
    pub action_plan: Vec<JournalAction>,
    #[serde(default)]
    pub reflection: String,
    #[serde(default)]
    pub mood_before: String,
    #[serde(default)]
    pub mood_after: String,
}
