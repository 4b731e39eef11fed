//! `journal_store` -- persists a structured journal entry for the user.
//!
//! Expected input shape (every field optional):
//!
//! ```json
//! {
//!   "problem_summary": "...",
//!   "reflection": "...",
//!   "mood_before": "anxious",
//!   "mood_after": "calmer",
//!   "actions": [
//!     { "description": "Walk for ten minutes", "status": "pending", "notes": "after dinner" }
//!   ]
//! }
//! ```

use chrono::{DateTime, Utc};
use farum_types::error::ToolError;
use farum_types::journal::{ActionStatus, JournalAction, JournalEntry, JournalEntryId};
use farum_types::session::{SessionId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use super::{Tool, ToolContext};
use crate::repository::JournalRepository;
use crate::request_context::RequestContext;

/// Registered name of the journal tool.
pub const JOURNAL_TOOL_NAME: &str = "journal_store";

/// Result of a successful `journal_store` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalToolOutput {
    pub status: String,
    pub entry_id: JournalEntryId,
    pub session_id: SessionId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub actions_count: usize,
}

/// Tool that writes journal entries through a [`JournalRepository`].
pub struct JournalTool<J: JournalRepository> {
    repo: J,
}

impl<J: JournalRepository> JournalTool<J> {
    pub fn new(repo: J) -> Self {
        Self { repo }
    }

    /// Validate the input, build one entry and persist it.
    pub async fn record(
        &self,
        ctx: &RequestContext,
        tool_ctx: &ToolContext,
        input: &Value,
    ) -> Result<JournalToolOutput, ToolError> {
        if tool_ctx.user_id.trim().is_empty() || tool_ctx.session_id.trim().is_empty() {
            return Err(ToolError::Validation(format!(
                "{JOURNAL_TOOL_NAME}: missing user_id or session_id in tool context"
            )));
        }
        let session_id: SessionId = tool_ctx.session_id.parse().map_err(|_| {
            ToolError::Validation(format!(
                "{JOURNAL_TOOL_NAME}: invalid session_id '{}'",
                tool_ctx.session_id
            ))
        })?;

        let now = Utc::now();
        let entry = JournalEntry {
            id: JournalEntryId::new(),
            session_id,
            user_id: UserId::new(tool_ctx.user_id.clone()),
            created_at: now,
            updated_at: now,
            problem_summary: string_field(input, "problem_summary"),
            action_plan: parse_actions(input.get("actions"), now),
            reflection: string_field(input, "reflection"),
            mood_before: string_field(input, "mood_before"),
            mood_after: string_field(input, "mood_after"),
        };

        self.repo.append_journal_entry(ctx, &entry).await?;

        info!(
            entry_id = %entry.id,
            session_id = %entry.session_id,
            actions = entry.action_plan.len(),
            "journal entry stored"
        );

        Ok(JournalToolOutput {
            status: "ok".to_string(),
            entry_id: entry.id,
            session_id: entry.session_id,
            user_id: entry.user_id,
            created_at: entry.created_at,
            actions_count: entry.action_plan.len(),
        })
    }
}

impl<J: JournalRepository> Tool for JournalTool<J> {
    fn name(&self) -> &str {
        JOURNAL_TOOL_NAME
    }

    async fn call(
        &self,
        ctx: &RequestContext,
        tool_ctx: &ToolContext,
        input: Value,
    ) -> Result<Value, ToolError> {
        let output = self.record(ctx, tool_ctx, &input).await?;
        serde_json::to_value(output).map_err(|e| ToolError::Serialization(e.to_string()))
    }
}

fn string_field(obj: &Value, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Turn the raw `actions` value into journal actions, in submission order.
///
/// Non-object items, items without a description and items with an
/// unrecognised status are skipped. A missing status means pending.
fn parse_actions(raw: Option<&Value>, now: DateTime<Utc>) -> Vec<JournalAction> {
    let Some(items) = raw.and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            if !item.is_object() {
                debug!(index, "skipping non-object journal action");
                return None;
            }

            let description = string_field(item, "description");
            if description.trim().is_empty() {
                debug!(index, "skipping journal action without description");
                return None;
            }

            let status_raw = string_field(item, "status");
            let status = if status_raw.trim().is_empty() {
                ActionStatus::Pending
            } else {
                match status_raw.parse::<ActionStatus>() {
                    Ok(status) => status,
                    Err(e) => {
                        debug!(index, error = %e, "skipping journal action");
                        return None;
                    }
                }
            };

            Some(JournalAction {
                id: Uuid::now_v7(),
                description,
                status,
                notes: string_field(item, "notes"),
                created_at: now,
                updated_at: now,
            })
        })
        .collect()
}
