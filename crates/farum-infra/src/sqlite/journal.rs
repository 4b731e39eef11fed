//! SQLite journal repository implementation.
//!
//! The action plan is stored as a JSON array column; entries are read back
//! in append order.

use farum_core::repository::JournalRepository;
use farum_core::request_context::RequestContext;
use farum_types::error::RepositoryError;
use farum_types::journal::{JournalAction, JournalEntry, JournalEntryId};
use farum_types::session::{SessionId, UserId};
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, guarded, parse_datetime, sql_limit};

/// SQLite-backed implementation of `JournalRepository`.
#[derive(Clone)]
pub struct SqliteJournalRepository {
    pool: DatabasePool,
}

impl SqliteJournalRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct JournalEntryRow {
    id: String,
    session_id: String,
    user_id: String,
    created_at: String,
    updated_at: String,
    problem_summary: String,
    action_plan: String,
    reflection: String,
    mood_before: String,
    mood_after: String,
}

impl JournalEntryRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            user_id: row.try_get("user_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            problem_summary: row.try_get("problem_summary")?,
            action_plan: row.try_get("action_plan")?,
            reflection: row.try_get("reflection")?,
            mood_before: row.try_get("mood_before")?,
            mood_after: row.try_get("mood_after")?,
        })
    }

    fn into_entry(self) -> Result<JournalEntry, RepositoryError> {
        let id: JournalEntryId = self
            .id
            .parse()
            .map_err(|e| RepositoryError::Query(format!("invalid journal entry id: {e}")))?;
        let session_id: SessionId = self
            .session_id
            .parse()
            .map_err(|e| RepositoryError::Query(format!("invalid session_id: {e}")))?;
        let action_plan: Vec<JournalAction> = serde_json::from_str(&self.action_plan)
            .map_err(|e| RepositoryError::Query(format!("invalid action_plan: {e}")))?;

        Ok(JournalEntry {
            id,
            session_id,
            user_id: UserId::new(self.user_id),
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
            problem_summary: self.problem_summary,
            action_plan,
            reflection: self.reflection,
            mood_before: self.mood_before,
            mood_after: self.mood_after,
        })
    }
}

fn decode(row: &sqlx::sqlite::SqliteRow) -> Result<JournalEntry, RepositoryError> {
    JournalEntryRow::from_row(row)
        .map_err(|e| RepositoryError::Query(e.to_string()))?
        .into_entry()
}

impl JournalRepository for SqliteJournalRepository {
    async fn append_journal_entry(
        &self,
        ctx: &RequestContext,
        entry: &JournalEntry,
    ) -> Result<(), RepositoryError> {
        let action_plan = serde_json::to_string(&entry.action_plan)
            .map_err(|e| RepositoryError::Query(format!("failed to encode action_plan: {e}")))?;

        let query = sqlx::query(
            r#"INSERT INTO journal_entries (id, session_id, user_id, created_at, updated_at,
                   problem_summary, action_plan, reflection, mood_before, mood_after)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(entry.id.to_string())
        .bind(entry.session_id.to_string())
        .bind(entry.user_id.as_str())
        .bind(format_datetime(&entry.created_at))
        .bind(format_datetime(&entry.updated_at))
        .bind(&entry.problem_summary)
        .bind(action_plan)
        .bind(&entry.reflection)
        .bind(&entry.mood_before)
        .bind(&entry.mood_after)
        .execute(&self.pool.writer);

        guarded(ctx, query).await?;
        Ok(())
    }

    async fn list_journal_entries_by_user(
        &self,
        ctx: &RequestContext,
        user_id: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<JournalEntry>, RepositoryError> {
        let query = sqlx::query(
            r#"SELECT * FROM (
                   SELECT * FROM journal_entries WHERE user_id = ? ORDER BY seq DESC LIMIT ?
               ) ORDER BY seq ASC"#,
        )
        .bind(user_id.as_str())
        .bind(sql_limit(limit))
        .fetch_all(&self.pool.reader);

        guarded(ctx, query).await?.iter().map(decode).collect()
    }
}
