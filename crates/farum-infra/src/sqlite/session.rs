//! SQLite session repository implementation.

use farum_core::repository::SessionRepository;
use farum_core::request_context::RequestContext;
use farum_types::error::RepositoryError;
use farum_types::session::{InteractionMode, Session, SessionId, UserId};
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, guarded, parse_datetime, sql_limit};

/// SQLite-backed implementation of `SessionRepository`.
#[derive(Clone)]
pub struct SqliteSessionRepository {
    pool: DatabasePool,
}

impl SqliteSessionRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Session.
struct SessionRow {
    id: String,
    user_id: String,
    created_at: String,
    updated_at: String,
    preferred_mode: String,
    title: String,
}

impl SessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            preferred_mode: row.try_get("preferred_mode")?,
            title: row.try_get("title")?,
        })
    }

    fn into_session(self) -> Result<Session, RepositoryError> {
        let id: SessionId = self
            .id
            .parse()
            .map_err(|e| RepositoryError::Query(format!("invalid session id: {e}")))?;
        let preferred_mode: InteractionMode = self
            .preferred_mode
            .parse()
            .map_err(RepositoryError::Query)?;

        Ok(Session {
            id,
            user_id: UserId::new(self.user_id),
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
            preferred_mode,
            title: self.title,
        })
    }
}

fn decode(row: &sqlx::sqlite::SqliteRow) -> Result<Session, RepositoryError> {
    SessionRow::from_row(row)
        .map_err(|e| RepositoryError::Query(e.to_string()))?
        .into_session()
}

impl SessionRepository for SqliteSessionRepository {
    async fn create_session(
        &self,
        ctx: &RequestContext,
        session: &Session,
    ) -> Result<(), RepositoryError> {
        let query = sqlx::query(
            r#"INSERT INTO sessions (id, user_id, created_at, updated_at, preferred_mode, title)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(session.id.to_string())
        .bind(session.user_id.as_str())
        .bind(format_datetime(&session.created_at))
        .bind(format_datetime(&session.updated_at))
        .bind(session.preferred_mode.to_string())
        .bind(&session.title)
        .execute(&self.pool.writer);

        guarded(ctx, query).await?;
        Ok(())
    }

    async fn update_session(
        &self,
        ctx: &RequestContext,
        session: &Session,
    ) -> Result<(), RepositoryError> {
        let query = sqlx::query(
            r#"UPDATE sessions
               SET user_id = ?, created_at = ?, updated_at = ?, preferred_mode = ?, title = ?
               WHERE id = ?"#,
        )
        .bind(session.user_id.as_str())
        .bind(format_datetime(&session.created_at))
        .bind(format_datetime(&session.updated_at))
        .bind(session.preferred_mode.to_string())
        .bind(&session.title)
        .bind(session.id.to_string())
        .execute(&self.pool.writer);

        let result = guarded(ctx, query).await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn get_session(
        &self,
        ctx: &RequestContext,
        id: &SessionId,
    ) -> Result<Option<Session>, RepositoryError> {
        let query = sqlx::query("SELECT * FROM sessions WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader);

        guarded(ctx, query).await?.as_ref().map(decode).transpose()
    }

    async fn list_sessions_by_user(
        &self,
        ctx: &RequestContext,
        user_id: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<Session>, RepositoryError> {
        let query = sqlx::query(
            "SELECT * FROM sessions WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(user_id.as_str())
        .bind(sql_limit(limit))
        .fetch_all(&self.pool.reader);

        guarded(ctx, query).await?.iter().map(decode).collect()
    }
}
