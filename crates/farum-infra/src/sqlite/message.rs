//! SQLite message repository implementation.
//!
//! Messages keep their append order through the `seq` column; the
//! "last N" window is selected newest-first and flipped back to
//! oldest-first in the outer query.

use farum_core::repository::MessageRepository;
use farum_core::request_context::RequestContext;
use farum_types::error::RepositoryError;
use farum_types::message::{Message, MessageId, Role};
use farum_types::session::{InteractionMode, SessionId};
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, guarded, parse_datetime, sql_limit};

/// SQLite-backed implementation of `MessageRepository`.
#[derive(Clone)]
pub struct SqliteMessageRepository {
    pool: DatabasePool,
}

impl SqliteMessageRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Message.
struct MessageRow {
    id: String,
    session_id: String,
    author: String,
    text: String,
    mode: String,
    created_at: String,
    reply_to: Option<String>,
    tags: String,
    content_type: Option<String>,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            author: row.try_get("author")?,
            text: row.try_get("text")?,
            mode: row.try_get("mode")?,
            created_at: row.try_get("created_at")?,
            reply_to: row.try_get("reply_to")?,
            tags: row.try_get("tags")?,
            content_type: row.try_get("content_type")?,
        })
    }

    fn into_message(self) -> Result<Message, RepositoryError> {
        let id: MessageId = self
            .id
            .parse()
            .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?;
        let session_id: SessionId = self
            .session_id
            .parse()
            .map_err(|e| RepositoryError::Query(format!("invalid session_id: {e}")))?;
        let author: Role = self.author.parse().map_err(RepositoryError::Query)?;
        let mode: InteractionMode = self.mode.parse().map_err(RepositoryError::Query)?;
        let reply_to = self
            .reply_to
            .as_deref()
            .map(str::parse::<MessageId>)
            .transpose()
            .map_err(|e| RepositoryError::Query(format!("invalid reply_to: {e}")))?;
        let tags: Vec<String> = serde_json::from_str(&self.tags)
            .map_err(|e| RepositoryError::Query(format!("invalid tags: {e}")))?;

        Ok(Message {
            id,
            session_id,
            author,
            text: self.text,
            mode,
            created_at: parse_datetime(&self.created_at)?,
            reply_to,
            tags,
            content_type: self.content_type,
        })
    }
}

fn decode(row: &sqlx::sqlite::SqliteRow) -> Result<Message, RepositoryError> {
    MessageRow::from_row(row)
        .map_err(|e| RepositoryError::Query(e.to_string()))?
        .into_message()
}

impl MessageRepository for SqliteMessageRepository {
    async fn append_message(
        &self,
        ctx: &RequestContext,
        message: &Message,
    ) -> Result<(), RepositoryError> {
        let tags = serde_json::to_string(&message.tags)
            .map_err(|e| RepositoryError::Query(format!("failed to encode tags: {e}")))?;

        let query = sqlx::query(
            r#"INSERT INTO messages (id, session_id, author, text, mode, created_at, reply_to, tags, content_type)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(message.id.to_string())
        .bind(message.session_id.to_string())
        .bind(message.author.to_string())
        .bind(&message.text)
        .bind(message.mode.to_string())
        .bind(format_datetime(&message.created_at))
        .bind(message.reply_to.map(|id| id.to_string()))
        .bind(tags)
        .bind(&message.content_type)
        .execute(&self.pool.writer);

        guarded(ctx, query).await?;
        Ok(())
    }

    async fn get_messages_by_session(
        &self,
        ctx: &RequestContext,
        session_id: &SessionId,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, RepositoryError> {
        let query = sqlx::query(
            r#"SELECT * FROM (
                   SELECT * FROM messages WHERE session_id = ? ORDER BY seq DESC LIMIT ?
               ) ORDER BY seq ASC"#,
        )
        .bind(session_id.to_string())
        .bind(sql_limit(limit))
        .fetch_all(&self.pool.reader);

        guarded(ctx, query).await?.iter().map(decode).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_support::test_pool;
    use chrono::Utc;

    #[tokio::test]
    async fn test_append_and_window() {
        let repo = SqliteMessageRepository::new(test_pool().await);
        let ctx = RequestContext::new();
        let session_id = SessionId::new();
        let now = Utc::now();

        let first = Message::new(session_id, Role::Agent, "welcome", InteractionMode::CheckIn, now);
        let second = Message::new(session_id, Role::User, "hi", InteractionMode::CheckIn, now);
        let mut third = Message::new(session_id, Role::Agent, "hello", InteractionMode::CheckIn, now)
            .in_reply_to(second.id);
        third.tags = vec!["greeting".to_string()];
        for m in [&first, &second, &third] {
            repo.append_message(&ctx, m).await.unwrap();
        }

        let all = repo.get_messages_by_session(&ctx, &session_id, None).await.unwrap();
        assert_eq!(all, vec![first.clone(), second.clone(), third.clone()]);

        let window = repo.get_messages_by_session(&ctx, &session_id, Some(2)).await.unwrap();
        assert_eq!(window, vec![second, third]);
    }

    #[tokio::test]
    async fn test_duplicate_id_is_conflict() {
        let repo = SqliteMessageRepository::new(test_pool().await);
        let ctx = RequestContext::new();
        let message = Message::new(
            SessionId::new(),
            Role::User,
            "once",
            InteractionMode::CheckIn,
            Utc::now(),
        );
        repo.append_message(&ctx, &message).await.unwrap();

        let err = repo.append_message(&ctx, &message).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }
}
