//! In-memory `SessionRepository`.

use std::collections::HashMap;
use std::sync::Arc;

use farum_core::repository::SessionRepository;
use farum_core::request_context::RequestContext;
use farum_types::error::RepositoryError;
use farum_types::session::{Session, SessionId, UserId};
use tokio::sync::RwLock;

use super::{read, write};

#[derive(Debug, Clone, Default)]
pub struct InMemorySessionRepository {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionRepository for InMemorySessionRepository {
    async fn create_session(
        &self,
        ctx: &RequestContext,
        session: &Session,
    ) -> Result<(), RepositoryError> {
        let mut sessions = write(ctx, &self.sessions).await?;
        if sessions.contains_key(&session.id) {
            return Err(RepositoryError::Conflict(format!(
                "session '{}' already exists",
                session.id
            )));
        }
        sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn update_session(
        &self,
        ctx: &RequestContext,
        session: &Session,
    ) -> Result<(), RepositoryError> {
        let mut sessions = write(ctx, &self.sessions).await?;
        match sessions.get_mut(&session.id) {
            Some(existing) => {
                *existing = session.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn get_session(
        &self,
        ctx: &RequestContext,
        id: &SessionId,
    ) -> Result<Option<Session>, RepositoryError> {
        Ok(read(ctx, &self.sessions).await?.get(id).cloned())
    }

    async fn list_sessions_by_user(
        &self,
        ctx: &RequestContext,
        user_id: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<Session>, RepositoryError> {
        let mut sessions: Vec<Session> = read(ctx, &self.sessions)
            .await?
            .values()
            .filter(|s| &s.user_id == user_id)
            .cloned()
            .collect();
        // Ids are time-ordered, so they break ties between equal timestamps.
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        if let Some(n) = limit {
            sessions.truncate(n);
        }
        Ok(sessions)
    }
}
