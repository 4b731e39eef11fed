//! SessionRepository trait definition.

use farum_types::error::RepositoryError;
use farum_types::session::{Session, SessionId, UserId};

use crate::request_context::RequestContext;

/// Repository trait for session persistence.
///
/// Implementations live in farum-infra (`InMemorySessionRepository`,
/// `SqliteSessionRepository`). Uses native async fn in traits (RPITIT,
/// Rust 2024 edition). Ids and timestamps are assigned by the caller;
/// implementations store what they are given.
pub trait SessionRepository: Send + Sync {
    /// Persist a new session. A duplicate id is `RepositoryError::Conflict`.
    fn create_session(
        &self,
        ctx: &RequestContext,
        session: &Session,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Overwrite an existing session. An unknown id is `RepositoryError::NotFound`.
    fn update_session(
        &self,
        ctx: &RequestContext,
        session: &Session,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a session by id. Absence is `Ok(None)`, not an error.
    fn get_session(
        &self,
        ctx: &RequestContext,
        id: &SessionId,
    ) -> impl std::future::Future<Output = Result<Option<Session>, RepositoryError>> + Send;

    /// List a user's sessions, newest `created_at` first.
    ///
    /// `limit` of `None` returns every session.
    fn list_sessions_by_user(
        &self,
        ctx: &RequestContext,
        user_id: &UserId,
        limit: Option<usize>,
    ) -> impl std::future::Future<Output = Result<Vec<Session>, RepositoryError>> + Send;
}
