//! MessageRepository trait definition.

use farum_types::error::RepositoryError;
use farum_types::message::Message;
use farum_types::session::SessionId;

use crate::request_context::RequestContext;

/// Repository trait for the append-only message timeline.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait MessageRepository: Send + Sync {
    /// Append a message to its session's timeline.
    fn append_message(
        &self,
        ctx: &RequestContext,
        message: &Message,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a session's messages in chronological order (oldest first).
    ///
    /// `None` returns the whole timeline; `Some(n)` returns only the most
    /// recent `n` messages, still oldest first.
    fn get_messages_by_session(
        &self,
        ctx: &RequestContext,
        session_id: &SessionId,
        limit: Option<usize>,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;
}
