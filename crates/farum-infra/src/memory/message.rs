//! In-memory `MessageRepository`.

use std::collections::HashMap;
use std::sync::Arc;

use farum_core::repository::MessageRepository;
use farum_core::request_context::RequestContext;
use farum_types::error::RepositoryError;
use farum_types::message::Message;
use farum_types::session::SessionId;
use tokio::sync::RwLock;

use super::{keep_last, read, write};

/// Per-session message logs in append order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMessageRepository {
    messages: Arc<RwLock<HashMap<SessionId, Vec<Message>>>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MessageRepository for InMemoryMessageRepository {
    async fn append_message(
        &self,
        ctx: &RequestContext,
        message: &Message,
    ) -> Result<(), RepositoryError> {
        write(ctx, &self.messages)
            .await?
            .entry(message.session_id)
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn get_messages_by_session(
        &self,
        ctx: &RequestContext,
        session_id: &SessionId,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, RepositoryError> {
        let messages = read(ctx, &self.messages)
            .await?
            .get(session_id)
            .cloned()
            .unwrap_or_default();
        Ok(keep_last(messages, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use farum_types::message::Role;
    use farum_types::session::InteractionMode;

    fn make_message(session_id: SessionId, text: &str) -> Message {
        Message::new(session_id, Role::User, text, InteractionMode::CheckIn, Utc::now())
    }

    #[tokio::test]
    async fn test_append_and_read_in_order() {
        let repo = InMemoryMessageRepository::new();
        let ctx = RequestContext::new();
        let session_id = SessionId::new();
        for text in ["a", "b", "c"] {
            repo.append_message(&ctx, &make_message(session_id, text)).await.unwrap();
        }
        repo.append_message(&ctx, &make_message(SessionId::new(), "elsewhere"))
            .await
            .unwrap();

        let all = repo.get_messages_by_session(&ctx, &session_id, None).await.unwrap();
        let texts: Vec<&str> = all.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);

        let last_two = repo.get_messages_by_session(&ctx, &session_id, Some(2)).await.unwrap();
        let texts: Vec<&str> = last_two.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_unknown_session_is_empty() {
        let repo = InMemoryMessageRepository::new();
        let messages = repo
            .get_messages_by_session(&RequestContext::new(), &SessionId::new(), Some(5))
            .await
            .unwrap();
        assert!(messages.is_empty());
    }
}
