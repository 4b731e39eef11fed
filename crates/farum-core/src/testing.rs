//! In-process fakes shared by unit tests in this crate.

use std::sync::{Arc, Mutex};

use farum_types::conversation::ConversationContext;
use farum_types::error::RepositoryError;
use farum_types::journal::JournalEntry;
use farum_types::llm::LlmError;
use farum_types::message::Message;
use farum_types::session::{Session, SessionId, UserId};

use crate::llm::ReplyGenerator;
use crate::repository::{JournalRepository, MessageRepository, SessionRepository};
use crate::request_context::RequestContext;

#[derive(Clone, Default)]
pub struct FakeJournalRepo {
    entries: Arc<Mutex<Vec<JournalEntry>>>,
    fail: bool,
}

impl FakeJournalRepo {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn entries(&self) -> Vec<JournalEntry> {
        self.entries.lock().unwrap().clone()
    }
}

impl JournalRepository for FakeJournalRepo {
    async fn append_journal_entry(
        &self,
        _ctx: &RequestContext,
        entry: &JournalEntry,
    ) -> Result<(), RepositoryError> {
        if self.fail {
            return Err(RepositoryError::Query("journal unavailable".to_string()));
        }
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn list_journal_entries_by_user(
        &self,
        _ctx: &RequestContext,
        user_id: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<JournalEntry>, RepositoryError> {
        let mut out: Vec<JournalEntry> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| &e.user_id == user_id)
            .cloned()
            .collect();
        if let Some(n) = limit {
            let skip = out.len().saturating_sub(n);
            out.drain(..skip);
        }
        Ok(out)
    }
}

/// Session + message store with an optional write failure switch.
#[derive(Clone, Default)]
pub struct FakeStore {
    pub sessions: Arc<Mutex<Vec<Session>>>,
    pub messages: Arc<Mutex<Vec<Message>>>,
    /// Number of successful message appends before every append fails.
    pub fail_appends_after: Option<usize>,
}

impl FakeStore {
    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().unwrap().clone()
    }

    pub fn session_writes(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

impl SessionRepository for FakeStore {
    async fn create_session(
        &self,
        _ctx: &RequestContext,
        session: &Session,
    ) -> Result<(), RepositoryError> {
        let mut sessions = self.sessions.lock().unwrap();
        if sessions.iter().any(|s| s.id == session.id) {
            return Err(RepositoryError::Conflict(session.id.to_string()));
        }
        sessions.push(session.clone());
        Ok(())
    }

    async fn update_session(
        &self,
        _ctx: &RequestContext,
        session: &Session,
    ) -> Result<(), RepositoryError> {
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.iter_mut().find(|s| s.id == session.id) {
            Some(existing) => {
                *existing = session.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn get_session(
        &self,
        _ctx: &RequestContext,
        id: &SessionId,
    ) -> Result<Option<Session>, RepositoryError> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| &s.id == id)
            .cloned())
    }

    async fn list_sessions_by_user(
        &self,
        _ctx: &RequestContext,
        user_id: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<Session>, RepositoryError> {
        let mut out: Vec<Session> = self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| &s.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(n) = limit {
            out.truncate(n);
        }
        Ok(out)
    }
}

impl MessageRepository for FakeStore {
    async fn append_message(
        &self,
        _ctx: &RequestContext,
        message: &Message,
    ) -> Result<(), RepositoryError> {
        let mut messages = self.messages.lock().unwrap();
        if self.fail_appends_after.is_some_and(|n| messages.len() >= n) {
            return Err(RepositoryError::Connection);
        }
        messages.push(message.clone());
        Ok(())
    }

    async fn get_messages_by_session(
        &self,
        _ctx: &RequestContext,
        session_id: &SessionId,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, RepositoryError> {
        let mut out: Vec<Message> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| &m.session_id == session_id)
            .cloned()
            .collect();
        if let Some(n) = limit {
            let skip = out.len().saturating_sub(n);
            out.drain(..skip);
        }
        Ok(out)
    }
}

/// Generator that answers every call with the same text and records the
/// prompt and context of each call.
#[derive(Clone)]
pub struct FixedGenerator {
    pub reply: String,
    pub prompts: Arc<Mutex<Vec<String>>>,
    pub contexts: Arc<Mutex<Vec<ConversationContext>>>,
}

impl FixedGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Arc::new(Mutex::new(Vec::new())),
            contexts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn contexts(&self) -> Vec<ConversationContext> {
        self.contexts.lock().unwrap().clone()
    }
}

impl ReplyGenerator for FixedGenerator {
    async fn generate_reply(
        &self,
        _ctx: &RequestContext,
        prompt: &str,
        context: &ConversationContext,
    ) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.contexts.lock().unwrap().push(context.clone());
        Ok(self.reply.clone())
    }
}

/// Generator that always fails with a provider error.
#[derive(Clone, Copy)]
pub struct FailingGenerator;

impl ReplyGenerator for FailingGenerator {
    async fn generate_reply(
        &self,
        _ctx: &RequestContext,
        _prompt: &str,
        _context: &ConversationContext,
    ) -> Result<String, LlmError> {
        Err(LlmError::Provider {
            message: "model unavailable".to_string(),
        })
    }
}
