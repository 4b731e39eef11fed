//! Conversation service orchestrating session lifecycle and message persistence.
//!
//! ConversationService coordinates the session and message repositories with
//! the reply `Orchestrator`: creating sessions, persisting each user turn,
//! building the conversation context, persisting the agent's reply and
//! serving timelines.
//!
//! Sending a message is not transactional. The user turn is durable before
//! the pipeline runs, so a generation or storage failure after that point
//! leaves a user message without a reply (see
//! `Timeline::has_dangling_user_turn`).

use chrono::Utc;
use farum_types::conversation::{ConversationContext, Timeline};
use farum_types::error::ConversationError;
use farum_types::message::{Message, Role};
use farum_types::session::{InteractionMode, Session, SessionId, UserId};
use serde::Serialize;
use tracing::{Instrument, debug, error, info};

use crate::agent::Orchestrator;
use crate::repository::{MessageRepository, SessionRepository};
use crate::request_context::RequestContext;

/// Number of recent messages handed to the pipeline by default.
pub const DEFAULT_HISTORY_WINDOW: usize = 20;

/// First message of every session.
pub const WELCOME_MESSAGE: &str = "Hi, I'm Farum. What would you like to work on today?";

/// Both turns of a completed exchange.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageOutput {
    pub user_message: Message,
    pub agent_message: Message,
}

/// A new session and the welcome message written with it.
#[derive(Debug, Clone, Serialize)]
pub struct StartSessionOutput {
    pub session: Session,
    pub welcome_message: Message,
}

/// Orchestrates session lifecycle, message persistence and reply generation.
///
/// Generic over `SessionRepository` and `MessageRepository` to maintain
/// clean architecture (farum-core never depends on farum-infra).
pub struct ConversationService<S: SessionRepository, M: MessageRepository> {
    sessions: S,
    messages: M,
    orchestrator: Orchestrator,
    history_window: usize,
}

impl<S: SessionRepository, M: MessageRepository> ConversationService<S, M> {
    /// Create a new conversation service with the given repositories and pipeline.
    pub fn new(sessions: S, messages: M, orchestrator: Orchestrator) -> Self {
        Self {
            sessions,
            messages,
            orchestrator,
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }

    /// Override the number of recent messages used as pipeline context.
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window.max(1);
        self
    }

    /// Access the session repository.
    pub fn sessions(&self) -> &S {
        &self.sessions
    }

    /// Access the message repository.
    pub fn messages(&self) -> &M {
        &self.messages
    }

    // --- Session lifecycle ---

    /// Create a session and greet the user with a welcome message.
    ///
    /// The session's `created_at`, `updated_at` and the welcome message all
    /// share one timestamp.
    pub async fn start_session(
        &self,
        ctx: &RequestContext,
        user_id: UserId,
        preferred_mode: InteractionMode,
        title: impl Into<String>,
    ) -> Result<Session, ConversationError> {
        self.open_session(ctx, user_id, preferred_mode, title)
            .await
            .map(|output| output.session)
    }

    /// [`start_session`](Self::start_session), also returning the welcome
    /// message as written.
    pub async fn open_session(
        &self,
        ctx: &RequestContext,
        user_id: UserId,
        preferred_mode: InteractionMode,
        title: impl Into<String>,
    ) -> Result<StartSessionOutput, ConversationError> {
        let title = title.into();
        async move {
            if user_id.is_empty() {
                return Err(ConversationError::Validation("user_id is required".to_string()));
            }

            let now = Utc::now();
            let session = Session {
                id: SessionId::new(),
                user_id,
                created_at: now,
                updated_at: now,
                preferred_mode,
                title,
            };

            self.sessions
                .create_session(ctx, &session)
                .await
                .map_err(|e| {
                    error!(error = %e, "failed to create session");
                    ConversationError::storage("create_session", e)
                })?;

            let welcome = Message::new(session.id, Role::Agent, WELCOME_MESSAGE, session.preferred_mode, now);
            self.messages
                .append_message(ctx, &welcome)
                .await
                .map_err(|e| {
                    error!(session_id = %session.id, error = %e, "failed to append welcome message");
                    ConversationError::storage("append_message", e)
                })?;

            info!(
                session_id = %session.id,
                user_id = %session.user_id,
                mode = %session.preferred_mode,
                "session started"
            );
            Ok(StartSessionOutput {
                session,
                welcome_message: welcome,
            })
        }
        .instrument(ctx.span())
        .await
    }

    /// Get a session by id, failing with `NotFound` when it does not exist.
    pub async fn get_session(
        &self,
        ctx: &RequestContext,
        session_id: &SessionId,
    ) -> Result<Session, ConversationError> {
        self.sessions
            .get_session(ctx, session_id)
            .await
            .map_err(|e| ConversationError::storage("get_session", e))?
            .ok_or_else(|| ConversationError::NotFound {
                entity: "session",
                id: session_id.to_string(),
            })
    }

    /// List a user's sessions, newest first. `limit <= 0` returns all.
    pub async fn list_sessions(
        &self,
        ctx: &RequestContext,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<Session>, ConversationError> {
        async move {
            if user_id.is_empty() {
                return Err(ConversationError::Validation("user_id is required".to_string()));
            }
            let sessions = self
                .sessions
                .list_sessions_by_user(ctx, user_id, positive_limit(limit))
                .await
                .map_err(|e| ConversationError::storage("list_sessions_by_user", e))?;
            debug!(user_id = %user_id, count = sessions.len(), "listed sessions");
            Ok(sessions)
        }
        .instrument(ctx.span())
        .await
    }

    // --- Message exchange ---

    /// Persist a user message, run the reply pipeline and persist the reply.
    ///
    /// An unknown session fails with `NotFound` before anything is written.
    /// Pipeline errors are returned as-is and leave no agent message behind.
    pub async fn send_message(
        &self,
        ctx: &RequestContext,
        session_id: &SessionId,
        user_id: &UserId,
        text: &str,
    ) -> Result<SendMessageOutput, ConversationError> {
        async move {
            if text.trim().is_empty() {
                return Err(ConversationError::Validation("message text is required".to_string()));
            }

            let mut session = self.get_session(ctx, session_id).await?;
            if !user_id.is_empty() && user_id != &session.user_id {
                debug!(
                    session_id = %session.id,
                    caller = %user_id,
                    owner = %session.user_id,
                    "message sent by a user other than the session owner"
                );
            }

            info!(
                session_id = %session.id,
                user_id = %session.user_id,
                mode = %session.preferred_mode,
                "sending message"
            );

            let user_message = Message::new(
                session.id,
                Role::User,
                text,
                session.preferred_mode,
                Utc::now(),
            );
            self.messages
                .append_message(ctx, &user_message)
                .await
                .map_err(|e| {
                    error!(error = %e, "failed to append user message");
                    ConversationError::storage("append_message", e)
                })?;

            let history = self
                .messages
                .get_messages_by_session(ctx, &session.id, Some(self.history_window))
                .await
                .map_err(|e| {
                    error!(error = %e, "failed to load history");
                    ConversationError::storage("get_messages_by_session", e)
                })?;

            let context = ConversationContext::for_session(&session, history);
            let reply = self.orchestrator.run(ctx, text, context).await.map_err(|e| {
                error!(error = %e, "reply pipeline failed");
                e
            })?;

            let replied_at = Utc::now().max(user_message.created_at);
            let agent_message = Message::new(
                session.id,
                Role::Agent,
                reply,
                session.preferred_mode,
                replied_at,
            )
            .in_reply_to(user_message.id);
            self.messages
                .append_message(ctx, &agent_message)
                .await
                .map_err(|e| {
                    error!(error = %e, "failed to append agent message");
                    ConversationError::storage("append_message", e)
                })?;

            session.touch(agent_message.created_at);
            self.sessions
                .update_session(ctx, &session)
                .await
                .map_err(|e| {
                    error!(error = %e, "failed to update session");
                    ConversationError::storage("update_session", e)
                })?;

            info!(session_id = %session.id, "send message completed");
            Ok(SendMessageOutput {
                user_message,
                agent_message,
            })
        }
        .instrument(ctx.span())
        .await
    }

    /// A session with its messages, oldest first.
    ///
    /// `limit <= 0` returns the whole timeline; otherwise only the most
    /// recent `limit` messages.
    pub async fn get_session_timeline(
        &self,
        ctx: &RequestContext,
        session_id: &SessionId,
        limit: i64,
    ) -> Result<Timeline, ConversationError> {
        async move {
            let session = self.get_session(ctx, session_id).await?;
            let messages = self
                .messages
                .get_messages_by_session(ctx, session_id, positive_limit(limit))
                .await
                .map_err(|e| {
                    error!(session_id = %session_id, error = %e, "failed to get messages");
                    ConversationError::storage("get_messages_by_session", e)
                })?;

            info!(
                session_id = %session_id,
                limit,
                message_count = messages.len(),
                "fetched session timeline"
            );
            Ok(Timeline { session, messages })
        }
        .instrument(ctx.span())
        .await
    }
}

/// Map the external "non-positive means everything" convention to `Option`.
fn positive_limit(limit: i64) -> Option<usize> {
    usize::try_from(limit).ok().filter(|n| *n > 0)
}
