//! End-to-end conversation flow over the real storage backends.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use farum_core::agent::Orchestrator;
use farum_core::conversation::ConversationService;
use farum_core::conversation::service::WELCOME_MESSAGE;
use farum_core::event::EventBus;
use farum_core::journal::JournalService;
use farum_core::llm::{BoxReplyGenerator, ReplyGenerator};
use farum_core::request_context::RequestContext;
use farum_core::tool::{BoxTool, JournalTool};
use farum_infra::sqlite::DatabasePool;
use farum_infra::store::{JournalStore, MessageStore, SessionStore, Stores};
use farum_types::conversation::ConversationContext;
use farum_types::error::ConversationError;
use farum_types::event::PipelineEvent;
use farum_types::llm::LlmError;
use farum_types::message::Role;
use farum_types::session::{InteractionMode, UserId};

/// Generator that answers with `"{stage}:{n}"`, `n` counting calls.
#[derive(Clone, Default)]
struct ScriptedGenerator {
    calls: Arc<Mutex<usize>>,
}

impl ReplyGenerator for ScriptedGenerator {
    async fn generate_reply(
        &self,
        _ctx: &RequestContext,
        prompt: &str,
        _context: &ConversationContext,
    ) -> Result<String, LlmError> {
        let stage = if prompt.starts_with("You are Farum's Listener") {
            "listener"
        } else if prompt.starts_with("You are Farum's Planner") {
            "planner"
        } else {
            "reflector"
        };
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        Ok(format!("{stage}:{}", *calls))
    }
}

/// Generator that never finishes on its own.
#[derive(Clone, Copy)]
struct HangingGenerator;

impl ReplyGenerator for HangingGenerator {
    async fn generate_reply(
        &self,
        ctx: &RequestContext,
        _prompt: &str,
        _context: &ConversationContext,
    ) -> Result<String, LlmError> {
        ctx.guard(std::future::pending::<()>())
            .await
            .ok_or(LlmError::Cancelled)?;
        Ok(String::new())
    }
}

struct App {
    conversation: Arc<ConversationService<SessionStore, MessageStore>>,
    journal: JournalService<JournalStore>,
    events: EventBus,
}

fn build_app(stores: Stores, generator: BoxReplyGenerator) -> App {
    let events = EventBus::default();
    let tool = BoxTool::new(JournalTool::new(stores.journal.clone()));
    let orchestrator = Orchestrator::default_pipeline(generator, Some(tool), events.clone());
    App {
        conversation: Arc::new(ConversationService::new(
            stores.sessions,
            stores.messages,
            orchestrator,
        )),
        journal: JournalService::new(stores.journal),
        events,
    }
}

async fn sqlite_stores() -> (Stores, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("farum.db").display());
    let pool = DatabasePool::new(&url).await.unwrap();
    (Stores::sqlite(pool), dir)
}

async fn full_exchange(app: App) {
    let ctx = RequestContext::new();
    let user = UserId::new("ana");
    let session = app
        .conversation
        .start_session(&ctx, user.clone(), InteractionMode::DeepDive, "Work")
        .await
        .unwrap();
    let mut events = app.events.subscribe_session(session.id);
    let out = app
        .conversation
        .send_message(&ctx, &session.id, &user, "I can't switch off after work")
        .await
        .unwrap();

    assert_eq!(out.agent_message.text, "reflector:3");
    assert_eq!(out.agent_message.reply_to, Some(out.user_message.id));
    assert_eq!(out.agent_message.mode, InteractionMode::DeepDive);

    let timeline = app
        .conversation
        .get_session_timeline(&ctx, &session.id, 0)
        .await
        .unwrap();
    let authors: Vec<Role> = timeline.messages.iter().map(|m| m.author).collect();
    assert_eq!(authors, vec![Role::Agent, Role::User, Role::Agent]);
    assert_eq!(timeline.messages[0].text, WELCOME_MESSAGE);
    assert!(timeline.session.updated_at >= out.agent_message.created_at);

    let entries = app.journal.get_user_journal(&ctx, &user, 0).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].reflection, "reflector:3");
    assert_eq!(entries[0].session_id, session.id);

    assert_eq!(completed_stages(events.drain()), vec!["listener", "planner", "reflector"]);
}

fn completed_stages(events: Vec<PipelineEvent>) -> Vec<String> {
    events
        .into_iter()
        .filter_map(|event| match event {
            PipelineEvent::StageCompleted { stage, .. } => Some(stage),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn full_exchange_in_memory() {
    let app = build_app(
        Stores::in_memory(),
        BoxReplyGenerator::new(ScriptedGenerator::default()),
    );
    full_exchange(app).await;
}

#[tokio::test]
async fn full_exchange_sqlite() {
    let (stores, _dir) = sqlite_stores().await;
    let app = build_app(stores, BoxReplyGenerator::new(ScriptedGenerator::default()));
    full_exchange(app).await;
}

async fn concurrent_sends(stores: Stores) {
    const SESSIONS: usize = 8;
    let app = build_app(stores, BoxReplyGenerator::new(ScriptedGenerator::default()));
    let ctx = RequestContext::new();

    let mut ids = Vec::new();
    let mut subscriptions = Vec::new();
    for i in 0..SESSIONS {
        let session = app
            .conversation
            .start_session(&ctx, UserId::new(format!("user-{i}")), InteractionMode::CheckIn, "")
            .await
            .unwrap();
        ids.push(session.id);
        subscriptions.push(app.events.subscribe_session(session.id));
    }

    let mut tasks = tokio::task::JoinSet::new();
    for (i, id) in ids.iter().copied().enumerate() {
        let service = Arc::clone(&app.conversation);
        tasks.spawn(async move {
            let ctx = RequestContext::new();
            let user = UserId::new(format!("user-{i}"));
            service
                .send_message(&ctx, &id, &user, &format!("message {i}"))
                .await
                .map(|_| ())
        });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    for id in ids {
        let timeline = app
            .conversation
            .get_session_timeline(&ctx, &id, 0)
            .await
            .unwrap();
        assert_eq!(timeline.messages.len(), 3);
        assert!(!timeline.has_dangling_user_turn());
    }

    // Interleaved runs still publish each session's stages in order.
    for mut events in subscriptions {
        let events = events.drain();
        assert!(events.iter().any(|e| matches!(e, PipelineEvent::JournalRecorded { .. })));
        assert_eq!(completed_stages(events), vec!["listener", "planner", "reflector"]);
    }
}

#[tokio::test]
async fn concurrent_sends_in_memory() {
    concurrent_sends(Stores::in_memory()).await;
}

#[tokio::test]
async fn concurrent_sends_sqlite() {
    let (stores, _dir) = sqlite_stores().await;
    concurrent_sends(stores).await;
}

#[tokio::test]
async fn deadline_aborts_send_and_leaves_user_turn() {
    let stores = Stores::in_memory();
    let app = build_app(stores, BoxReplyGenerator::new(HangingGenerator));
    let setup = RequestContext::new();
    let user = UserId::new("ana");
    let session = app
        .conversation
        .start_session(&setup, user.clone(), InteractionMode::CheckIn, "")
        .await
        .unwrap();

    let ctx = RequestContext::new().with_timeout(Duration::from_millis(200));
    let err = app
        .conversation
        .send_message(&ctx, &session.id, &user, "hello?")
        .await
        .unwrap_err();
    assert!(matches!(err, ConversationError::Cancelled));

    let timeline = app
        .conversation
        .get_session_timeline(&setup, &session.id, 0)
        .await
        .unwrap();
    assert_eq!(timeline.messages.len(), 2);
    assert!(timeline.has_dangling_user_turn());
}

#[tokio::test]
async fn cancelled_context_writes_nothing() {
    let app = build_app(
        Stores::in_memory(),
        BoxReplyGenerator::new(ScriptedGenerator::default()),
    );
    let ctx = RequestContext::new();
    ctx.cancel();

    let err = app
        .conversation
        .start_session(&ctx, UserId::new("ana"), InteractionMode::CheckIn, "")
        .await
        .unwrap_err();
    assert!(matches!(err, ConversationError::Cancelled));

    let sessions = app
        .conversation
        .list_sessions(&RequestContext::new(), &UserId::new("ana"), 0)
        .await
        .unwrap();
    assert!(sessions.is_empty());
}
