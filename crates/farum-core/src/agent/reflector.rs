//! Reflector stage: closes the exchange with a short reflective message and
//! records it in the user's journal.
//!
//! The journal write is best effort. A failing tool never fails the stage;
//! it is logged and published as `PipelineEvent::JournalFailed` instead.

use farum_types::conversation::ConversationContext;
use farum_types::error::ConversationError;
use farum_types::event::PipelineEvent;
use serde_json::json;
use tracing::{debug, warn};

use super::stage::{AgentInput, AgentOutput, Stage, generate};
use crate::event::EventBus;
use crate::llm::ReplyGenerator;
use crate::request_context::RequestContext;
use crate::tool::{BoxTool, Tool, ToolContext};

pub struct Reflector<G: ReplyGenerator> {
    generator: G,
    journal: Option<BoxTool>,
    events: Option<EventBus>,
}

impl<G: ReplyGenerator> Reflector<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            journal: None,
            events: None,
        }
    }

    /// Record every reflection through `tool`.
    pub fn with_journal(mut self, tool: BoxTool) -> Self {
        self.journal = Some(tool);
        self
    }

    /// Publish journal outcomes on `events`.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    fn instruction(text: &str) -> String {
        format!(
            "You are Farum's Reflector agent. The Planner agent proposed an action plan.\n\
             Close the conversation with a short reflective message that helps the user \
             connect emotionally with the plan, and maybe ask one gentle journaling question.\n\n\
             Previous agent output:\n{text}"
        )
    }

    async fn record(
        &self,
        tool: &BoxTool,
        ctx: &RequestContext,
        reply: &str,
        context: &ConversationContext,
    ) {
        let tool_ctx = ToolContext {
            user_id: context.user_id.to_string(),
            session_id: context.session_id.to_string(),
            request_id: ctx.request_id,
        };
        let input = json!({
            "problem_summary": "",
            "reflection": reply,
            "mood_before": "",
            "mood_after": "",
            "actions": [],
        });

        let event = match tool.call(ctx, &tool_ctx, input).await {
            Ok(output) => {
                let entry_id = output
                    .get("entry_id")
                    .and_then(|v| v.as_str())
                    .and_then(|s| s.parse().ok());
                debug!(tool = tool.name(), "reflection journaled");
                PipelineEvent::JournalRecorded {
                    request_id: ctx.request_id,
                    session_id: context.session_id,
                    entry_id,
                }
            }
            Err(e) => {
                warn!(
                    tool = tool.name(),
                    session_id = %context.session_id,
                    error = %e,
                    "journal write failed; continuing without it"
                );
                PipelineEvent::JournalFailed {
                    request_id: ctx.request_id,
                    session_id: context.session_id,
                    error: e.to_string(),
                }
            }
        };

        if let Some(events) = &self.events {
            events.publish(event);
        }
    }
}

impl<G: ReplyGenerator> Stage for Reflector<G> {
    fn name(&self) -> &str {
        "reflector"
    }

    async fn run(
        &self,
        ctx: &RequestContext,
        input: AgentInput,
    ) -> Result<AgentOutput, ConversationError> {
        let prompt = Self::instruction(&input.text);
        let text = generate(&self.generator, ctx, &prompt, &input.context).await?;

        if let Some(tool) = &self.journal {
            self.record(tool, ctx, &text, &input.context).await;
        }

        Ok(AgentOutput {
            text,
            context: input.context,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farum_types::journal::ActionStatus;
    use farum_types::session::{InteractionMode, SessionId, UserId};

    use crate::testing::{FakeJournalRepo, FixedGenerator};
    use crate::tool::JournalTool;

    fn input() -> AgentInput {
        AgentInput {
            text: "1. Rest\n2. Walk".to_string(),
            context: ConversationContext {
                session_id: SessionId::new(),
                user_id: UserId::new("u1"),
                mode: InteractionMode::CheckIn,
                history: vec![],
            },
        }
    }

    #[tokio::test]
    async fn journals_reflection_and_publishes_event() {
        let repo = FakeJournalRepo::default();
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let reflector = Reflector::new(FixedGenerator::new("Be gentle with yourself."))
            .with_journal(BoxTool::new(JournalTool::new(repo.clone())))
            .with_events(bus);

        let input = input();
        let session_id = input.context.session_id;
        let out = reflector.run(&RequestContext::new(), input).await.unwrap();
        assert_eq!(out.text, "Be gentle with yourself.");

        let entries = repo.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].reflection, "Be gentle with yourself.");
        assert_eq!(entries[0].session_id, session_id);
        assert!(entries[0].problem_summary.is_empty());
        assert!(entries[0].action_plan.iter().all(|a| a.status == ActionStatus::Pending));
        assert!(entries[0].action_plan.is_empty());

        match rx.recv().await.unwrap() {
            PipelineEvent::JournalRecorded { entry_id, .. } => {
                assert_eq!(entry_id, Some(entries[0].id));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn journal_failure_is_swallowed_but_observable() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let reflector = Reflector::new(FixedGenerator::new("Reflection."))
            .with_journal(BoxTool::new(JournalTool::new(FakeJournalRepo::failing())))
            .with_events(bus);

        let input = input();
        let session_id = input.context.session_id;
        let out = reflector.run(&RequestContext::new(), input).await.unwrap();
        assert_eq!(out.text, "Reflection.");

        match rx.recv().await.unwrap() {
            PipelineEvent::JournalFailed {
                session_id: sid,
                error,
                ..
            } => {
                assert_eq!(sid, session_id);
                assert!(error.contains("journal unavailable"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn without_journal_no_event_is_published() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let generator = FixedGenerator::new("Reflection.");
        let reflector = Reflector::new(generator.clone()).with_events(bus);

        reflector.run(&RequestContext::new(), input()).await.unwrap();

        assert!(rx.try_recv().is_err());
        assert!(generator.prompts()[0].contains("Reflector agent"));
    }
}
