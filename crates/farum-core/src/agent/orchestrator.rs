//! Reply pipeline orchestrator.
//!
//! `Orchestrator` runs an ordered list of stages as a strict left fold: the
//! running `(text, context)` starts as the user's message and the session
//! context, each stage's output replaces it, and the last stage's text is
//! the reply. There is no branching, skipping or retrying. The first stage
//! error aborts the run and is wrapped with the failing stage's name.
//! Lifecycle events are published to the `EventBus` when one is attached.

use std::time::Instant;

use farum_types::conversation::ConversationContext;
use farum_types::error::ConversationError;
use farum_types::event::PipelineEvent;
use tracing::{Instrument, error, info, info_span};

use super::listener::Listener;
use super::planner::Planner;
use super::reflector::Reflector;
use super::stage::{AgentInput, BoxStage, Stage};
use crate::event::EventBus;
use crate::llm::BoxReplyGenerator;
use crate::request_context::RequestContext;
use crate::tool::BoxTool;

/// Runs the reply pipeline for one user message.
#[derive(Debug)]
pub struct Orchestrator {
    stages: Vec<BoxStage>,
    events: Option<EventBus>,
}

impl Orchestrator {
    /// Create an orchestrator over `stages`, run in the given order.
    pub fn new(stages: Vec<BoxStage>) -> Self {
        Self {
            stages,
            events: None,
        }
    }

    /// The standard listener -> planner -> reflector pipeline.
    ///
    /// All three stages share `generator`. When `journal` is set the
    /// reflector records each reflection through it.
    pub fn default_pipeline(
        generator: BoxReplyGenerator,
        journal: Option<BoxTool>,
        events: EventBus,
    ) -> Self {
        let mut reflector = Reflector::new(generator.clone()).with_events(events.clone());
        if let Some(tool) = journal {
            reflector = reflector.with_journal(tool);
        }

        Self::new(vec![
            BoxStage::new(Listener::new(generator.clone())),
            BoxStage::new(Planner::new(generator)),
            BoxStage::new(reflector),
        ])
        .with_events(events)
    }

    /// Publish stage lifecycle events on `events`.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Names of the configured stages, in run order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    fn publish(&self, event: PipelineEvent) {
        if let Some(events) = &self.events {
            events.publish(event);
        }
    }

    /// Fold `text` through every stage and return the final text.
    pub async fn run(
        &self,
        ctx: &RequestContext,
        text: &str,
        context: ConversationContext,
    ) -> Result<String, ConversationError> {
        if self.stages.is_empty() {
            return Err(ConversationError::Configuration(
                "no stages configured in orchestrator".to_string(),
            ));
        }

        let session_id = context.session_id;
        info!(
            session_id = %session_id,
            user_id = %context.user_id,
            stages = self.stages.len(),
            "pipeline started"
        );

        let mut input = AgentInput {
            text: text.to_string(),
            context,
        };

        for stage in &self.stages {
            let name = stage.name().to_string();
            let span = info_span!("pipeline.stage", stage = %name, session_id = %session_id);
            let started = Instant::now();

            self.publish(PipelineEvent::StageStarted {
                request_id: ctx.request_id,
                session_id,
                stage: name.clone(),
            });

            match stage.run(ctx, input).instrument(span).await {
                Ok(output) => {
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    info!(stage = %name, elapsed_ms, "stage completed");
                    self.publish(PipelineEvent::StageCompleted {
                        request_id: ctx.request_id,
                        session_id,
                        stage: name,
                        duration_ms: elapsed_ms,
                    });
                    input = AgentInput {
                        text: output.text,
                        context: output.context,
                    };
                }
                Err(e) => {
                    error!(stage = %name, error = %e, "stage failed");
                    self.publish(PipelineEvent::StageFailed {
                        request_id: ctx.request_id,
                        session_id,
                        stage: name.clone(),
                        error: e.to_string(),
                    });
                    return Err(ConversationError::stage(name, e));
                }
            }
        }

        info!(session_id = %session_id, "pipeline finished");
        Ok(input.text)
    }
}
