//! Planner stage: turns the clarified concern into a short action plan.

use farum_types::error::ConversationError;
use tracing::debug;

use super::stage::{AgentInput, AgentOutput, Stage, generate};
use crate::llm::ReplyGenerator;
use crate::request_context::RequestContext;

pub struct Planner<G: ReplyGenerator> {
    generator: G,
}

impl<G: ReplyGenerator> Planner<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    fn instruction(text: &str) -> String {
        format!(
            "You are Farum's Planner agent. The Listener agent has clarified the user's concern.\n\
             Create a short, concrete action plan with 2-4 steps the user can follow.\n\
             Be realistic, kind and practical.\n\nPrevious agent output:\n{text}"
        )
    }
}

impl<G: ReplyGenerator> Stage for Planner<G> {
    fn name(&self) -> &str {
        "planner"
    }

    async fn run(
        &self,
        ctx: &RequestContext,
        input: AgentInput,
    ) -> Result<AgentOutput, ConversationError> {
        let prompt = Self::instruction(&input.text);
        let text = generate(&self.generator, ctx, &prompt, &input.context).await?;
        debug!(chars = text.len(), "planner produced plan");
        Ok(AgentOutput {
            text,
            context: input.context,
        })
    }
}
