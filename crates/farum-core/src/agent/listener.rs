//! Listener stage: restates the user's concern clearly and with empathy.

use farum_types::error::ConversationError;
use tracing::debug;

use super::stage::{AgentInput, AgentOutput, Stage, generate};
use crate::llm::ReplyGenerator;
use crate::request_context::RequestContext;

pub struct Listener<G: ReplyGenerator> {
    generator: G,
}

impl<G: ReplyGenerator> Listener<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    fn instruction(text: &str) -> String {
        format!(
            "You are Farum's Listener agent. Listen carefully, clarify the user's concern \
             and restate it in a clear, empathetic way.\n\nUser: {text}"
        )
    }
}

impl<G: ReplyGenerator> Stage for Listener<G> {
    fn name(&self) -> &str {
        "listener"
    }

    async fn run(
        &self,
        ctx: &RequestContext,
        input: AgentInput,
    ) -> Result<AgentOutput, ConversationError> {
        let prompt = Self::instruction(&input.text);
        let text = generate(&self.generator, ctx, &prompt, &input.context).await?;
        debug!(chars = text.len(), "listener reframed concern");
        Ok(AgentOutput {
            text,
            context: input.context,
        })
    }
}
