//! Stage contract for the reply pipeline.
//!
//! Every stage maps `(text, context)` to `(text, context)`. The orchestrator
//! feeds each stage's output into the next one.

use std::future::Future;
use std::pin::Pin;

use farum_types::conversation::ConversationContext;
use farum_types::error::ConversationError;
use farum_types::llm::LlmError;

use crate::llm::ReplyGenerator;
use crate::request_context::RequestContext;

/// Running state handed to a stage.
#[derive(Debug, Clone)]
pub struct AgentInput {
    pub text: String,
    pub context: ConversationContext,
}

/// What a stage hands to the next one.
#[derive(Debug, Clone)]
pub struct AgentOutput {
    pub text: String,
    pub context: ConversationContext,
}

/// One step of the reply pipeline.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait Stage: Send + Sync {
    /// Short stable name used in logs, events and error messages.
    fn name(&self) -> &str;

    fn run(
        &self,
        ctx: &RequestContext,
        input: AgentInput,
    ) -> impl Future<Output = Result<AgentOutput, ConversationError>> + Send;
}

/// Object-safe version of [`Stage`] with boxed futures.
pub trait StageDyn: Send + Sync {
    fn name(&self) -> &str;

    fn run_boxed<'a>(
        &'a self,
        ctx: &'a RequestContext,
        input: AgentInput,
    ) -> Pin<Box<dyn Future<Output = Result<AgentOutput, ConversationError>> + Send + 'a>>;
}

impl<T: Stage> StageDyn for T {
    fn name(&self) -> &str {
        Stage::name(self)
    }

    fn run_boxed<'a>(
        &'a self,
        ctx: &'a RequestContext,
        input: AgentInput,
    ) -> Pin<Box<dyn Future<Output = Result<AgentOutput, ConversationError>> + Send + 'a>> {
        Box::pin(self.run(ctx, input))
    }
}

/// Type-erased stage so a pipeline can hold a heterogeneous list.
pub struct BoxStage {
    inner: Box<dyn StageDyn>,
}

impl BoxStage {
    pub fn new<T: Stage + 'static>(stage: T) -> Self {
        Self {
            inner: Box::new(stage),
        }
    }
}

impl Stage for BoxStage {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn run(
        &self,
        ctx: &RequestContext,
        input: AgentInput,
    ) -> Result<AgentOutput, ConversationError> {
        self.inner.run_boxed(ctx, input).await
    }
}

impl std::fmt::Debug for BoxStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxStage")
            .field("name", &self.inner.name())
            .finish()
    }
}

/// Run one generation call on behalf of a stage.
///
/// A blank reply is reported as a generation error rather than passed on.
pub(crate) async fn generate<G: ReplyGenerator>(
    generator: &G,
    ctx: &RequestContext,
    prompt: &str,
    context: &ConversationContext,
) -> Result<String, ConversationError> {
    let reply = generator.generate_reply(ctx, prompt, context).await?;
    if reply.trim().is_empty() {
        return Err(ConversationError::Generation(LlmError::EmptyResponse));
    }
    Ok(reply)
}
