//! ReplyGenerator -- the generation port used by pipeline stages.
//!
//! Stages never talk to an `LlmProvider` directly; they ask a
//! `ReplyGenerator` to "produce reply text for this instruction in this
//! conversation". `LlmReplyGenerator` adapts any provider to that port by
//! assembling the prompt and unwrapping the completion.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use farum_types::conversation::ConversationContext;
use farum_types::llm::{CompletionRequest, FinishReason, LlmError};
use tracing::{Instrument, field, info_span, warn};

use super::prompt::build_prompt;
use super::provider::LlmProvider;
use crate::request_context::RequestContext;

/// Default sampling temperature for companion replies.
pub const DEFAULT_TEMPERATURE: f64 = 0.6;

/// Default output token cap for companion replies.
pub const DEFAULT_MAX_TOKENS: u32 = 512;

/// Produce reply text from an instruction and a conversation context.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition). Implementors
/// return `LlmError::Cancelled` when `ctx` is cancelled mid-call.
pub trait ReplyGenerator: Send + Sync {
    fn generate_reply(
        &self,
        ctx: &RequestContext,
        prompt: &str,
        context: &ConversationContext,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;
}

/// Object-safe version of [`ReplyGenerator`] with boxed futures.
pub trait ReplyGeneratorDyn: Send + Sync {
    fn generate_reply_boxed<'a>(
        &'a self,
        ctx: &'a RequestContext,
        prompt: &'a str,
        context: &'a ConversationContext,
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>>;
}

impl<T: ReplyGenerator> ReplyGeneratorDyn for T {
    fn generate_reply_boxed<'a>(
        &'a self,
        ctx: &'a RequestContext,
        prompt: &'a str,
        context: &'a ConversationContext,
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>> {
        Box::pin(self.generate_reply(ctx, prompt, context))
    }
}

/// Type-erased, shareable reply generator.
///
/// Cloning shares the same underlying generator, so one instance can back
/// every stage of a pipeline.
#[derive(Clone)]
pub struct BoxReplyGenerator {
    inner: Arc<dyn ReplyGeneratorDyn>,
}

impl BoxReplyGenerator {
    pub fn new<T: ReplyGenerator + 'static>(generator: T) -> Self {
        Self {
            inner: Arc::new(generator),
        }
    }
}

impl ReplyGenerator for BoxReplyGenerator {
    async fn generate_reply(
        &self,
        ctx: &RequestContext,
        prompt: &str,
        context: &ConversationContext,
    ) -> Result<String, LlmError> {
        self.inner.generate_reply_boxed(ctx, prompt, context).await
    }
}

impl std::fmt::Debug for BoxReplyGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxReplyGenerator").finish_non_exhaustive()
    }
}

/// Adapts an [`LlmProvider`] to the [`ReplyGenerator`] port.
pub struct LlmReplyGenerator<P: LlmProvider> {
    provider: P,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl<P: LlmProvider> LlmReplyGenerator<P> {
    pub fn new(provider: P, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// The completion request for one generation call. The output cap never
    /// exceeds what the provider's model accepts.
    pub fn build_request(&self, prompt: &str, context: &ConversationContext) -> CompletionRequest {
        let assembled = build_prompt(prompt, context);
        CompletionRequest {
            model: self.model.clone(),
            system: assembled.system,
            user: assembled.user,
            max_tokens: self.provider.limits().clamp_output(self.max_tokens),
            temperature: self.temperature,
        }
    }
}

impl<P: LlmProvider> ReplyGenerator for LlmReplyGenerator<P> {
    async fn generate_reply(
        &self,
        ctx: &RequestContext,
        prompt: &str,
        context: &ConversationContext,
    ) -> Result<String, LlmError> {
        let request = self.build_request(prompt, context);

        let span = info_span!(
            "gen_ai.complete",
            gen_ai.operation.name = "chat",
            gen_ai.provider.name = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = request.temperature,
            gen_ai.response.id = field::Empty,
            gen_ai.response.finish_reasons = field::Empty,
            gen_ai.usage.input_tokens = field::Empty,
            gen_ai.usage.output_tokens = field::Empty,
        );

        let outcome = ctx
            .guard(self.provider.complete(&request))
            .instrument(span.clone())
            .await
            .ok_or(LlmError::Cancelled)?;

        let completion = match outcome {
            Ok(completion) => completion,
            Err(e) => {
                span.in_scope(|| warn!(error = %e, transient = e.is_transient(), "model call failed"));
                return Err(e);
            }
        };

        span.record("gen_ai.response.id", completion.id.as_str());
        span.record("gen_ai.response.finish_reasons", completion.finish.as_str());
        span.record("gen_ai.usage.input_tokens", completion.usage.input);
        span.record("gen_ai.usage.output_tokens", completion.usage.output);
        if completion.finish == FinishReason::Truncated {
            span.in_scope(|| warn!(max_tokens = request.max_tokens, "reply hit the output token cap"));
        }

        let text = completion.text.trim();
        if text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use farum_types::llm::{Completion, ModelLimits, TokenUsage};
    use farum_types::session::{InteractionMode, SessionId, UserId};

    use crate::llm::provider::BoxLlmProvider;

    struct CannedProvider {
        reply: String,
        finish: FinishReason,
        delay: Duration,
        max_output: u32,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl CannedProvider {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                finish: FinishReason::Complete,
                delay: Duration::ZERO,
                max_output: 4_096,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl LlmProvider for CannedProvider {
        fn name(&self) -> &'static str {
            "canned"
        }

        fn limits(&self) -> ModelLimits {
            ModelLimits {
                context_window: 8_000,
                max_output: self.max_output,
            }
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
            self.seen.lock().unwrap().push(request.clone());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(Completion {
                id: "resp-1".to_string(),
                text: self.reply.clone(),
                model: request.model.clone(),
                finish: self.finish,
                usage: TokenUsage { input: 10, output: 3 },
            })
        }
    }

    fn context() -> ConversationContext {
        ConversationContext {
            session_id: SessionId::new(),
            user_id: UserId::new("u1"),
            mode: InteractionMode::DeepDive,
            history: vec![],
        }
    }

    #[test]
    fn request_uses_defaults_and_assembled_prompt() {
        let generator = LlmReplyGenerator::new(CannedProvider::new("ok"), "test-model");
        let request = generator.build_request("what now?", &context());

        assert_eq!(request.model, "test-model");
        assert_eq!(request.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(request.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(request.user, "New user message:\nwhat now?");
        assert!(request.system.contains("deep_dive"));
    }

    #[test]
    fn output_cap_follows_model_limits() {
        let mut provider = CannedProvider::new("ok");
        provider.max_output = 128;
        let generator = LlmReplyGenerator::new(provider, "m").with_max_tokens(1_000);
        assert_eq!(generator.build_request("hi", &context()).max_tokens, 128);
    }

    #[tokio::test]
    async fn reply_is_trimmed() {
        let generator = LlmReplyGenerator::new(CannedProvider::new("  hi there \n"), "m");
        let reply = generator
            .generate_reply(&RequestContext::new(), "hello", &context())
            .await
            .unwrap();
        assert_eq!(reply, "hi there");
    }

    #[tokio::test]
    async fn truncated_reply_is_still_returned() {
        let mut provider = CannedProvider::new("half a thou");
        provider.finish = FinishReason::Truncated;
        let generator = LlmReplyGenerator::new(provider, "m");
        let reply = generator
            .generate_reply(&RequestContext::new(), "hello", &context())
            .await
            .unwrap();
        assert_eq!(reply, "half a thou");
    }

    #[tokio::test]
    async fn blank_reply_is_an_error() {
        let generator = LlmReplyGenerator::new(CannedProvider::new("   "), "m");
        let err = generator
            .generate_reply(&RequestContext::new(), "hello", &context())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_cancels_generation() {
        let mut provider = CannedProvider::new("late");
        provider.delay = Duration::from_secs(60);
        let generator = LlmReplyGenerator::new(provider, "m");
        let ctx = RequestContext::new().with_timeout(Duration::from_secs(1));

        let err = generator
            .generate_reply(&ctx, "hello", &context())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Cancelled));
    }

    #[tokio::test]
    async fn boxed_generator_delegates() {
        let generator = BoxReplyGenerator::new(
            LlmReplyGenerator::new(BoxLlmProvider::new(CannedProvider::new("boxed")), "m")
                .with_temperature(0.2)
                .with_max_tokens(64),
        );
        let shared = generator.clone();
        let reply = shared
            .generate_reply(&RequestContext::new(), "hello", &context())
            .await
            .unwrap();
        assert_eq!(reply, "boxed");
    }
}
