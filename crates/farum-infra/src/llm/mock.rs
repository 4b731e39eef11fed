//! Offline provider.
//!
//! Deterministic, no network. It answers with a companion sentence that
//! quotes the last line of the user block, so local runs and tests drive
//! the whole pipeline without an API key.

use farum_core::llm::LlmProvider;
use farum_types::llm::{
    Completion, CompletionRequest, FinishReason, LlmError, ModelLimits, TokenUsage,
};

const LIMITS: ModelLimits = ModelLimits {
    context_window: 32_000,
    max_output: 4_096,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct MockProvider;

impl MockProvider {
    pub fn new() -> Self {
        Self
    }

    /// The companion sentence for `prompt`.
    pub fn reply_for(prompt: &str) -> String {
        let said = prompt
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .last()
            .unwrap_or_default();
        let said = said.strip_prefix("User:").map(str::trim).unwrap_or(said);
        format!("I hear you. You said {said:?}. Tell me a bit more about how that makes you feel.")
    }
}

fn word_count(text: &str) -> u32 {
    u32::try_from(text.split_whitespace().count()).unwrap_or(u32::MAX)
}

impl LlmProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn limits(&self) -> ModelLimits {
        LIMITS
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        if request.user.trim().is_empty() {
            return Err(LlmError::InvalidRequest("empty user block".to_string()));
        }

        let text = Self::reply_for(&request.user);
        let usage = TokenUsage {
            input: word_count(&request.system) + word_count(&request.user),
            output: word_count(&text),
        };

        Ok(Completion {
            id: format!("mock-{}", uuid::Uuid::now_v7()),
            text,
            model: request.model.clone(),
            finish: FinishReason::Complete,
            usage,
        })
    }
}
