//! LLM provider implementations.
//!
//! Concrete implementations of the [`LlmProvider`](farum_core::llm::LlmProvider)
//! trait defined in `farum-core`: Anthropic Claude over HTTP and an offline
//! mock. [`create_provider`] picks one from [`LlmSettings`];
//! [`build_reply_generator`] wraps it for the reply pipeline.

pub mod anthropic;
pub mod mock;

use secrecy::SecretString;
use tracing::info;

use farum_core::llm::{BoxLlmProvider, BoxReplyGenerator, LlmReplyGenerator};
use farum_types::config::LlmSettings;
use farum_types::llm::{LlmError, ProviderType};

use self::anthropic::AnthropicProvider;
use self::mock::MockProvider;

/// Create a [`BoxLlmProvider`] from [`LlmSettings`].
///
/// # Errors
///
/// Returns `AuthenticationFailed` if the provider needs an API key and none
/// is provided.
pub fn create_provider(
    settings: &LlmSettings,
    api_key: Option<SecretString>,
) -> Result<BoxLlmProvider, LlmError> {
    match settings.provider {
        ProviderType::Mock => Ok(BoxLlmProvider::new(MockProvider::new())),
        ProviderType::Anthropic => {
            let key = api_key.ok_or(LlmError::AuthenticationFailed)?;
            let provider = AnthropicProvider::new(key, settings.model.clone())?;
            Ok(BoxLlmProvider::new(provider))
        }
    }
}

/// Provider plus prompt assembly, ready to back every pipeline stage.
pub fn build_reply_generator(
    settings: &LlmSettings,
    api_key: Option<SecretString>,
) -> Result<BoxReplyGenerator, LlmError> {
    let provider = create_provider(settings, api_key)?;
    info!(
        provider = %settings.provider,
        model = %settings.model,
        temperature = settings.temperature,
        max_tokens = settings.max_tokens,
        "reply generator configured"
    );
    let generator = LlmReplyGenerator::new(provider, settings.model.clone())
        .with_temperature(settings.temperature)
        .with_max_tokens(settings.max_tokens);
    Ok(BoxReplyGenerator::new(generator))
}
