//! Model call types.
//!
//! Every generation in Farum is a single exchange: one system block (persona,
//! mode, recent history) and one user block (the stage instruction). The
//! shapes here carry that exchange and its outcome; provider wire formats
//! live in farum-infra.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One generation call as the pipeline sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

/// What came back from the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    /// Provider-assigned response id.
    pub id: String,
    pub text: String,
    pub model: String,
    pub finish: FinishReason,
    #[serde(default)]
    pub usage: TokenUsage,
}

/// Why the model stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// The model ended its turn.
    Complete,
    /// The output token cap cut the reply short.
    Truncated,
    StopSequence,
}

impl FinishReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FinishReason::Complete => "complete",
            FinishReason::Truncated => "truncated",
            FinishReason::StopSequence => "stop_sequence",
        }
    }
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: u32,
    pub output: u32,
}

impl TokenUsage {
    pub fn total(self) -> u32 {
        self.input.saturating_add(self.output)
    }
}

/// Token ceilings of the model behind a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelLimits {
    pub context_window: u32,
    pub max_output: u32,
}

impl ModelLimits {
    /// `requested` output tokens, capped to what the model allows.
    pub fn clamp_output(self, requested: u32) -> u32 {
        requested.min(self.max_output)
    }
}

/// Errors from model calls and reply generation.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("unreadable provider response: {0}")]
    Deserialization(String),

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("provider overloaded: {0}")]
    Overloaded(String),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("model returned an empty reply")]
    EmptyResponse,

    #[error("generation cancelled")]
    Cancelled,
}

impl LlmError {
    /// Whether the same call could succeed if tried again later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmError::RateLimited { .. } | LlmError::Overloaded(_) | LlmError::Provider { .. }
        )
    }
}

/// Which backend serves reply generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    /// Deterministic offline echo, no network.
    Mock,
    Anthropic,
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProviderType::Mock => "mock",
            ProviderType::Anthropic => "anthropic",
        })
    }
}

impl FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(ProviderType::Mock),
            "anthropic" => Ok(ProviderType::Anthropic),
            other => Err(format!("unknown LLM provider '{other}'")),
        }
    }
}
