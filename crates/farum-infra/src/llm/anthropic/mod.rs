//! Anthropic Messages API backend.
//!
//! One non-streaming `POST /v1/messages` per generation. The API key is held
//! as a [`SecretString`] and only exposed while building request headers.

mod wire;

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use farum_core::llm::LlmProvider;
use farum_types::llm::{Completion, CompletionRequest, LlmError, ModelLimits};

use self::wire::{ErrorBody, MessagesRequest, MessagesResponse};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

pub struct AnthropicProvider {
    http: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    limits: ModelLimits,
}

impl AnthropicProvider {
    /// Build a provider for `model`; the model name only decides the
    /// output ceiling here, requests carry their own model field.
    pub fn new(api_key: SecretString, model: String) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            limits: limits_for(&model),
        })
    }

    /// Point at a proxy or a local stand-in.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("base_url", &self.base_url)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

fn limits_for(model: &str) -> ModelLimits {
    let max_output = match model {
        m if m.contains("opus") => 32_000,
        m if m.contains("sonnet") || m.contains("haiku") => 8_192,
        _ => 4_096,
    };
    ModelLimits {
        context_window: 200_000,
        max_output,
    }
}

/// Classify a failed response. `retry_after_secs` comes from the
/// `retry-after` header.
fn status_error(status: StatusCode, body: &str, retry_after_secs: Option<u64>) -> LlmError {
    let (kind, message) = match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => (parsed.error.kind, parsed.error.message),
        Err(_) => (String::from("unknown"), body.to_string()),
    };

    match status.as_u16() {
        401 | 403 => LlmError::AuthenticationFailed,
        429 => LlmError::RateLimited {
            retry_after_ms: retry_after_secs.map(|s| s.saturating_mul(1000)),
        },
        529 => LlmError::Overloaded(message),
        400 | 404 | 413 => LlmError::InvalidRequest(message),
        code => LlmError::Provider {
            message: format!("HTTP {code} ({kind}): {message}"),
        },
    }
}

impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn limits(&self) -> ModelLimits {
        self.limits
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        let response = self
            .http
            .post(self.messages_url())
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .json(&MessagesRequest::from(request))
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("request to Anthropic failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok());
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body, retry_after));
        }

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(e.to_string()))?;
        debug!(model = %body.model, blocks = body.content.len(), "anthropic response received");
        Ok(body.into_completion())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(model: &str) -> AnthropicProvider {
        AnthropicProvider::new(SecretString::from("test-key-not-real"), model.to_string()).unwrap()
    }

    #[test]
    fn limits_follow_model_family() {
        assert_eq!(provider("claude-sonnet-4-20250514").limits().max_output, 8_192);
        assert_eq!(provider("claude-opus-4-20250514").limits().max_output, 32_000);
        assert_eq!(provider("something-else").limits().max_output, 4_096);
    }

    #[test]
    fn base_url_override_tolerates_trailing_slash() {
        let p = provider("claude-haiku").with_base_url("http://localhost:8080/");
        assert_eq!(p.messages_url(), "http://localhost:8080/v1/messages");
    }

    #[test]
    fn debug_hides_the_key() {
        let rendered = format!("{:?}", provider("claude-haiku"));
        assert!(!rendered.contains("test-key-not-real"));
        assert!(rendered.contains("api.anthropic.com"));
    }

    #[test]
    fn status_errors_are_classified() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, "", None),
            LlmError::AuthenticationFailed
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, "", Some(3)),
            LlmError::RateLimited {
                retry_after_ms: Some(3000)
            }
        ));

        let overloaded = StatusCode::from_u16(529).unwrap();
        let body = r#"{"type":"error","error":{"type":"overloaded_error","message":"busy"}}"#;
        match status_error(overloaded, body, None) {
            LlmError::Overloaded(msg) => assert_eq!(msg, "busy"),
            other => panic!("unexpected: {other:?}"),
        }
        match status_error(StatusCode::BAD_REQUEST, "plain text", None) {
            LlmError::InvalidRequest(msg) => assert_eq!(msg, "plain text"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(
            status_error(StatusCode::INTERNAL_SERVER_ERROR, "", None),
            LlmError::Provider { .. }
        ));
    }
}
