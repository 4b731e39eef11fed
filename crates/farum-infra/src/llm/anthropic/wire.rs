//! Messages API bodies.
//!
//! Requests borrow from the [`CompletionRequest`] they are built from; only
//! the response is owned.

use serde::{Deserialize, Serialize};

use farum_types::llm::{Completion, CompletionRequest, FinishReason, TokenUsage};

#[derive(Debug, Serialize)]
pub(crate) struct MessagesRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "is_blank")]
    pub system: &'a str,
    pub messages: [Turn<'a>; 1],
    pub temperature: f64,
}

fn is_blank(s: &&str) -> bool {
    s.trim().is_empty()
}

#[derive(Debug, Serialize)]
pub(crate) struct Turn<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

impl<'a> From<&'a CompletionRequest> for MessagesRequest<'a> {
    fn from(request: &'a CompletionRequest) -> Self {
        Self {
            model: &request.model,
            max_tokens: request.max_tokens,
            system: &request.system,
            messages: [Turn {
                role: "user",
                content: &request.user,
            }],
            temperature: request.temperature,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessagesResponse {
    pub id: String,
    pub model: String,
    pub content: Vec<Block>,
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Usage,
}

/// Only text blocks carry reply content.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum Block {
    Text {
        text: String,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Usage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
}

impl MessagesResponse {
    pub fn into_completion(self) -> Completion {
        let text = self
            .content
            .into_iter()
            .filter_map(|block| match block {
                Block::Text { text } => Some(text),
                Block::Unsupported => None,
            })
            .collect();
        let finish = match self.stop_reason.as_deref() {
            Some("max_tokens") => FinishReason::Truncated,
            Some("stop_sequence") => FinishReason::StopSequence,
            _ => FinishReason::Complete,
        };
        Completion {
            id: self.id,
            text,
            model: self.model,
            finish,
            usage: TokenUsage {
                input: self.usage.input_tokens,
                output: self.usage.output_tokens,
            },
        }
    }
}

/// Body sent with non-2xx statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}
