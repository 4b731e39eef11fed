//! Application error type mapping to HTTP status codes and envelope format.

use std::time::Instant;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use farum_types::error::ConversationError;

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Errors from the conversation and journal services.
    Conversation(ConversationError),
    /// Malformed request input caught before reaching a service.
    Validation(String),
}

impl From<ConversationError> for AppError {
    fn from(e: ConversationError) -> Self {
        AppError::Conversation(e)
    }
}

impl AppError {
    /// Status, machine-readable code and message for this error.
    ///
    /// Stage failures are classified by their root cause, so a generation
    /// failure inside any stage is a bad gateway.
    pub fn classify(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conversation(e) => {
                let message = e.to_string();
                match e.root_cause() {
                    ConversationError::NotFound { .. } => {
                        (StatusCode::NOT_FOUND, "NOT_FOUND", message)
                    }
                    ConversationError::Validation(_) => {
                        (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
                    }
                    ConversationError::Cancelled => {
                        (StatusCode::REQUEST_TIMEOUT, "REQUEST_TIMEOUT", message)
                    }
                    ConversationError::Generation(_) => {
                        (StatusCode::BAD_GATEWAY, "GENERATION_ERROR", message)
                    }
                    ConversationError::Storage { .. } => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", message)
                    }
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message),
                }
            }
        }
    }
}

/// An [`AppError`] tagged with the request it failed.
#[derive(Debug)]
pub struct HandlerError {
    pub error: AppError,
    pub request_id: String,
    pub started: Instant,
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.error.classify();
        if status.is_server_error() {
            tracing::error!(request_id = %self.request_id, code, error = %message, "request failed");
        } else {
            tracing::debug!(request_id = %self.request_id, code, error = %message, "request rejected");
        }
        ApiResponse::error(status, code, &message, self.request_id, self.started).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farum_types::error::RepositoryError;
    use farum_types::llm::LlmError;

    fn status(e: ConversationError) -> StatusCode {
        AppError::from(e).classify().0
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status(ConversationError::NotFound {
                entity: "session",
                id: "x".into()
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(ConversationError::Validation("blank".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status(ConversationError::Cancelled), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(
            status(ConversationError::Generation(LlmError::AuthenticationFailed)),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status(ConversationError::storage("append_message", RepositoryError::Connection)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(ConversationError::Configuration("no stages".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_stage_generation_failure_is_bad_gateway() {
        let err = ConversationError::stage(
            "planner",
            ConversationError::Generation(LlmError::Overloaded("busy".into())),
        );
        let (status, code, message) = AppError::from(err).classify();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(code, "GENERATION_ERROR");
        assert!(message.contains("planner"));
    }

    #[test]
    fn test_handler_error_response() {
        let resp = HandlerError {
            error: AppError::Validation("bad id".into()),
            request_id: "req-1".into(),
            started: Instant::now(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
