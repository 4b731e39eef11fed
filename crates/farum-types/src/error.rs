use thiserror::Error;

use crate::llm::LlmError;

/// Errors from repository operations (used by trait definitions in farum-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("operation cancelled")]
    Cancelled,
}

/// Errors surfaced by the conversation engine.
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("storage error during {operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: RepositoryError,
    },

    #[error("generation failed: {0}")]
    Generation(#[source] LlmError),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("agent {stage} failed: {source}")]
    Stage {
        stage: String,
        #[source]
        source: Box<ConversationError>,
    },

    #[error("request cancelled")]
    Cancelled,
}

impl ConversationError {
    /// Wrap a repository failure, folding cancellation into `Cancelled`.
    pub fn storage(operation: &'static str, source: RepositoryError) -> Self {
        match source {
            RepositoryError::Cancelled => ConversationError::Cancelled,
            source => ConversationError::Storage { operation, source },
        }
    }

    /// Wrap a stage failure with the stage's name.
    ///
    /// Cancellation is never wrapped so callers can match on it directly.
    pub fn stage(stage: impl Into<String>, source: ConversationError) -> Self {
        match source {
            ConversationError::Cancelled => ConversationError::Cancelled,
            source => ConversationError::Stage {
                stage: stage.into(),
                source: Box::new(source),
            },
        }
    }

    /// The innermost error, looking through stage wrappers.
    pub fn root_cause(&self) -> &ConversationError {
        match self {
            ConversationError::Stage { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Name of the stage that failed, if this error came out of the pipeline.
    pub fn failed_stage(&self) -> Option<&str> {
        match self {
            ConversationError::Stage { stage, .. } => Some(stage),
            _ => None,
        }
    }
}

impl From<LlmError> for ConversationError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Cancelled => ConversationError::Cancelled,
            err => ConversationError::Generation(err),
        }
    }
}

/// Errors from tool invocations.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid tool input: {0}")]
    Validation(String),

    #[error("tool storage error: {0}")]
    Storage(#[from] RepositoryError),

    #[error("tool output serialization error: {0}")]
    Serialization(String),
}
