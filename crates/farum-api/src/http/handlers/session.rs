//! Session HTTP handlers.
//!
//! Endpoints:
//! - POST /api/v1/sessions                - Start a session
//! - GET  /api/v1/sessions/{id}           - Session with its timeline
//! - POST /api/v1/sessions/{id}/messages  - Send a message, get the reply
//! - GET  /api/v1/users/{id}/sessions     - List a user's sessions

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use farum_core::conversation::{SendMessageOutput, StartSessionOutput};
use farum_types::conversation::Timeline;
use farum_types::session::{InteractionMode, Session, SessionId, UserId};

use super::{LimitQuery, RequestScope};
use crate::http::error::{AppError, HandlerError};
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for starting a session.
#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    #[serde(default)]
    pub user_id: String,
    /// Parsed leniently; anything unrecognised means check-in.
    #[serde(default)]
    pub preferred_mode: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Request body for sending a message.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub text: String,
}

fn parse_session_id(scope: &RequestScope, raw: &str) -> Result<SessionId, HandlerError> {
    raw.parse::<SessionId>()
        .map_err(|_| scope.fail(AppError::Validation(format!("invalid session id: {raw}"))))
}

/// POST /api/v1/sessions - Start a session and return it with its welcome message.
pub async fn start_session(
    State(state): State<AppState>,
    Json(body): Json<StartSessionRequest>,
) -> Result<ApiResponse<StartSessionOutput>, HandlerError> {
    let scope = RequestScope::new(&state);
    let mode = body
        .preferred_mode
        .as_deref()
        .map(InteractionMode::parse_lenient)
        .unwrap_or_default();

    let output = state
        .conversation
        .open_session(
            &scope.ctx,
            UserId::new(body.user_id),
            mode,
            body.title.unwrap_or_default(),
        )
        .await
        .map_err(|e| scope.fail(e))?;

    let self_link = format!("/api/v1/sessions/{}", output.session.id);
    let messages_link = format!("{self_link}/messages");
    Ok(scope
        .created(output)
        .with_link("self", &self_link)
        .with_link("messages", &messages_link))
}

/// GET /api/v1/sessions/{id} - A session and its most recent messages.
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<ApiResponse<Timeline>, HandlerError> {
    let scope = RequestScope::new(&state);
    let sid = parse_session_id(&scope, &session_id)?;

    let timeline = state
        .conversation
        .get_session_timeline(&scope.ctx, &sid, query.limit)
        .await
        .map_err(|e| scope.fail(e))?;

    Ok(scope
        .ok(timeline)
        .with_link("self", &format!("/api/v1/sessions/{sid}")))
}

/// POST /api/v1/sessions/{id}/messages - Send a user message and run the pipeline.
pub async fn send_message(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> Result<ApiResponse<SendMessageOutput>, HandlerError> {
    let scope = RequestScope::new(&state);
    let sid = parse_session_id(&scope, &session_id)?;

    let output = state
        .conversation
        .send_message(&scope.ctx, &sid, &UserId::new(body.user_id), &body.text)
        .await
        .map_err(|e| scope.fail(e))?;

    Ok(scope
        .ok(output)
        .with_link("session", &format!("/api/v1/sessions/{sid}")))
}

/// GET /api/v1/users/{id}/sessions - A user's sessions, newest first.
pub async fn list_sessions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<ApiResponse<Vec<Session>>, HandlerError> {
    let scope = RequestScope::new(&state);

    let sessions = state
        .conversation
        .list_sessions(&scope.ctx, &UserId::new(user_id), query.limit)
        .await
        .map_err(|e| scope.fail(e))?;

    Ok(scope.ok(sessions))
}
