//! Journal HTTP handlers.
//!
//! Endpoints:
//! - GET /api/v1/users/{id}/journal - Most recent journal entries of a user

use axum::extract::{Path, Query, State};

use farum_types::journal::JournalEntry;
use farum_types::session::UserId;

use super::{LimitQuery, RequestScope};
use crate::http::error::HandlerError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/users/{id}/journal - Journal entries, oldest first.
pub async fn get_journal(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<ApiResponse<Vec<JournalEntry>>, HandlerError> {
    let scope = RequestScope::new(&state);

    let entries = state
        .journal
        .get_user_journal(&scope.ctx, &UserId::new(user_id.clone()), query.limit)
        .await
        .map_err(|e| scope.fail(e))?;

    Ok(scope
        .ok(entries)
        .with_link("self", &format!("/api/v1/users/{user_id}/journal")))
}
