//! HTTP request handlers for the REST API.

pub mod health;
pub mod journal;
pub mod session;

use std::time::Instant;

use serde::{Deserialize, Serialize};

use farum_core::request_context::RequestContext;

use crate::http::error::{AppError, HandlerError};
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// `?limit=` for list endpoints. Absent or non-positive means the
/// endpoint's default.
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    #[serde(default)]
    pub limit: i64,
}

/// Per-request bookkeeping: the service context and the response clock.
pub(crate) struct RequestScope {
    pub ctx: RequestContext,
    started: Instant,
}

impl RequestScope {
    pub fn new(state: &AppState) -> Self {
        Self {
            ctx: state.request_context(),
            started: Instant::now(),
        }
    }

    fn request_id(&self) -> String {
        self.ctx.request_id.to_string()
    }

    pub fn ok<T: Serialize>(&self, data: T) -> ApiResponse<T> {
        ApiResponse::success(data, self.request_id(), self.started)
    }

    pub fn created<T: Serialize>(&self, data: T) -> ApiResponse<T> {
        ApiResponse::created(data, self.request_id(), self.started)
    }

    pub fn fail(&self, error: impl Into<AppError>) -> HandlerError {
        HandlerError {
            error: error.into(),
            request_id: self.request_id(),
            started: self.started,
        }
    }
}
