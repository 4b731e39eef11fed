//! JSON envelope shared by every `/api/v1` response.
//!
//! ```json
//! {
//!   "data": { ... },
//!   "meta": { "request_id": "...", "timestamp": "...", "response_time_ms": 5 },
//!   "errors": [{ "code": "NOT_FOUND", "message": "..." }],
//!   "_links": { "self": "/api/v1/..." }
//! }
//! ```
//!
//! `data` is absent on failure and `errors` is absent on success.

use std::collections::BTreeMap;
use std::time::Instant;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub meta: ApiMeta,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ApiErrorDetail>,
    #[serde(rename = "_links", skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<&'static str, String>,
    #[serde(skip)]
    status: StatusCode,
}

#[derive(Debug, Serialize)]
pub struct ApiMeta {
    /// Same id as the request's log span and `RequestContext`.
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub response_time_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    /// Stable, machine-readable code such as `NOT_FOUND`.
    pub code: &'static str,
    pub message: String,
}

impl ApiMeta {
    fn stamp(request_id: String, started: Instant) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
            response_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        }
    }
}

impl<T> ApiResponse<T> {
    fn build(
        status: StatusCode,
        data: Option<T>,
        errors: Vec<ApiErrorDetail>,
        request_id: String,
        started: Instant,
    ) -> Self {
        Self {
            data,
            meta: ApiMeta::stamp(request_id, started),
            errors,
            links: BTreeMap::new(),
            status,
        }
    }

    pub fn success(data: T, request_id: String, started: Instant) -> Self {
        Self::build(StatusCode::OK, Some(data), Vec::new(), request_id, started)
    }

    pub fn created(data: T, request_id: String, started: Instant) -> Self {
        Self::build(StatusCode::CREATED, Some(data), Vec::new(), request_id, started)
    }

    /// Attach a related resource under `_links`.
    pub fn with_link(mut self, rel: &'static str, href: impl Into<String>) -> Self {
        self.links.insert(rel, href.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl ApiResponse<()> {
    pub fn error(
        status: StatusCode,
        code: &'static str,
        message: impl Into<String>,
        request_id: String,
        started: Instant,
    ) -> Self {
        let detail = ApiErrorDetail {
            code,
            message: message.into(),
        };
        Self::build(status, None, vec![detail], request_id, started)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
