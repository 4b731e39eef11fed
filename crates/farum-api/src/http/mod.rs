//! HTTP/REST API layer for Farum.
//!
//! Axum-based REST API at `/api/v1/` with an envelope response format and
//! CORS support. Every request runs under its own `RequestContext` bounded
//! by the configured request timeout.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
