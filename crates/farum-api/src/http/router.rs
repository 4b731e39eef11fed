//! Axum router configuration with middleware.
//!
//! API routes are under `/api/v1/`, plus unversioned `/health` and `/healthz`.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Sessions
        .route("/sessions", post(handlers::session::start_session))
        .route("/sessions/{id}", get(handlers::session::get_session))
        .route(
            "/sessions/{id}/messages",
            post(handlers::session::send_message),
        )
        // User-scoped reads
        .route(
            "/users/{id}/sessions",
            get(handlers::session::list_sessions),
        )
        .route("/users/{id}/journal", get(handlers::journal::get_journal));

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/healthz", get(handlers::health::health))
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::memory_state;

    #[tokio::test]
    async fn test_router_builds_without_route_conflicts() {
        let _router = build_router(memory_state());
    }
}
