//! Axum router construction for the feed server.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete router.
///
/// CORS allows any origin: reporters and trackers run on operator
/// machines, not on a known site.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/citizens",
            get(handlers::list_citizens).post(handlers::report_citizen),
        )
        .route(
            "/api/citizens/{world}",
            get(handlers::get_citizen).delete(handlers::delete_citizen),
        )
        .route("/api/stats", get(handlers::stats))
        .route("/health", get(handlers::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
