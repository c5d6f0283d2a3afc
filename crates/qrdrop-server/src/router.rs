use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all QR Drop endpoints.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.body_limit();
    Router::new()
        .route("/api/upload", post(handler::upload))
        .route("/api/preview", post(handler::preview))
        .route("/image/:id", get(handler::image))
        .route("/health", get(handler::health))
        .fallback(handler::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
