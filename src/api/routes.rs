//! API route definitions

use axum::routing::get;
use axum::routing::post;
use axum::Router;

use super::handlers::AppState;
use super::handlers::{
    self,
};

/// Create the web form router
pub fn web_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/process", post(handlers::process))
        .route("/chat", post(handlers::chat))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .with_state(state)
}
