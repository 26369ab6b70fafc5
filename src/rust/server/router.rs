use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use super::handlers;
use super::state::AppState;

/// Create the HTTP router
pub fn create_router(state: AppState, max_body_size: usize) -> Router {
    Router::new()
        .route("/predict", post(handlers::predict))
        .route("/comments/recent", get(handlers::recent_comments))
        .route("/comments/category/:category", get(handlers::comments_by_category))
        .route("/comments/:id", get(handlers::get_comment))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(max_body_size))
        .with_state(state)
}
