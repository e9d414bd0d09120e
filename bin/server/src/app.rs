//! HTTP router.

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::{self, AppState};

/// Builds the application router over the shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/users/login", post(auth::login))
        .route("/api/v1/users/logout", post(auth::logout))
        .route(auth::routes::OAUTH_PATH, get(auth::oauth))
        .route("/api/v1/users/current", get(auth::current))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
