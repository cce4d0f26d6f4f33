//! Route table.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/health", get(handlers::health))
        .route("/status", get(handlers::status))
        .route("/enqueue", post(handlers::enqueue))
        .route("/task/{id}", get(handlers::get_task))
        .route("/task/{id}/cancel", post(handlers::cancel_task))
        .route("/command", post(handlers::command))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
}
