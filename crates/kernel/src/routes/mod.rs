//! HTTP route handlers.

pub mod content_api;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// All routes, bound to `state`. Middleware is layered by the caller.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(content_api::router())
        .with_state(state)
}
